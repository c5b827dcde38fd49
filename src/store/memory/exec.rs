use super::collection::MemoryCollection;
use super::index::{Scan, key_from_bson};
use crate::document::Document;
use crate::index::{ExplainStats, PlanStage};
use crate::query::{
    CmpOp, Cursor, DeleteReport, Filter, FindOptions, MAX_LIMIT, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS,
    UpdateDoc, UpdateReport, bson_equal, compare_docs, eval_filter, project_fields,
};
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use std::time::Instant;

/// How a filter will be answered: a full scan or an index scan.
#[derive(Debug)]
pub(crate) struct Plan {
    pub index_name: Option<String>,
    pub scan: Option<Scan>,
}

impl Plan {
    fn stage(&self) -> PlanStage {
        self.index_name
            .as_ref()
            .map_or(PlanStage::CollScan, |n| PlanStage::IxScan { index_name: n.clone() })
    }
}

fn conjuncts(filter: &Filter) -> &[Filter] {
    match filter {
        Filter::And(parts) => parts,
        other => std::slice::from_ref(other),
    }
}

/// Picks the index with the longest equality prefix; failing that, one whose leading
/// field carries a range predicate. Candidates are re-checked by the caller.
pub(crate) fn plan(col: &MemoryCollection, filter: &Filter) -> Plan {
    let preds: Vec<(&str, CmpOp, &Bson)> = conjuncts(filter)
        .iter()
        .filter_map(|f| match f {
            Filter::Cmp { path, op, value } => Some((path.as_str(), *op, value)),
            _ => None,
        })
        .collect();
    if preds.is_empty() {
        return Plan { index_name: None, scan: None };
    }
    let eq_key = |field: &str| {
        preds
            .iter()
            .find(|(p, op, _)| *p == field && *op == CmpOp::Eq)
            .and_then(|(_, _, v)| key_from_bson(v))
    };

    let st = col.state().read();
    let mut best: Option<(usize, &str)> = None;
    for (name, idx) in &st.indexes.indexes {
        let prefix = idx.spec.keys.iter().take_while(|(f, _)| eq_key(f.as_str()).is_some()).count();
        if prefix > 0 && best.is_none_or(|(b, _)| prefix > b) {
            best = Some((prefix, name.as_str()));
        }
    }
    if let Some((len, name)) = best {
        let idx = &st.indexes.indexes[name];
        let prefix: Vec<_> = idx.spec.keys.iter().take(len).filter_map(|(f, _)| eq_key(f.as_str())).collect();
        return Plan { index_name: Some(name.to_string()), scan: Some(idx.lookup_prefix(&prefix)) };
    }
    for (name, idx) in &st.indexes.indexes {
        let Some((lead, _)) = idx.spec.keys.first() else { continue };
        let range = preds
            .iter()
            .find(|(p, _, _)| *p == lead.as_str())
            .and_then(|(_, op, v)| key_from_bson(v).map(|k| (*op, k)));
        if let Some((op, key)) = range {
            return Plan { index_name: Some(name.clone()), scan: Some(idx.lookup_leading_range(op, &key)) };
        }
    }
    Plan { index_name: None, scan: None }
}

fn candidate_ids(col: &MemoryCollection, plan: Plan) -> Vec<DocumentId> {
    match plan.scan {
        Some(scan) => col.natural_order(scan.ids),
        None => col.list_ids(),
    }
}

fn is_match(col: &MemoryCollection, id: &DocumentId, filter: &Filter) -> bool {
    col.find_document(id).is_some_and(|d| eval_filter(&d.to_bson(), filter))
}

fn slice_bounds(len: usize, opts: &FindOptions) -> (usize, usize) {
    let skip = opts.skip.unwrap_or(0).min(len);
    // Only an explicit limit is capped; `None` means every match.
    let limit = opts.limit.map_or(usize::MAX, |l| l.min(MAX_LIMIT));
    (skip, skip.saturating_add(limit).min(len))
}

pub fn find_docs(col: &MemoryCollection, filter: &Filter, opts: &FindOptions) -> Cursor {
    let start = Instant::now();
    let plan = plan(col, filter);
    let index_name = plan.index_name.clone();

    if opts.projection.is_none() && opts.sort.is_none() {
        let mut ids = candidate_ids(col, plan);
        ids.retain(|id| is_match(col, id, filter));
        let (from, to) = slice_bounds(ids.len(), opts);
        let ids: Vec<DocumentId> = ids.drain(from..to).collect();
        log::debug!(
            target: "bookstore::store",
            "find collection={} filter={} used_index={:?} results={} duration_us={}",
            col.name_str(), filter, index_name, ids.len(), start.elapsed().as_micros()
        );
        // Rows are fetched on iteration; documents deleted in between are skipped.
        let source = col.clone();
        return Cursor::new(ids.into_iter().filter_map(move |id| source.find_document(&id).map(|d| d.to_bson())));
    }

    let mut docs: Vec<BsonDocument> = candidate_ids(col, plan)
        .into_iter()
        .filter_map(|id| col.find_document(&id))
        .map(|d| d.to_bson())
        .filter(|d| eval_filter(d, filter))
        .collect();

    if let Some(sort) = &opts.sort {
        let sort = &sort[..sort.len().min(MAX_SORT_FIELDS)];
        // stable: ties keep natural order
        docs.sort_by(|a, b| compare_docs(a, b, sort));
    }

    let (from, to) = slice_bounds(docs.len(), opts);
    let mut docs: Vec<BsonDocument> = docs.drain(from..to).collect();

    if let Some(fields) = &opts.projection {
        let fields: Vec<String> = fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut docs {
            *d = project_fields(d, &fields);
        }
    }
    log::debug!(
        target: "bookstore::store",
        "find collection={} filter={} used_index={:?} results={} skip={:?} limit={:?} duration_us={}",
        col.name_str(), filter, index_name, docs.len(), opts.skip, opts.limit, start.elapsed().as_micros()
    );
    Cursor::from_docs(docs)
}

#[must_use]
pub fn count_docs(col: &MemoryCollection, filter: &Filter) -> u64 {
    if matches!(filter, Filter::True) {
        return col.len() as u64;
    }
    let plan = plan(col, filter);
    candidate_ids(col, plan).iter().filter(|id| is_match(col, id, filter)).count() as u64
}

fn first_match(col: &MemoryCollection, filter: &Filter) -> Option<Document> {
    candidate_ids(col, plan(col, filter))
        .into_iter()
        .filter_map(|id| col.find_document(&id))
        .find(|d| eval_filter(&d.to_bson(), filter))
}

pub fn update_one(col: &MemoryCollection, filter: &Filter, update: &UpdateDoc) -> UpdateReport {
    let Some(mut doc) = first_match(col, filter) else {
        return UpdateReport { matched: 0, modified: 0 };
    };
    let id = doc.id.clone();
    let changed = apply_update(&mut doc, update);
    if changed {
        col.update_document(&id, doc);
    }
    UpdateReport { matched: 1, modified: u64::from(changed) }
}

pub fn delete_one(col: &MemoryCollection, filter: &Filter) -> DeleteReport {
    let Some(doc) = first_match(col, filter) else {
        return DeleteReport { deleted: 0 };
    };
    DeleteReport { deleted: u64::from(col.delete_document(&doc.id)) }
}

/// Executes `filter` and reports plan and work counters.
pub fn explain(col: &MemoryCollection, filter: &Filter) -> ExplainStats {
    let start = Instant::now();
    let plan = plan(col, filter);
    let stage = plan.stage();
    let keys_examined = plan.scan.as_ref().map_or(0, |s| s.keys_examined);
    let examined = candidate_ids(col, plan);
    let n_returned = examined.iter().filter(|id| is_match(col, id, filter)).count();
    ExplainStats {
        plan: stage,
        n_returned: n_returned as u64,
        total_keys_examined: keys_examined,
        total_docs_examined: examined.len() as u64,
        execution_time_millis: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

/// Applies `$set`/`$unset`; returns whether anything changed.
pub fn apply_update(doc: &mut Document, upd: &UpdateDoc) -> bool {
    let mut modified = false;
    // Enforce caps on number of fields updated per operation to bound work
    for (path, val) in upd.set.iter().take(128) {
        modified |= set_path(&mut doc.data, path, val.clone());
    }
    for path in upd.unset.iter().take(128) {
        modified |= unset_path(&mut doc.data, path);
    }
    if modified {
        doc.touch();
    }
    modified
}

fn set_path(doc: &mut BsonDocument, path: &str, val: Bson) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = parts.split_last() else { return false };
    let mut cur = doc;
    for key in parents {
        if !matches!(cur.get(*key), Some(Bson::Document(_))) {
            cur.insert((*key).to_string(), Bson::Document(BsonDocument::new()));
        }
        match cur.get_mut(*key) {
            Some(Bson::Document(d)) => cur = d,
            _ => return false,
        }
    }
    let changed = cur.get(*last).is_none_or(|prev| !bson_equal(prev, &val) || prev.element_type() != val.element_type());
    cur.insert((*last).to_string(), val);
    changed
}

fn unset_path(doc: &mut BsonDocument, path: &str) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = parts.split_last() else { return false };
    let mut cur = doc;
    for key in parents {
        match cur.get_mut(*key) {
            Some(Bson::Document(d)) => cur = d,
            _ => return false,
        }
    }
    cur.remove(*last).is_some()
}
