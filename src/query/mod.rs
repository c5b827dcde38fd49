// Submodules for separation of concerns
mod cursor;
mod eval;
mod parse;
mod types;

pub use cursor::Cursor;
pub use eval::{bson_equal, compare_bson, compare_docs, eval_filter, get_path, project_fields, to_f64};
pub use parse::{FilterSerde, parse_filter_json};
pub use types::{
    CmpOp, DeleteReport, Filter, FindOptions, InsertManyReport, MAX_LIMIT, Order, SortSpec, UpdateDoc,
    UpdateReport,
};
pub(crate) use types::{MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS};
