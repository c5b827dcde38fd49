use crate::errors::{Result, ServiceError};
use bson::Document as BsonDocument;

/// Convert a JSON object into a BSON document.
pub fn json_value_to_bson_document(val: &serde_json::Value) -> Result<BsonDocument> {
    let obj = val.as_object().ok_or_else(|| ServiceError::invalid("expected a JSON object"))?;
    BsonDocument::try_from(obj.clone()).map_err(|e| ServiceError::invalid(format!("not representable as BSON: {e}")))
}

/// Parse a JSON array of objects into BSON documents, keeping their order.
pub fn parse_json_documents(json: &str) -> Result<Vec<BsonDocument>> {
    let val: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ServiceError::invalid(format!("malformed JSON: {e}")))?;
    let items = val.as_array().ok_or_else(|| ServiceError::invalid("expected a JSON array of records"))?;
    items.iter().map(json_value_to_bson_document).collect()
}
