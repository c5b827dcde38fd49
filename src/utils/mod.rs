//! Utility modules: operation log, JSON helpers.
pub mod json;
pub mod oplog;
