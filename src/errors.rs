use thiserror::Error;

/// Failures surfaced by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Aggregation error: {0}")]
    AggregationError(String),

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the bookstore service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed for record {index}: field `{field}` {reason}")]
    Validation { index: usize, field: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store error during {operation} (filter: {filter}): {source}")]
    Store {
        operation: &'static str,
        filter: String,
        #[source]
        source: StoreError,
    },

    #[error("stored document {id} is not a book: {reason}")]
    Decode { id: String, reason: String },
}

impl ServiceError {
    pub(crate) fn store(operation: &'static str, filter: impl Into<String>, source: StoreError) -> Self {
        Self::Store { operation, filter: filter.into(), source }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// The underlying store failure, if this error came from the store.
    #[must_use]
    pub const fn store_source(&self) -> Option<&StoreError> {
        match self {
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
