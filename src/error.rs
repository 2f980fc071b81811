use crate::num::NumError;

/// Error returned by the key-value collaborators behind [`crate::store`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Missing entity, or a prefix with no entries.
    #[error("not found")]
    NotFound,

    /// Any structural failure of the underlying store.
    #[error("store i/o error: {0}")]
    Io(String),
}

/// Error returned by the query engine.
///
/// Listing operations of [`crate::query::QueryEngine`] only ever fail with
/// [`QueryError::InvalidParam`], [`QueryError::TypeMismatch`] or
/// [`QueryError::Store`]; `NotFound` and `Decode` are produced by single-item
/// lookups and turn into omission inside multi-item results. Direct lookups
/// by key also report `NotFound`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("not found")]
    NotFound,

    #[error("decode failure: {0}")]
    Decode(String),

    #[error("row {key} of index {index} is not a {expected}")]
    TypeMismatch {
        index: &'static str,
        key: String,
        expected: &'static str,
    },

    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for QueryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            StoreError::Io(msg) => Self::Store(msg),
        }
    }
}

impl From<NumError> for QueryError {
    fn from(value: NumError) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        assert_eq!(QueryError::from(StoreError::NotFound), QueryError::NotFound);
        assert_eq!(
            QueryError::from(StoreError::Io("disk".to_string())),
            QueryError::Store("disk".to_string())
        );
    }
}
