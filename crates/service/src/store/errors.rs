use thiserror::Error;

use models::errors::ModelError;

/// Business errors for store workflows
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store already exists")]
    Duplicate,
    #[error("store not found")]
    NotFound,
    #[error("unsupported sort parameter: {0}")]
    SortNotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl StoreError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            StoreError::Duplicate => 2001,
            StoreError::NotFound => 2002,
            StoreError::SortNotFound(_) => 2003,
            StoreError::Validation(_) => 2004,
            StoreError::Repository(_) => 2200,
        }
    }
}

impl From<ModelError> for StoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => StoreError::Validation(msg),
            ModelError::Db(msg) => StoreError::Repository(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            StoreError::Duplicate.code(),
            StoreError::NotFound.code(),
            StoreError::SortNotFound("x".into()).code(),
            StoreError::Validation("x".into()).code(),
            StoreError::Repository("x".into()).code(),
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn model_validation_maps_to_validation() {
        let err: StoreError = ModelError::Validation("bad".into()).into();
        assert!(matches!(err, StoreError::Validation(m) if m == "bad"));
    }
}
