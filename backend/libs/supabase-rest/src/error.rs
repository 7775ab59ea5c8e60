use thiserror::Error;

/// Errors surfaced by the hosted database service.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level failure before a response was received
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the REST layer
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the JSON shape we asked for
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// Row-level security or missing/expired credentials.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            StoreError::Status {
                status: 401 | 403,
                ..
            }
        )
    }

    /// The named procedure or relation is not deployed on this project.
    /// Treated as expected-and-recoverable by callers with a fallback.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Status { status: 404, .. })
    }

    /// The REST layer rejected a filter or argument value, e.g. a
    /// non-uuid value against a uuid column. For lookups this is a
    /// miss, not a failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, StoreError::Status { status: 400, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        let err = StoreError::Status {
            status: 403,
            body: "row-level security".into(),
        };
        assert!(err.is_permission_denied());
        assert!(!err.is_unavailable());

        let err = StoreError::Status {
            status: 404,
            body: "function not found".into(),
        };
        assert!(err.is_unavailable());
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn test_invalid_input_classification() {
        let err = StoreError::Status {
            status: 400,
            body: "invalid input syntax for type uuid".into(),
        };
        assert!(err.is_invalid_input());
        assert!(!err.is_unavailable());

        let err = StoreError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.is_invalid_input());
    }
}
