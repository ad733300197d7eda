//! Error vocabulary shared by every Memora layer.
//!
//! Not-found errors carry a string key because guest sessions are keyed by
//! UUID while persisted rows use numeric ids.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with key {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a not-found error keyed by a numeric id.
    pub fn not_found(entity: &'static str, id: crate::types::DbId) -> Self {
        Self::NotFound {
            entity,
            key: id.to_string(),
        }
    }

    /// Validation error for a required text field left blank.
    pub fn blank(field: &str) -> Self {
        Self::Validation(format!("{field} must not be empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_entity_and_key() {
        let err = CoreError::not_found("Event", 7);
        assert_eq!(err.to_string(), "Entity not found: Event with key 7");
    }

    #[test]
    fn blank_names_the_field() {
        let err = CoreError::blank("Message");
        assert!(matches!(&err, CoreError::Validation(m) if m == "Message must not be empty"));
    }
}
