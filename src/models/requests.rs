//! Request DTOs for the ops API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::hooks::{MutationEvent, Operation};

/// Maximum accepted length for a class, id or slug segment.
pub const MAX_SEGMENT_LENGTH: usize = 256;

/// Request body for POST /hooks/mutation
///
/// # Fields
/// - `class`: Resource class of the mutated record
/// - `id`: Record identifier
/// - `slug`: Optional slug the record is also cached under
/// - `operation`: "create", "update" or "delete"
#[derive(Debug, Clone, Deserialize)]
pub struct MutationRequest {
    pub class: String,
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub operation: Operation,
}

impl MutationRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let mut segments = vec![("class", self.class.as_str()), ("id", self.id.as_str())];
        if let Some(slug) = &self.slug {
            segments.push(("slug", slug.as_str()));
        }

        for (name, value) in segments {
            if value.trim().is_empty() {
                return Some(format!("{} cannot be empty", name));
            }
            if value.len() > MAX_SEGMENT_LENGTH {
                return Some(format!(
                    "{} exceeds maximum length of {} characters",
                    name, MAX_SEGMENT_LENGTH
                ));
            }
            if value.contains('*') {
                return Some(format!("{} cannot contain '*'", name));
            }
        }
        None
    }

    pub fn into_event(self) -> MutationEvent {
        MutationEvent {
            class: self.class,
            id: self.id,
            slug: self.slug,
            operation: self.operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(class: &str, id: &str) -> MutationRequest {
        MutationRequest {
            class: class.to_string(),
            id: id.to_string(),
            slug: None,
            operation: Operation::Update,
        }
    }

    #[test]
    fn test_mutation_request_deserialize() {
        let json = r#"{"class": "events", "id": "42", "operation": "delete"}"#;
        let req: MutationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.class, "events");
        assert_eq!(req.id, "42");
        assert!(req.slug.is_none());
        assert_eq!(req.operation, Operation::Delete);
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let json = r#"{"class": "events", "id": "42", "operation": "upsert"}"#;
        assert!(serde_json::from_str::<MutationRequest>(json).is_err());
    }

    #[test]
    fn test_validate_empty_segments() {
        assert!(request("", "42").validate().is_some());
        assert!(request("events", " ").validate().is_some());
    }

    #[test]
    fn test_validate_rejects_wildcards() {
        assert!(request("*", "42").validate().is_some());

        let mut req = request("events", "42");
        req.slug = Some("fair*".to_string());
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = request("events", "42");
        assert!(req.validate().is_none());
        assert_eq!(req.into_event().class, "events");
    }
}
