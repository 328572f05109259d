//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for PUT /__session/set
///
/// # Fields
/// - `key`: The user-data key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses the engine default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }
}

/// Request body for POST /__sw/update
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    /// Version of the freshly built worker
    pub version: String,
}

impl UpdateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.version.trim().is_empty() {
            return Some("Version cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /__critical/extract
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub html: String,
    pub css: String,
    /// Also return `html` with the critical CSS inlined into its head
    #[serde(default)]
    pub inline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "prefs", "value": {"theme": "dark"}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "prefs");
        assert_eq!(req.value["theme"], "dark");
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
    }

    #[test]
    fn test_validate_set_request() {
        let mut req = SetRequest {
            key: "".to_string(),
            value: Value::Null,
            ttl: None,
        };
        assert!(req.validate().is_some());

        req.key = "k".repeat(MAX_KEY_LENGTH + 1);
        assert!(req.validate().is_some());

        req.key = "valid_key".to_string();
        req.ttl = Some(0);
        assert!(req.validate().is_some());

        req.ttl = Some(60);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_update_request_validate() {
        let req: UpdateRequest = serde_json::from_str(r#"{"version": "  "}"#).unwrap();
        assert!(req.validate().is_some());
        let req: UpdateRequest = serde_json::from_str(r#"{"version": "v2"}"#).unwrap();
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_extract_request_inline_defaults_off() {
        let req: ExtractRequest =
            serde_json::from_str(r#"{"html": "<p></p>", "css": "p{}"}"#).unwrap();
        assert!(!req.inline);
    }
}
