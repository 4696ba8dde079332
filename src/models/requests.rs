//! Request DTOs for the herd cache API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::collections::HashMap;

use serde::Deserialize;

fn default_herd() -> bool {
    true
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    None
}

/// Request body for PUT /set and PUT /add
///
/// # Fields
/// - `key`: Logical cache key
/// - `value`: The value to store
/// - `timeout`: Seconds until the value should be recomputed; omitted uses
///   the server default, `0` stores without herd protection
/// - `version`: Key version; omitted uses the server default
/// - `herd`: Whether to wrap the value for herd protection (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default = "default_herd")]
    pub herd: bool,
}

impl SetRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for POST /get_many
#[derive(Debug, Clone, Deserialize)]
pub struct GetManyRequest {
    pub keys: Vec<String>,
    #[serde(default)]
    pub version: Option<u32>,
}

impl GetManyRequest {
    pub fn validate(&self) -> Option<String> {
        self.keys.iter().find_map(|key| validate_key(key))
    }
}

/// Request body for PUT /set_many
#[derive(Debug, Clone, Deserialize)]
pub struct SetManyRequest {
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default = "default_herd")]
    pub herd: bool,
}

impl SetManyRequest {
    pub fn validate(&self) -> Option<String> {
        if self.data.is_empty() {
            return Some("Data cannot be empty".to_string());
        }
        self.data.keys().find_map(|key| validate_key(key))
    }

    /// Values as bytes, keyed by logical key.
    pub fn into_bytes(self) -> HashMap<String, Vec<u8>> {
        self.data
            .into_iter()
            .map(|(key, value)| (key, value.into_bytes()))
            .collect()
    }
}

/// Query string accepted by GET /get/:key and DELETE /del/:key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionQuery {
    #[serde(default)]
    pub version: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_defaults() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.timeout.is_none());
        assert!(req.version.is_none());
        assert!(req.herd);
    }

    #[test]
    fn test_set_request_full() {
        let json = r#"{"key": "test", "value": "hello", "timeout": 0, "version": 2, "herd": false}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.timeout, Some(0));
        assert_eq!(req.version, Some(2));
        assert!(!req.herd);
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: "test".to_string(),
            timeout: None,
            version: None,
            herd: true,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_get_many_request_validation() {
        let req: GetManyRequest = serde_json::from_str(r#"{"keys": ["a", ""]}"#).unwrap();
        assert!(req.validate().is_some());

        let req: GetManyRequest = serde_json::from_str(r#"{"keys": ["a", "b"]}"#).unwrap();
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_set_many_request_into_bytes() {
        let req: SetManyRequest =
            serde_json::from_str(r#"{"data": {"a": "1"}, "timeout": 30}"#).unwrap();
        assert!(req.validate().is_none());
        assert!(req.herd);

        let data = req.into_bytes();
        assert_eq!(data["a"], b"1");
    }

    #[test]
    fn test_set_many_request_rejects_empty_data() {
        let req: SetManyRequest = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(req.validate().is_some());
    }
}
