//! The `policy_keys` index: a JSON array of bare policy ids, append-only.
//!
//! The index can drift from the records it names (an append that failed
//! after its record write, a record that was never written). Readers treat
//! it as a hint and skip ids whose record is missing.

use mayor_core::PolicyId;
use mayor_policy::ParseError;

pub const KEY_INDEX: &str = "policy_keys";

/// Parse stored index bytes. Empty or whitespace-only bytes are an empty index.
pub fn parse_index(bytes: &[u8]) -> Result<Vec<PolicyId>, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::new(format!("index is not utf-8: {}", e)).with_key(KEY_INDEX))?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| ParseError::new(e.to_string()).with_key(KEY_INDEX))
}

pub fn encode_index(ids: &[PolicyId]) -> Result<Vec<u8>, ParseError> {
    serde_json::to_vec(ids).map_err(|e| ParseError::new(e.to_string()).with_key(KEY_INDEX))
}
