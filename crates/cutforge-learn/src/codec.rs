//! Text encoding of constraint sets stored in samples.
//!
//! Enforced-violation sets are stored as a single JSON object mapping the
//! text form of each identifier to its metadata:
//!
//! ```
//! use cutforge_learn::codec::{decode, encode, ViolationRegistry};
//! use serde_json::json;
//!
//! let mut violations = ViolationRegistry::new();
//! violations.insert("c1".into(), json!({"coeffs": [1.0, -1.0]}));
//! violations.insert("c2".into(), json!(null));
//!
//! let text = encode(&violations).unwrap();
//! assert_eq!(text, r#"{"c1":{"coeffs":[1.0,-1.0]},"c2":null}"#);
//! assert_eq!(decode(&text).unwrap(), violations);
//! ```

use std::collections::BTreeMap;

use cutforge_core::ConstraintId;
use serde_json::Value as Metadata;

use crate::error::{LearnError, Result};

/// Constraint identifiers with their associated metadata, ordered by identifier.
pub type ViolationRegistry = BTreeMap<ConstraintId, Metadata>;

/// Serializes a violation set. Keys are written in identifier order.
///
/// # Errors
///
/// Returns [`LearnError::NonUtf8Identifier`] when an identifier has no
/// text form.
pub fn encode(violations: &ViolationRegistry) -> Result<String> {
    let text: BTreeMap<&str, &Metadata> = violations
        .iter()
        .map(|(id, data)| Ok((text_of(id)?, data)))
        .collect::<Result<_>>()?;
    Ok(serde_json::to_string(&text)?)
}

/// Parses a violation set written by [`encode`].
pub fn decode(encoded: &str) -> Result<ViolationRegistry> {
    let text: BTreeMap<String, Metadata> = serde_json::from_str(encoded)?;
    Ok(text
        .into_iter()
        .map(|(k, v)| (ConstraintId::from(k), v))
        .collect())
}

/// Serializes a list of identifiers as a JSON array, keeping its order.
pub fn encode_list(ids: &[ConstraintId]) -> Result<String> {
    let text = ids.iter().map(text_of).collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string(&text)?)
}

/// Parses a list written by [`encode_list`].
pub fn decode_list(encoded: &str) -> Result<Vec<ConstraintId>> {
    let text: Vec<String> = serde_json::from_str(encoded)?;
    Ok(text.into_iter().map(ConstraintId::from).collect())
}

fn text_of(id: &ConstraintId) -> Result<&str> {
    id.as_text()
        .ok_or_else(|| LearnError::NonUtf8Identifier(id.as_bytes().to_vec()))
}
