use serde_json::Value;

use crate::errors::CryptoError;

pub mod binary;
mod json;

use json::canonicalize_to_string;

pub trait Canonicalizer: Send + Sync {
    fn canonical_json(&self, value: &Value) -> Result<Vec<u8>, CryptoError>;
}

/// Renders JSON with object keys sorted and no insignificant whitespace.
/// Floating point numbers are rejected since their textual form is not stable.
#[derive(Default, Clone, Copy, Debug)]
pub struct JsonCanonicalizer;

impl Canonicalizer for JsonCanonicalizer {
    fn canonical_json(&self, value: &Value) -> Result<Vec<u8>, CryptoError> {
        let rendered = canonicalize_to_string(value)?;
        Ok(rendered.into_bytes())
    }
}
