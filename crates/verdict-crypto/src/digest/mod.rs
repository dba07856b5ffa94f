use serde_json::Value;
use sha2::Digest as ShaDigest;

use crate::base64url;
use crate::canonical::Canonicalizer;
use crate::errors::CryptoError;

/// A sha256 digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    pub bytes: [u8; 32],
}

impl Digest {
    pub const ALGO: &'static str = "sha256";

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn to_base64url(&self) -> String {
        base64url::encode(&self.bytes)
    }

    /// `sha256:base64url`, stable across processes and suitable as a version tag.
    pub fn to_tagged_string(&self) -> String {
        format!("{}:{}", Self::ALGO, self.to_base64url())
    }
}

pub trait Digester: Send + Sync {
    fn sha256(&self, data: &[u8]) -> Digest;

    fn commit_json(
        &self,
        canonicalizer: &impl Canonicalizer,
        value: &Value,
    ) -> Result<Digest, CryptoError> {
        let canonical = canonicalizer.canonical_json(value)?;
        Ok(self.sha256(&canonical))
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct DefaultDigester;

impl Digester for DefaultDigester {
    fn sha256(&self, data: &[u8]) -> Digest {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&sha2::Sha256::digest(data));
        Digest { bytes }
    }
}
