use std::fmt;

use verdict_crypto::prelude::*;
use verdict_crypto::base64url;

use crate::model::{AttrMap, AuthzRequest};

const KEY_DOMAIN: &str = "verdict.decision-key.v1";

/// Fixed-size fingerprint of an authorization request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Stable shard selector derived from the leading key bytes.
    pub(crate) fn shard_index(&self, shards: usize) -> usize {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.0[..8]);
        (u64::from_be_bytes(head) % shards.max(1) as u64) as usize
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base64url::encode(&self.0))
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({self})")
    }
}

/// Derives the cache key for a request.
///
/// Identifiers are written verbatim and both maps in key order, each field
/// length-prefixed, then the byte stream is hashed with sha256.
pub fn encode(
    principal: &str,
    action: &str,
    resource: &str,
    context: Option<&AttrMap>,
    entities: Option<&AttrMap>,
) -> CacheKey {
    let mut writer = CanonicalWriter::with_capacity(128);
    writer
        .str(KEY_DOMAIN)
        .str(principal)
        .str(action)
        .str(resource)
        .value(&context)
        .value(&entities);
    CacheKey(DefaultDigester.sha256(writer.as_bytes()).bytes)
}

pub fn encode_request(request: &AuthzRequest) -> CacheKey {
    encode(
        &request.principal,
        &request.action,
        &request.resource,
        request.context.as_ref(),
        request.entities.as_ref(),
    )
}
