use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use verdict_crypto::prelude::*;

/// Opaque fingerprint of the loaded policy set.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(Arc<str>);

impl VersionTag {
    pub fn new(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionTag({})", self.0)
    }
}

/// Reports a digest that changes if and only if the effective policy content does.
#[async_trait]
pub trait PolicyVersionProbe: Send + Sync {
    async fn current_digest(&self) -> String;
}

/// Holds the last observed policy version and detects changes on demand.
pub struct PolicyVersionTracker {
    probe: Arc<dyn PolicyVersionProbe>,
    current: ArcSwap<VersionTag>,
}

impl PolicyVersionTracker {
    pub async fn new(probe: Arc<dyn PolicyVersionProbe>) -> Self {
        let initial = VersionTag::new(probe.current_digest().await);
        Self {
            probe,
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn current(&self) -> VersionTag {
        (**self.current.load()).clone()
    }

    /// Asks the probe again. Returns `(old, new)` only when the tag moved;
    /// concurrent callers observing the same change report it once.
    pub async fn refresh_and_detect_change(&self) -> Option<(VersionTag, VersionTag)> {
        let fresh = VersionTag::new(self.probe.current_digest().await);
        if **self.current.load() == fresh {
            return None;
        }
        let previous = self.current.swap(Arc::new(fresh.clone()));
        if *previous == fresh {
            None
        } else {
            Some(((*previous).clone(), fresh))
        }
    }
}

/// Digest helpers for embedders that hold their policies as text or JSON.
pub struct PolicyDigest;

impl PolicyDigest {
    /// Digests `(id, body)` pairs sorted by id, so listing order is irrelevant.
    pub fn of<I, K, B>(policies: I) -> String
    where
        I: IntoIterator<Item = (K, B)>,
        K: AsRef<str>,
        B: AsRef<str>,
    {
        let mut pairs: Vec<(String, String)> = policies
            .into_iter()
            .map(|(id, body)| (id.as_ref().to_string(), body.as_ref().to_string()))
            .collect();
        pairs.sort();
        let mut writer = CanonicalWriter::new();
        writer.list_header(pairs.len());
        for (id, body) in &pairs {
            writer.str(id).str(body);
        }
        DefaultDigester.sha256(writer.as_bytes()).to_tagged_string()
    }

    /// Digests a structured policy document through canonical JSON.
    pub fn of_document(document: &Value) -> Result<String, CryptoError> {
        DefaultDigester
            .commit_json(&JsonCanonicalizer, document)
            .map(|digest| digest.to_tagged_string())
    }
}

/// Probe over a replaceable in-memory policy list.
#[derive(Default)]
pub struct InMemoryPolicySet {
    policies: RwLock<Vec<(String, String)>>,
}

impl InMemoryPolicySet {
    pub fn new<I, K, B>(policies: I) -> Self
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<String>,
    {
        let set = Self::default();
        set.replace(policies);
        set
    }

    pub fn replace<I, K, B>(&self, policies: I)
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<String>,
    {
        let next = policies
            .into_iter()
            .map(|(id, body)| (id.into(), body.into()))
            .collect();
        *self.policies.write() = next;
    }

    pub fn upsert(&self, id: impl Into<String>, body: impl Into<String>) {
        let id = id.into();
        let body = body.into();
        let mut guard = self.policies.write();
        match guard.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = body,
            None => guard.push((id, body)),
        }
    }

    pub fn digest(&self) -> String {
        PolicyDigest::of(self.policies.read().iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

#[async_trait]
impl PolicyVersionProbe for InMemoryPolicySet {
    async fn current_digest(&self) -> String {
        self.digest()
    }
}
