use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use verdict_crypto::{Canonical, CanonicalWriter};

/// Attribute value carried in a request's context or entity map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`; smaller values deserialize as `Int`.
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<AttrValue>),
    Map(AttrMap),
}

impl Canonical for AttrValue {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        match self {
            AttrValue::Null => {
                out.null();
            }
            AttrValue::Bool(b) => {
                out.bool(*b);
            }
            AttrValue::Int(i) => {
                out.int(*i);
            }
            AttrValue::UInt(u) => {
                out.uint(*u);
            }
            AttrValue::Float(f) => {
                out.float(*f);
            }
            AttrValue::String(s) => {
                out.str(s);
            }
            AttrValue::List(items) => {
                out.list_header(items.len());
                for item in items {
                    item.write_canonical(out);
                }
            }
            AttrValue::Map(map) => map.write_canonical(out),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => AttrValue::Int(signed),
            Err(_) => AttrValue::UInt(value),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<AttrMap> for AttrValue {
    fn from(value: AttrMap) -> Self {
        AttrValue::Map(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(value: Vec<T>) -> Self {
        AttrValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Bool(b),
            Value::Number(num) => match (num.as_i64(), num.as_u64()) {
                (Some(i), _) => AttrValue::Int(i),
                (None, Some(u)) => AttrValue::UInt(u),
                (None, None) => AttrValue::Float(num.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => AttrValue::String(s),
            Value::Array(items) => AttrValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => AttrValue::Map(map.into_iter().collect()),
        }
    }
}

/// Associative attribute map stored as pairs sorted by key.
///
/// Construction order never matters: pairs are sorted on the way in and a
/// repeated key keeps the value that was supplied last.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, AttrValue>", into = "BTreeMap<String, AttrValue>")]
pub struct AttrMap {
    entries: Vec<(String, AttrValue)>,
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for AttrMap
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries: Vec<(String, AttrValue)> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        // Stable sort keeps insertion order among equal keys, so the last
        // occurrence of a key is the one retained below.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let mut deduped: Vec<(String, AttrValue)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match deduped.last_mut() {
                Some(last) if last.0 == key => last.1 = value,
                _ => deduped.push((key, value)),
            }
        }
        Self { entries: deduped }
    }
}

impl<V: Into<AttrValue>> From<HashMap<String, V>> for AttrMap {
    fn from(map: HashMap<String, V>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, AttrValue>> for AttrMap {
    fn from(map: BTreeMap<String, AttrValue>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl From<AttrMap> for BTreeMap<String, AttrValue> {
    fn from(map: AttrMap) -> Self {
        map.entries.into_iter().collect()
    }
}

impl Canonical for AttrMap {
    fn write_canonical(&self, out: &mut CanonicalWriter) {
        out.map_header(self.entries.len());
        for (key, value) in &self.entries {
            out.str(key);
            value.write_canonical(out);
        }
    }
}

/// A fully-resolved authorization request as seen by the cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthzRequest {
    pub principal: String,
    pub action: String,
    pub resource: String,
    #[serde(default)]
    pub context: Option<AttrMap>,
    #[serde(default)]
    pub entities: Option<AttrMap>,
}

impl AuthzRequest {
    pub fn new(
        principal: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            action: action.into(),
            resource: resource.into(),
            context: None,
            entities: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<AttrMap>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_entities(mut self, entities: impl Into<AttrMap>) -> Self {
        self.entities = Some(entities.into());
        self
    }
}
