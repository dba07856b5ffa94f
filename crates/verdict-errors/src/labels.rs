use crate::model::ErrorObj;
use std::collections::BTreeMap;

pub fn labels(err: &ErrorObj) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("code", err.code.0.to_string());
    map.insert("kind", err.kind.as_str().to_string());
    map.insert("retryable", err.retryable.as_str().to_string());
    map.insert("severity", err.severity.as_str().to_string());

    for key in ["principal", "action", "resource", "cache_key"] {
        if let Some(value) = err.meta.get(key).and_then(|v| v.as_str()) {
            map.insert(key, value.to_string());
        }
    }

    if let Some(cause) = err.cause_chain.as_ref().and_then(|chain| chain.first()) {
        map.insert("cause", cause.code.clone());
    }

    map
}
