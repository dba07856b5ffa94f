use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use verdict_errors::prelude::*;

use crate::key::CacheKey;
use crate::model::AuthzRequest;

/// Failure reported by a [`DecisionSource`](crate::source::DecisionSource).
///
/// Propagated to the caller on a miss and never cached.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecisionError(pub Box<ErrorObj>);

impl DecisionError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }

    /// Tags the error with the request it was raised for. Meta the source
    /// already set is kept.
    pub fn with_request(mut self, request: &AuthzRequest, key: &CacheKey) -> Self {
        let meta = &mut self.0.meta;
        for (name, value) in [
            ("principal", request.principal.clone()),
            ("action", request.action.clone()),
            ("resource", request.resource.clone()),
            ("cache_key", key.to_string()),
        ] {
            meta.entry(name).or_insert(Value::String(value));
        }
        self
    }

    pub fn labels(&self) -> BTreeMap<&'static str, String> {
        labels(&self.0)
    }

    pub fn evaluation(msg: &str) -> Self {
        Self(Box::new(
            ErrorBuilder::new(codes::POLICY_EVALUATION_FAILED)
                .dev_msg(msg)
                .build(),
        ))
    }

    pub fn malformed(msg: &str) -> Self {
        Self(Box::new(
            ErrorBuilder::new(codes::POLICY_REQUEST_MALFORMED)
                .dev_msg(msg)
                .build(),
        ))
    }

    pub fn unavailable(msg: &str) -> Self {
        Self(Box::new(
            ErrorBuilder::new(codes::POLICY_SOURCE_UNAVAILABLE)
                .dev_msg(msg)
                .build(),
        ))
    }
}

impl From<ErrorObj> for DecisionError {
    fn from(value: ErrorObj) -> Self {
        Self(Box::new(value))
    }
}

/// Invalid construction parameters or an unreadable configuration source.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub Box<ErrorObj>);

impl ConfigError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn invalid(field: &str, detail: &str) -> Self {
        Self(Box::new(
            ErrorBuilder::new(codes::CONFIG_INVALID)
                .dev_msg(format!("{field}: {detail}"))
                .meta_kv("field", Value::String(field.to_string()))
                .build(),
        ))
    }

    pub fn source_unavailable(phase: &str, detail: &str) -> Self {
        Self(Box::new(
            ErrorBuilder::new(codes::CONFIG_SOURCE_UNAVAILABLE)
                .dev_msg(format!("{phase}: {detail}"))
                .build(),
        ))
    }
}

/// Why a background refresh did not overwrite its entry. Only ever logged.
#[derive(Debug, Error)]
pub enum RefreshFailure {
    #[error("decision source failed: {0}")]
    Source(#[from] DecisionError),
    #[error("policy version changed while refreshing")]
    VersionMoved,
    #[error("refresh cancelled by shutdown")]
    Cancelled,
}

impl RefreshFailure {
    pub fn to_error_obj(&self, key: &CacheKey) -> ErrorObj {
        let mut builder = ErrorBuilder::new(codes::CACHE_REFRESH_FAILED)
            .dev_msg(self.to_string())
            .meta_kv("cache_key", Value::String(key.to_string()));
        if let RefreshFailure::Source(inner) = self {
            for (name, value) in &inner.0.meta {
                if name != "cache_key" {
                    builder = builder.meta_kv(name.clone(), value.clone());
                }
            }
            builder = builder.cause(CauseEntry::new(
                inner.0.code.0,
                inner.0.message_dev.clone().unwrap_or_default(),
            ));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;

    #[test]
    fn request_meta_reaches_labels() {
        let request = AuthzRequest::new("User::alice", "Action::read", "Document::1");
        let key = key::encode_request(&request);
        let err = DecisionError::unavailable("engine offline").with_request(&request, &key);

        let labels = err.labels();
        assert_eq!(labels.get("code").unwrap(), "POLICY.SOURCE_UNAVAILABLE");
        assert_eq!(labels.get("principal").unwrap(), "User::alice");
        assert_eq!(labels.get("resource").unwrap(), "Document::1");
        assert_eq!(labels.get("cache_key").unwrap(), &key.to_string());
    }

    #[test]
    fn source_supplied_meta_is_kept() {
        let request = AuthzRequest::new("User::alice", "Action::read", "Document::1");
        let key = key::encode_request(&request);
        let obj = ErrorBuilder::new(codes::POLICY_REQUEST_MALFORMED)
            .meta_kv("principal", Value::String("User::canonical-alice".into()))
            .build();
        let err = DecisionError::from(obj).with_request(&request, &key);
        assert_eq!(err.labels().get("principal").unwrap(), "User::canonical-alice");
    }

    #[test]
    fn refresh_failure_wraps_source_meta() {
        let request = AuthzRequest::new("User::bob", "Action::write", "Document::2");
        let key = key::encode_request(&request);
        let failure = RefreshFailure::from(
            DecisionError::evaluation("no verdict").with_request(&request, &key),
        );

        let tags = labels(&failure.to_error_obj(&key));
        assert_eq!(tags.get("code").unwrap(), "CACHE.REFRESH_FAILED");
        assert_eq!(tags.get("cause").unwrap(), "POLICY.EVALUATION_FAILED");
        assert_eq!(tags.get("principal").unwrap(), "User::bob");
        assert_eq!(tags.get("cache_key").unwrap(), &key.to_string());

        let moved = labels(&RefreshFailure::VersionMoved.to_error_obj(&key));
        assert!(!moved.contains_key("cause"));
        assert_eq!(moved.get("cache_key").unwrap(), &key.to_string());
    }
}
