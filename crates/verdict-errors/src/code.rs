use crate::{kind::ErrorKind, retry::RetryClass, severity::Severity};
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

#[derive(Clone, Debug)]
pub struct CodeSpec {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub retryable: RetryClass,
    pub severity: Severity,
    pub default_user_msg: &'static str,
}

pub mod codes {
    use super::ErrorCode;

    pub const CONFIG_INVALID: ErrorCode = ErrorCode("CONFIG.INVALID");
    pub const CONFIG_SOURCE_UNAVAILABLE: ErrorCode = ErrorCode("CONFIG.SOURCE_UNAVAILABLE");
    pub const POLICY_EVALUATION_FAILED: ErrorCode = ErrorCode("POLICY.EVALUATION_FAILED");
    pub const POLICY_REQUEST_MALFORMED: ErrorCode = ErrorCode("POLICY.REQUEST_MALFORMED");
    pub const POLICY_SOURCE_UNAVAILABLE: ErrorCode = ErrorCode("POLICY.SOURCE_UNAVAILABLE");
    pub const CACHE_REFRESH_FAILED: ErrorCode = ErrorCode("CACHE.REFRESH_FAILED");
    pub const SCHEMA_CANONICAL: ErrorCode = ErrorCode("SCHEMA.CANONICAL");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("UNKNOWN.INTERNAL");
}

pub static REGISTRY: Lazy<HashMap<&'static str, CodeSpec>> = Lazy::new(|| {
    use codes::*;

    let mut map = HashMap::new();
    let mut add = |spec: CodeSpec| {
        let key = spec.code.0;
        if map.insert(key, spec).is_some() {
            panic!("duplicate error code: {}", key);
        }
    };

    add(CodeSpec {
        code: CONFIG_INVALID,
        kind: ErrorKind::Configuration,
        retryable: RetryClass::Permanent,
        severity: Severity::Error,
        default_user_msg: "Cache configuration is invalid.",
    });

    add(CodeSpec {
        code: CONFIG_SOURCE_UNAVAILABLE,
        kind: ErrorKind::Configuration,
        retryable: RetryClass::Transient,
        severity: Severity::Error,
        default_user_msg: "Cache configuration source is unavailable.",
    });

    add(CodeSpec {
        code: POLICY_EVALUATION_FAILED,
        kind: ErrorKind::Evaluation,
        retryable: RetryClass::Permanent,
        severity: Severity::Warn,
        default_user_msg: "The authorization decision could not be evaluated.",
    });

    add(CodeSpec {
        code: POLICY_REQUEST_MALFORMED,
        kind: ErrorKind::Evaluation,
        retryable: RetryClass::Permanent,
        severity: Severity::Warn,
        default_user_msg: "The authorization request is malformed.",
    });

    add(CodeSpec {
        code: POLICY_SOURCE_UNAVAILABLE,
        kind: ErrorKind::Provider,
        retryable: RetryClass::Transient,
        severity: Severity::Error,
        default_user_msg: "The policy engine is unavailable. Please retry later.",
    });

    add(CodeSpec {
        code: CACHE_REFRESH_FAILED,
        kind: ErrorKind::Refresh,
        retryable: RetryClass::Transient,
        severity: Severity::Warn,
        default_user_msg: "Background refresh of a cached decision failed.",
    });

    add(CodeSpec {
        code: SCHEMA_CANONICAL,
        kind: ErrorKind::Schema,
        retryable: RetryClass::Permanent,
        severity: Severity::Warn,
        default_user_msg: "Canonical encoding failed for the provided payload.",
    });

    add(CodeSpec {
        code: UNKNOWN_INTERNAL,
        kind: ErrorKind::Unknown,
        retryable: RetryClass::Transient,
        severity: Severity::Critical,
        default_user_msg: "Internal error. Please retry later.",
    });

    map
});

pub fn spec_of(code: ErrorCode) -> &'static CodeSpec {
    REGISTRY.get(code.0).expect("unregistered ErrorCode")
}
