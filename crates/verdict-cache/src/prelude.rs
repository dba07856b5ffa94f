pub use crate::config::CacheConfig;
pub use crate::errors::{ConfigError, DecisionError, RefreshFailure};
pub use crate::facade::CacheFacade;
pub use crate::key::{encode_request, CacheKey};
pub use crate::loader::{load_config, LoadOptions};
pub use crate::model::{AttrMap, AttrValue, AuthzRequest};
pub use crate::report::{CacheReport, WarmReport};
pub use crate::source::{DecisionSource, FnSource};
pub use crate::stats::CacheStats;
pub use crate::version::{InMemoryPolicySet, PolicyDigest, PolicyVersionProbe, VersionTag};
