pub mod config;
pub mod errors;
pub mod facade;
pub mod flight;
pub mod frequency;
pub mod key;
pub mod loader;
pub mod model;
pub mod prelude;
pub mod refresh;
pub mod report;
pub mod source;
pub mod stats;
pub mod store;
pub mod ttl;
pub mod version;

pub use config::CacheConfig;
pub use errors::{ConfigError, DecisionError, RefreshFailure};
pub use facade::CacheFacade;
pub use flight::{Flight, FlightGuard};
pub use frequency::FrequencyTracker;
pub use key::{encode, encode_request, CacheKey};
pub use loader::{load_config, load_config_with_options, LoadOptions};
pub use model::{AttrMap, AttrValue, AuthzRequest};
pub use refresh::BackgroundRefresher;
pub use report::{CacheReport, ConfigSummary, TopKey, WarmReport};
pub use source::{DecisionSource, FnSource};
pub use stats::CacheStats;
pub use store::{BoundedStore, CacheEntry, StoreHit};
pub use ttl::{should_refresh, ttl_for};
pub use version::{
    InMemoryPolicySet, PolicyDigest, PolicyVersionProbe, PolicyVersionTracker, VersionTag,
};
