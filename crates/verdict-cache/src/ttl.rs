use std::time::Duration;

/// Retention for a decision requested `frequency` times.
///
/// Hot keys keep twice the base TTL, warm keys (at least half the threshold)
/// one and a half times, everything else the base.
pub fn ttl_for(base_ttl: Duration, frequency: u64, hot_threshold: u64) -> Duration {
    if frequency >= hot_threshold {
        base_ttl.saturating_mul(2)
    } else if frequency >= hot_threshold / 2 {
        base_ttl.saturating_add(base_ttl / 2)
    } else {
        base_ttl
    }
}

/// True once `fraction` of the entry's lifetime has elapsed.
pub fn should_refresh(age: Duration, ttl: Duration, fraction: f64) -> bool {
    age >= ttl.mul_f64(fraction.clamp(0.0, 1.0))
}
