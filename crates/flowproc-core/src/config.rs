//! Engine-wide sizing and tuning constants.
//!
//! Every magic number the dispatcher depends on lives here instead of
//! scattered through the modules that use it, so a test (S4's single-slot
//! arena, for instance) can override just the one knob it cares about.

use crate::error::{CoreError, CoreResult};

/// Capacity split of the flow arena across its three logical pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizes {
    pub large: usize,
    pub bursty: usize,
    pub micro: usize,
}

impl PoolSizes {
    pub fn total(&self) -> usize {
        self.large + self.bursty + self.micro
    }
}

impl Default for PoolSizes {
    fn default() -> Self {
        Self {
            large: 50_000,
            bursty: 500,
            micro: 1_000,
        }
    }
}

/// All tunable sizes and thresholds for one dispatcher instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Flow arena capacity split.
    pub pools: PoolSizes,
    /// Number of buckets in the intrusive hash index.
    pub hash_table_size: usize,
    /// Direct-mapped lookup-cache slot count.
    pub cache_size: usize,
    /// Priority queue ring-buffer capacity.
    pub queue_capacity: usize,
    /// Direct-mapped prediction-cache slot count.
    pub prediction_cache_size: usize,
    /// TTL, in seconds, of a cached prediction.
    pub prediction_cache_ttl_secs: u64,
    /// Count-min sketch row count.
    pub sketch_depth: usize,
    /// Count-min sketch column count (must be a power of two).
    pub sketch_width: usize,
    /// Per-second burst-rate sample threshold.
    pub burst_threshold: u64,
    /// Minimum packets between aging cycles.
    pub aging_interval_packets: u64,
    /// Minimum seconds between aging cycles.
    pub aging_interval_secs: u64,
    /// Packets between ML adaptation passes.
    pub ml_adaptation_interval: u64,
    /// Packets between lifecycle (promote/demote/retire) passes.
    pub lifecycle_interval: u64,
    /// Number of arena slots touched by a single lifecycle pass.
    pub lifecycle_scan_limit: usize,
    /// Seed for the priority queue's drop-probability RNG.
    pub rng_seed: u64,
}

impl EngineConfig {
    /// Arena capacity, derived from the pool split.
    pub fn pool_capacity(&self) -> usize {
        self.pools.total()
    }

    /// Checks the invariants the rest of the engine assumes but doesn't
    /// re-verify: every mask-indexed table (hash index buckets, its lookup
    /// cache, the prediction cache, the count-min sketch's row width) must
    /// be a non-zero power of two, and the arena must have somewhere to put
    /// a flow.
    pub fn validate(&self) -> CoreResult<()> {
        if self.pool_capacity() == 0 {
            return Err(CoreError::ConfigError(
                "pool sizes must add up to at least one flow slot".into(),
            ));
        }
        for (name, value) in [
            ("hash_table_size", self.hash_table_size),
            ("cache_size", self.cache_size),
            ("prediction_cache_size", self.prediction_cache_size),
            ("sketch_width", self.sketch_width),
        ] {
            if value == 0 || !value.is_power_of_two() {
                return Err(CoreError::ConfigError(format!(
                    "{name} must be a non-zero power of two, got {value}"
                )));
            }
        }
        if self.sketch_depth == 0 {
            return Err(CoreError::ConfigError(
                "sketch_depth must be non-zero".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(CoreError::ConfigError(
                "queue_capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pools: PoolSizes::default(),
            hash_table_size: 65_536,
            cache_size: 8_192,
            queue_capacity: 64_000,
            prediction_cache_size: 1_024,
            prediction_cache_ttl_secs: 30,
            sketch_depth: 3,
            sketch_width: 4_096,
            burst_threshold: 100,
            aging_interval_packets: 25_000,
            aging_interval_secs: 30,
            ml_adaptation_interval: 50_000,
            lifecycle_interval: 100_000,
            lifecycle_scan_limit: 1_000,
            rng_seed: 0x5eed_1234_5eed_1234,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_totals_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.pool_capacity(), 51_500);
    }

    #[test]
    fn sketch_width_is_power_of_two() {
        let cfg = EngineConfig::default();
        assert!(cfg.sketch_width.is_power_of_two());
    }

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_pools_are_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.pools = PoolSizes {
            large: 0,
            bursty: 0,
            micro: 0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_power_of_two_table_size_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.hash_table_size = 1_000;
        assert!(cfg.validate().is_err());
    }
}
