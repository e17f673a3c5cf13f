//! Linear-plus-sigmoid flow scorer, and the direct-mapped cache that lets
//! established flows skip recomputing it on every packet.

use crate::flow::FlowEntry;
use crate::hash::fast_hash;
use crate::path::Path;

const FEATURE_COUNT: usize = 8;

/// Per-feature weights, bias, and adaptive learning rate for the scorer.
///
/// The learning rate is the only thing `adapt` ever changes: validation
/// feedback nudges how aggressively future tuning *would* move the model,
/// it does not perform gradient updates against the weights themselves.
/// The weights below were hand-tuned once and are carried as fixed
/// coefficients for the lifetime of a dispatcher instance.
#[derive(Debug, Clone)]
pub struct MlModel {
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    feature_mins: [f64; FEATURE_COUNT],
    feature_maxs: [f64; FEATURE_COUNT],
    pub learning_rate: f64,
    pub accuracy: f64,
    validation_samples: u64,
    validation_correct: u64,
    last_adaptation: u64,
    pub predictions_made: u64,
}

impl Default for MlModel {
    fn default() -> Self {
        Self {
            weights: [0.35, 0.20, 0.15, 0.10, 0.08, 0.05, 0.04, 0.03],
            bias: 0.2,
            feature_mins: [0.0; FEATURE_COUNT],
            feature_maxs: [100.0, 1000.0, 10000.0, 100.0, 100.0, 100.0, 100.0, 100.0],
            learning_rate: 0.002,
            accuracy: 0.0,
            validation_samples: 0,
            validation_correct: 0,
            last_adaptation: 0,
            predictions_made: 0,
        }
    }
}

impl MlModel {
    fn extract_features(&self, flow: &FlowEntry, now: u64) -> [f64; FEATURE_COUNT] {
        let time_diff = (now.saturating_sub(flow.last_seen) + 1) as f64;
        let cache_ratio = if flow.hits > 0 {
            flow.cache_hits as f64 / flow.hits as f64 * 100.0
        } else {
            0.0
        };
        [
            flow.confidence as f64,
            flow.hits as f64,
            flow.packet_count as f64,
            100.0 / time_diff,
            flow.pattern.path_consistency * 100.0,
            flow.pattern.burst_score * 100.0,
            cache_ratio,
            flow.flow_type.code() as f64 * 10.0,
        ]
    }

    fn normalize(&self, mut features: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        for i in 0..FEATURE_COUNT {
            let range = self.feature_maxs[i] - self.feature_mins[i];
            features[i] = if range > 1e-6 {
                (features[i] - self.feature_mins[i]) / range
            } else {
                0.5
            };
            features[i] = features[i].clamp(0.0, 1.0);
        }
        features
    }

    /// Sigmoid score in `(0, 1)` for how strongly a flow favors the fast
    /// paths. Pure function of the flow's current state; callers that want
    /// to avoid recomputing it on every packet should go through
    /// [`PredictionCache`] instead.
    pub fn predict(&mut self, flow: &FlowEntry, now: u64) -> f64 {
        let features = self.normalize(self.extract_features(flow, now));
        let mut z = self.bias;
        for i in 0..FEATURE_COUNT {
            z += self.weights[i] * features[i];
        }
        self.predictions_made += 1;
        1.0 / (1.0 + (-z).exp())
    }

    /// Record whether `path` agreed with what the model would have called
    /// "fast" for an established flow (`hits >= 5`).
    pub fn validate(&mut self, flow: &FlowEntry, path: Path, now: u64) {
        if flow.hits < 5 {
            return;
        }
        let prediction = self.predict(flow, now);
        let predicted_fast = prediction > 0.6;
        let actual_fast = path.is_fast();
        self.validation_samples += 1;
        if predicted_fast == actual_fast {
            self.validation_correct += 1;
        }
    }

    /// Retune the learning rate from accumulated validation feedback, if
    /// at least `interval` packets have passed since the last adaptation.
    pub fn adapt(&mut self, total_processed: u64, interval: u64) {
        if total_processed.saturating_sub(self.last_adaptation) < interval {
            return;
        }
        if self.validation_samples > 0 {
            self.accuracy = self.validation_correct as f64 / self.validation_samples as f64;
            if self.accuracy > 0.85 {
                self.learning_rate *= 0.98;
            } else if self.accuracy < 0.70 {
                self.learning_rate *= 1.05;
            }
            self.learning_rate = self.learning_rate.clamp(5e-4, 1e-2);
            self.validation_samples = 0;
            self.validation_correct = 0;
        }
        self.last_adaptation = total_processed;
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedPrediction {
    key: u32,
    prediction: f64,
    suggested_path: Path,
    timestamp: u64,
    confidence_level: u8,
}

/// Direct-mapped cache of recent predictions, keyed by flow key.
///
/// Entries expire after a fixed TTL rather than being explicitly
/// invalidated: a stale slot is simply overwritten the next time its
/// bucket is needed.
#[derive(Debug)]
pub struct PredictionCache {
    slots: Vec<Option<CachedPrediction>>,
    mask: u32,
    ttl_secs: u64,
    pub hits: u64,
}

impl PredictionCache {
    pub fn new(size: usize, ttl_secs: u64) -> Self {
        assert!(size.is_power_of_two());
        Self {
            slots: vec![None; size],
            mask: (size - 1) as u32,
            ttl_secs,
            hits: 0,
        }
    }

    fn slot_of(&self, key: u32) -> usize {
        (fast_hash(key) & self.mask) as usize
    }

    /// Look up a still-fresh prediction for `key`, if the cache holds one.
    pub fn get(&mut self, key: u32, now: u64) -> Option<(f64, Path)> {
        let slot = self.slot_of(key);
        match self.slots[slot] {
            Some(entry) if entry.key == key && now.saturating_sub(entry.timestamp) < self.ttl_secs => {
                self.hits += 1;
                Some((entry.prediction, entry.suggested_path))
            }
            _ => None,
        }
    }

    /// Cache `prediction`/`path` for `key` at time `now`.
    pub fn put(&mut self, key: u32, prediction: f64, path: Path, now: u64) {
        let slot = self.slot_of(key);
        self.slots[slot] = Some(CachedPrediction {
            key,
            prediction,
            suggested_path: path,
            timestamp: now,
            confidence_level: (prediction * 255.0) as u8,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowArena;

    #[test]
    fn prediction_stays_in_unit_interval() {
        let mut arena = FlowArena::new(1);
        let idx = arena.allocate(1, 0).unwrap();
        let mut model = MlModel::default();
        for _ in 0..50 {
            let p = model.predict(arena.get(idx), 100);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn higher_confidence_never_lowers_prediction() {
        let mut arena = FlowArena::new(1);
        let idx = arena.allocate(1, 0).unwrap();
        let mut model = MlModel::default();
        let low = model.predict(arena.get(idx), 100);
        arena.get_mut(idx).confidence = 90;
        let high = model.predict(arena.get(idx), 100);
        assert!(high >= low);
    }

    #[test]
    fn adapt_is_noop_before_interval_elapses() {
        let mut model = MlModel::default();
        let before = model.learning_rate;
        model.adapt(10, 50_000);
        assert_eq!(model.learning_rate, before);
    }

    #[test]
    fn prediction_cache_expires_after_ttl() {
        let mut cache = PredictionCache::new(1024, 30);
        cache.put(7, 0.9, Path::UltraFast, 0);
        assert!(cache.get(7, 10).is_some());
        assert!(cache.get(7, 31).is_none());
    }
}
