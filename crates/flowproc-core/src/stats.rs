//! A point-in-time snapshot of engine state, suitable for reporting.

use flowproc_common::Clock;

use crate::dispatcher::{Engine, PathWork};
use crate::path::Path;

/// Everything a caller needs to render an end-of-run report, collected in
/// one pass over the engine so the reporting layer never has to reach back
/// into the engine's internals.
///
/// Collection scores every live flow through the predictor to report its
/// per-type mean ML score, the same thing the reference implementation's
/// statistics printer does; this nudges `ml_predictions` up by one per
/// flow, matching that implementation rather than trying to report a
/// "pure" count that excludes its own measurement.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub total_processed: u64,
    pub flows_created: usize,
    pub flow_pool_capacity: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub collision_count: u64,
    pub validation_accuracy: f64,
    pub learning_rate: f64,
    pub ml_predictions: u64,
    pub ml_cache_hits: u64,
    pub memory_utilization: f64,
    pub aging_pressure: f64,
    pub flows_promoted: u64,
    pub flows_demoted: u64,
    pub flows_aged_out: u64,
    pub current_burst_rate: f64,
    pub ultra_fast_promotions: u64,
    pub confidence_updates: u64,
    pub pattern_updates: u64,
    pub allocation_exhausted: u64,
    pub path_counts: [u64; 6],
    pub type_distribution: [usize; 7],
    pub avg_confidence_by_type: [f64; 7],
    pub avg_ml_score_by_type: [f64; 7],
    pub avg_promotion_score_by_type: [f64; 7],
    pub flows_with_patterns: usize,
    pub high_consistency_flows: usize,
    pub average_path_consistency: f64,
    pub average_burst_score: f64,
}

impl EngineStats {
    pub fn collect<C: Clock, W: PathWork>(engine: &mut Engine<C, W>) -> Self {
        let now = engine.now();

        let mut type_distribution = [0usize; 7];
        let mut avg_confidence_by_type = [0f64; 7];
        let mut avg_ml_score_by_type = [0f64; 7];
        let mut avg_promotion_score_by_type = [0f64; 7];
        let mut flows_with_patterns = 0usize;
        let mut high_consistency_flows = 0usize;
        let mut total_path_consistency = 0.0f64;
        let mut total_burst_score = 0.0f64;

        let flow_count = engine.arena().len();
        for idx in 0..flow_count as u32 {
            let flow = engine.arena().get(idx).clone();
            let ty = flow.flow_type.code() as usize;
            type_distribution[ty] += 1;
            avg_confidence_by_type[ty] += flow.confidence as f64;
            avg_promotion_score_by_type[ty] += flow.promotion_score as f64;

            let has_pattern = flow.pattern.history_filled() || flow.pattern.history_len() >= 4;
            if has_pattern {
                total_path_consistency += flow.pattern.path_consistency;
                total_burst_score += flow.pattern.burst_score;
                flows_with_patterns += 1;
                if flow.pattern.path_consistency > 0.8 {
                    high_consistency_flows += 1;
                }
            }

            let score = engine.model_mut().predict(&flow, now);
            avg_ml_score_by_type[ty] += score;
        }
        for ty in 0..7 {
            if type_distribution[ty] > 0 {
                let n = type_distribution[ty] as f64;
                avg_confidence_by_type[ty] /= n;
                avg_ml_score_by_type[ty] /= n;
                avg_promotion_score_by_type[ty] /= n;
            }
        }
        let (average_path_consistency, average_burst_score) = if flows_with_patterns > 0 {
            (
                total_path_consistency / flows_with_patterns as f64,
                total_burst_score / flows_with_patterns as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let mut path_counts = [0u64; 6];
        for path in Path::ALL {
            path_counts[path.code() as usize] = engine.path_counts.get(path);
        }

        let index = engine.hash_index();
        let aging = engine.aging_manager();
        let model = engine.model();

        Self {
            total_processed: engine.counters.total_processed,
            flows_created: engine.arena().len(),
            flow_pool_capacity: engine.arena().capacity(),
            cache_hits: index.stats.cache_hits,
            cache_misses: index.stats.cache_misses,
            collision_count: index.stats.collision_count,
            validation_accuracy: model.accuracy,
            learning_rate: model.learning_rate,
            ml_predictions: model.predictions_made,
            ml_cache_hits: engine.prediction_cache().hits,
            memory_utilization: aging.memory_utilization,
            aging_pressure: aging.aging_pressure,
            flows_promoted: aging.stats.flows_promoted,
            flows_demoted: aging.stats.flows_demoted,
            flows_aged_out: aging.stats.flows_aged_out,
            current_burst_rate: aging.current_burst_rate(),
            ultra_fast_promotions: engine.counters.ultra_fast_promotions,
            confidence_updates: engine.counters.confidence_updates,
            pattern_updates: engine.counters.pattern_updates,
            allocation_exhausted: engine.counters.allocation_exhausted,
            path_counts,
            type_distribution,
            avg_confidence_by_type,
            avg_ml_score_by_type,
            avg_promotion_score_by_type,
            flows_with_patterns,
            high_consistency_flows,
            average_path_consistency,
            average_burst_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::dispatcher::NullWork;
    use flowproc_common::ManualClock;

    #[test]
    fn snapshot_reflects_processed_packets() {
        let mut engine = Engine::new(EngineConfig::default(), ManualClock::new(1_000), NullWork);
        engine.process_packet(1);
        engine.process_packet(1);
        engine.process_packet(2);

        let snapshot = EngineStats::collect(&mut engine);
        assert_eq!(snapshot.total_processed, 3);
        assert_eq!(snapshot.flows_created, 2);
        assert_eq!(snapshot.path_counts.iter().sum::<u64>(), 3);
    }
}
