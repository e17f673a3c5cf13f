//! Renders an [`EngineStats`] snapshot as the human-readable end-of-run
//! report: ML stats, then aging/lifecycle, then performance counters,
//! then path/flow-type distribution, then pattern analysis.

use std::fmt::Write as _;
use std::time::Duration;

use flowproc_core::{EngineStats, FlowType};

const TYPE_NAMES: [&str; 7] = [
    "Normal", "Large", "Bursty", "Micro", "Dying", "Promoted", "Suspected",
];

const PATH_NAMES: [&str; 6] = [
    "UltraFast",
    "Fast",
    "Accelerated",
    "Adaptive",
    "Slow",
    "DeepAnalysis",
];

/// Render the full report as a single string for printing or logging.
pub fn render(stats: &EngineStats, elapsed: Duration, dataset_ip_range: u32) -> String {
    let mut out = String::new();

    let pps = if elapsed.as_secs_f64() > 0.0 {
        stats.total_processed as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    let _ = writeln!(out, "=== DISPATCH RESULTS ===");
    let _ = writeln!(out, "Packets processed: {}", stats.total_processed);
    let _ = writeln!(out, "Elapsed: {:.3}s ({:.0} pkt/s)", elapsed.as_secs_f64(), pps);
    let _ = writeln!(out, "Dataset IP range: {dataset_ip_range}");

    let _ = writeln!(out, "\nML Model Performance:");
    let _ = writeln!(
        out,
        "  Validation Accuracy: {:.1}%",
        stats.validation_accuracy * 100.0
    );
    let _ = writeln!(out, "  Learning Rate: {:.6}", stats.learning_rate);
    let _ = writeln!(out, "  Total ML Predictions: {}", stats.ml_predictions);
    let cache_hit_rate = if stats.ml_predictions > 0 {
        100.0 * stats.ml_cache_hits as f64 / stats.ml_predictions as f64
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "  Prediction Cache Hit Rate: {:.1}% ({} hits)",
        cache_hit_rate, stats.ml_cache_hits
    );

    let _ = writeln!(out, "\nAging & Lifecycle Management:");
    let _ = writeln!(
        out,
        "  Memory Utilization: {:.1}% ({} / {} flows)",
        stats.memory_utilization * 100.0,
        stats.flows_created,
        stats.flow_pool_capacity
    );
    let _ = writeln!(out, "  Aging Pressure: {:.1}%", stats.aging_pressure * 100.0);
    let _ = writeln!(out, "  Flows Promoted: {}", stats.flows_promoted);
    let _ = writeln!(out, "  Flows Demoted: {}", stats.flows_demoted);
    let _ = writeln!(out, "  Flows Aged Out: {}", stats.flows_aged_out);
    let _ = writeln!(
        out,
        "  Current Burst Rate: {:.1} packets/sec",
        stats.current_burst_rate
    );

    let _ = writeln!(out, "\nPerformance Metrics:");
    let _ = writeln!(out, "  Ultra-fast Promotions: {}", stats.ultra_fast_promotions);
    let _ = writeln!(out, "  Confidence Updates: {}", stats.confidence_updates);
    let _ = writeln!(out, "  Pattern Updates: {}", stats.pattern_updates);
    let _ = writeln!(out, "  Cache Hits: {}", stats.cache_hits);
    let _ = writeln!(out, "  Cache Misses: {}", stats.cache_misses);
    let _ = writeln!(out, "  Hash Collisions: {}", stats.collision_count);
    let _ = writeln!(out, "  Arena Allocation Exhausted: {}", stats.allocation_exhausted);

    let _ = writeln!(out, "\nProcessing Path Distribution:");
    for (i, name) in PATH_NAMES.iter().enumerate() {
        let _ = writeln!(out, "  {name}: {}", stats.path_counts[i]);
    }

    let _ = writeln!(out, "\nFlow Type Distribution:");
    for (i, name) in TYPE_NAMES.iter().enumerate() {
        let count = stats.type_distribution[i];
        if count == 0 {
            continue;
        }
        let pct = 100.0 * count as f64 / stats.flows_created.max(1) as f64;
        let _ = writeln!(
            out,
            "  {name:<9}: {count:>5} flows ({pct:>4.1}%) | conf: {:>4.1} | ML: {:.3} | promo: {:>4.0}",
            stats.avg_confidence_by_type[i],
            stats.avg_ml_score_by_type[i],
            stats.avg_promotion_score_by_type[i],
        );
    }

    if stats.flows_with_patterns > 0 {
        let _ = writeln!(out, "\nPattern Analysis:");
        let _ = writeln!(
            out,
            "  Flows with Patterns: {} ({:.1}%)",
            stats.flows_with_patterns,
            100.0 * stats.flows_with_patterns as f64 / stats.flows_created.max(1) as f64
        );
        let _ = writeln!(
            out,
            "  Average Path Consistency: {:.3}",
            stats.average_path_consistency
        );
        let _ = writeln!(
            out,
            "  High Consistency Flows: {} ({:.1}%)",
            stats.high_consistency_flows,
            100.0 * stats.high_consistency_flows as f64 / stats.flows_with_patterns as f64
        );
        let _ = writeln!(out, "  Average Burst Score: {:.3}", stats.average_burst_score);
    }

    out
}

/// Index helper kept alongside the report so its table stays in lockstep
/// with [`flowproc_core::FlowType`]'s discriminant order.
pub fn type_name(ty: FlowType) -> &'static str {
    TYPE_NAMES[ty.code() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_every_section() {
        let stats = EngineStats {
            total_processed: 10,
            flows_created: 2,
            flow_pool_capacity: 100,
            cache_hits: 1,
            cache_misses: 1,
            collision_count: 0,
            validation_accuracy: 0.9,
            learning_rate: 0.002,
            ml_predictions: 5,
            ml_cache_hits: 1,
            memory_utilization: 0.02,
            aging_pressure: 0.3,
            flows_promoted: 0,
            flows_demoted: 0,
            flows_aged_out: 0,
            current_burst_rate: 0.0,
            ultra_fast_promotions: 0,
            confidence_updates: 1,
            pattern_updates: 10,
            allocation_exhausted: 0,
            path_counts: [0, 0, 10, 0, 0, 0],
            type_distribution: [2, 0, 0, 0, 0, 0, 0],
            avg_confidence_by_type: [42.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            avg_ml_score_by_type: [0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            avg_promotion_score_by_type: [120.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            flows_with_patterns: 1,
            high_consistency_flows: 1,
            average_path_consistency: 0.9,
            average_burst_score: 0.1,
        };
        let rendered = render(&stats, Duration::from_secs(1), 65536);
        assert!(rendered.contains("ML Model Performance"));
        assert!(rendered.contains("Aging & Lifecycle Management"));
        assert!(rendered.contains("Processing Path Distribution"));
        assert!(rendered.contains("Flow Type Distribution"));
        assert!(rendered.contains("Pattern Analysis"));
        assert!(rendered.contains("conf:"));
    }

    #[test]
    fn pattern_analysis_section_omitted_when_no_flow_has_enough_history() {
        let mut stats = base_stats();
        stats.flows_with_patterns = 0;
        let rendered = render(&stats, Duration::from_secs(1), 65536);
        assert!(!rendered.contains("Pattern Analysis"));
    }

    fn base_stats() -> EngineStats {
        EngineStats {
            total_processed: 10,
            flows_created: 2,
            flow_pool_capacity: 100,
            cache_hits: 1,
            cache_misses: 1,
            collision_count: 0,
            validation_accuracy: 0.9,
            learning_rate: 0.002,
            ml_predictions: 5,
            ml_cache_hits: 1,
            memory_utilization: 0.02,
            aging_pressure: 0.3,
            flows_promoted: 0,
            flows_demoted: 0,
            flows_aged_out: 0,
            current_burst_rate: 0.0,
            ultra_fast_promotions: 0,
            confidence_updates: 1,
            pattern_updates: 10,
            allocation_exhausted: 0,
            path_counts: [0, 0, 10, 0, 0, 0],
            type_distribution: [2, 0, 0, 0, 0, 0, 0],
            avg_confidence_by_type: [42.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            avg_ml_score_by_type: [0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            avg_promotion_score_by_type: [120.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            flows_with_patterns: 0,
            high_consistency_flows: 0,
            average_path_consistency: 0.0,
            average_burst_score: 0.0,
        }
    }
}
