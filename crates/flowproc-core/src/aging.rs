//! Confidence decay, burst detection, and the promote/demote/retire
//! lifecycle pass.

use crate::flow::{AgingStrategy, FlowArena, FlowType};
use crate::predictor::MlModel;

const BURST_WINDOW_SIZE: usize = 100;

/// Decay `confidence` under `strategy`, given how long the flow has been
/// idle and (for [`AgingStrategy::Adaptive`]) its current predictor score.
///
/// Each strategy's thresholds and rates are fixed constants rather than
/// config, matching the fixed behavioral contract a flow signed up for
/// when it was assigned that strategy.
fn apply_strategy(confidence: u16, strategy: AgingStrategy, idle_secs: u64, ml_score: f64) -> u16 {
    let idle = idle_secs as f64;
    match strategy {
        AgingStrategy::Linear => {
            if idle > 180.0 {
                confidence.saturating_sub(3)
            } else {
                confidence
            }
        }
        AgingStrategy::Exponential => {
            if idle > 60.0 {
                let decay = (1.0 - idle / 600.0).max(0.1);
                (confidence as f64 * decay) as u16
            } else {
                confidence
            }
        }
        AgingStrategy::Adaptive => {
            let protection = ml_score * 0.8;
            let decay = (idle / 1200.0) * (1.0 - protection);
            (confidence as f64 * (1.0 - decay)) as u16
        }
        AgingStrategy::Aggressive => {
            if idle > 90.0 {
                confidence.saturating_sub(8)
            } else {
                confidence
            }
        }
    }
}

/// Confidence below which a flow is reclassified as [`FlowType::Dying`].
const DYING_THRESHOLD: u16 = 10;
/// Seconds a `Dying` flow must stay idle before it is fully retired.
const RETIREMENT_IDLE_SECS: u64 = 900;
/// Seconds a `Promoted` flow may idle before it is reconsidered for demotion.
const PROMOTED_IDLE_SECS: u64 = 300;

#[derive(Debug, Default, Clone, Copy)]
pub struct AgingStats {
    pub flows_promoted: u64,
    pub flows_demoted: u64,
    pub flows_aged_out: u64,
}

/// Tracks memory pressure, burst rate, and drives periodic aging and
/// lifecycle passes over the flow arena.
#[derive(Debug)]
pub struct AgingManager {
    burst_history: [u64; BURST_WINDOW_SIZE],
    burst_index: usize,
    current_burst_rate: f64,
    last_packet_count: u64,
    last_check_secs: Option<u64>,
    pub memory_utilization: f64,
    pub aging_pressure: f64,
    last_aging_cycle: Option<u64>,
    aging_cycle_secs: u64,
    /// Persisted round-robin cursor into the arena for the 10% aging
    /// slice each cycle, rather than re-deriving a position from
    /// `total_processed` every time.
    aging_cursor: usize,
    pub stats: AgingStats,
}

impl AgingManager {
    pub fn new(aging_cycle_secs: u64) -> Self {
        Self {
            burst_history: [0; BURST_WINDOW_SIZE],
            burst_index: 0,
            current_burst_rate: 0.0,
            last_packet_count: 0,
            last_check_secs: None,
            memory_utilization: 0.0,
            aging_pressure: 0.3,
            last_aging_cycle: None,
            aging_cycle_secs,
            aging_cursor: 0,
            stats: AgingStats::default(),
        }
    }

    pub fn current_burst_rate(&self) -> f64 {
        self.current_burst_rate
    }

    /// Sample the packet rate once per wall-clock second and report
    /// whether this second's rate counts as a burst.
    pub fn detect_burst(&mut self, total_processed: u64, now_secs: u64, burst_threshold: u64) -> bool {
        if self.last_check_secs == Some(now_secs) {
            return false;
        }

        let packets_this_second = total_processed.saturating_sub(self.last_packet_count);
        self.burst_history[self.burst_index] = packets_this_second;
        self.burst_index = (self.burst_index + 1) % BURST_WINDOW_SIZE;

        let total: u64 = self.burst_history.iter().sum();
        self.current_burst_rate = total as f64 / BURST_WINDOW_SIZE as f64;

        self.last_packet_count = total_processed;
        self.last_check_secs = Some(now_secs);

        packets_this_second as f64 > self.current_burst_rate * 2.0
            && packets_this_second > burst_threshold
    }

    /// Run one aging cycle if at least `aging_cycle_secs` have passed
    /// since the last one: refresh memory pressure, decay a rotating 10%
    /// slice of the arena, and demote any flow whose confidence dropped
    /// below [`DYING_THRESHOLD`].
    pub fn maybe_run_cycle(&mut self, arena: &mut FlowArena, model: &mut MlModel, now_secs: u64) {
        if let Some(last) = self.last_aging_cycle {
            if now_secs.saturating_sub(last) < self.aging_cycle_secs {
                return;
            }
        }

        let pool_index = arena.len();
        let pool_size = arena.capacity();
        self.memory_utilization = if pool_size > 0 {
            pool_index as f64 / pool_size as f64
        } else {
            0.0
        };
        self.aging_pressure = if self.memory_utilization > 0.85 {
            0.9
        } else if self.memory_utilization > 0.70 {
            0.6
        } else {
            0.3
        };

        // Round up to at least one flow per cycle: truncating 10% of a
        // small pool to zero would make the aging cycle a permanent no-op
        // for any arena under ten live flows.
        let flows_to_age = if pool_index == 0 {
            0
        } else {
            ((pool_index as f64 * 0.1) as usize).max(1)
        };
        for _ in 0..flows_to_age.min(pool_index) {
            let idx = self.aging_cursor as u32;
            self.aging_cursor = (self.aging_cursor + 1) % pool_index.max(1);

            let ml_score = model.predict(arena.get(idx), now_secs);
            let flow = arena.get_mut(idx);
            let idle = flow.idle_for(now_secs);
            flow.confidence = apply_strategy(flow.confidence, flow.aging.aging_strategy, idle, ml_score);

            if flow.confidence < DYING_THRESHOLD && flow.flow_type != FlowType::Dying {
                flow.previous_type = flow.flow_type;
                flow.flow_type = FlowType::Dying;
                self.stats.flows_demoted += 1;
            }
        }

        self.last_aging_cycle = Some(now_secs);
    }

    /// Promote, demote, and retire flows over the first `scan_limit` arena
    /// slots. Scope is intentionally bounded: scanning the whole arena on
    /// every lifecycle pass would undo the point of keeping it cheap.
    pub fn run_lifecycle_pass(&mut self, arena: &mut FlowArena, model: &mut MlModel, now_secs: u64, scan_limit: usize) {
        let limit = scan_limit.min(arena.len());
        for idx in 0..limit as u32 {
            let ml_score = model.predict(arena.get(idx), now_secs);
            let flow = arena.get_mut(idx);
            let idle = flow.idle_for(now_secs);

            if flow.flow_type == FlowType::Normal
                && ml_score > 0.75
                && flow.promotion_score > 700
                && flow.hits > 8
            {
                flow.previous_type = flow.flow_type;
                flow.flow_type = FlowType::Promoted;
                flow.confidence = crate::dispatcher::CONFIDENCE_FAST_TRACK;
                self.stats.flows_promoted += 1;
            }

            if flow.flow_type == FlowType::Promoted
                && (ml_score < 0.4 || idle > PROMOTED_IDLE_SECS || flow.promotion_score < 200)
            {
                flow.flow_type = flow.previous_type;
                flow.confidence = if flow.confidence > 15 { flow.confidence - 15 } else { 10 };
                self.stats.flows_demoted += 1;
            }

            if flow.flow_type == FlowType::Dying && idle > RETIREMENT_IDLE_SECS {
                flow.confidence = 0;
                self.stats.flows_aged_out += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_decay_only_after_threshold() {
        assert_eq!(apply_strategy(50, AgingStrategy::Linear, 10, 0.0), 50);
        assert_eq!(apply_strategy(50, AgingStrategy::Linear, 181, 0.0), 47);
    }

    #[test]
    fn linear_decay_floors_at_zero() {
        assert_eq!(apply_strategy(2, AgingStrategy::Linear, 200, 0.0), 0);
    }

    #[test]
    fn aggressive_decay_is_steeper_than_linear() {
        let linear = apply_strategy(50, AgingStrategy::Linear, 300, 0.0);
        let aggressive = apply_strategy(50, AgingStrategy::Aggressive, 300, 0.0);
        assert!(aggressive < linear);
    }

    #[test]
    fn adaptive_decay_protects_high_scoring_flows() {
        let protected = apply_strategy(80, AgingStrategy::Adaptive, 1200, 1.0);
        let unprotected = apply_strategy(80, AgingStrategy::Adaptive, 1200, 0.0);
        assert!(protected > unprotected);
    }

    #[test]
    fn burst_not_detected_twice_in_same_second() {
        let mut manager = AgingManager::new(30);
        assert!(!manager.detect_burst(0, 1_000, 100));
        let first = manager.detect_burst(500, 1_000, 100);
        assert!(!first);
    }

    #[test]
    fn aging_cycle_respects_minimum_interval() {
        let mut arena = FlowArena::new(4);
        arena.allocate(1, 0);
        let mut model = MlModel::default();
        let mut manager = AgingManager::new(30);
        manager.maybe_run_cycle(&mut arena, &mut model, 0);
        let pressure_after_first = manager.aging_pressure;
        manager.memory_utilization = -1.0; // sentinel to detect a second run
        manager.maybe_run_cycle(&mut arena, &mut model, 5);
        assert_eq!(manager.memory_utilization, -1.0);
        let _ = pressure_after_first;
    }
}
