//! Wires every component together and implements the per-packet dispatch
//! protocol.

use flowproc_common::Clock;

use crate::aging::AgingManager;
use crate::config::EngineConfig;
use crate::error::CoreResult;
use crate::flow::{AgingStrategy, FlowArena, FlowKey, FlowType};
use crate::hash_index::HashIndex;
use crate::path::Path;
use crate::predictor::{MlModel, PredictionCache};
use crate::queue::PriorityQueue;
use crate::sketch::CountMinSketch;

/// Confidence a flow is bumped to when fast-tracked by a burst promotion.
pub(crate) const CONFIDENCE_FAST_TRACK: u16 = 60;
/// Confidence a flow is bumped to when promoted all the way to ultra-fast.
pub(crate) const CONFIDENCE_ULTRA_FAST: u16 = 85;

/// Work to perform for a packet dispatched to a given path.
///
/// The dispatcher only needs to know "do the path's work"; what that work
/// actually is belongs to the caller (packet forwarding, a benchmark
/// workload, a no-op for tests). Swapping implementations never touches
/// classification logic.
pub trait PathWork {
    fn run(&mut self, key: FlowKey, path: Path);
}

/// No-op executor, useful for tests that only care about path selection.
#[derive(Debug, Default)]
pub struct NullWork;

impl PathWork for NullWork {
    fn run(&mut self, _key: FlowKey, _path: Path) {}
}

/// Running per-path dispatch counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathCounts {
    counts: [u64; 6],
}

impl PathCounts {
    pub fn record(&mut self, path: Path) {
        self.counts[path.code() as usize] += 1;
    }

    pub fn get(&self, path: Path) -> u64 {
        self.counts[path.code() as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Engine-wide counters not already owned by a sub-component.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchCounters {
    pub total_processed: u64,
    pub ultra_fast_promotions: u64,
    pub confidence_updates: u64,
    pub pattern_updates: u64,
    /// Packets for which the arena was already full and a flow could not
    /// be created. A counted degraded mode, not a propagated error.
    pub allocation_exhausted: u64,
}

/// The full packet-classification engine: arena, hash index, sketch,
/// predictor, aging manager, and queue, wired together by
/// [`Engine::process_packet`].
pub struct Engine<C: Clock, W: PathWork> {
    config: EngineConfig,
    clock: C,
    work: W,
    sketch: CountMinSketch,
    arena: FlowArena,
    index: HashIndex,
    model: MlModel,
    prediction_cache: PredictionCache,
    aging: AgingManager,
    queue: PriorityQueue<FlowKey>,
    pub path_counts: PathCounts,
    pub counters: DispatchCounters,
}

impl<C: Clock, W: PathWork> Engine<C, W> {
    /// Builds an engine, validating `config` first.
    ///
    /// # Panics
    /// Panics if `config` is invalid. Use [`Engine::try_new`] to handle
    /// an invalid configuration without panicking.
    pub fn new(config: EngineConfig, clock: C, work: W) -> Self {
        Self::try_new(config, clock, work).expect("invalid engine configuration")
    }

    /// Builds an engine, returning an error instead of panicking if
    /// `config` fails [`EngineConfig::validate`].
    pub fn try_new(config: EngineConfig, clock: C, work: W) -> CoreResult<Self> {
        config.validate()?;

        let sketch = CountMinSketch::new(config.sketch_depth, config.sketch_width);
        let arena = FlowArena::new(config.pool_capacity());
        let index = HashIndex::new(config.hash_table_size, config.cache_size);
        let prediction_cache =
            PredictionCache::new(config.prediction_cache_size, config.prediction_cache_ttl_secs);
        let aging = AgingManager::new(config.aging_interval_secs);
        let queue = PriorityQueue::new(config.queue_capacity, config.rng_seed);

        Ok(Self {
            config,
            clock,
            work,
            sketch,
            arena,
            index,
            model: MlModel::default(),
            prediction_cache,
            aging,
            queue,
            path_counts: PathCounts::default(),
            counters: DispatchCounters::default(),
        })
    }

    pub fn arena(&self) -> &FlowArena {
        &self.arena
    }

    pub fn hash_index(&self) -> &HashIndex {
        &self.index
    }

    pub fn aging_manager(&self) -> &AgingManager {
        &self.aging
    }

    pub fn model(&self) -> &MlModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut MlModel {
        &mut self.model
    }

    pub fn prediction_cache(&self) -> &PredictionCache {
        &self.prediction_cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Current count-min estimate for `key`, independent of whether it has
    /// ever been allocated a flow.
    pub fn sketch_estimate(&self, key: FlowKey) -> u32 {
        self.sketch.estimate(key)
    }

    /// Pre-populate a known flow with the "already established" state
    /// used for the dataset's known-key warm start.
    pub fn prepopulate_known(&mut self, key: FlowKey) {
        let now = self.clock.now();
        if self.index.lookup(key, &mut self.arena).is_some() {
            return;
        }
        let Some(idx) = self.arena.allocate(key, now) else {
            return;
        };
        let prev = self.index.insert(key, idx);
        let flow = self.arena.get_mut(idx);
        flow.next = prev;
        flow.confidence = 75;
        flow.hits = 12;
        flow.packet_count = 15;
        flow.flow_type = FlowType::Large;
        flow.previous_type = FlowType::Large;
        flow.aging.aging_strategy = AgingStrategy::Adaptive;
        flow.promotion_score = 800;
        flow.pattern.path_consistency = 0.85;
        flow.pattern.burst_score = 0.15;
        flow.pattern.consecutive_fast_paths = 5;
    }

    /// Enqueue `key` for processing, applying the queue's overflow and
    /// load-shedding policy rather than dispatching inline.
    pub fn enqueue(&mut self, key: FlowKey, priority: u8) -> bool {
        if self.queue.should_drop_incoming() {
            return false;
        }
        self.queue.enqueue(key, priority);
        true
    }

    /// Drain and process the single most urgent queued packet, if any.
    pub fn process_queued(&mut self) -> bool {
        match self.queue.dequeue_highest_priority() {
            Some(key) => {
                self.process_packet(key);
                true
            }
            None => false,
        }
    }

    /// Run the full dispatch protocol for one packet with key `key`.
    pub fn process_packet(&mut self, key: FlowKey) {
        let now = self.clock.now();

        self.sketch.update(key);

        let existing = self.index.lookup(key, &mut self.arena);
        let flow_idx = match existing {
            Some(idx) => idx,
            None => match self.arena.allocate(key, now) {
                Some(idx) => {
                    let prev = self.index.insert(key, idx);
                    self.arena.get_mut(idx).next = prev;
                    self.work.run(key, Path::Accelerated);
                    self.path_counts.record(Path::Accelerated);
                    self.arena.get_mut(idx).pattern.record(Path::Accelerated);
                    self.counters.pattern_updates += 1;
                    self.finish_packet(now);
                    return;
                }
                None => {
                    // Arena exhausted: no flow to track, but the packet
                    // still takes a path based on what the sketch alone
                    // can tell us.
                    self.counters.allocation_exhausted += 1;
                    let estimate = self.sketch.estimate(key);
                    let path = if estimate > 8 { Path::Accelerated } else { Path::Slow };
                    self.work.run(key, path);
                    self.path_counts.record(path);
                    self.finish_packet(now);
                    return;
                }
            },
        };

        self.maybe_promote_burst(flow_idx, now);

        let path = self.select_path(key, flow_idx, now);

        self.execute(key, path, flow_idx, now);

        self.arena.get_mut(flow_idx).pattern.record(path);
        self.counters.pattern_updates += 1;
        self.model.validate(self.arena.get(flow_idx), path, now);

        self.post_update(flow_idx, path, now);
        self.finish_packet(now);
    }

    fn maybe_promote_burst(&mut self, flow_idx: u32, now: u64) {
        if !self
            .aging
            .detect_burst(self.counters.total_processed, now, self.config.burst_threshold)
        {
            return;
        }

        let ml_score = self.model.predict(self.arena.get(flow_idx), now);
        let flow = self.arena.get_mut(flow_idx);

        if ml_score > 0.75 && flow.pattern.consecutive_fast_paths >= 3 {
            if flow.confidence < CONFIDENCE_ULTRA_FAST {
                flow.confidence = CONFIDENCE_ULTRA_FAST;
                flow.previous_type = flow.flow_type;
                flow.flow_type = FlowType::Promoted;
                flow.pattern.recent_promotions += 1;
                self.counters.ultra_fast_promotions += 1;
            }
        } else if ml_score > 0.55 && flow.pattern.consecutive_fast_paths >= 2 && flow.confidence < CONFIDENCE_FAST_TRACK {
            flow.confidence = CONFIDENCE_FAST_TRACK;
            flow.flow_type = FlowType::Bursty;
        }
    }

    fn select_path(&mut self, key: FlowKey, flow_idx: u32, now: u64) -> Path {
        let hits = self.arena.get(flow_idx).hits;

        if hits > 2 {
            if let Some((_, cached_path)) = self.prediction_cache.get(key, now) {
                return cached_path;
            }
        }

        if hits == 1 {
            return Path::Accelerated;
        }

        let prediction = self.model.predict(self.arena.get(flow_idx), now);
        let confidence = self.arena.get(flow_idx).confidence;
        let consecutive_fast = self.arena.get(flow_idx).pattern.consecutive_fast_paths;

        let path = if confidence >= CONFIDENCE_ULTRA_FAST && prediction > 0.7 {
            Path::UltraFast
        } else if confidence >= CONFIDENCE_FAST_TRACK && prediction > 0.5 {
            Path::Fast
        } else if prediction > 0.6 || consecutive_fast >= 3 {
            Path::Adaptive
        } else {
            Path::Accelerated
        };

        if hits > 2 {
            self.prediction_cache.put(key, prediction, path, now);
        }

        path
    }

    fn execute(&mut self, key: FlowKey, path: Path, flow_idx: u32, now: u64) {
        self.path_counts.record(path);
        match path {
            Path::Adaptive => {
                let prediction = self.model.predict(self.arena.get(flow_idx), now);
                if prediction > 0.75 {
                    self.work.run(key, Path::Fast);
                } else {
                    self.work.run(key, Path::Accelerated);
                }
            }
            other => self.work.run(key, other),
        }
    }

    fn post_update(&mut self, flow_idx: u32, path: Path, now: u64) {
        {
            let flow = self.arena.get_mut(flow_idx);
            flow.hits += 1;
            flow.packet_count += 1;
            flow.last_seen = now;
            flow.aging.last_access_time = now;
            flow.aging.total_accesses += 1;
        }

        if self.arena.get(flow_idx).hits % 4 == 0 && self.arena.get(flow_idx).confidence < 100 {
            let ml_score = self.model.predict(self.arena.get(flow_idx), now);
            let base_boost = 4u16;
            let ml_boost = (ml_score * 6.0) as u16;
            let flow = self.arena.get_mut(flow_idx);
            flow.confidence = (flow.confidence + base_boost + ml_boost).min(100);
            self.counters.confidence_updates += 1;
        }

        let flow = self.arena.get_mut(flow_idx);
        if flow.packet_count > 800 && flow.flow_type != FlowType::Large {
            flow.previous_type = flow.flow_type;
            flow.flow_type = FlowType::Large;
            flow.aging.aging_strategy = AgingStrategy::Adaptive;
        } else if flow.pattern.burst_score > 0.6 && flow.hits > 10 {
            if flow.flow_type != FlowType::Bursty && flow.flow_type != FlowType::Promoted {
                flow.previous_type = flow.flow_type;
                flow.flow_type = FlowType::Bursty;
                flow.aging.aging_strategy = AgingStrategy::Linear;
            }
        } else if flow.packet_count < 10 && flow.hits < 5 {
            flow.flow_type = FlowType::Micro;
            flow.aging.aging_strategy = AgingStrategy::Aggressive;
        }

        if flow.pattern.history_filled() && flow.pattern.path_consistency < 0.3 {
            if flow.flow_type != FlowType::Suspected && flow.hits > 8 {
                flow.previous_type = flow.flow_type;
                flow.flow_type = FlowType::Suspected;
            }
        }

        if path.is_fast() {
            flow.promotion_score = if flow.promotion_score < 950 {
                flow.promotion_score + 10
            } else {
                1000
            };
        } else if path.is_slow_or_worse() {
            flow.promotion_score = if flow.promotion_score > 50 {
                flow.promotion_score - 5
            } else {
                0
            };
        }
    }

    fn finish_packet(&mut self, now: u64) {
        self.counters.total_processed += 1;

        if self.counters.total_processed % self.config.aging_interval_packets == 0 {
            self.aging.maybe_run_cycle(&mut self.arena, &mut self.model, now);
        }

        if self.counters.total_processed % self.config.ml_adaptation_interval == 0 {
            self.model.adapt(self.counters.total_processed, self.config.ml_adaptation_interval);
        }

        if self.counters.total_processed % self.config.lifecycle_interval == 0 {
            self.aging.run_lifecycle_pass(
                &mut self.arena,
                &mut self.model,
                now,
                self.config.lifecycle_scan_limit,
            );
        }
    }
}
