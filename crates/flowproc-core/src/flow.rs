//! Flow state: per-key classification, pattern history, and the arena that
//! owns every flow entry.

use crate::path::Path;

/// A flow's key. Packets are keyed by a single `u32` (e.g. a packed source
/// address); nothing in the dispatcher interprets its bits.
pub type FlowKey = u32;

/// A flow's current behavioral classification.
///
/// Discriminant order doubles as the numeric feature fed to the predictor
/// (feature `f7`), so reordering these changes predictor behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowType {
    #[default]
    Normal,
    Large,
    Bursty,
    Micro,
    Dying,
    Promoted,
    Suspected,
}

impl FlowType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Confidence decay strategy applied to a flow during an aging cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgingStrategy {
    #[default]
    Exponential,
    Linear,
    Adaptive,
    Aggressive,
}

/// Last `HISTORY` processing-path decisions for one flow, plus the
/// derived statistics the predictor and classifier read back.
const HISTORY: usize = 8;

#[derive(Debug, Clone)]
pub struct Pattern {
    history: [Path; HISTORY],
    index: usize,
    filled: bool,
    pub path_consistency: f64,
    pub burst_score: f64,
    pub consecutive_fast_paths: u32,
    pub recent_promotions: u32,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            history: [Path::UltraFast; HISTORY],
            index: 0,
            filled: false,
            path_consistency: 1.0,
            burst_score: 0.0,
            consecutive_fast_paths: 0,
            recent_promotions: 0,
        }
    }
}

impl Pattern {
    /// Record that `path` was chosen for the latest packet on this flow.
    pub fn record(&mut self, path: Path) {
        self.history[self.index] = path;
        self.index = (self.index + 1) % HISTORY;
        if !self.filled && self.index == 0 {
            self.filled = true;
        }

        let size = if self.filled { HISTORY } else { self.index };
        if self.filled || size >= 4 {
            self.path_consistency = modal_fraction(&self.history[..size]);
        }

        if path.is_fast() {
            self.consecutive_fast_paths += 1;
        } else {
            self.consecutive_fast_paths = 0;
        }

        if self.filled {
            let transitions = (1..HISTORY)
                .filter(|&i| self.history[i] != self.history[i - 1])
                .count();
            self.burst_score = transitions as f64 / (HISTORY - 1) as f64;
        }
    }

    pub fn history_filled(&self) -> bool {
        self.filled
    }

    pub fn history_len(&self) -> usize {
        if self.filled {
            HISTORY
        } else {
            self.index
        }
    }
}

/// Fraction of `window` occupied by its single most frequent element.
fn modal_fraction(window: &[Path]) -> f64 {
    let mut best = 0usize;
    for i in 0..window.len() {
        let count = window.iter().filter(|&&p| p == window[i]).count();
        best = best.max(count);
    }
    best as f64 / window.len() as f64
}

/// Per-flow aging bookkeeping.
#[derive(Debug, Clone)]
pub struct AgingInfo {
    pub creation_time: u64,
    pub last_access_time: u64,
    pub aging_strategy: AgingStrategy,
    pub aging_multiplier: f64,
    pub total_accesses: u64,
}

impl Default for AgingInfo {
    fn default() -> Self {
        Self {
            creation_time: 0,
            last_access_time: 0,
            aging_strategy: AgingStrategy::Exponential,
            aging_multiplier: 1.0,
            total_accesses: 0,
        }
    }
}

/// Starting confidence given to a freshly created flow.
pub const INITIAL_CONFIDENCE: u16 = 35;
/// Starting promotion score given to a freshly created flow.
pub const INITIAL_PROMOTION_SCORE: u32 = 100;

/// One flow's full state, as stored in the arena.
///
/// `next` is an arena index, not a pointer: entries never move once
/// created, so a `u32` index into the same `Vec` is as stable as a
/// pointer would be and needs no unsafe code or lifetime plumbing.
#[derive(Debug, Clone)]
pub struct FlowEntry {
    pub key: FlowKey,
    pub confidence: u16,
    pub hits: u64,
    pub packet_count: u64,
    pub first_seen: u64,
    pub last_seen: u64,
    pub flow_type: FlowType,
    pub previous_type: FlowType,
    pub pattern: Pattern,
    pub aging: AgingInfo,
    pub cache_hits: u64,
    pub promotion_score: u32,
    pub next: Option<u32>,
}

impl FlowEntry {
    fn new(key: FlowKey, now: u64) -> Self {
        Self {
            key,
            confidence: INITIAL_CONFIDENCE,
            hits: 1,
            packet_count: 1,
            first_seen: now,
            last_seen: now,
            flow_type: FlowType::Normal,
            previous_type: FlowType::Normal,
            pattern: Pattern {
                path_consistency: 1.0,
                burst_score: 0.0,
                ..Pattern::default()
            },
            aging: AgingInfo {
                creation_time: now,
                last_access_time: now,
                aging_strategy: AgingStrategy::Exponential,
                aging_multiplier: 1.0,
                total_accesses: 1,
            },
            cache_hits: 0,
            promotion_score: INITIAL_PROMOTION_SCORE,
            next: None,
        }
    }

    pub fn idle_for(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen)
    }
}

/// Bump-allocated, fixed-capacity store of flow entries.
///
/// Entries are appended and never removed or relocated: "retiring" a flow
/// means marking it `FlowType::Dying` with confidence zero, not freeing
/// its slot, matching the single-process, run-to-completion lifetime of
/// the dispatcher this models.
#[derive(Debug)]
pub struct FlowArena {
    entries: Vec<FlowEntry>,
    capacity: usize,
}

impl FlowArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn get(&self, idx: u32) -> &FlowEntry {
        &self.entries[idx as usize]
    }

    pub fn get_mut(&mut self, idx: u32) -> &mut FlowEntry {
        &mut self.entries[idx as usize]
    }

    /// Allocate a new entry for `key`, returning its arena index.
    ///
    /// Returns `None` if the arena is at capacity; the caller (the
    /// dispatcher) falls back to sketch-only handling in that case.
    pub fn allocate(&mut self, key: FlowKey, now: u64) -> Option<u32> {
        if self.is_full() {
            return None;
        }
        let idx = self.entries.len() as u32;
        self.entries.push(FlowEntry::new(key, now));
        Some(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &FlowEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i as u32, e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut FlowEntry)> {
        self.entries
            .iter_mut()
            .enumerate()
            .map(|(i, e)| (i as u32, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_respects_capacity() {
        let mut arena = FlowArena::new(2);
        assert!(arena.allocate(1, 0).is_some());
        assert!(arena.allocate(2, 0).is_some());
        assert!(arena.allocate(3, 0).is_none());
        assert!(arena.is_full());
    }

    #[test]
    fn new_entry_has_documented_defaults() {
        let mut arena = FlowArena::new(1);
        let idx = arena.allocate(42, 100).unwrap();
        let flow = arena.get(idx);
        assert_eq!(flow.confidence, INITIAL_CONFIDENCE);
        assert_eq!(flow.hits, 1);
        assert_eq!(flow.packet_count, 1);
        assert_eq!(flow.promotion_score, INITIAL_PROMOTION_SCORE);
        assert_eq!(flow.pattern.path_consistency, 1.0);
    }

    #[test]
    fn pattern_consistency_needs_at_least_four_samples() {
        let mut pattern = Pattern::default();
        pattern.record(Path::Fast);
        pattern.record(Path::Fast);
        // Only two samples recorded so far; still the Default value.
        assert_eq!(pattern.path_consistency, 1.0);
        pattern.record(Path::Fast);
        pattern.record(Path::Fast);
        assert_eq!(pattern.path_consistency, 1.0);
    }

    #[test]
    fn consecutive_fast_paths_resets_on_slow_choice() {
        let mut pattern = Pattern::default();
        pattern.record(Path::UltraFast);
        pattern.record(Path::Fast);
        assert_eq!(pattern.consecutive_fast_paths, 2);
        pattern.record(Path::Slow);
        assert_eq!(pattern.consecutive_fast_paths, 0);
    }

    #[test]
    fn burst_score_only_populates_once_history_wraps() {
        let mut pattern = Pattern::default();
        for _ in 0..HISTORY - 1 {
            pattern.record(Path::Fast);
        }
        assert!(!pattern.history_filled());
        pattern.record(Path::Slow);
        assert!(pattern.history_filled());
    }
}
