//! Processing paths a packet can be routed to, and their relative cost.

/// A processing path a packet can be dispatched to.
///
/// Declared in increasing cost order so the derived `Ord` gives the
/// dispatcher a correct "cheaper than" comparison directly; this order
/// does not match the source algorithm's raw enum discriminants, which
/// were assigned historically rather than by cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Path {
    UltraFast,
    Fast,
    Accelerated,
    Adaptive,
    Slow,
    DeepAnalysis,
}

impl Path {
    pub const ALL: [Path; 6] = [
        Path::UltraFast,
        Path::Fast,
        Path::Accelerated,
        Path::Adaptive,
        Path::Slow,
        Path::DeepAnalysis,
    ];

    /// Numeric code used when recording this path into a flow's pattern
    /// ring and when feeding it back as a predictor feature.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether this path counts as "fast" for consecutive-fast-path
    /// tracking (anything at or cheaper than `Fast`).
    pub fn is_fast(self) -> bool {
        self <= Path::Fast
    }

    /// Whether this path counts as "slow or worse" for `promotion_score`
    /// penalties.
    ///
    /// This does NOT follow the cost-ordered derivation `self >=
    /// Path::Slow` gives: the source algorithm's raw enum discriminants
    /// (`FAST=0, ACCELERATED=1, ULTRA_FAST=2, SLOW=3, ADAPTIVE=4,
    /// DEEP_ANALYSIS=5`) put `Adaptive` above `Slow`, so its `path >=
    /// SLOW_PATH` promotion-penalty check also catches Adaptive. `Path`
    /// here is reordered by true cost for `is_fast`, which puts Adaptive
    /// below Slow, so that comparison alone would stop penalizing
    /// Adaptive. Named explicitly instead so it stays correct regardless
    /// of where `Adaptive` sits in the cost ordering.
    pub fn is_slow_or_worse(self) -> bool {
        matches!(self, Path::Adaptive | Path::Slow | Path::DeepAnalysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_order_matches_declaration() {
        assert!(Path::UltraFast < Path::Fast);
        assert!(Path::Fast < Path::Accelerated);
        assert!(Path::Accelerated < Path::Adaptive);
        assert!(Path::Adaptive < Path::Slow);
        assert!(Path::Slow < Path::DeepAnalysis);
    }

    #[test]
    fn is_fast_boundary() {
        assert!(Path::UltraFast.is_fast());
        assert!(Path::Fast.is_fast());
        assert!(!Path::Accelerated.is_fast());
    }

    #[test]
    fn is_slow_or_worse_includes_adaptive_despite_cost_order() {
        assert!(Path::Adaptive.is_slow_or_worse());
        assert!(Path::Slow.is_slow_or_worse());
        assert!(Path::DeepAnalysis.is_slow_or_worse());
        assert!(!Path::Accelerated.is_slow_or_worse());
        assert!(!Path::Fast.is_slow_or_worse());
        assert!(!Path::UltraFast.is_slow_or_worse());
    }
}
