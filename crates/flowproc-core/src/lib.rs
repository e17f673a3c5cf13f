//! Hybrid fast/slow-path flow classification.
//!
//! A packet's key is hashed into a count-min sketch for a cheap frequency
//! estimate, looked up (or created) in a fixed-capacity flow arena, scored
//! by a small linear-plus-sigmoid predictor, and routed to one of six
//! processing paths ranging from `UltraFast` to `DeepAnalysis`. A
//! background aging cycle decays stale flows' confidence and a lifecycle
//! pass promotes, demotes, and retires flows based on sustained behavior.
//!
//! [`dispatcher::Engine`] is the entry point; everything else is a
//! component it wires together.

pub mod aging;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod hash;
pub mod hash_index;
pub mod path;
pub mod predictor;
pub mod queue;
pub mod sketch;
pub mod stats;

pub use config::{EngineConfig, PoolSizes};
pub use dispatcher::{Engine, NullWork, PathWork};
pub use error::{CoreError, CoreResult};
pub use flow::{AgingStrategy, FlowArena, FlowEntry, FlowKey, FlowType};
pub use path::Path;
pub use stats::EngineStats;
