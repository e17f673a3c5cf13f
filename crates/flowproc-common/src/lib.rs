//! Shared primitives for the flow-classification dispatcher.
//!
//! This crate holds the handful of things every other crate in the
//! workspace needs and that don't belong to any one component: a pluggable
//! wall-clock (`Clock`) and a seeded PRNG for the probabilistic pieces of
//! the dispatcher (queue overflow drops).
//!
//! Nothing here touches the per-packet hot path directly; it's the
//! vocabulary the hot path is built out of.

pub mod clock;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use rng::Xorshift64;
