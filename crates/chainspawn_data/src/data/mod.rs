//! Core data structures for chainspawn.

pub mod block;
pub mod metrics;
pub mod organism;
pub mod particle;
pub mod rng;
