//! # Chainspawn Core
//!
//! Deterministic organism generation seeded by Bitcoin blocks.
//!
//! This crate contains:
//! - A seedable 32-bit PRNG with named sub-streams and bounded rehash chains
//! - Block sources (Esplora REST, static fixtures, synthetic offline blocks)
//! - Trait derivation with two-parent inheritance and mutation
//! - Bulk particle allocation with batched and yielding variants
//! - Allocation validation and distribution metrics
//!
//! ## Example
//!
//! ```
//! use chainspawn_core::derivation::{DerivationConfig, DerivationEngine};
//! use chainspawn_core::rng::Prng;
//!
//! let mut engine = DerivationEngine::new(Prng::with_seed(42), DerivationConfig::default());
//! let traits = engine.generate_traits(800_000, &[]).unwrap();
//! assert!(traits.particle_count().is_some());
//! ```

/// Allocation validation and distribution metrics
pub mod analysis;
/// Block metadata sources and block-to-seed mapping
pub mod blockchain;
/// Configuration for generation runs
pub mod config;
/// Trait generation, inheritance and mutation
pub mod derivation;
/// Error types
pub mod error;
/// Generation counters and logging setup
pub mod metrics;
/// Bulk particle allocation
pub mod particles;
/// Deterministic pseudo-random number generation
pub mod rng;
/// Trait schema and value domains
pub mod schema;

pub use error::{CoreError, Result};
pub use rng::{Prng, PurposeStream};
