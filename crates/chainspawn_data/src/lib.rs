//! # chainspawn Data
//!
//! Plain value types shared by the chainspawn crates: generator state,
//! organism trait records, particle allocations and distribution metrics.
//! Nothing in here draws random numbers; the logic lives in `chainspawn_core`.

pub mod data;

pub use data::block::BlockInfo;
pub use data::metrics::ParticleDistributionMetrics;
pub use data::organism::{
    MutationRecord, OrganismTraits, TraitCategory, TraitGroup, TraitValue,
};
pub use data::particle::{
    AllocationStats, Bounds, EmergentBehavior, ParticleAllocationResult, ParticleDescriptor,
    ParticleInitConfig, ParticleRole, SpatialPattern,
};
pub use data::rng::RngState;
