use super::particle::ParticleRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spatial and categorical summary of an allocation.
///
/// Empty allocations produce zeroes. Coordinates spread wider than
/// `f64::MAX` saturate the distance and volume fields to infinity; `density`
/// is 0 in that case.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ParticleDistributionMetrics {
    pub particle_count: usize,
    /// Mean Euclidean distance between particle pairs.
    pub mean_pairwise_distance: f64,
    /// Whether the distance was computed on a strided subset.
    pub distance_sampled: bool,
    /// Volume of the axis-aligned box enclosing all particles.
    pub bounding_volume: f64,
    /// Particles per unit of bounding volume.
    pub density: f64,
    /// Shannon entropy of observed role frequencies, in bits.
    pub role_entropy: f64,
    /// Role entropy normalized by its maximum over the observed roles; 1.0
    /// is perfectly uniform. A single observed role scores 1.0, so check
    /// `role_counts` or `role_entropy` (0.0) to detect a fully skewed run.
    pub balance_score: f64,
    /// Shannon diversity index (natural log) of emergent tags.
    pub emergent_diversity: f64,
    /// Share of particles carrying an emergent tag.
    pub emergent_fraction: f64,
    pub role_counts: BTreeMap<ParticleRole, usize>,
}
