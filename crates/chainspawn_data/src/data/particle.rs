use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Functional role of a particle within an organism.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ParticleRole {
    /// Nucleus particles anchoring the body.
    Core,
    /// Load-bearing shell.
    Structural,
    /// Energy storage and transfer.
    Energy,
    /// Perception.
    Sensor,
    /// Locomotion.
    Motor,
    /// Offspring material.
    Reproductive,
    /// Protective outer layer.
    Defensive,
}

impl ParticleRole {
    pub const ALL: [ParticleRole; 7] = [
        ParticleRole::Core,
        ParticleRole::Structural,
        ParticleRole::Energy,
        ParticleRole::Sensor,
        ParticleRole::Motor,
        ParticleRole::Reproductive,
        ParticleRole::Defensive,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleRole::Core => "core",
            ParticleRole::Structural => "structural",
            ParticleRole::Energy => "energy",
            ParticleRole::Sensor => "sensor",
            ParticleRole::Motor => "motor",
            ParticleRole::Reproductive => "reproductive",
            ParticleRole::Defensive => "defensive",
        }
    }
}

impl fmt::Display for ParticleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional behaviour tag assigned independently of role.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EmergentBehavior {
    Swarming,
    Pulsing,
    Orbiting,
    Bonding,
    Fleeing,
    Mimicry,
}

impl EmergentBehavior {
    pub const ALL: [EmergentBehavior; 6] = [
        EmergentBehavior::Swarming,
        EmergentBehavior::Pulsing,
        EmergentBehavior::Orbiting,
        EmergentBehavior::Bonding,
        EmergentBehavior::Fleeing,
        EmergentBehavior::Mimicry,
    ];
}

/// How particle positions are laid out inside the bounds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpatialPattern {
    /// Uniform inside the box.
    #[default]
    Uniform,
    /// Uniform inside the ellipsoid inscribed in the box.
    Spherical,
    /// Jittered cubic lattice filling the box.
    Lattice,
}

/// Axis-aligned box.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    #[must_use]
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Cube of half-width `half` centred on the origin.
    #[must_use]
    pub fn centered(half: f64) -> Self {
        Self::new([-half; 3], [half; 3])
    }

    /// All components finite and `min <= max` on every axis.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.min
            .iter()
            .zip(&self.max)
            .all(|(lo, hi)| lo.is_finite() && hi.is_finite() && lo <= hi)
    }

    #[must_use]
    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        let [x, y, z] = self.extent();
        x * y * z
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::centered(50.0)
    }
}

/// Parameters for one bulk allocation. Missing fields take their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParticleInitConfig {
    pub total_count: usize,
    /// Relative role weights; normalized before sampling.
    pub role_weights: BTreeMap<ParticleRole, f64>,
    pub bounds: Bounds,
    pub pattern: SpatialPattern,
    pub enable_emergent_behavior: bool,
    /// Probability that a particle receives an emergent tag.
    pub emergent_probability: f64,
    /// Tags to choose from; all tags when empty.
    pub emergent_behaviors: Vec<EmergentBehavior>,
}

impl Default for ParticleInitConfig {
    fn default() -> Self {
        let role_weights = BTreeMap::from([
            (ParticleRole::Core, 0.05),
            (ParticleRole::Structural, 0.30),
            (ParticleRole::Energy, 0.20),
            (ParticleRole::Sensor, 0.15),
            (ParticleRole::Motor, 0.15),
            (ParticleRole::Reproductive, 0.05),
            (ParticleRole::Defensive, 0.10),
        ]);
        Self {
            total_count: 500,
            role_weights,
            bounds: Bounds::default(),
            pattern: SpatialPattern::Uniform,
            enable_emergent_behavior: true,
            emergent_probability: 0.1,
            emergent_behaviors: Vec::new(),
        }
    }
}

/// One allocated particle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParticleDescriptor {
    pub index: usize,
    pub role: ParticleRole,
    pub position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergent_behavior: Option<EmergentBehavior>,
}

/// Counters gathered during allocation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AllocationStats {
    pub total_allocated: usize,
    pub by_role: BTreeMap<ParticleRole, usize>,
    pub with_emergent_behavior: usize,
    /// Wall-clock duration, diagnostic only.
    pub allocation_time_ms: f64,
    pub memory_estimate_bytes: usize,
}

/// Output of bulk particle creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ParticleAllocationResult {
    pub particles: Vec<ParticleDescriptor>,
    pub stats: AllocationStats,
    /// Non-fatal problems encountered while allocating.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Role keys of the configuration the result was allocated from.
    #[serde(default)]
    pub requested_roles: BTreeSet<ParticleRole>,
}
