//! Bulk particle allocation.
//!
//! Each particle consumes a fixed number of draws in a fixed order: one for
//! its role, three for its position, then (when emergent behaviour is
//! enabled) one roll plus one pick if the roll succeeds. Batched and yielding
//! variants walk the same sequence, so they return the same particles as a
//! single-shot call given the same generator state.

use crate::error::{CoreError, Result};
use crate::rng::Prng;
use chainspawn_data::{
    AllocationStats, Bounds, EmergentBehavior, ParticleAllocationResult, ParticleDescriptor,
    ParticleInitConfig, ParticleRole, SpatialPattern,
};
use std::f64::consts::TAU;
use std::time::Instant;

/// Approximate heap footprint of one allocated particle, in bytes.
pub const PARTICLE_BYTE_ESTIMATE: usize = 128;

/// Chunking options for [`initialize_particles_batch`].
#[derive(Default)]
pub struct BatchOptions<'a> {
    /// Particles per chunk; 0 is treated as 1.
    pub batch_size: usize,
    /// Called after each chunk with `(allocated, total)`.
    pub on_progress: Option<&'a mut dyn FnMut(usize, usize)>,
}

/// Allocates every particle in one pass.
pub fn initialize_particles(
    rng: &mut Prng,
    config: &ParticleInitConfig,
) -> Result<ParticleAllocationResult> {
    let started = Instant::now();
    let plan = AllocationPlan::new(config)?;
    let mut result = plan.empty_result();
    for index in 0..plan.total {
        result.particles.push(plan.draw(rng, index));
    }
    Ok(plan.finish(result, started))
}

/// Allocates in chunks of `options.batch_size`, reporting progress between
/// chunks.
pub fn initialize_particles_batch(
    rng: &mut Prng,
    config: &ParticleInitConfig,
    mut options: BatchOptions<'_>,
) -> Result<ParticleAllocationResult> {
    let started = Instant::now();
    let plan = AllocationPlan::new(config)?;
    let batch_size = options.batch_size.max(1);
    let mut result = plan.empty_result();

    let mut next = 0;
    while next < plan.total {
        let end = (next + batch_size).min(plan.total);
        for index in next..end {
            result.particles.push(plan.draw(rng, index));
        }
        next = end;
        if let Some(callback) = options.on_progress.as_deref_mut() {
            callback(next, plan.total);
        }
    }
    Ok(plan.finish(result, started))
}

/// Chunked allocation that yields to the tokio scheduler between chunks.
///
/// The generator stays mutably borrowed across every yield, so no other
/// caller can interleave draws.
pub async fn initialize_particles_yielding(
    rng: &mut Prng,
    config: &ParticleInitConfig,
    batch_size: usize,
) -> Result<ParticleAllocationResult> {
    let started = Instant::now();
    let plan = AllocationPlan::new(config)?;
    let batch_size = batch_size.max(1);
    let mut result = plan.empty_result();

    let mut next = 0;
    while next < plan.total {
        let end = (next + batch_size).min(plan.total);
        for index in next..end {
            result.particles.push(plan.draw(rng, index));
        }
        next = end;
        tokio::task::yield_now().await;
    }
    Ok(plan.finish(result, started))
}

/// Chunk size keeping one chunk under `memory_limit` bytes.
#[must_use]
pub fn calculate_optimal_batch_size(total: usize, memory_limit: usize) -> usize {
    (memory_limit / PARTICLE_BYTE_ESTIMATE)
        .max(1)
        .clamp(1, total.max(1))
}

/// Checks a configuration before any draw is taken.
pub fn validate_config(config: &ParticleInitConfig) -> Result<()> {
    if config.total_count == 0 {
        return Err(CoreError::invalid_allocation("total_count must be positive"));
    }
    if !config.bounds.is_well_formed() {
        return Err(CoreError::invalid_allocation(format!(
            "bounds must be finite with min <= max, got {:?}",
            config.bounds
        )));
    }
    if config.role_weights.is_empty() {
        return Err(CoreError::invalid_allocation("role_weights cannot be empty"));
    }
    if !(0.0..=1.0).contains(&config.emergent_probability) {
        return Err(CoreError::invalid_allocation(format!(
            "emergent_probability must be in [0, 1], got {}",
            config.emergent_probability
        )));
    }
    Ok(())
}

/// Validated, normalized view of a configuration.
struct AllocationPlan<'a> {
    config: &'a ParticleInitConfig,
    total: usize,
    /// Cumulative weights in role order.
    cumulative: Vec<(ParticleRole, f64)>,
    weight_sum: f64,
    behaviors: Vec<EmergentBehavior>,
    lattice_side: usize,
    warnings: Vec<String>,
}

impl<'a> AllocationPlan<'a> {
    fn new(config: &'a ParticleInitConfig) -> Result<Self> {
        validate_config(config)?;

        let mut warnings = Vec::new();
        let weight = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let mut sum: f64 = config.role_weights.values().map(|&w| weight(w)).sum();
        let uniform = sum <= 0.0 || !sum.is_finite();
        if uniform {
            tracing::warn!(
                roles = config.role_weights.len(),
                "Role weights sum to zero; falling back to uniform"
            );
            warnings.push("role weights sum to zero; using uniform weights".to_string());
            sum = config.role_weights.len() as f64;
        }

        let mut running = 0.0;
        let cumulative = config
            .role_weights
            .iter()
            .map(|(&role, &w)| {
                running += if uniform { 1.0 } else { weight(w) };
                (role, running)
            })
            .collect();

        let behaviors = if config.emergent_behaviors.is_empty() {
            EmergentBehavior::ALL.to_vec()
        } else {
            config.emergent_behaviors.clone()
        };

        Ok(Self {
            config,
            total: config.total_count,
            cumulative,
            weight_sum: sum,
            behaviors,
            lattice_side: lattice_side(config.total_count),
            warnings,
        })
    }

    fn empty_result(&self) -> ParticleAllocationResult {
        ParticleAllocationResult {
            particles: Vec::with_capacity(self.total),
            stats: AllocationStats::default(),
            errors: self.warnings.clone(),
            requested_roles: self.config.role_weights.keys().copied().collect(),
        }
    }

    fn draw(&self, rng: &mut Prng, index: usize) -> ParticleDescriptor {
        let role = self.pick_role(rng.random() * self.weight_sum);
        let position = self.position(rng, index);
        let emergent_behavior = if self.config.enable_emergent_behavior {
            let roll = rng.random();
            if roll < self.config.emergent_probability {
                self.behaviors
                    .get(rng.random_index(self.behaviors.len()))
                    .copied()
            } else {
                None
            }
        } else {
            None
        };
        ParticleDescriptor {
            index,
            role,
            position,
            emergent_behavior,
        }
    }

    fn pick_role(&self, target: f64) -> ParticleRole {
        self.cumulative
            .iter()
            .find(|(_, upper)| target < *upper)
            .or_else(|| self.cumulative.last())
            .map_or(ParticleRole::Core, |(role, _)| *role)
    }

    fn position(&self, rng: &mut Prng, index: usize) -> [f64; 3] {
        let bounds = &self.config.bounds;
        let u = [rng.random(), rng.random(), rng.random()];
        let raw = match self.config.pattern {
            SpatialPattern::Uniform => uniform_point(bounds, u),
            SpatialPattern::Spherical => spherical_point(bounds, u),
            SpatialPattern::Lattice => lattice_point(bounds, u, index, self.lattice_side),
        };
        clamp_into(bounds, raw)
    }

    fn finish(
        &self,
        mut result: ParticleAllocationResult,
        started: Instant,
    ) -> ParticleAllocationResult {
        let mut stats = AllocationStats {
            total_allocated: result.particles.len(),
            memory_estimate_bytes: result.particles.len() * PARTICLE_BYTE_ESTIMATE,
            ..AllocationStats::default()
        };
        for particle in &result.particles {
            *stats.by_role.entry(particle.role).or_insert(0) += 1;
            if particle.emergent_behavior.is_some() {
                stats.with_emergent_behavior += 1;
            }
        }
        stats.allocation_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(
            total = stats.total_allocated,
            emergent = stats.with_emergent_behavior,
            "Particles allocated"
        );
        result.stats = stats;
        result
    }
}

fn uniform_point(bounds: &Bounds, u: [f64; 3]) -> [f64; 3] {
    std::array::from_fn(|axis| lerp(bounds.min[axis], bounds.max[axis], u[axis]))
}

/// Uniform point in the ellipsoid inscribed in `bounds`.
fn spherical_point(bounds: &Bounds, u: [f64; 3]) -> [f64; 3] {
    let theta = TAU * u[0];
    let cos_phi = 2.0 * u[1] - 1.0;
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    let radius = u[2].cbrt();
    let direction = [sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi];

    std::array::from_fn(|axis| {
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
        // Halved before combining; `hi - lo` can exceed f64::MAX.
        let center = lo * 0.5 + hi * 0.5;
        let half = hi * 0.5 - lo * 0.5;
        center + half * radius * direction[axis]
    })
}

/// Cell `index` of a cubic lattice with `side` cells per axis, jittered
/// inside the cell.
fn lattice_point(bounds: &Bounds, u: [f64; 3], index: usize, side: usize) -> [f64; 3] {
    let cell = [index % side, (index / side) % side, index / (side * side)];
    std::array::from_fn(|axis| {
        let t = (cell[axis] as f64 + u[axis]) / side as f64;
        lerp(bounds.min[axis], bounds.max[axis], t)
    })
}

/// Point at fraction `t` of the way from `lo` to `hi`, without forming the
/// width of the interval.
fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
    lo * (1.0 - t) + hi * t
}

fn lattice_side(total: usize) -> usize {
    let mut side = (total as f64).cbrt().floor() as usize;
    while side.pow(3) < total {
        side += 1;
    }
    side.max(1)
}

fn clamp_into(bounds: &Bounds, point: [f64; 3]) -> [f64; 3] {
    std::array::from_fn(|axis| point[axis].clamp(bounds.min[axis], bounds.max[axis]))
}
