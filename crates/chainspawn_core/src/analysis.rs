//! Allocation validation and distribution metrics.
//!
//! Read-only checks over finished results. Nothing here draws from a
//! generator, so results can be analyzed any number of times.

use crate::schema::{lookup, SCHEMA};
use chainspawn_data::{
    OrganismTraits, ParticleAllocationResult, ParticleDescriptor, ParticleDistributionMetrics,
};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Above this many particles, pairwise distance is computed on an evenly
/// strided subset.
pub const EXACT_PAIRWISE_LIMIT: usize = 2048;

/// Whether the result's counters agree with each other and with its
/// configuration.
#[must_use]
pub fn validate_allocation(result: &ParticleAllocationResult) -> bool {
    allocation_issues(result).is_empty()
}

/// Human readable findings behind [`validate_allocation`].
#[must_use]
pub fn allocation_issues(result: &ParticleAllocationResult) -> Vec<String> {
    let mut issues = Vec::new();
    let stats = &result.stats;

    let by_role_sum: usize = stats.by_role.values().sum();
    if by_role_sum != stats.total_allocated {
        issues.push(format!(
            "by_role sums to {} but total_allocated is {}",
            by_role_sum, stats.total_allocated
        ));
    }
    if stats.total_allocated != result.particles.len() {
        issues.push(format!(
            "total_allocated is {} but {} particles are present",
            stats.total_allocated,
            result.particles.len()
        ));
    }
    for role in stats.by_role.keys() {
        if !result.requested_roles.contains(role) {
            issues.push(format!("role {role} was counted but never requested"));
        }
    }
    for particle in &result.particles {
        if !result.requested_roles.contains(&particle.role) {
            issues.push(format!(
                "particle {} has unrequested role {}",
                particle.index, particle.role
            ));
        }
    }
    issues
}

/// Spatial and categorical summary; zeroed for an empty slice.
#[must_use]
pub fn analyze_distribution(particles: &[ParticleDescriptor]) -> ParticleDistributionMetrics {
    let count = particles.len();
    if count == 0 {
        return ParticleDistributionMetrics::default();
    }

    let (mean_pairwise_distance, distance_sampled) = mean_pairwise_distance(particles);
    let bounding_volume = bounding_volume(particles);
    let density = if bounding_volume > 0.0 && bounding_volume.is_finite() {
        count as f64 / bounding_volume
    } else {
        0.0
    };

    let mut role_counts = BTreeMap::new();
    let mut tag_counts = BTreeMap::new();
    for particle in particles {
        *role_counts.entry(particle.role).or_insert(0usize) += 1;
        if let Some(tag) = particle.emergent_behavior {
            *tag_counts.entry(tag).or_insert(0usize) += 1;
        }
    }

    let role_entropy = entropy(role_counts.values().copied(), count, f64::log2);
    let balance_score = match role_counts.len() {
        0 => 0.0,
        1 => 1.0,
        k => role_entropy / (k as f64).log2(),
    };

    let tagged: usize = tag_counts.values().sum();
    let emergent_diversity = entropy(tag_counts.values().copied(), tagged, f64::ln);

    ParticleDistributionMetrics {
        particle_count: count,
        mean_pairwise_distance,
        distance_sampled,
        bounding_volume,
        density,
        role_entropy,
        balance_score,
        emergent_diversity,
        emergent_fraction: tagged as f64 / count as f64,
        role_counts,
    }
}

/// Checks every trait against the schema; empty when the record is sound.
#[must_use]
pub fn validate_traits(traits: &OrganismTraits) -> Vec<String> {
    let mut issues = Vec::new();
    for &(category, specs) in &SCHEMA {
        let group = traits.group(category);
        for spec in specs {
            match group.get(spec.name) {
                None => issues.push(format!("{category}.{} is missing", spec.name)),
                Some(value) if !spec.domain.contains(value) => {
                    issues.push(format!("{category}.{} = {value} is out of range", spec.name));
                }
                Some(_) => {}
            }
        }
        for (name, _) in group.iter() {
            if lookup(category, name).is_none() {
                issues.push(format!("{category}.{name} is not a known trait"));
            }
        }
    }
    for record in &traits.mutation_history {
        if lookup(record.category, &record.trait_name).is_none() {
            issues.push(format!(
                "mutation of unknown trait {}.{}",
                record.category, record.trait_name
            ));
        }
    }
    issues
}

fn entropy(counts: impl Iterator<Item = usize>, total: usize, log: fn(f64) -> f64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let h: f64 = counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total as f64;
            -p * log(p)
        })
        .sum();
    h.max(0.0)
}

fn mean_pairwise_distance(particles: &[ParticleDescriptor]) -> (f64, bool) {
    let sampled = particles.len() > EXACT_PAIRWISE_LIMIT;
    let points: Vec<[f64; 3]> = if sampled {
        let stride = particles.len().div_ceil(EXACT_PAIRWISE_LIMIT);
        particles.iter().step_by(stride).map(|p| p.position).collect()
    } else {
        particles.iter().map(|p| p.position).collect()
    };

    let n = points.len();
    if n < 2 {
        return (0.0, sampled);
    }

    // Row sums are collected in order so the total does not depend on
    // the thread pool's reduction order.
    let rows: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            points[i + 1..]
                .iter()
                .map(|q| distance(&points[i], q))
                .sum()
        })
        .collect();
    let pairs = (n * (n - 1) / 2) as f64;
    (rows.iter().sum::<f64>() / pairs, sampled)
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

fn bounding_volume(particles: &[ParticleDescriptor]) -> f64 {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for particle in particles {
        for axis in 0..3 {
            min[axis] = min[axis].min(particle.position[axis]);
            max[axis] = max[axis].max(particle.position[axis]);
        }
    }
    (0..3).map(|axis| (max[axis] - min[axis]).max(0.0)).product()
}
