//! Organism trait derivation: genesis generation, two-parent inheritance and
//! mutation.
//!
//! Every organism is produced from its own derived stream, keyed by block
//! number and sorted parent ids, so the same inputs reproduce the same traits
//! no matter what else the engine has generated in between.

use crate::error::{CoreError, Result};
use crate::metrics::Metrics;
use crate::particles::initialize_particles;
use crate::rng::{next_below, Prng};
use crate::schema::{TraitDomain, TraitSpec, SCHEMA};
use chainspawn_data::{
    MutationRecord, OrganismTraits, ParticleAllocationResult, ParticleInitConfig, TraitValue,
};
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Relative contribution of each source when blending inherited traits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct InheritanceWeights {
    pub parent1_weight: f64,
    pub parent2_weight: f64,
    /// Scales the random perturbation added after blending.
    pub mutation_weight: f64,
    /// Weight of the fresh block-derived draw.
    pub block_weight: f64,
}

impl Default for InheritanceWeights {
    fn default() -> Self {
        Self {
            parent1_weight: 0.4,
            parent2_weight: 0.4,
            mutation_weight: 0.1,
            block_weight: 0.2,
        }
    }
}

impl InheritanceWeights {
    /// Negative and NaN weights count as zero.
    fn sanitized(&self) -> (f64, f64, f64, f64) {
        (
            self.parent1_weight.max(0.0),
            self.parent2_weight.max(0.0),
            self.mutation_weight.max(0.0),
            self.block_weight.max(0.0),
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DerivationConfig {
    pub inheritance: InheritanceWeights,
    /// Per-field mutation probability used when none is passed explicitly.
    pub mutation_rate: f64,
    /// Maximum mutation step as a fraction of the field's range.
    pub mutation_strength: f64,
    /// Inheritance perturbation as a fraction of the field's range.
    pub perturbation_scale: f64,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            inheritance: InheritanceWeights::default(),
            mutation_rate: 0.05,
            mutation_strength: 0.1,
            perturbation_scale: 0.05,
        }
    }
}

/// Owns the root generator and the registry of known organisms.
pub struct DerivationEngine {
    rng: Prng,
    config: DerivationConfig,
    organisms: HashMap<Uuid, OrganismTraits>,
    sequence: u64,
    metrics: Arc<Metrics>,
}

impl DerivationEngine {
    #[must_use]
    pub fn new(rng: Prng, config: DerivationConfig) -> Self {
        Self {
            rng,
            config,
            organisms: HashMap::new(),
            sequence: 0,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Shares an existing metrics collector.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn rng(&self) -> &Prng {
        &self.rng
    }

    /// Root generator, e.g. for reseeding from a block.
    pub fn rng_mut(&mut self) -> &mut Prng {
        &mut self.rng
    }

    #[must_use]
    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Number of organisms generated so far by this engine.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Makes `traits` available as a parent.
    pub fn register(&mut self, traits: OrganismTraits) {
        self.organisms.insert(traits.organism_id, traits);
    }

    #[must_use]
    pub fn organism(&self, id: &Uuid) -> Option<&OrganismTraits> {
        self.organisms.get(id)
    }

    #[must_use]
    pub fn organism_count(&self) -> usize {
        self.organisms.len()
    }

    /// Derives traits for an organism born at `block_number`.
    ///
    /// Parent ids are sorted and deduplicated first, so their order never
    /// matters. Only the first two sorted parents contribute values.
    pub fn generate_traits(
        &mut self,
        block_number: u64,
        parent_ids: &[Uuid],
    ) -> Result<OrganismTraits> {
        let mut ids = parent_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.len() > 2 {
            tracing::warn!(
                block_number = block_number,
                parents = ids.len(),
                "More than two parents; using the first two"
            );
            self.metrics.increment_counter("extra_parents_ignored");
        }

        let parents = ids
            .iter()
            .map(|id| {
                self.organisms
                    .get(id)
                    .ok_or(CoreError::UnknownOrganism(*id))
            })
            .collect::<Result<Vec<_>>>()?;

        let traits = build_traits(
            &self.rng,
            &self.config,
            block_number,
            ids.clone(),
            &parents,
            self.sequence,
        );
        self.sequence += 1;

        self.metrics
            .record_organism(block_number, traits.generation);
        tracing::debug!(
            organism_id = %traits.organism_id,
            block_number = block_number,
            generation = traits.generation,
            "Organism generated"
        );
        self.register(traits.clone());
        Ok(traits)
    }

    /// Genesis organisms for every block in `blocks`, built in parallel.
    ///
    /// Produces exactly what the same sequence of `generate_traits` calls
    /// without parents would.
    pub fn generate_population(&mut self, blocks: &[u64]) -> Vec<OrganismTraits> {
        let start = self.sequence;
        let root = &self.rng;
        let config = &self.config;
        let population: Vec<OrganismTraits> = blocks
            .par_iter()
            .enumerate()
            .map(|(i, &block)| build_traits(root, config, block, Vec::new(), &[], start + i as u64))
            .collect();
        self.sequence += blocks.len() as u64;

        for traits in &population {
            self.metrics
                .record_organism(traits.block_number, traits.generation);
            self.register(traits.clone());
        }
        tracing::info!(count = population.len(), "Population generated");
        population
    }

    /// Returns a mutated copy of `traits`; the input is left untouched.
    ///
    /// Every mutable field consumes a roll and a step draw whether or not it
    /// mutates. The result replaces the organism in the registry.
    pub fn mutate_traits(
        &mut self,
        traits: &OrganismTraits,
        mutation_rate: Option<f64>,
    ) -> OrganismTraits {
        let rate = mutation_rate.unwrap_or(self.config.mutation_rate);
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        let strength = self.config.mutation_strength.max(0.0);

        let purpose = format!("mutate:{}:{}", traits.organism_id, traits.mutation_epoch);
        let mut stream = self.rng.derive_stream(&purpose);
        let rng = stream.rng();

        let mut mutated = traits.clone();
        let mut applied = 0;
        for &(category, specs) in &SCHEMA {
            for spec in specs.iter().filter(|s| s.mutable) {
                let roll = rng.random();
                let step = rng.random_float(-1.0, 1.0);
                if roll >= rate {
                    continue;
                }
                let Some(current) = mutated.group(category).get(spec.name).cloned() else {
                    continue;
                };
                let Some(new_value) = perturb(spec, &current, step, strength) else {
                    continue;
                };
                if new_value == current {
                    continue;
                }

                let mutation_strength = match (current.as_f64(), new_value.as_f64()) {
                    (Some(a), Some(b)) if spec.domain.span() > 0.0 => {
                        (b - a).abs() / spec.domain.span()
                    }
                    _ => 1.0,
                };
                mutated
                    .group_mut(category)
                    .set(spec.name, new_value.clone());
                mutated.mutation_history.push(MutationRecord {
                    timestamp: Utc::now(),
                    block_number: traits.block_number,
                    category,
                    trait_name: spec.name.to_string(),
                    previous_value: current,
                    new_value,
                    mutation_strength,
                });
                applied += 1;
            }
        }
        mutated.mutation_epoch += 1;

        self.metrics.record_mutations(applied);
        tracing::debug!(
            organism_id = %mutated.organism_id,
            epoch = mutated.mutation_epoch,
            applied = applied,
            "Mutation pass"
        );
        self.register(mutated.clone());
        mutated
    }

    /// Allocates the organism's particles from its own stream.
    ///
    /// `template` supplies everything but the count, which comes from the
    /// organism's `particle_count` trait when present.
    pub fn particles_for(
        &self,
        traits: &OrganismTraits,
        template: &ParticleInitConfig,
    ) -> Result<ParticleAllocationResult> {
        let mut config = template.clone();
        if let Some(count) = traits.particle_count() {
            config.total_count = count;
        }

        let started = Instant::now();
        let mut stream = self
            .rng
            .derive_stream(&format!("particles:{}", traits.organism_id));
        let result = initialize_particles(stream.rng(), &config)?;
        if !result.errors.is_empty() {
            self.metrics.increment_counter("role_weight_fallback");
        }
        self.metrics
            .record_allocation(result.particles.len(), started.elapsed());
        Ok(result)
    }
}

/// Stream key for an organism: the block number plus sorted parent ids.
fn stream_key(block_number: u64, parent_ids: &[Uuid]) -> String {
    if parent_ids.is_empty() {
        return block_number.to_string();
    }
    let ids: Vec<String> = parent_ids.iter().map(Uuid::to_string).collect();
    format!("{}:{}", block_number, ids.join(","))
}

/// Random-layout UUID fixed by the root seed, stream key and sequence.
fn organism_id(root_seed: u32, key: &str, sequence: u64) -> Uuid {
    let digest = Sha256::new()
        .chain_update(root_seed.to_be_bytes())
        .chain_update(key.as_bytes())
        .chain_update(sequence.to_be_bytes())
        .finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn build_traits(
    root: &Prng,
    config: &DerivationConfig,
    block_number: u64,
    parent_ids: Vec<Uuid>,
    parents: &[&OrganismTraits],
    sequence: u64,
) -> OrganismTraits {
    let key = stream_key(block_number, &parent_ids);
    let mut stream = root.derive_stream(&format!("traits:{key}"));
    let rng = stream.rng();

    let mut traits = OrganismTraits::empty(organism_id(root.base_seed(), &key, sequence), block_number);
    traits.generation = parents
        .iter()
        .map(|p| p.generation + 1)
        .max()
        .unwrap_or(0);
    traits.parent_ids = parent_ids;

    let lineage = match parents {
        [] => None,
        [only] => Some((*only, *only)),
        [first, second, ..] => Some((*first, *second)),
    };

    for &(category, specs) in &SCHEMA {
        for spec in specs {
            let fresh = fresh_value(rng, &spec.domain);
            let value = match lineage {
                None => fresh,
                Some((p1, p2)) => inherit(
                    rng,
                    config,
                    spec,
                    fresh,
                    p1.group(category).get(spec.name),
                    p2.group(category).get(spec.name),
                ),
            };
            traits.group_mut(category).set(spec.name, value);
        }
    }
    traits
}

fn fresh_value(rng: &mut Prng, domain: &TraitDomain) -> TraitValue {
    match *domain {
        TraitDomain::Float { min, max } => TraitValue::Float(rng.random_float(min, max)),
        TraitDomain::Int { min, max } => TraitValue::Int(rng.random_int(min, max)),
        TraitDomain::Categorical(options) => {
            let index = rng.random_index(options.len());
            TraitValue::Category(options.get(index).copied().unwrap_or_default().to_string())
        }
    }
}

/// Blends parent values with the fresh draw. Always takes exactly one more
/// draw: the perturbation for numbers, the selector for categories.
fn inherit(
    rng: &mut Prng,
    config: &DerivationConfig,
    spec: &TraitSpec,
    fresh: TraitValue,
    first: Option<&TraitValue>,
    second: Option<&TraitValue>,
) -> TraitValue {
    let (w1, w2, wm, wb) = config.inheritance.sanitized();
    let total = w1 + w2 + wb;

    match spec.domain {
        TraitDomain::Float { .. } | TraitDomain::Int { .. } => {
            let u = rng.random_float(-1.0, 1.0);
            let drawn = fresh.as_f64().unwrap_or_default();
            let p1 = first.and_then(TraitValue::as_f64).unwrap_or(drawn);
            let p2 = second.and_then(TraitValue::as_f64).unwrap_or(drawn);
            let base = if total > 0.0 {
                (w1 * p1 + w2 * p2 + wb * drawn) / total
            } else {
                drawn
            };
            let value = base + wm * config.perturbation_scale * spec.domain.span() * u;
            clamp_to_domain(&spec.domain, value).unwrap_or(fresh)
        }
        TraitDomain::Categorical(_) => {
            let selector = rng.random() * total;
            let picked = if total <= 0.0 {
                None
            } else if selector < w1 {
                first
            } else if selector < w1 + w2 {
                second
            } else {
                None
            };
            match picked {
                Some(value) if spec.domain.contains(value) => value.clone(),
                _ => fresh,
            }
        }
    }
}

/// Clamps a numeric value into the half-open domain; ints are rounded.
fn clamp_to_domain(domain: &TraitDomain, value: f64) -> Option<TraitValue> {
    if !value.is_finite() {
        return None;
    }
    match *domain {
        TraitDomain::Float { min, max } => {
            Some(TraitValue::Float(value.clamp(min, next_below(max).max(min))))
        }
        TraitDomain::Int { min, max } => {
            let top = (max - 1).max(min);
            Some(TraitValue::Int((value.round() as i64).clamp(min, top)))
        }
        TraitDomain::Categorical(_) => None,
    }
}

/// Applies one mutation step `u` in `[-1, 1)` to `current`.
fn perturb(spec: &TraitSpec, current: &TraitValue, u: f64, strength: f64) -> Option<TraitValue> {
    match (spec.domain, current) {
        (TraitDomain::Float { .. } | TraitDomain::Int { .. }, _) => {
            let value = current.as_f64()?;
            clamp_to_domain(&spec.domain, value + u * strength * spec.domain.span())
        }
        (TraitDomain::Categorical(options), TraitValue::Category(name)) => {
            if options.len() < 2 {
                return None;
            }
            let index = options.iter().position(|o| *o == name.as_str())?;
            // Shift by 1..len-1 so the result always differs.
            let shift = 1 + (((u + 1.0) / 2.0) * (options.len() - 1) as f64) as usize;
            let shift = shift.min(options.len() - 1);
            let next = (index + shift) % options.len();
            Some(TraitValue::Category(options[next].to_string()))
        }
        _ => None,
    }
}
