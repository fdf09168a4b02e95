pub mod macros;

use async_trait::async_trait;
use chainspawn_core::blockchain::{BlockSource, SyntheticBlockSource};
use chainspawn_core::derivation::{DerivationConfig, DerivationEngine, InheritanceWeights};
use chainspawn_core::rng::{Prng, RngConfig};
use chainspawn_data::{BlockInfo, OrganismTraits, TraitCategory, TraitValue};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Synthetic blocks with a call counter.
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingSource {
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockSource for CountingSource {
    async fn block_info(&self, height: u64) -> anyhow::Result<BlockInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SyntheticBlockSource::block(height))
    }
}

/// Always fails, as an unreachable API would.
#[allow(dead_code)]
pub struct FailingSource;

#[async_trait]
impl BlockSource for FailingSource {
    async fn block_info(&self, _height: u64) -> anyhow::Result<BlockInfo> {
        Err(anyhow::anyhow!("Block API request failed: connection refused"))
    }
}

/// Never completes; used to drop seeding mid-flight.
#[allow(dead_code)]
pub struct PendingSource;

#[async_trait]
impl BlockSource for PendingSource {
    async fn block_info(&self, _height: u64) -> anyhow::Result<BlockInfo> {
        std::future::pending().await
    }
}

/// Answers with the block after the one requested.
#[allow(dead_code)]
pub struct OffByOneSource;

#[async_trait]
impl BlockSource for OffByOneSource {
    async fn block_info(&self, height: u64) -> anyhow::Result<BlockInfo> {
        Ok(SyntheticBlockSource::block(height + 1))
    }
}

#[allow(dead_code)]
pub struct EngineBuilder {
    rng: RngConfig,
    config: DerivationConfig,
    organisms: Vec<OrganismTraits>,
}

#[allow(dead_code)]
impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            rng: RngConfig {
                default_seed: Some(42),
                ..RngConfig::default()
            },
            config: DerivationConfig::default(),
            organisms: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng.default_seed = Some(seed);
        self
    }

    pub fn with_algorithm(mut self, name: &str) -> Self {
        self.rng.algorithm = name.to_string();
        self
    }

    pub fn with_weights(mut self, p1: f64, p2: f64, mutation: f64, block: f64) -> Self {
        self.config.inheritance = InheritanceWeights {
            parent1_weight: p1,
            parent2_weight: p2,
            mutation_weight: mutation,
            block_weight: block,
        };
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut DerivationConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_organism(mut self, traits: OrganismTraits) -> Self {
        self.organisms.push(traits);
        self
    }

    pub fn build(self) -> DerivationEngine {
        let mut engine = DerivationEngine::new(Prng::new(self.rng), self.config);
        for traits in self.organisms {
            engine.register(traits);
        }
        engine
    }
}

/// Genesis organism at `block` with the listed float traits overridden.
#[allow(dead_code)]
pub fn organism_with(
    seed: u32,
    block: u64,
    set: &[(TraitCategory, &str, f64)],
) -> OrganismTraits {
    let mut engine = EngineBuilder::new().with_seed(seed).build();
    let mut traits = engine
        .generate_traits(block, &[])
        .expect("genesis generation cannot fail");
    for &(category, name, value) in set {
        traits
            .group_mut(category)
            .set(name, TraitValue::Float(value));
    }
    traits
}

/// Pearson correlation of two equally long samples.
#[allow(dead_code)]
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}
