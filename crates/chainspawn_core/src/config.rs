//! Configuration for generation runs.
//!
//! Maps to `chainspawn.toml`. Every section has defaults, so an empty file is
//! a valid configuration.
//!
//! ## Example `chainspawn.toml`
//!
//! ```toml
//! [rng]
//! default_seed = 42
//! algorithm = "xorshift32"
//! max_chain_length = 8
//!
//! [derivation]
//! mutation_rate = 0.1
//!
//! [derivation.inheritance]
//! block_weight = 0.0
//!
//! [block_source]
//! base_url = "https://mempool.space/api"
//! ```

use crate::derivation::DerivationConfig;
use crate::rng::RngConfig;
use chainspawn_data::ParticleInitConfig;
use serde::{Deserialize, Serialize};

/// Upper bound for `block_source.max_retries`.
pub const MAX_BLOCK_RETRIES: u32 = 16;

/// Particle allocation defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParticleDefaults {
    /// Template used for every organism; its count is replaced by the
    /// organism's `particle_count` trait.
    pub template: ParticleInitConfig,
    /// Upper bound for one allocation chunk.
    pub memory_limit_bytes: usize,
}

impl Default for ParticleDefaults {
    fn default() -> Self {
        Self {
            template: ParticleInitConfig::default(),
            memory_limit_bytes: 1 << 20,
        }
    }
}

/// Esplora endpoint and retry policy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BlockSourceConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for BlockSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blockstream.info/api".to_string(),
            request_timeout_secs: 10,
            max_retries: 3,
            initial_backoff_ms: 250,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub rng: RngConfig,
    pub derivation: DerivationConfig,
    pub particles: ParticleDefaults,
    pub block_source: BlockSourceConfig,
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        // RNG validation
        anyhow::ensure!(
            self.rng.max_chain_length > 0,
            "Max chain length must be positive"
        );
        anyhow::ensure!(
            self.rng.min_block_height > 0,
            "Min block height must be positive"
        );

        // Derivation validation
        let weights = &self.derivation.inheritance;
        for (name, w) in [
            ("Parent 1 weight", weights.parent1_weight),
            ("Parent 2 weight", weights.parent2_weight),
            ("Mutation weight", weights.mutation_weight),
            ("Block weight", weights.block_weight),
        ] {
            anyhow::ensure!(w.is_finite() && w >= 0.0, "{} must be non-negative", name);
        }
        anyhow::ensure!(
            self.derivation.mutation_rate >= 0.0 && self.derivation.mutation_rate <= 1.0,
            "Mutation rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.derivation.mutation_strength >= 0.0,
            "Mutation strength must be non-negative"
        );
        anyhow::ensure!(
            self.derivation.perturbation_scale >= 0.0,
            "Perturbation scale must be non-negative"
        );

        // Particle validation
        let template = &self.particles.template;
        anyhow::ensure!(
            template.bounds.is_well_formed(),
            "Particle bounds must be finite with min <= max"
        );
        anyhow::ensure!(
            !template.role_weights.is_empty(),
            "Particle role weights cannot be empty"
        );
        anyhow::ensure!(
            template.emergent_probability >= 0.0 && template.emergent_probability <= 1.0,
            "Emergent probability must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.particles.memory_limit_bytes > 0,
            "Memory limit must be positive"
        );

        // Block source validation
        anyhow::ensure!(
            !self.block_source.base_url.trim().is_empty(),
            "Block source URL cannot be empty"
        );
        anyhow::ensure!(
            self.block_source.request_timeout_secs > 0,
            "Request timeout must be positive"
        );
        anyhow::ensure!(
            self.block_source.max_retries > 0
                && self.block_source.max_retries <= MAX_BLOCK_RETRIES,
            "Max retries must be in [1, {}]",
            MAX_BLOCK_RETRIES
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hash of every section that affects generated output.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.rng).as_bytes());
        hasher.update(format!("{:?}", self.derivation).as_bytes());
        hasher.update(format!("{:?}", self.particles.template).as_bytes());
        hex::encode(hasher.finalize())
    }
}
