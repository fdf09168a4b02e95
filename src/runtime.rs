use crate::bootstrap::{startup_order, ServiceName, SERVICES};
use anyhow::Result;
use chainspawn_core::blockchain::{BlockSource, EsploraBlockSource, SyntheticBlockSource};
use chainspawn_core::config::AppConfig;
use chainspawn_core::derivation::DerivationEngine;
use chainspawn_core::error::CoreError;
use chainspawn_core::metrics::Metrics;
use chainspawn_core::rng::Prng;
use chainspawn_data::{OrganismTraits, ParticleAllocationResult};
use std::path::Path;
use std::sync::Arc;

/// Loads `path`, falling back to defaults when the file is absent.
///
/// A file that exists but fails to parse or validate is an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    AppConfig::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
}

/// Network source for `config`, or the synthetic one when `offline`.
#[must_use]
pub fn block_source_for(config: &AppConfig, offline: bool) -> Arc<dyn BlockSource> {
    if offline {
        Arc::new(SyntheticBlockSource)
    } else {
        Arc::new(EsploraBlockSource::new(&config.block_source))
    }
}

/// Fully assembled services of one generation session.
pub struct Runtime {
    config: AppConfig,
    block_source: Arc<dyn BlockSource>,
    metrics: Arc<Metrics>,
    derivation: DerivationEngine,
}

impl Runtime {
    /// Builds every service in dependency order.
    ///
    /// With `rng.use_bitcoin_seeding` set and a `seed_block` given, the root
    /// generator is seeded from that block before derivation starts.
    pub async fn assemble(
        config: AppConfig,
        block_source: Arc<dyn BlockSource>,
        seed_block: Option<u64>,
    ) -> Result<Self> {
        let mut metrics = None;
        let mut rng = None;
        let mut derivation = None;

        for service in startup_order(SERVICES)? {
            tracing::debug!(service = %service, "Starting service");
            match service {
                ServiceName::Config => config.validate()?,
                ServiceName::Metrics => metrics = Some(Arc::new(Metrics::new())),
                ServiceName::BlockSource => {}
                ServiceName::Rng => {
                    let mut prng = Prng::new(config.rng.clone());
                    if let (true, Some(height)) = (config.rng.use_bitcoin_seeding, seed_block) {
                        prng.seed_from_block(block_source.as_ref(), height).await?;
                    }
                    rng = Some(prng);
                }
                ServiceName::Derivation => {
                    let prng = rng.take().ok_or_else(|| missing(service, ServiceName::Rng))?;
                    let shared = metrics
                        .clone()
                        .ok_or_else(|| missing(service, ServiceName::Metrics))?;
                    derivation =
                        Some(DerivationEngine::new(prng, config.derivation).with_metrics(shared));
                }
            }
        }

        let metrics = metrics.ok_or_else(|| missing(ServiceName::Derivation, ServiceName::Metrics))?;
        let derivation = derivation.ok_or_else(|| CoreError::startup("derivation was not built"))?;
        tracing::info!(
            seed = derivation.rng().base_seed(),
            algorithm = derivation.rng().algorithm().name(),
            fingerprint = %config.fingerprint(),
            "Runtime assembled"
        );
        Ok(Self {
            config,
            block_source,
            metrics,
            derivation,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    #[must_use]
    pub fn engine(&self) -> &DerivationEngine {
        &self.derivation
    }

    pub fn engine_mut(&mut self) -> &mut DerivationEngine {
        &mut self.derivation
    }

    /// Reseeds the root generator from `height`.
    pub async fn seed_from_block(&mut self, height: u64) -> chainspawn_core::Result<u32> {
        let source = Arc::clone(&self.block_source);
        self.derivation
            .rng_mut()
            .seed_from_block(source.as_ref(), height)
            .await
    }

    /// Particles for `traits` using the configured template.
    pub fn particles(&self, traits: &OrganismTraits) -> chainspawn_core::Result<ParticleAllocationResult> {
        self.derivation
            .particles_for(traits, &self.config.particles.template)
    }
}

fn missing(service: ServiceName, dependency: ServiceName) -> CoreError {
    CoreError::startup(format!("{service} started before {dependency}"))
}
