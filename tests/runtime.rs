mod common;

use chainspawn_core::blockchain::{block_seed, SyntheticBlockSource};
use chainspawn_core::config::AppConfig;
use chainspawn_lib::bootstrap::{startup_order, ServiceName, SERVICES};
use chainspawn_lib::{block_source_for, load_config, Runtime};
use common::{CountingSource, FailingSource};
use std::sync::Arc;

fn seeded_config(seed: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.rng.default_seed = Some(seed);
    config
}

#[test]
fn test_rng_starts_after_its_dependencies() {
    let order = startup_order(SERVICES).unwrap();
    let at = |name: ServiceName| order.iter().position(|&n| n == name).unwrap();
    assert!(at(ServiceName::Config) < at(ServiceName::Rng));
    assert!(at(ServiceName::BlockSource) < at(ServiceName::Rng));
    assert!(at(ServiceName::Rng) < at(ServiceName::Derivation));
    assert!(at(ServiceName::Metrics) < at(ServiceName::Derivation));
}

#[tokio::test]
async fn test_assemble_without_block_seeding() {
    let source = Arc::new(CountingSource::new());
    let runtime = Runtime::assemble(seeded_config(42), source.clone(), Some(800_000))
        .await
        .unwrap();
    assert_eq!(runtime.engine().rng().base_seed(), 42);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_assemble_with_block_seeding() {
    let mut config = seeded_config(42);
    config.rng.use_bitcoin_seeding = true;
    let source = Arc::new(CountingSource::new());

    let mut runtime = Runtime::assemble(config, source.clone(), Some(800_000))
        .await
        .unwrap();
    let expected = block_seed(&SyntheticBlockSource::block(800_000)).unwrap();
    assert_eq!(runtime.engine().rng().base_seed(), expected);
    assert_eq!(source.calls(), 1);

    let traits = runtime.engine_mut().generate_traits(800_000, &[]).unwrap();
    assert_traits_in_schema!(traits);
    let particles = runtime.particles(&traits).unwrap();
    assert_conserved!(particles);
    assert_eq!(runtime.metrics().organisms_generated(), 1);
    assert_eq!(
        runtime.metrics().particles_allocated(),
        particles.particles.len() as u64
    );
}

#[tokio::test]
async fn test_assemble_fails_when_seeding_fails() {
    let mut config = seeded_config(42);
    config.rng.use_bitcoin_seeding = true;
    let result = Runtime::assemble(config, Arc::new(FailingSource), Some(800_000)).await;
    let err = result.err().unwrap();
    assert!(err.to_string().contains("800000"));
}

#[tokio::test]
async fn test_assemble_rejects_invalid_config() {
    let mut config = seeded_config(42);
    config.derivation.mutation_rate = 2.0;
    let result = Runtime::assemble(config, Arc::new(SyntheticBlockSource), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_offline_runtime_reseeds() {
    let config = seeded_config(1);
    let source = block_source_for(&config, true);
    let mut runtime = Runtime::assemble(config, source, None).await.unwrap();
    let seed = runtime.seed_from_block(123).await.unwrap();
    assert_eq!(seed, block_seed(&SyntheticBlockSource::block(123)).unwrap());
    assert_eq!(runtime.engine().rng().base_seed(), seed);
}

#[test]
fn test_load_config_defaults_and_files() {
    let missing = std::env::temp_dir().join("chainspawn-missing-config.toml");
    let _ = std::fs::remove_file(&missing);
    assert_eq!(load_config(&missing).unwrap(), AppConfig::default());

    let path = std::env::temp_dir().join(format!("chainspawn-{}.toml", std::process::id()));
    std::fs::write(&path, "[rng]\ndefault_seed = 9\nalgorithm = \"mersenne\"\n").unwrap();
    let config = load_config(&path).unwrap();
    assert_eq!(config.rng.default_seed, Some(9));
    assert_eq!(config.rng.algorithm, "mersenne");

    std::fs::write(&path, "[derivation]\nmutation_rate = 3.0\n").unwrap();
    assert!(load_config(&path).is_err());
    let _ = std::fs::remove_file(&path);
}
