mod common;

use chainspawn_core::analysis::validate_allocation;
use chainspawn_core::error::CoreError;
use chainspawn_core::schema::{TraitDomain, SCHEMA};
use chainspawn_data::{ParticleInitConfig, TraitCategory};
use common::{organism_with, EngineBuilder};
use uuid::Uuid;

#[test]
fn test_genesis_block_800000() {
    let mut engine = EngineBuilder::new().build();
    let traits = engine.generate_traits(800_000, &[]).unwrap();

    assert_traits_in_schema!(traits);
    assert_eq!(traits.block_number, 800_000);
    assert_eq!(traits.generation, 0);
    assert!(traits.parent_ids.is_empty());

    let count = traits.particle_count().unwrap();
    assert!((100..1000).contains(&count));

    let particles = engine
        .particles_for(&traits, &ParticleInitConfig::default())
        .unwrap();
    assert_eq!(particles.particles.len(), count);
    assert!(validate_allocation(&particles));
    assert_conserved!(particles);

    let mut again = EngineBuilder::new().build();
    let replay = again.generate_traits(800_000, &[]).unwrap();
    assert!(replay.same_values(&traits));
    let replay_particles = again
        .particles_for(&replay, &ParticleInitConfig::default())
        .unwrap();
    assert_eq!(replay_particles.particles, particles.particles);
}

#[test]
fn test_inheritance_block_800001() {
    let org_a = organism_with(42, 799_998, &[(TraitCategory::Visual, "size", 1.0)]);
    let org_b = organism_with(42, 799_999, &[(TraitCategory::Visual, "size", 1.5)]);
    assert_ne!(org_a.organism_id, org_b.organism_id);

    let mut engine = EngineBuilder::new()
        .with_weights(0.5, 0.5, 0.0, 0.0)
        .with_organism(org_a.clone())
        .with_organism(org_b.clone())
        .build();
    let child = engine
        .generate_traits(800_001, &[org_a.organism_id, org_b.organism_id])
        .unwrap();

    assert_close!(child.visual.float("size").unwrap(), 1.25, 1e-9);
    assert_eq!(child.generation, 1);
    assert_traits_in_schema!(child);

    // Every numeric field is the midpoint of its parents.
    for &(category, specs) in &SCHEMA {
        for spec in specs {
            if let TraitDomain::Float { .. } = spec.domain {
                let a = org_a.group(category).float(spec.name).unwrap();
                let b = org_b.group(category).float(spec.name).unwrap();
                let c = child.group(category).float(spec.name).unwrap();
                assert_close!(c, (a + b) / 2.0, 1e-9);
            }
        }
    }
}

#[test]
fn test_parent_order_does_not_matter() {
    let org_a = organism_with(42, 10, &[]);
    let org_b = organism_with(42, 11, &[]);

    let mut forward = EngineBuilder::new()
        .with_organism(org_a.clone())
        .with_organism(org_b.clone())
        .build();
    let mut backward = EngineBuilder::new()
        .with_organism(org_a.clone())
        .with_organism(org_b.clone())
        .build();

    let x = forward
        .generate_traits(12, &[org_a.organism_id, org_b.organism_id])
        .unwrap();
    let y = backward
        .generate_traits(12, &[org_b.organism_id, org_a.organism_id])
        .unwrap();
    assert!(x.same_values(&y));
}

#[test]
fn test_block_weight_pulls_towards_fresh_draw() {
    let org_a = organism_with(42, 20, &[(TraitCategory::Visual, "size", 0.5)]);
    let org_b = organism_with(42, 21, &[(TraitCategory::Visual, "size", 0.5)]);
    let mut engine = EngineBuilder::new()
        .with_weights(0.0, 0.0, 0.0, 1.0)
        .with_organism(org_a.clone())
        .with_organism(org_b.clone())
        .build();
    let child = engine
        .generate_traits(22, &[org_a.organism_id, org_b.organism_id])
        .unwrap();
    assert_traits_in_schema!(child);
    assert_ne!(child.visual.float("size"), Some(0.5));
}

#[test]
fn test_unknown_parent_fails() {
    let mut engine = EngineBuilder::new().build();
    let ghost = Uuid::from_u128(7);
    let err = engine.generate_traits(1, &[ghost]).unwrap_err();
    assert_eq!(err, CoreError::UnknownOrganism(ghost));
}

#[test]
fn test_three_parents_use_first_two() {
    let mut engine = EngineBuilder::new().build();
    let ids: Vec<Uuid> = (0..3)
        .map(|i| engine.generate_traits(100 + i, &[]).unwrap().organism_id)
        .collect();
    let child = engine.generate_traits(200, &ids).unwrap();
    assert_eq!(child.parent_ids.len(), 3);
    assert_eq!(child.generation, 1);
    assert_traits_in_schema!(child);
}

#[test]
fn test_multi_generation_lineage() {
    let mut engine = EngineBuilder::new().build();
    let a = engine.generate_traits(1, &[]).unwrap();
    let b = engine.generate_traits(2, &[]).unwrap();
    let ab = engine.generate_traits(3, &[a.organism_id, b.organism_id]).unwrap();
    let c = engine.generate_traits(4, &[]).unwrap();
    let abc = engine.generate_traits(5, &[ab.organism_id, c.organism_id]).unwrap();
    assert_eq!(ab.generation, 1);
    assert_eq!(abc.generation, 2);
}

#[test]
fn test_mutation_history_and_epochs() {
    let mut engine = EngineBuilder::new().build();
    let traits = engine.generate_traits(800_000, &[]).unwrap();
    let first = engine.mutate_traits(&traits, Some(1.0));
    let second = engine.mutate_traits(&first, Some(1.0));

    assert_eq!(first.mutation_epoch, 1);
    assert_eq!(second.mutation_epoch, 2);
    assert!(second.mutation_history.len() > first.mutation_history.len());
    assert_traits_in_schema!(second);
    assert_eq!(second.particle_count(), traits.particle_count());
    for record in &second.mutation_history {
        assert_eq!(record.block_number, 800_000);
        assert!(record.mutation_strength > 0.0 && record.mutation_strength <= 1.0);
    }

    let serialized = second.to_hex();
    let restored = chainspawn_data::OrganismTraits::from_hex(&serialized).unwrap();
    assert!(restored.same_values(&second));
}

#[test]
fn test_parallel_population_matches_sequential() {
    let blocks: Vec<u64> = (800_000..800_064).collect();

    let mut parallel = EngineBuilder::new().build();
    let population = parallel.generate_population(&blocks);

    let mut sequential = EngineBuilder::new().build();
    for (organism, &block) in population.iter().zip(&blocks) {
        let expected = sequential.generate_traits(block, &[]).unwrap();
        assert!(organism.same_values(&expected), "block {block}");
    }
    assert_eq!(parallel.sequence(), sequential.sequence());
}
