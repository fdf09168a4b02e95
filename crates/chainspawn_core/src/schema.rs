//! Trait schema: which fields each group carries, their domains, and the
//! order in which they are drawn.
//!
//! The order of [`SCHEMA`] and of the fields inside each group is part of the
//! reproducibility contract. Reordering, inserting or removing a field shifts
//! every later draw and changes every organism.

use chainspawn_data::{TraitCategory, TraitValue};

/// Value domain of a trait. Numeric ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraitDomain {
    Float { min: f64, max: f64 },
    Int { min: i64, max: i64 },
    Categorical(&'static [&'static str]),
}

impl TraitDomain {
    /// Whether `value` has the right kind and lies inside the domain.
    #[must_use]
    pub fn contains(&self, value: &TraitValue) -> bool {
        match (self, value) {
            (TraitDomain::Float { min, max }, TraitValue::Float(v)) => *v >= *min && *v < *max,
            (TraitDomain::Int { min, max }, TraitValue::Int(v)) => *v >= *min && *v < *max,
            (TraitDomain::Categorical(options), TraitValue::Category(c)) => {
                options.contains(&c.as_str())
            }
            _ => false,
        }
    }

    /// Width of a numeric range; 0 for categories.
    #[must_use]
    pub fn span(&self) -> f64 {
        match self {
            TraitDomain::Float { min, max } => max - min,
            TraitDomain::Int { min, max } => (max - min) as f64,
            TraitDomain::Categorical(_) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitSpec {
    pub name: &'static str,
    pub domain: TraitDomain,
    /// Whether `mutate_traits` may change the field.
    pub mutable: bool,
}

const fn float(name: &'static str, min: f64, max: f64) -> TraitSpec {
    TraitSpec {
        name,
        domain: TraitDomain::Float { min, max },
        mutable: true,
    }
}

const fn categorical(name: &'static str, options: &'static [&'static str]) -> TraitSpec {
    TraitSpec {
        name,
        domain: TraitDomain::Categorical(options),
        mutable: true,
    }
}

pub const SHAPES: &[&str] = &["sphere", "cube", "tetrahedron", "torus", "helix"];
pub const MOVEMENT_PATTERNS: &[&str] = &["linear", "orbital", "spiral", "random", "flocking"];

pub const VISUAL: &[TraitSpec] = &[
    float("size", 0.5, 2.0),
    float("hue", 0.0, 360.0),
    float("saturation", 0.3, 1.0),
    float("brightness", 0.3, 1.0),
    float("opacity", 0.5, 1.0),
    float("glow_intensity", 0.0, 1.0),
    categorical("shape", SHAPES),
];

pub const BEHAVIORAL: &[TraitSpec] = &[
    float("speed", 0.1, 2.0),
    float("aggression", 0.0, 1.0),
    float("sociability", 0.0, 1.0),
    float("curiosity", 0.0, 1.0),
    float("energy_efficiency", 0.5, 1.5),
    categorical("movement_pattern", MOVEMENT_PATTERNS),
];

pub const PHYSICAL: &[TraitSpec] = &[
    float("mass", 0.5, 5.0),
    float("density", 0.5, 2.0),
    float("elasticity", 0.0, 1.0),
    float("friction", 0.0, 1.0),
    TraitSpec {
        name: "particle_count",
        domain: TraitDomain::Int {
            min: 100,
            max: 1000,
        },
        mutable: false,
    },
];

pub const EVOLUTIONARY: &[TraitSpec] = &[
    float("mutation_rate", 0.001, 0.1),
    float("fitness", 0.0, 1.0),
    float("adaptability", 0.0, 1.0),
    float("longevity", 0.5, 2.0),
    float("reproduction_rate", 0.0, 1.0),
];

/// Every group in draw order.
pub const SCHEMA: [(TraitCategory, &[TraitSpec]); 4] = [
    (TraitCategory::Visual, VISUAL),
    (TraitCategory::Behavioral, BEHAVIORAL),
    (TraitCategory::Physical, PHYSICAL),
    (TraitCategory::Evolutionary, EVOLUTIONARY),
];

#[must_use]
pub fn fields(category: TraitCategory) -> &'static [TraitSpec] {
    match category {
        TraitCategory::Visual => VISUAL,
        TraitCategory::Behavioral => BEHAVIORAL,
        TraitCategory::Physical => PHYSICAL,
        TraitCategory::Evolutionary => EVOLUTIONARY,
    }
}

#[must_use]
pub fn lookup(category: TraitCategory, name: &str) -> Option<&'static TraitSpec> {
    fields(category).iter().find(|spec| spec.name == name)
}
