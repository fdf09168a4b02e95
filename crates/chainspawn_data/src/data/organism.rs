use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// The four trait groups, in draw order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TraitCategory {
    /// Appearance (size, colour, shape).
    Visual,
    /// Movement and temperament.
    Behavioral,
    /// Body mechanics and particle budget.
    Physical,
    /// Heritability and fitness.
    Evolutionary,
}

impl TraitCategory {
    /// All categories in draw order.
    pub const ALL: [TraitCategory; 4] = [
        TraitCategory::Visual,
        TraitCategory::Behavioral,
        TraitCategory::Physical,
        TraitCategory::Evolutionary,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TraitCategory::Visual => "visual",
            TraitCategory::Behavioral => "behavioral",
            TraitCategory::Physical => "physical",
            TraitCategory::Evolutionary => "evolutionary",
        }
    }
}

impl fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trait value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TraitValue {
    /// Integral attribute (counts).
    Int(i64),
    /// Continuous attribute.
    Float(f64),
    /// Categorical attribute.
    Category(String),
}

impl TraitValue {
    /// Numeric view of the value; `None` for categories.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TraitValue::Int(v) => Some(*v as f64),
            TraitValue::Float(v) => Some(*v),
            TraitValue::Category(_) => None,
        }
    }

    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            TraitValue::Category(c) => Some(c.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraitValue::Int(v) => write!(f, "{v}"),
            TraitValue::Float(v) => write!(f, "{v:.4}"),
            TraitValue::Category(c) => f.write_str(c),
        }
    }
}

/// Flat mapping of named attributes within one category.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct TraitGroup {
    values: BTreeMap<String, TraitValue>,
}

impl TraitGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&TraitValue> {
        self.values.get(name)
    }

    /// Numeric value of `name`, converting integers.
    pub fn float(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(TraitValue::as_f64)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(TraitValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(TraitValue::as_category)
    }

    /// Inserts or replaces `name`, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: TraitValue) -> Option<TraitValue> {
        self.values.insert(name.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TraitValue)> {
        self.values.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One applied mutation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub timestamp: DateTime<Utc>,
    pub block_number: u64,
    pub category: TraitCategory,
    pub trait_name: String,
    pub previous_value: TraitValue,
    pub new_value: TraitValue,
    /// Fraction of the trait's range the value moved by.
    pub mutation_strength: f64,
}

/// Trait record of one organism.
///
/// Created once per `(block_number, parent_ids)` pair by the derivation
/// layer. Mutation produces a new value with the same `organism_id` and an
/// extended `mutation_history`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrganismTraits {
    pub organism_id: Uuid,
    pub block_number: u64,
    /// Parent ids, sorted ascending.
    #[serde(default)]
    pub parent_ids: Vec<Uuid>,
    /// 0 for genesis organisms, otherwise one more than the oldest parent.
    pub generation: u32,
    pub visual: TraitGroup,
    pub behavioral: TraitGroup,
    pub physical: TraitGroup,
    pub evolutionary: TraitGroup,
    #[serde(default)]
    pub mutation_history: Vec<MutationRecord>,
    /// Number of mutation passes applied so far.
    #[serde(default)]
    pub mutation_epoch: u32,
    pub generated_at: DateTime<Utc>,
}

impl OrganismTraits {
    /// Empty record with no traits populated.
    #[must_use]
    pub fn empty(organism_id: Uuid, block_number: u64) -> Self {
        Self {
            organism_id,
            block_number,
            parent_ids: Vec::new(),
            generation: 0,
            visual: TraitGroup::new(),
            behavioral: TraitGroup::new(),
            physical: TraitGroup::new(),
            evolutionary: TraitGroup::new(),
            mutation_history: Vec::new(),
            mutation_epoch: 0,
            generated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn group(&self, category: TraitCategory) -> &TraitGroup {
        match category {
            TraitCategory::Visual => &self.visual,
            TraitCategory::Behavioral => &self.behavioral,
            TraitCategory::Physical => &self.physical,
            TraitCategory::Evolutionary => &self.evolutionary,
        }
    }

    pub fn group_mut(&mut self, category: TraitCategory) -> &mut TraitGroup {
        match category {
            TraitCategory::Visual => &mut self.visual,
            TraitCategory::Behavioral => &mut self.behavioral,
            TraitCategory::Physical => &mut self.physical,
            TraitCategory::Evolutionary => &mut self.evolutionary,
        }
    }

    /// Particle budget assigned to this organism, if present.
    #[must_use]
    pub fn particle_count(&self) -> Option<usize> {
        self.physical
            .int("particle_count")
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Compares every deterministic field, skipping wall-clock timestamps.
    #[must_use]
    pub fn same_values(&self, other: &Self) -> bool {
        self.organism_id == other.organism_id
            && self.block_number == other.block_number
            && self.parent_ids == other.parent_ids
            && self.generation == other.generation
            && self.visual == other.visual
            && self.behavioral == other.behavioral
            && self.physical == other.physical
            && self.evolutionary == other.evolutionary
            && self.mutation_epoch == other.mutation_epoch
            && self.mutation_history.len() == other.mutation_history.len()
            && self
                .mutation_history
                .iter()
                .zip(&other.mutation_history)
                .all(|(a, b)| {
                    a.block_number == b.block_number
                        && a.category == b.category
                        && a.trait_name == b.trait_name
                        && a.previous_value == b.previous_value
                        && a.new_value == b.new_value
                        && a.mutation_strength == b.mutation_strength
                })
    }

    /// Serialize traits to hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(bytes)
    }

    /// Deserialize traits from hex string.
    pub fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let traits = serde_json::from_slice(&bytes)?;
        Ok(traits)
    }
}
