use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete mutable state of one generator stream.
///
/// `seed` alone determines every future output. `counter` and `chain_length`
/// are bookkeeping carried through serialization so a restored stream reports
/// the same diagnostics; `last_modified` is purely informational and is
/// ignored by equality.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RngState {
    /// Current generator state.
    pub seed: u32,
    /// Values produced since the last (re)seed.
    pub counter: u64,
    /// Rehash operations since the last explicit seed.
    pub chain_length: u32,
    /// Wall-clock time of the last reseed, rehash or restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl RngState {
    /// Fresh state for `seed` with zeroed counters.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            counter: 0,
            chain_length: 0,
            last_modified: None,
        }
    }

    /// Stamps `last_modified` with the current time.
    pub fn touch(&mut self) {
        self.last_modified = Some(Utc::now());
    }

    /// Serializes the persisted layout (`seed`, `counter`, `chain_length`) to JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let persisted = Self {
            last_modified: None,
            ..self.clone()
        };
        Ok(serde_json::to_string(&persisted)?)
    }

    /// Restores state from the persisted JSON layout.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl PartialEq for RngState {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed
            && self.counter == other.counter
            && self.chain_length == other.chain_length
    }
}

impl Eq for RngState {}
