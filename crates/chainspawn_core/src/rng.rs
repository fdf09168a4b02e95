//! Deterministic pseudo-random number generation.
//!
//! A [`Prng`] is a 32-bit state generator whose entire future output is fixed
//! by [`RngState::seed`]. Named sub-streams are derived with
//! [`Prng::derive_stream`], which mixes a purpose label into the most recent
//! explicit seed, so unrelated features never share a sequence.
//!
//! Range conventions: every `min..max` range is half-open, `max` is never
//! returned. A degenerate range (`min >= max`) returns `min` and still
//! consumes one draw, keeping the position in the stream independent of the
//! arguments.

use crate::blockchain::{block_seed, BlockSource};
use crate::error::{CoreError, Result};
use chainspawn_data::RngState;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Lowest block height accepted by [`Prng::seed_from_block`].
pub const MIN_BLOCK_HEIGHT: u64 = 1;

/// Default bound on consecutive rehashes.
pub const DEFAULT_MAX_CHAIN_LENGTH: u32 = 16;

const XORSHIFT_ZERO_ESCAPE: u32 = 0x9E37_79B9;

/// Bit-mixing function applied to the 32-bit state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Weyl sequence with the mulberry32 output mix. Period 2^32.
    #[default]
    Mulberry32,
    /// Marsaglia xorshift (13, 17, 5). Period 2^32 - 1; a zero state is
    /// replaced by a fixed non-zero constant before stepping.
    Xorshift32,
    /// Numerical Recipes LCG (1664525, 1013904223). Period 2^32.
    Lcg,
    /// MT19937 initialisation recurrence and tempering applied to a Weyl
    /// sequence. Period 2^32.
    Mersenne,
}

impl Algorithm {
    /// Resolves a configured name, falling back to [`Algorithm::Mulberry32`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mulberry32" | "mulberry" => Algorithm::Mulberry32,
            "xorshift32" | "xorshift" => Algorithm::Xorshift32,
            "lcg" | "linear-congruential" | "linear_congruential" => Algorithm::Lcg,
            "mersenne" | "mersenne-twister" | "mersenne_twister" | "mt19937" => {
                Algorithm::Mersenne
            }
            other => {
                tracing::warn!(
                    algorithm = other,
                    fallback = "mulberry32",
                    "Unknown RNG algorithm"
                );
                Algorithm::Mulberry32
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Mulberry32 => "mulberry32",
            Algorithm::Xorshift32 => "xorshift32",
            Algorithm::Lcg => "lcg",
            Algorithm::Mersenne => "mersenne",
        }
    }

    /// Advances `state` and returns the next output.
    fn step(self, state: &mut u32) -> u32 {
        match self {
            Algorithm::Mulberry32 => {
                *state = state.wrapping_add(0x6D2B_79F5);
                let mut t = *state;
                t = (t ^ (t >> 15)).wrapping_mul(t | 1);
                t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
                t ^ (t >> 14)
            }
            Algorithm::Xorshift32 => {
                let mut x = if *state == 0 {
                    XORSHIFT_ZERO_ESCAPE
                } else {
                    *state
                };
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                *state = x;
                x
            }
            Algorithm::Lcg => {
                *state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                *state
            }
            Algorithm::Mersenne => {
                *state = state.wrapping_add(0x9E37_79B9);
                let mut y = 1_812_433_253u32
                    .wrapping_mul(*state ^ (*state >> 30))
                    .wrapping_add(1);
                y ^= y >> 11;
                y ^= (y << 7) & 0x9D2C_5680;
                y ^= (y << 15) & 0xEFC6_0000;
                y ^ (y >> 18)
            }
        }
    }
}

/// Generator configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RngConfig {
    /// Seed used by `initialize`; OS entropy when absent.
    pub default_seed: Option<u32>,
    /// Whether the runtime seeds its root generator from a block at startup.
    pub use_bitcoin_seeding: bool,
    pub max_chain_length: u32,
    /// Algorithm name, see [`Algorithm::from_name`].
    pub algorithm: String,
    pub min_block_height: u64,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            default_seed: None,
            use_bitcoin_seeding: false,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
            algorithm: Algorithm::Mulberry32.name().to_string(),
            min_block_height: MIN_BLOCK_HEIGHT,
        }
    }
}

/// Options for [`Prng::random_array`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RandomArrayOptions {
    /// Lower bound, 0.0 when absent.
    pub min: Option<f64>,
    /// Exclusive upper bound, 1.0 when absent.
    pub max: Option<f64>,
    pub count: usize,
    /// Temporary seed; the prior state is restored afterwards.
    pub seed: Option<u32>,
}

/// Seedable deterministic generator.
///
/// Not synchronised: one owner at a time. Parallel consumers should each
/// take their own [`PurposeStream`].
#[derive(Debug, Clone)]
pub struct Prng {
    config: RngConfig,
    algorithm: Algorithm,
    base_seed: u32,
    state: RngState,
}

impl Prng {
    /// Creates a generator and runs [`Prng::initialize`].
    #[must_use]
    pub fn new(config: RngConfig) -> Self {
        let algorithm = Algorithm::from_name(&config.algorithm);
        let seed = config.default_seed.unwrap_or_else(entropy_seed);
        let mut state = RngState::new(seed);
        state.touch();
        Self {
            config,
            algorithm,
            base_seed: seed,
            state,
        }
    }

    /// Default configuration seeded with `seed`.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self::new(RngConfig {
            default_seed: Some(seed),
            ..RngConfig::default()
        })
    }

    /// Replaces the configuration and resets to its default seed.
    pub fn initialize(&mut self, config: RngConfig) {
        *self = Self::new(config);
        tracing::debug!(
            seed = self.base_seed,
            algorithm = self.algorithm.name(),
            "RNG initialized"
        );
    }

    #[must_use]
    pub fn config(&self) -> &RngConfig {
        &self.config
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Most recent explicit seed; the root of derived streams.
    #[must_use]
    pub fn base_seed(&self) -> u32 {
        self.base_seed
    }

    /// Replaces the seed and clears counter and chain length.
    pub fn set_seed(&mut self, seed: u32) {
        self.base_seed = seed;
        self.state = RngState::new(seed);
        self.state.touch();
    }

    /// Seeds from block metadata fetched through `source`.
    ///
    /// Heights below the configured minimum fail without contacting the
    /// source. The new seed is applied only once the fetch has completed and
    /// the seed was derived, so a failed or dropped call leaves the state as
    /// it was.
    pub async fn seed_from_block<S>(&mut self, source: &S, height: u64) -> Result<u32>
    where
        S: BlockSource + ?Sized,
    {
        let min = self.config.min_block_height;
        if height < min {
            return Err(CoreError::seed_source(
                height,
                format!("below minimum block height {min}"),
            ));
        }

        let info = source
            .block_info(height)
            .await
            .map_err(|e| CoreError::seed_source(height, e.to_string()))?;
        if info.height != height {
            return Err(CoreError::seed_source(
                height,
                format!("source returned block {}", info.height),
            ));
        }
        let seed = block_seed(&info).map_err(|e| CoreError::seed_source(height, e.to_string()))?;

        self.set_seed(seed);
        tracing::info!(height = height, seed = seed, hash = %info.hash, "Seeded from block");
        Ok(seed)
    }

    fn step(&mut self) -> u32 {
        self.state.counter += 1;
        self.algorithm.step(&mut self.state.seed)
    }

    /// Uniform value in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        f64::from(self.step()) / 4_294_967_296.0
    }

    /// Uniform integer in `[min, max)`.
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        let r = self.step();
        if min >= max {
            return min;
        }
        let span = (i128::from(max) - i128::from(min)) as u128;
        let offset = (u128::from(r) * span) >> 32;
        (i128::from(min) + offset as i128) as i64
    }

    /// Uniform float in `[min, max)`.
    pub fn random_float(&mut self, min: f64, max: f64) -> f64 {
        let r = self.random();
        // Written negated so NaN bounds also take the degenerate path.
        if !(min < max) {
            return min;
        }
        // Interpolated so ranges wider than f64::MAX stay finite.
        let value = (min * (1.0 - r) + max * r).max(min);
        if value < max {
            value
        } else {
            next_below(max).max(min)
        }
    }

    /// Uniform index in `[0, len)`; 0 for empty collections.
    pub fn random_index(&mut self, len: usize) -> usize {
        self.random_int(0, len as i64) as usize
    }

    /// `count` floats, optionally from a temporary seed.
    pub fn random_array(&mut self, options: &RandomArrayOptions) -> Vec<f64> {
        let min = options.min.unwrap_or(0.0);
        let max = options.max.unwrap_or(1.0);
        let saved = options.seed.map(|seed| {
            let snapshot = (self.base_seed, self.state.clone());
            self.set_seed(seed);
            snapshot
        });

        let values = (0..options.count)
            .map(|_| self.random_float(min, max))
            .collect();

        if let Some((base_seed, state)) = saved {
            self.base_seed = base_seed;
            self.state = state;
        }
        values
    }

    /// Independent stream for `purpose`. Does not touch this generator.
    #[must_use]
    pub fn derive_stream(&self, purpose: &str) -> PurposeStream {
        let derived_seed = derive_seed(self.base_seed, purpose);
        PurposeStream {
            purpose: purpose.to_string(),
            derived_seed,
            rng: self.fork(derived_seed),
        }
    }

    fn fork(&self, seed: u32) -> Self {
        let mut config = self.config.clone();
        config.default_seed = Some(seed);
        Self {
            config,
            algorithm: self.algorithm,
            base_seed: seed,
            state: RngState::new(seed),
        }
    }

    /// Feeds one generation step back in as the seed.
    ///
    /// Counts towards `max_chain_length`; once reached, only an explicit
    /// [`Prng::set_seed`] (or block seeding) re-enables rehashing.
    pub fn rehash(&mut self) -> Result<u32> {
        let max = self.config.max_chain_length;
        if self.state.chain_length >= max {
            tracing::warn!(max = max, "Rehash chain exhausted");
            return Err(CoreError::ChainLengthExceeded { max });
        }
        let next = self.step();
        let chain_length = self.state.chain_length + 1;
        self.state = RngState::new(next);
        self.state.chain_length = chain_length;
        self.state.touch();
        tracing::debug!(seed = next, chain_length = chain_length, "RNG rehashed");
        Ok(next)
    }

    #[must_use]
    pub fn state(&self) -> RngState {
        self.state.clone()
    }

    /// Restores a captured state. The derivation root (`base_seed`) is kept.
    pub fn set_state(&mut self, state: RngState) {
        self.state = state;
        self.state.touch();
    }

    /// Returns to the most recent explicit seed.
    pub fn reset(&mut self) {
        self.state = RngState::new(self.base_seed);
        self.state.touch();
    }
}

impl RngCore for Prng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.step());
        let hi = u64::from(self.step());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Generator isolated under a purpose label.
#[derive(Debug, Clone)]
pub struct PurposeStream {
    pub purpose: String,
    pub derived_seed: u32,
    rng: Prng,
}

impl PurposeStream {
    pub fn rng(&mut self) -> &mut Prng {
        &mut self.rng
    }

    #[must_use]
    pub fn state(&self) -> RngState {
        self.rng.state()
    }

    #[must_use]
    pub fn into_rng(self) -> Prng {
        self.rng
    }
}

/// Seed of the stream labelled `purpose` under `root_seed`.
#[must_use]
pub fn derive_seed(root_seed: u32, purpose: &str) -> u32 {
    let mixed = splitmix64((u64::from(root_seed) << 32) ^ fnv1a64(purpose.as_bytes()));
    (mixed ^ (mixed >> 32)) as u32
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xCBF2_9CE4_8422_2325u64;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn entropy_seed() -> u32 {
    rand::rngs::OsRng.next_u32()
}

/// Largest float strictly below `x`.
pub(crate) fn next_below(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x < 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}
