use crate::config::BlockSourceConfig;
use anyhow::Result;
use async_trait::async_trait;
use chainspawn_data::BlockInfo;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;

/// Bitcoin genesis timestamp, used by the synthetic source.
const GENESIS_TIME: i64 = 1_231_006_505;

#[async_trait]
pub trait BlockSource: Send + Sync {
    async fn block_info(&self, height: u64) -> Result<BlockInfo>;
}

/// Seed for a block: the first four bytes, big-endian, of
/// `SHA-256(hash_bytes || merkle_root_bytes)`.
///
/// Hashing first matters because displayed block hashes begin with long runs
/// of zero bytes.
pub fn block_seed(info: &BlockInfo) -> Result<u32> {
    let hash = hex::decode(info.hash.trim())?;
    let merkle = hex::decode(info.merkle_root.trim())?;
    anyhow::ensure!(!hash.is_empty(), "Block hash cannot be empty");

    let digest = Sha256::new()
        .chain_update(&hash)
        .chain_update(&merkle)
        .finalize();
    Ok(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Esplora-compatible REST client (blockstream.info, mempool.space).
pub struct EsploraBlockSource {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl EsploraBlockSource {
    #[must_use]
    pub fn new(config: &BlockSourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..self.max_retries {
            let response = self
                .client
                .get(url)
                .timeout(self.request_timeout)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if resp.status().is_success() {
                        return Ok(resp);
                    }

                    let status = resp.status();
                    let is_transient = status.is_server_error() || status == 429;

                    if !is_transient || attempt == self.max_retries - 1 {
                        return Err(anyhow::anyhow!("Block API returned error: {}", status));
                    }

                    last_error = Some(anyhow::anyhow!("Block API returned error: {}", status));
                }
                Err(e) => {
                    let is_timeout = e.is_timeout() || e.is_connect();
                    if !is_timeout || attempt == self.max_retries - 1 {
                        return Err(anyhow::anyhow!("Block API request failed: {}", e));
                    }

                    last_error = Some(anyhow::anyhow!("Block API request failed: {}", e));
                }
            }

            if attempt < self.max_retries - 1 {
                let backoff = backoff_delay(self.initial_backoff, attempt);
                tracing::debug!(
                    url = url,
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying block API request"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown block API error")))
    }
}

/// Delay before retry `attempt + 1`: `initial * 2^attempt`, saturating.
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial.saturating_mul(2_u32.saturating_pow(attempt))
}

#[async_trait]
impl BlockSource for EsploraBlockSource {
    async fn block_info(&self, height: u64) -> Result<BlockInfo> {
        let hash_url = format!("{}/block-height/{}", self.base_url, height);
        let hash = self.get_with_retry(&hash_url).await?.text().await?;
        let hash = hash.trim();
        anyhow::ensure!(
            hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit()),
            "Invalid block hash for height {}: {:?}",
            height,
            hash
        );

        let block_url = format!("{}/block/{}", self.base_url, hash);
        let info: BlockInfo = self.get_with_retry(&block_url).await?.json().await?;
        anyhow::ensure!(
            info.height == height,
            "Block API returned height {} for {}",
            info.height,
            height
        );
        Ok(info)
    }
}

/// In-memory blocks, for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticBlockSource {
    blocks: HashMap<u64, BlockInfo>,
}

impl StaticBlockSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: BlockInfo) {
        self.blocks.insert(info.height, info);
    }

    #[must_use]
    pub fn with_block(mut self, info: BlockInfo) -> Self {
        self.insert(info);
        self
    }
}

#[async_trait]
impl BlockSource for StaticBlockSource {
    async fn block_info(&self, height: u64) -> Result<BlockInfo> {
        self.blocks
            .get(&height)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Block {} not available", height))
    }
}

/// Offline source fabricating stable block data from the height alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticBlockSource;

impl SyntheticBlockSource {
    #[must_use]
    pub fn block(height: u64) -> BlockInfo {
        let hash = Sha256::new()
            .chain_update(b"chainspawn-synthetic")
            .chain_update(height.to_be_bytes())
            .finalize();
        let merkle = Sha256::digest(hash);
        let mut rng = ChaCha8Rng::seed_from_u64(height);
        BlockInfo {
            hash: hex::encode(hash),
            merkle_root: hex::encode(merkle),
            height,
            time: GENESIS_TIME + height as i64 * 600,
            nonce: u64::from(rng.next_u32()),
            previous_block_hash: None,
        }
    }
}

#[async_trait]
impl BlockSource for SyntheticBlockSource {
    async fn block_info(&self, height: u64) -> Result<BlockInfo> {
        Ok(Self::block(height))
    }
}
