use serde::{Deserialize, Serialize};

/// Block metadata consumed for seeding.
///
/// Field aliases accept both the Bitcoin Core RPC names (`merkleroot`,
/// `time`) and the Esplora REST names (`id`, `merkle_root`, `timestamp`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block hash as big-endian hex.
    #[serde(alias = "id")]
    pub hash: String,
    /// Merkle root as hex.
    #[serde(alias = "merkleroot")]
    pub merkle_root: String,
    /// Block height.
    pub height: u64,
    /// Block timestamp (unix seconds).
    #[serde(alias = "timestamp")]
    pub time: i64,
    /// Header nonce.
    #[serde(default)]
    pub nonce: u64,
    /// Previous block hash, absent for genesis.
    #[serde(default, alias = "previousblockhash")]
    pub previous_block_hash: Option<String>,
}
