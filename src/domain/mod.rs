pub mod totals;
pub mod units;

pub use totals::{BlockTotals, TOKEN_TRANSFER_SELECTOR};
pub use units::to_ether;

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Deserializer};

/// One transaction as far as block classification is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// `None` for contract creation.
    pub to: Option<Address>,
    /// Carried value in wei.
    pub value: U256,
    pub input: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub hash: B256,
    pub transactions: Vec<Transaction>,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub nonce: u64,
    pub difficulty: U256,
    pub uncles: usize,
    pub size: ReportedSize,
}

/// Block size as the node client formats it.
///
/// The client always renders kilobytes (`"12.345 kB"`), which is the unit
/// [`BlockTotals`] assumes when it converts back to bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportedSize(String);

impl ReportedSize {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn from_bytes(bytes: u64) -> Self {
        Self(format!("{:.3} kB", bytes as f64 / 1000.0))
    }

    /// Leading numeric token scaled by 1000, rounded to whole bytes.
    ///
    /// A size reported in any other unit comes out wrong; there is no
    /// unit detection. Unparsable text yields 0.
    pub fn to_bytes(&self) -> f64 {
        self.0
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<f64>().ok())
            .map(|kb| (kb * 1000.0).round())
            .unwrap_or(0.0)
    }
}

/// The `eth_syncing` object, reduced to the counters the exporter reports.
/// Counters a node leaves out read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    #[serde(default, deserialize_with = "quantity")]
    pub known_states: u64,
    #[serde(default, deserialize_with = "quantity")]
    pub highest_block: u64,
    #[serde(default, deserialize_with = "quantity")]
    pub pulled_states: u64,
}

/// Hex quantity (`"0x1f4"`), with `null` read as zero.
fn quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<U64>::deserialize(deserializer)?;
    Ok(value.map(|q| q.to::<u64>()).unwrap_or_default())
}

/// Balance and nonce sampled together at one height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub balance: U256,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedAddress {
    pub address: Address,
    /// `None` until the first cycle where both queries succeed.
    pub state: Option<AccountState>,
}

impl WatchedAddress {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: None,
        }
    }

    /// Checksummed form, used as the metric label.
    pub fn label(&self) -> String {
        self.address.to_checksum(None)
    }
}
