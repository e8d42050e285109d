use super::NodeClient;
use crate::{
    domain::{Block, ReportedSize, SyncProgress, Transaction},
    error::{ExporterError, Result},
};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

/// Scripted node for sampler tests.
///
/// `latest_block` pops from a queue; `None` entries and an empty queue are
/// failures. The other queries answer from settable values, where `None`
/// means the query fails.
#[derive(Default)]
pub struct MockNodeClient {
    blocks: Mutex<VecDeque<Option<Block>>>,
    gas_price: Mutex<Option<u128>>,
    pending: Mutex<Option<u64>>,
    network_id: Mutex<Option<u64>>,
    sync: Mutex<Option<Option<SyncProgress>>>,
    balances: Mutex<HashMap<Address, Option<U256>>>,
    nonces: Mutex<HashMap<Address, Option<u64>>>,
}

impl MockNodeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_block(&self, block: Block) {
        self.blocks.lock().unwrap().push_back(Some(block));
    }

    pub fn push_failure(&self) {
        self.blocks.lock().unwrap().push_back(None);
    }

    pub fn set_gas_price(&self, value: Option<u128>) {
        *self.gas_price.lock().unwrap() = value;
    }

    pub fn set_pending(&self, value: Option<u64>) {
        *self.pending.lock().unwrap() = value;
    }

    pub fn set_network_id(&self, value: Option<u64>) {
        *self.network_id.lock().unwrap() = value;
    }

    pub fn set_sync(&self, value: Option<Option<SyncProgress>>) {
        *self.sync.lock().unwrap() = value;
    }

    pub fn set_balance(&self, address: Address, value: Option<U256>) {
        self.balances.lock().unwrap().insert(address, value);
    }

    pub fn set_nonce(&self, address: Address, value: Option<u64>) {
        self.nonces.lock().unwrap().insert(address, value);
    }
}

fn scripted<T>(value: Option<T>, query: &str) -> Result<T> {
    value.ok_or_else(|| ExporterError::Rpc(format!("scripted {} failure", query)))
}

#[async_trait]
impl NodeClient for MockNodeClient {
    async fn latest_block(&self) -> Result<Block> {
        let next = self.blocks.lock().unwrap().pop_front().flatten();
        scripted(next, "latest_block")
    }

    async fn gas_price(&self) -> Result<u128> {
        scripted(*self.gas_price.lock().unwrap(), "gas_price")
    }

    async fn pending_transaction_count(&self) -> Result<u64> {
        scripted(*self.pending.lock().unwrap(), "pending")
    }

    async fn network_id(&self) -> Result<u64> {
        scripted(*self.network_id.lock().unwrap(), "network_id")
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>> {
        scripted(*self.sync.lock().unwrap(), "sync_progress")
    }

    async fn balance_at(&self, address: Address, _height: u64) -> Result<U256> {
        let value = self.balances.lock().unwrap().get(&address).copied().flatten();
        scripted(value, "balance_at")
    }

    async fn nonce_at(&self, address: Address, _height: u64) -> Result<u64> {
        let value = self.nonces.lock().unwrap().get(&address).copied().flatten();
        scripted(value, "nonce_at")
    }
}

/// A block at `number` whose hash is derived from the number.
pub fn block_at(number: u64, transactions: Vec<Transaction>) -> Block {
    Block {
        number,
        hash: B256::left_padding_from(&number.to_be_bytes()),
        transactions,
        gas_used: 21_000 * number,
        gas_limit: 30_000_000,
        nonce: 0x42,
        difficulty: U256::from(2u64),
        uncles: 0,
        size: ReportedSize::from_bytes(600),
    }
}
