use super::NodeClient;
use crate::{
    config::NodeConfig,
    domain::{Block, ReportedSize, SyncProgress, Transaction},
    error::{ExporterError, Result},
};
use alloy::{
    consensus::Transaction as _,
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, U256, U64},
    providers::{Provider, RootProvider},
    rpc::types::{Block as RpcBlock, BlockTransactionsKind},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::{future::IntoFuture, sync::Arc, time::Duration};
use tracing::trace;

pub struct RpcNodeClient {
    provider: Arc<RootProvider<Http<Client>>>,
    timeout: Duration,
}

impl RpcNodeClient {
    pub fn new(provider: RootProvider<Http<Client>>, config: &NodeConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            timeout: config.query_timeout(),
        }
    }

    pub fn connect(config: &NodeConfig) -> Result<Self> {
        let url = config
            .url
            .parse()
            .map_err(|e| ExporterError::Config(format!("Invalid RPC URL: {}", e)))?;
        Ok(Self::new(RootProvider::<Http<Client>>::new_http(url), config))
    }

    /// Runs one provider call under the per-query deadline.
    async fn bounded<F, T, E>(&self, call: F) -> Result<T>
    where
        F: IntoFuture<Output = std::result::Result<T, E>>,
        E: Into<ExporterError>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ExporterError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl NodeClient for RpcNodeClient {
    async fn latest_block(&self) -> Result<Block> {
        let block = self
            .bounded(
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Full),
            )
            .await?
            .ok_or_else(|| ExporterError::Rpc("Node returned no latest block".to_string()))?;

        trace!("Fetched block {}", block.header.number);
        Ok(convert_block(block))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.bounded(self.provider.get_gas_price()).await
    }

    async fn pending_transaction_count(&self) -> Result<u64> {
        let count: Option<U64> = self
            .bounded(self.provider.raw_request(
                "eth_getBlockTransactionCountByNumber".into(),
                ("pending",),
            ))
            .await?;
        pending_count(count)
    }

    async fn network_id(&self) -> Result<u64> {
        let version: String = self
            .bounded(self.provider.raw_request("net_version".into(), ()))
            .await?;
        parse_network_id(&version)
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>> {
        let raw: Value = self
            .bounded(self.provider.raw_request("eth_syncing".into(), ()))
            .await?;
        parse_sync_progress(raw)
    }

    async fn balance_at(&self, address: Address, height: u64) -> Result<U256> {
        self.bounded(
            self.provider
                .get_balance(address)
                .block_id(BlockId::number(height)),
        )
        .await
    }

    async fn nonce_at(&self, address: Address, height: u64) -> Result<u64> {
        self.bounded(
            self.provider
                .get_transaction_count(address)
                .block_id(BlockId::number(height)),
        )
        .await
    }
}

fn convert_block(block: RpcBlock) -> Block {
    let transactions = block
        .transactions
        .as_transactions()
        .unwrap_or_default()
        .iter()
        .map(|tx| Transaction {
            to: tx.to(),
            value: tx.value(),
            input: tx.input().clone(),
        })
        .collect();

    let size_bytes = block
        .header
        .size
        .map(|size| size.saturating_to::<u64>())
        .unwrap_or_default();

    Block {
        number: block.header.number,
        hash: block.header.hash,
        transactions,
        gas_used: block.header.gas_used,
        gas_limit: block.header.gas_limit,
        nonce: u64::from_be_bytes(block.header.nonce.0),
        difficulty: block.header.difficulty,
        uncles: block.uncles.len(),
        size: ReportedSize::from_bytes(size_bytes),
    }
}

/// `net_version` answers with a decimal string; some nodes answer in hex.
fn parse_network_id(version: &str) -> Result<u64> {
    let version = version.trim();
    let parsed = match version.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => version.parse(),
    };
    parsed.map_err(|e| ExporterError::Parse(format!("Invalid network id {}: {}", version, e)))
}

/// A node without a pending block answers `null`. That is a failed query,
/// not an empty pool, so the previous count is kept.
fn pending_count(count: Option<U64>) -> Result<u64> {
    count
        .map(|c| c.to::<u64>())
        .ok_or_else(|| ExporterError::Rpc("Node returned no pending block count".to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SyncingResponse {
    Idle(bool),
    Syncing(SyncProgress),
}

/// `eth_syncing` answers `false` when idle, otherwise an object of hex
/// quantities.
fn parse_sync_progress(raw: Value) -> Result<Option<SyncProgress>> {
    let response = serde_json::from_value::<Option<SyncingResponse>>(raw)
        .map_err(|e| ExporterError::Parse(format!("Unexpected eth_syncing response: {}", e)))?;

    match response {
        None | Some(SyncingResponse::Idle(false)) => Ok(None),
        Some(SyncingResponse::Idle(true)) => Err(ExporterError::Parse(
            "eth_syncing answered true without progress".to_string(),
        )),
        Some(SyncingResponse::Syncing(progress)) => Ok(Some(progress)),
    }
}
