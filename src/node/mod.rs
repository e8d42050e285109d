//! The node query boundary.
//!
//! [`NodeClient`] is everything the sampler needs from a node. The
//! production implementation is [`RpcNodeClient`], which talks JSON-RPC over
//! HTTP through an alloy provider and bounds every call with a deadline.

pub mod rpc;

#[cfg(test)]
pub mod mock;

pub use rpc::RpcNodeClient;

use crate::{
    domain::{Block, SyncProgress},
    error::Result,
};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn latest_block(&self) -> Result<Block>;

    /// Suggested gas price in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// Number of transactions in the node's pending block.
    async fn pending_transaction_count(&self) -> Result<u64>;

    async fn network_id(&self) -> Result<u64>;

    /// `None` when the node is not syncing.
    async fn sync_progress(&self) -> Result<Option<SyncProgress>>;

    async fn balance_at(&self, address: Address, height: u64) -> Result<U256>;

    async fn nonce_at(&self, address: Address, height: u64) -> Result<u64>;
}
