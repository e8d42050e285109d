//! Published chain state and the single place where a cycle's query
//! outcomes are folded into it.

use crate::domain::{Block, BlockTotals, SyncProgress, WatchedAddress};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;

/// One cycle's consistent view of the node. Never mutated after publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub block: Block,
    /// Always computed from `block`.
    pub totals: BlockTotals,
    /// When the block height last went up.
    pub last_block_update: DateTime<Utc>,
    /// Fetch latency of the block that last raised the height.
    pub load_time: Duration,
    pub gas_price: Option<u128>,
    pub pending_transactions: Option<u64>,
    pub network_id: Option<u64>,
    pub sync: Option<SyncProgress>,
    pub addresses: Vec<WatchedAddress>,
}

/// Recorded when a cycle observes a strictly higher block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightAdvance {
    pub at: DateTime<Utc>,
    pub load_time: Duration,
}

/// Everything one successful cycle learned. `None` marks a failed query.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub block: Block,
    pub advance: Option<HeightAdvance>,
    pub gas_price: Option<u128>,
    pub pending_transactions: Option<u64>,
    pub network_id: Option<u64>,
    /// Outer `None` is a failed query, inner `None` a node that is not syncing.
    pub sync: Option<Option<SyncProgress>>,
    pub addresses: Vec<WatchedAddress>,
}

impl Snapshot {
    /// Builds the next snapshot: every field the cycle obtained replaces the
    /// previous one, every failed field carries the previous value forward.
    pub fn merge(previous: Option<&Snapshot>, outcome: CycleOutcome) -> Snapshot {
        let totals = BlockTotals::from_block(&outcome.block);

        let (last_block_update, load_time) = match (outcome.advance, previous) {
            (Some(advance), _) => (advance.at, advance.load_time),
            (None, Some(prev)) => (prev.last_block_update, prev.load_time),
            (None, None) => (Utc::now(), Duration::ZERO),
        };

        Snapshot {
            block: outcome.block,
            totals,
            last_block_update,
            load_time,
            gas_price: outcome
                .gas_price
                .or_else(|| previous.and_then(|p| p.gas_price)),
            pending_transactions: outcome
                .pending_transactions
                .or_else(|| previous.and_then(|p| p.pending_transactions)),
            network_id: outcome
                .network_id
                .or_else(|| previous.and_then(|p| p.network_id)),
            sync: match outcome.sync {
                Some(sync) => sync,
                None => previous.and_then(|p| p.sync),
            },
            addresses: outcome.addresses,
        }
    }
}

/// The slot readers take snapshots from.
///
/// The sampler is the only writer and swaps in a whole `Arc<Snapshot>`;
/// readers clone the `Arc` and render without holding the lock.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.current.write().await = Some(snapshot);
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }
}
