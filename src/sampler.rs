use crate::{
    config::SamplerConfig,
    domain::{AccountState, Block, WatchedAddress},
    error::{ErrorContext, Result, ResultExt},
    node::NodeClient,
    snapshot::{CycleOutcome, HeightAdvance, Snapshot, SnapshotStore},
};
use chrono::Utc;
use futures_util::future::join_all;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls the node on a fixed cadence and publishes one snapshot per
/// successful cycle.
pub struct Sampler {
    client: Arc<dyn NodeClient>,
    store: SnapshotStore,
    interval: Duration,
    /// Working copy of the watch-list, mutated in place each cycle.
    addresses: Vec<WatchedAddress>,
    /// Height seen by the previous successful cycle.
    last_height: Option<u64>,
    previous: Option<Arc<Snapshot>>,
}

impl Sampler {
    pub fn new(client: Arc<dyn NodeClient>, store: SnapshotStore, config: &SamplerConfig) -> Self {
        Self {
            client,
            store,
            interval: config.poll_interval(),
            addresses: config
                .watch_addresses
                .iter()
                .copied()
                .map(WatchedAddress::new)
                .collect(),
            last_height: None,
            previous: None,
        }
    }

    /// First fetch at startup. An error here is meant to abort the process.
    pub async fn prime(&mut self) -> Result<()> {
        let snapshot = self.run_cycle().await?;
        info!(
            "Initial block #{} ({:#x})",
            snapshot.block.number, snapshot.block.hash
        );
        Ok(())
    }

    /// Runs until `shutdown` fires, sleeping one interval between cycles.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "Starting sampling loop (polling every {} ms, watching {} addresses)",
            self.interval.as_millis(),
            self.addresses.len()
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                // Failures are already logged; the next tick retries.
                _ = self.run_cycle() => {}
            }
        }

        info!("Sampling loop stopped");
    }

    /// One sampling cycle. A failed block fetch publishes nothing.
    pub async fn run_cycle(&mut self) -> Result<Arc<Snapshot>> {
        let started = Instant::now();
        let block = self
            .client
            .latest_block()
            .await
            .with_context(ErrorContext::new("fetch_latest_block"))?;
        let load_time = started.elapsed();

        let advance = match self.last_height {
            Some(last) if block.number <= last => {
                debug!("Block height unchanged at {}", block.number);
                None
            }
            _ => {
                info!(
                    "Received block #{} with {} transactions ({:#x})",
                    block.number,
                    block.transactions.len(),
                    block.hash
                );
                Some(HeightAdvance {
                    at: Utc::now(),
                    load_time,
                })
            }
        };

        let (gas_price, pending_transactions, network_id, sync) = tokio::join!(
            self.client.gas_price(),
            self.client.pending_transaction_count(),
            self.client.network_id(),
            self.client.sync_progress(),
        );

        self.refresh_addresses(&block).await;

        let height = block.number;
        let outcome = CycleOutcome {
            block,
            advance,
            gas_price: gas_price.logged(ErrorContext::new("suggest_gas_price").transient()),
            pending_transactions: pending_transactions
                .logged(ErrorContext::new("pending_transaction_count").transient()),
            network_id: network_id.logged(ErrorContext::new("network_id").transient()),
            sync: sync.logged(ErrorContext::new("sync_progress").transient()),
            addresses: self.addresses.clone(),
        };

        let snapshot = Arc::new(Snapshot::merge(self.previous.as_deref(), outcome));
        self.store.publish(snapshot.clone()).await;
        self.previous = Some(snapshot.clone());
        self.last_height = Some(height);

        Ok(snapshot)
    }

    /// Queries balance and nonce for every watched address at the block's
    /// height. An entry only changes when both queries succeed.
    async fn refresh_addresses(&mut self, block: &Block) {
        if self.addresses.is_empty() {
            return;
        }

        let client = &self.client;
        let height = block.number;
        let results = join_all(self.addresses.iter().map(|watched| async move {
            let (balance, nonce) = tokio::join!(
                client.balance_at(watched.address, height),
                client.nonce_at(watched.address, height),
            );
            match (balance, nonce) {
                (Ok(balance), Ok(nonce)) => Some(AccountState { balance, nonce }),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(
                        "Keeping previous state for {}: {}",
                        watched.label(),
                        e
                    );
                    None
                }
            }
        }))
        .await;

        for (watched, state) in self.addresses.iter_mut().zip(results) {
            if let Some(state) = state {
                watched.state = Some(state);
            }
        }
    }
}
