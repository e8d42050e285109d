//! Renders a published snapshot as Prometheus text exposition lines.

use crate::{
    domain::to_ether,
    error::{ExporterError, Result},
    snapshot::Snapshot,
};
use chrono::{DateTime, Utc};
use std::fmt::Display;

struct MetricLines<'a> {
    prefix: &'a str,
    lines: Vec<String>,
}

impl<'a> MetricLines<'a> {
    fn new(prefix: &'a str) -> Self {
        Self {
            prefix,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, value: impl Display) {
        self.lines
            .push(format!("{}_eth_{} {}", self.prefix, name, value));
    }

    fn push_opt(&mut self, name: &str, value: Option<impl Display>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    fn push_address(&mut self, name: &str, address: &str, value: impl Display) {
        self.lines.push(format!(
            "{}_eth_{}{{address=\"{}\"}} {}",
            self.prefix, name, address, value
        ));
    }

    fn finish(self) -> String {
        let mut body = self.lines.join("\n");
        body.push('\n');
        body
    }
}

/// Renders `snapshot` as of `now`. Fails with `Unavailable` until the
/// sampler has published at least once.
pub fn render(snapshot: Option<&Snapshot>, prefix: &str, now: DateTime<Utc>) -> Result<String> {
    let snapshot = snapshot.ok_or(ExporterError::Unavailable)?;
    let block = &snapshot.block;
    let totals = &snapshot.totals;

    let since_update = (now - snapshot.last_block_update)
        .to_std()
        .unwrap_or_default()
        .as_secs_f64();

    let mut out = MetricLines::new(prefix);
    out.push("block", block.number);
    out.push("seconds_last_block", format!("{:.2}", since_update));
    out.push("block_transactions", block.transactions.len());
    out.push("block_value", totals.total_value_ether());
    out.push("block_gas_used", block.gas_used);
    out.push("block_gas_limit", block.gas_limit);
    out.push("block_nonce", block.nonce);
    out.push("block_difficulty", block.difficulty);
    out.push("block_uncles", block.uncles);
    out.push("block_size_bytes", totals.size_bytes);
    out.push_opt("gas_price", snapshot.gas_price);
    out.push_opt("pending_transactions", snapshot.pending_transactions);
    out.push_opt("network_id", snapshot.network_id);
    out.push("contracts_created", totals.contracts_created);
    out.push("token_transfers", totals.token_transfers);
    out.push("eth_transfers", totals.value_transfers);
    out.push(
        "load_time",
        format!("{:.4}", snapshot.load_time.as_secs_f64()),
    );

    if let Some(sync) = &snapshot.sync {
        out.push("known_states", sync.known_states);
        out.push("highest_block", sync.highest_block);
        out.push("pulled_states", sync.pulled_states);
    }

    let mut addresses: Vec<_> = snapshot
        .addresses
        .iter()
        .filter_map(|watched| watched.state.map(|state| (watched.label(), state)))
        .collect();
    addresses.sort_by(|a, b| a.0.cmp(&b.0));

    for (label, state) in addresses {
        out.push_address("address_balance", &label, to_ether(state.balance));
        out.push_address("address_nonce", &label, state.nonce);
    }

    Ok(out.finish())
}
