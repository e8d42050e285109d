pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod node;
pub mod sampler;
pub mod server;
pub mod snapshot;

pub use config::Config;
pub use error::{ExporterError, Result};
pub use node::{NodeClient, RpcNodeClient};
pub use sampler::Sampler;
pub use server::MetricsServer;
pub use snapshot::{Snapshot, SnapshotStore};
