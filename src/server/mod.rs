pub mod metrics;

pub use metrics::MetricsServer;
