use eyre::{Result, WrapErr};
use geth_exporter::{Config, MetricsServer, RpcNodeClient, Sampler, SnapshotStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    dotenv::dotenv().ok();
    init_logging();

    let config = Config::from_env().wrap_err("failed to load configuration")?;
    config.validate().wrap_err("invalid configuration")?;

    info!("Connecting to Ethereum node: {}", config.mask_node_url());
    info!(
        "Poll interval {} ms, {} watched addresses, prefix {}",
        config.sampler.poll_interval_ms,
        config.sampler.watch_addresses.len(),
        config.server.prefix
    );

    let client = Arc::new(
        RpcNodeClient::connect(&config.node).wrap_err("failed to create node client")?,
    );
    let store = SnapshotStore::new();

    // Without an initial block the exporter has nothing to serve.
    let mut sampler = Sampler::new(client, store.clone(), &config.sampler);
    if let Err(e) = sampler.prime().await {
        error!("Failed to fetch initial block: {}", e);
        return Err(e).wrap_err("failed to fetch initial block");
    }

    let shutdown = CancellationToken::new();

    let sampler_handle = tokio::spawn(sampler.run(shutdown.clone()));

    let server = MetricsServer::new(
        config.server.port,
        store,
        &config.server.prefix,
        &config.mask_node_url(),
    );
    let server_shutdown = shutdown.clone();
    let mut server_handle = tokio::spawn(server.run(async move {
        server_shutdown.cancelled().await;
    }));

    let mut server_result = None;
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        },
        result = &mut server_handle => server_result = Some(result),
    }
    shutdown.cancel();

    if let Err(e) = sampler_handle.await {
        error!("Sampler task panicked: {}", e);
    }

    let server_result = match server_result {
        Some(result) => result,
        None => server_handle.await,
    };
    match server_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("Metrics server failed: {}", e);
            return Err(e).wrap_err("metrics server failed");
        }
        Err(e) => {
            error!("Metrics server task panicked: {}", e);
            return Err(e).wrap_err("metrics server task panicked");
        }
    }

    info!("Geth exporter shutdown complete");
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "geth_exporter=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
