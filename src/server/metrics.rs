use crate::{error, metrics::render, snapshot::SnapshotStore};
use chrono::Utc;
use std::{future::Future, sync::Arc};
use tracing::{debug, info};
use warp::{
    http::{header::CONTENT_TYPE, StatusCode},
    reply::Response,
    Filter, Rejection, Reply,
};

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Request-time context shared by every handler.
#[derive(Clone)]
struct Exposition {
    store: SnapshotStore,
    prefix: Arc<str>,
    /// Masked node URL, quoted when no snapshot is available.
    node_label: Arc<str>,
}

pub struct MetricsServer {
    port: u16,
    exposition: Exposition,
}

impl MetricsServer {
    pub fn new(port: u16, store: SnapshotStore, prefix: &str, node_label: &str) -> Self {
        Self {
            port,
            exposition: Exposition {
                store,
                prefix: Arc::from(prefix),
                node_label: Arc::from(node_label),
            },
        }
    }

    /// Serves until `shutdown` resolves. Failing to bind the port is an
    /// error, not a panic.
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> error::Result<()> {
        let routes = routes(self.exposition);
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([0, 0, 0, 0], self.port), shutdown)?;

        info!("Exporter running on http://{}/metrics", addr);
        server.await;
        info!("Metrics server stopped");

        Ok(())
    }
}

fn routes(
    exposition: Exposition,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_exposition(exposition.clone()))
        .and_then(get_metrics);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_exposition(exposition))
        .and_then(get_health);

    metrics.or(health).unify()
}

fn with_exposition(
    exposition: Exposition,
) -> impl Filter<Extract = (Exposition,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || exposition.clone())
}

async fn get_metrics(exposition: Exposition) -> Result<Response, Rejection> {
    let snapshot = exposition.store.current().await;

    let response = match render(snapshot.as_deref(), &exposition.prefix, Utc::now()) {
        Ok(body) => warp::reply::with_header(body, CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)
            .into_response(),
        Err(e) => {
            debug!("Metrics requested before data was ready: {}", e);
            warp::reply::with_status(
                format!("issue receiving block from URL: {}", exposition.node_label),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    };

    Ok(response)
}

async fn get_health(exposition: Exposition) -> Result<Response, Rejection> {
    let snapshot = exposition.store.current().await;

    let response = serde_json::json!({
        "status": if snapshot.is_some() { "healthy" } else { "starting" },
        "block": snapshot.map(|s| s.block.number),
    });

    Ok(warp::reply::json(&response).into_response())
}
