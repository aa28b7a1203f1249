#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;

use metrics_endpoint::config::MetricsConfig;
use metrics_endpoint::endpoint::MetricsEndpoint;
use metrics_endpoint::metrics::{InstrumentRegistry, MeasurementCollector};
use metrics_endpoint::observability::init_tracing;
use metrics_endpoint::server::MetricsServer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = match std::env::args().nth(1) {
        Some(path) => MetricsConfig::from_file(path)?,
        None => MetricsConfig::default(),
    }
    .with_env_overrides()?;
    config.validate()?;

    init_tracing(&config.log)?;

    let collector = Arc::new(MeasurementCollector::new());
    let registry = InstrumentRegistry::new(collector.clone());
    let endpoint = MetricsEndpoint::builder()
        .options(config.endpoint.clone())
        .collector(collector)
        .build()?;

    let server = MetricsServer::new(config.server.clone(), Arc::new(endpoint), &registry)?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
        }
    }

    Ok(())
}
