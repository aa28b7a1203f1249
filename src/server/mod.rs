//! HTTP transport for the metrics endpoint
//!
//! - `GET {path}` lists metric names
//! - `GET {path}/{name}?tag=key:value` returns one metric, 404 if unknown
//!
//! Every served request is counted in `http.server.requests`.

mod connection;
pub mod http;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::endpoint::MetricsEndpoint;
use crate::error::Result;
use crate::metrics::{Counter, InstrumentRegistry};
use connection::ConnectionHandler;

pub use http::{handle_request, HttpRequest, HttpResponse};

pub const REQUESTS_METRIC: &str = "http.server.requests";

pub struct MetricsServer {
    config: ServerConfig,
    endpoint: Arc<MetricsEndpoint>,
    requests: Counter,
}

impl MetricsServer {
    pub fn new(
        config: ServerConfig,
        endpoint: Arc<MetricsEndpoint>,
        registry: &InstrumentRegistry,
    ) -> Result<Self> {
        config.socket_addr()?;
        let requests = registry.counter(REQUESTS_METRIC)?;
        Ok(MetricsServer {
            config,
            endpoint,
            requests,
        })
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.config.socket_addr()?).await?;
        info!(
            addr = %listener.local_addr()?,
            path = %self.endpoint.path(),
            enabled = self.endpoint.enabled(),
            "Metrics endpoint listening"
        );
        Ok(listener)
    }

    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let handler = ConnectionHandler::new(
                        stream,
                        self.endpoint.clone(),
                        self.requests.clone(),
                        addr.to_string(),
                    );
                    tokio::spawn(async move {
                        handler.run().await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
