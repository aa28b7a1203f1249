use std::sync::Arc;

use ::http::StatusCode;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, warn, Instrument};

use super::http::{handle_request, HttpRequest, HttpResponse, Route};
use crate::endpoint::MetricsEndpoint;
use crate::metrics::{Counter, TagSet};
use crate::observability::spans::http_request_span;

pub struct ConnectionHandler {
    stream: TcpStream,
    endpoint: Arc<MetricsEndpoint>,
    requests: Counter,
    buffer: BytesMut,
    client_addr: String,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        endpoint: Arc<MetricsEndpoint>,
        requests: Counter,
        client_addr: String,
    ) -> Self {
        ConnectionHandler {
            stream,
            endpoint,
            requests,
            buffer: BytesMut::with_capacity(1024),
            client_addr,
        }
    }

    pub async fn run(mut self) {
        debug!("Client connected: {}", self.client_addr);

        let request = match self.read_request().await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("Client disconnected: {}", self.client_addr);
                return;
            }
            Err(e) => {
                warn!("Bad request from {}: {}", self.client_addr, e);
                self.respond(&HttpResponse::empty(StatusCode::BAD_REQUEST)).await;
                return;
            }
        };

        let span = http_request_span(request.method.as_str(), &request.path, &self.client_addr);
        async {
            let response = handle_request(&self.endpoint, &request);
            self.record(&request, &response);
            self.respond(&response).await;
        }
        .instrument(span)
        .await;
    }

    /// Read until a full request head is buffered; `None` on early EOF
    async fn read_request(&mut self) -> crate::error::Result<Option<HttpRequest>> {
        let mut read_buf = [0u8; 1024];
        loop {
            if let Some(request) = HttpRequest::parse(&self.buffer)? {
                return Ok(Some(request));
            }
            let n = self.stream.read(&mut read_buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.buffer.extend_from_slice(&read_buf[..n]);
        }
    }

    async fn respond(&mut self, response: &HttpResponse) {
        if let Err(e) = self.stream.write_all(&response.encode()).await {
            error!("Failed to write response to {}: {}", self.client_addr, e);
            return;
        }
        if let Err(e) = self.stream.shutdown().await {
            debug!("Failed to shut down connection to {}: {}", self.client_addr, e);
        }
    }

    fn record(&self, request: &HttpRequest, response: &HttpResponse) {
        let base_path = self.endpoint.options().base_path();
        let uri = Route::resolve(base_path, &request.path).template(base_path);
        let tags = TagSet::new()
            .with("method", request.method.as_str())
            .with("uri", uri)
            .with("status", response.status.as_u16());
        self.requests.increment(&tags);
    }
}
