//! Minimal HTTP/1.1 framing: request-line parsing, response encoding and
//! routing onto the endpoint façade. One request per connection.

use ::http::{Method, StatusCode, Version};
use memchr::memmem;

use crate::endpoint::{MetricsEndpoint, MetricsRequest, MetricsResponse};
use crate::error::{MetricsError, Result};

/// Upper bound on the request head; larger heads are rejected
pub const MAX_HEAD_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub version: Version,
    pub path: String,
    pub query: Option<String>,
}

impl HttpRequest {
    /// Parse a request head from `buf`.
    ///
    /// Returns `Ok(None)` until the blank line ending the head has arrived.
    pub fn parse(buf: &[u8]) -> Result<Option<HttpRequest>> {
        let Some(head_end) = memmem::find(buf, b"\r\n\r\n") else {
            if buf.len() > MAX_HEAD_LEN {
                return Err(MetricsError::MalformedRequest(
                    "request head too large".to_string(),
                ));
            }
            return Ok(None);
        };

        let head = std::str::from_utf8(&buf[..head_end])
            .map_err(|_| MetricsError::MalformedRequest("request head is not utf-8".to_string()))?;
        let request_line = head.split("\r\n").next().unwrap_or_default();

        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(MetricsError::MalformedRequest(format!(
                "bad request line {request_line:?}"
            )));
        };
        let version = match version {
            "HTTP/1.0" => Version::HTTP_10,
            "HTTP/1.1" => Version::HTTP_11,
            _ => {
                return Err(MetricsError::MalformedRequest(format!(
                    "unsupported version {version:?}"
                )))
            }
        };
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| MetricsError::MalformedRequest(format!("bad method {method:?}")))?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };

        Ok(Some(HttpRequest {
            method,
            version,
            path: path.to_string(),
            query,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn json(body: Vec<u8>) -> Self {
        HttpResponse {
            status: StatusCode::OK,
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        HttpResponse { status, body: None }
    }

    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_deref().unwrap_or_default();
        let mut out = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_str(),
            self.status.canonical_reason().unwrap_or_default()
        );
        if self.body.is_some() {
            out.push_str("Content-Type: application/json\r\n");
        }
        out.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        ));

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(body);
        bytes
    }
}

/// Where a request path points relative to the endpoint's base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    ListNames,
    Metric(&'a str),
    Other,
}

impl<'a> Route<'a> {
    pub fn resolve(base_path: &str, path: &'a str) -> Route<'a> {
        let Some(rest) = path.strip_prefix(base_path) else {
            return Route::Other;
        };
        match rest {
            "" | "/" => Route::ListNames,
            _ => match rest.strip_prefix('/') {
                Some(name) => Route::Metric(name),
                None => Route::Other,
            },
        }
    }

    /// Low-cardinality label for request metrics
    pub fn template(&self, base_path: &str) -> String {
        match self {
            Route::ListNames => base_path.to_string(),
            Route::Metric(_) => format!("{base_path}/{{metricName}}"),
            Route::Other => "UNKNOWN".to_string(),
        }
    }
}

/// Answer one request against the endpoint
pub fn handle_request(endpoint: &MetricsEndpoint, request: &HttpRequest) -> HttpResponse {
    if !endpoint.enabled() {
        return HttpResponse::empty(StatusCode::NOT_FOUND);
    }

    let route = Route::resolve(endpoint.options().base_path(), &request.path);
    if route == Route::Other {
        return HttpResponse::empty(StatusCode::NOT_FOUND);
    }
    if request.method != Method::GET {
        return HttpResponse::empty(StatusCode::METHOD_NOT_ALLOWED);
    }

    let response = match route {
        Route::ListNames => Some(endpoint.list_names()),
        Route::Metric(name) => match MetricsRequest::from_query(name, request.query.as_deref()) {
            Ok(req) => endpoint.query(&req),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected metrics request");
                return HttpResponse::empty(StatusCode::BAD_REQUEST);
            }
        },
        Route::Other => None,
    };

    match response {
        Some(resp) => encode_json(&resp),
        None => HttpResponse::empty(StatusCode::NOT_FOUND),
    }
}

fn encode_json(resp: &MetricsResponse) -> HttpResponse {
    match resp.to_json() {
        Ok(body) => HttpResponse::json(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize metrics response");
            HttpResponse::empty(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
