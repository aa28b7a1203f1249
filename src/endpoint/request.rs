use percent_encoding::percent_decode_str;

use crate::error::{MetricsError, Result};
use crate::metrics::TagFilter;

/// A point query for one metric, optionally narrowed by tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRequest {
    pub metric_name: String,
    pub tags: Vec<(String, String)>,
}

impl MetricsRequest {
    pub fn new(metric_name: impl Into<String>, tags: Vec<(String, String)>) -> Self {
        MetricsRequest {
            metric_name: metric_name.into(),
            tags,
        }
    }

    /// Build a request from a path segment and a raw query string.
    ///
    /// The path segment is percent-decoded only; `+` stays literal there.
    /// Every `tag=key:value` parameter adds one filter pair, split at the
    /// first ':'. Other parameters are ignored.
    pub fn from_query(metric_name: &str, query: Option<&str>) -> Result<Self> {
        let mut tags = Vec::new();
        for param in query.unwrap_or_default().split('&') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if decode_form(key)? != "tag" {
                continue;
            }
            let value = decode_form(value)?;
            match value.split_once(':') {
                Some((k, v)) if !k.is_empty() => tags.push((k.to_string(), v.to_string())),
                _ => return Err(MetricsError::InvalidTagParameter(value)),
            }
        }
        let metric_name = percent_decode_str(metric_name)
            .decode_utf8()
            .map_err(|e| MetricsError::MalformedRequest(format!("{metric_name}: {e}")))?;
        Ok(MetricsRequest::new(metric_name, tags))
    }

    pub fn tag_filter(&self) -> TagFilter {
        self.tags.iter().cloned().collect()
    }
}

/// Decode one `application/x-www-form-urlencoded` component
fn decode_form(raw: &str) -> Result<String> {
    let plus_as_space = raw.replace('+', " ");
    percent_decode_str(&plus_as_space)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| MetricsError::InvalidTagParameter(format!("{raw}: {e}")))
}
