//! Endpoint Façade
//!
//! Translates requests into calls on the aggregation engine and shapes the
//! answer: a list of names when no request is given, a single-metric detail
//! otherwise, `None` when the metric was never recorded.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use metrics_endpoint::endpoint::{MetricsEndpoint, MetricsEndpointOptions, MetricsRequest};
//! use metrics_endpoint::metrics::{InstrumentRegistry, MeasurementCollector, TagSet};
//!
//! let collector = Arc::new(MeasurementCollector::new());
//! let registry = InstrumentRegistry::new(collector.clone());
//! let endpoint = MetricsEndpoint::builder()
//!     .options(MetricsEndpointOptions::default())
//!     .collector(collector)
//!     .build()?;
//!
//! registry.counter("jobs.done")?.increment(&TagSet::new().with("queue", "high"));
//! let detail = endpoint.invoke(Some(&MetricsRequest::new("jobs.done", vec![])));
//! ```

mod options;
mod request;
mod response;

use std::sync::Arc;

use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::metrics::{
    filter_and_aggregate, AggregationEngine, MeasurementCollector, MetricSample,
    MetricsCollection, MetricsSnapshot, TagFilter,
};
use crate::observability::spans::query_span;

pub use options::MetricsEndpointOptions;
pub use request::MetricsRequest;
pub use response::{MetricDetailResponse, MetricsListNamesResponse, MetricsResponse};

pub struct MetricsEndpoint {
    options: MetricsEndpointOptions,
    engine: AggregationEngine,
}

/// Wires an endpoint, failing fast when a collaborator is missing
#[derive(Default)]
pub struct MetricsEndpointBuilder {
    options: Option<MetricsEndpointOptions>,
    collector: Option<Arc<MeasurementCollector>>,
}

impl MetricsEndpointBuilder {
    pub fn options(mut self, options: MetricsEndpointOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn collector(mut self, collector: Arc<MeasurementCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn build(self) -> Result<MetricsEndpoint> {
        let options = self
            .options
            .ok_or(MetricsError::MissingCollaborator("options"))?;
        let collector = self
            .collector
            .ok_or(MetricsError::MissingCollaborator("collector"))?;
        MetricsEndpoint::new(options, collector)
    }
}

impl MetricsEndpoint {
    pub fn new(options: MetricsEndpointOptions, collector: Arc<MeasurementCollector>) -> Result<Self> {
        options.validate()?;
        Ok(MetricsEndpoint {
            options,
            engine: AggregationEngine::new(collector),
        })
    }

    pub fn builder() -> MetricsEndpointBuilder {
        MetricsEndpointBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.options.id
    }

    pub fn path(&self) -> &str {
        &self.options.path
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn options(&self) -> &MetricsEndpointOptions {
        &self.options
    }

    /// No request lists all names; a request resolves one metric
    pub fn invoke(&self, request: Option<&MetricsRequest>) -> Option<MetricsResponse> {
        match request {
            None => Some(self.list_names()),
            Some(request) => self.query(request),
        }
    }

    pub fn list_names(&self) -> MetricsResponse {
        MetricsResponse::ListNames(MetricsListNamesResponse {
            names: self.engine.collector().metric_names(),
        })
    }

    /// `None` when the metric has never been recorded. A known metric whose
    /// filter matches nothing yields a detail with no measurements.
    pub fn query(&self, request: &MetricsRequest) -> Option<MetricsResponse> {
        let _span = query_span(&request.metric_name).entered();

        let Some((samples, available_tags)) = self.engine.snapshot_metric(&request.metric_name)
        else {
            debug!(metric = %request.metric_name, "Metric not found");
            return None;
        };

        let mut measurements = MetricsCollection::new();
        measurements.insert(request.metric_name.clone(), samples);
        let filtered = filter_and_aggregate(
            &measurements,
            &request.metric_name,
            &request.tag_filter(),
        )?;
        debug!(
            metric = %request.metric_name,
            filter_pairs = request.tags.len(),
            samples = filtered.len(),
            "Resolved metric query"
        );

        Some(MetricsResponse::Detail(MetricDetailResponse {
            name: request.metric_name.clone(),
            measurements: filtered,
            available_tags,
        }))
    }

    /// Full snapshot: per-combination samples and available tags for every metric
    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.engine.snapshot()
    }

    pub fn get_metric_samples_by_tags(
        &self,
        measurements: &MetricsCollection<Vec<MetricSample>>,
        metric_name: &str,
        tags: &[(String, String)],
    ) -> Option<Vec<MetricSample>> {
        let filter: TagFilter = tags.iter().cloned().collect();
        filter_and_aggregate(measurements, metric_name, &filter)
    }
}
