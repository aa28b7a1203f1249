pub mod config;
pub mod endpoint;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod server;

pub use endpoint::{MetricsEndpoint, MetricsRequest, MetricsResponse};
pub use error::{MetricsError, Result};
pub use metrics::{InstrumentRegistry, MeasurementCollector, MetricSample, MetricStatistic, MetricTag, TagSet};
