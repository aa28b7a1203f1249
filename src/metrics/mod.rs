//! In-process metrics aggregation
//!
//! Data flows leaf-first through this module:
//!
//! - **registry**: `Counter`/`Histogram` handles emit `MeasurementEvent`s
//! - **collector**: folds events into per-name, per-tag-combination accumulators
//! - **aggregate**: turns accumulators into samples and available tags
//! - **query**: conjunctive tag filtering and re-aggregation

mod aggregate;
mod collector;
mod query;
mod registry;
mod types;

pub use aggregate::{available_tags, samples_for, AggregationEngine, MetricsSnapshot};
pub use collector::{MeasurementCollector, MetricSeries, SeriesPoint};
pub use query::{aggregate_samples, filter_and_aggregate, TagFilter};
pub use registry::{
    noop_sink, Counter, Histogram, InstrumentRegistry, MeasurementSink, NoopSink, SharedSink,
};
pub use types::{
    InstrumentKind, MeasurementEvent, MetricSample, MetricStatistic, MetricTag,
    MetricsCollection, TagSet,
};
