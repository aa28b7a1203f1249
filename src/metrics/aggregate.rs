//! Aggregation Engine
//!
//! Turns the collector's accumulators into `MetricSample`s (one per tag
//! combination and statistic) and `MetricTag`s (distinct values per tag key).

use std::sync::Arc;

use super::collector::{MeasurementCollector, MetricSeries, SeriesPoint};
use super::types::{InstrumentKind, MetricSample, MetricTag, MetricsCollection};
use crate::observability::spans::snapshot_span;

/// Aggregated view of every metric at the moment it was taken
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub measurements: MetricsCollection<Vec<MetricSample>>,
    pub available_tags: MetricsCollection<Vec<MetricTag>>,
}

impl MetricsSnapshot {
    pub fn into_parts(
        self,
    ) -> (
        MetricsCollection<Vec<MetricSample>>,
        MetricsCollection<Vec<MetricTag>>,
    ) {
        (self.measurements, self.available_tags)
    }
}

/// Samples for each tag combination, statistics in the order `kind` reports them
pub fn samples_for(kind: InstrumentKind, points: &[SeriesPoint]) -> Vec<MetricSample> {
    let statistics = kind.statistics();
    let mut samples = Vec::with_capacity(points.len() * statistics.len());
    for point in points {
        for &statistic in statistics {
            samples.push(MetricSample::with_tags(
                statistic,
                point.value_of(statistic),
                point.tags.clone(),
            ));
        }
    }
    samples
}

/// Union of tag keys across all combinations, keys in first-seen order
pub fn available_tags(points: &[SeriesPoint]) -> Vec<MetricTag> {
    let mut tags: Vec<MetricTag> = Vec::new();
    for point in points {
        for (key, value) in point.tags.iter() {
            match tags.iter_mut().find(|t| t.tag == key) {
                Some(tag) => tag.observe(value),
                None => {
                    let mut tag = MetricTag::new(key);
                    tag.observe(value);
                    tags.push(tag);
                }
            }
        }
    }
    tags
}

#[derive(Clone)]
pub struct AggregationEngine {
    collector: Arc<MeasurementCollector>,
}

impl AggregationEngine {
    pub fn new(collector: Arc<MeasurementCollector>) -> Self {
        AggregationEngine { collector }
    }

    pub fn collector(&self) -> &Arc<MeasurementCollector> {
        &self.collector
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let _span = snapshot_span().entered();
        let mut snapshot = MetricsSnapshot::default();
        for series in self.collector.series() {
            let (samples, tags) = Self::aggregate(&series);
            snapshot.measurements.insert(series.name.clone(), samples);
            snapshot.available_tags.insert(series.name, tags);
        }
        tracing::debug!(metrics = snapshot.measurements.len(), "Built metrics snapshot");
        snapshot
    }

    /// Samples and available tags for a single metric, `None` if never recorded
    pub fn snapshot_metric(&self, name: &str) -> Option<(Vec<MetricSample>, Vec<MetricTag>)> {
        self.collector
            .series_for(name)
            .map(|series| Self::aggregate(&series))
    }

    fn aggregate(series: &MetricSeries) -> (Vec<MetricSample>, Vec<MetricTag>) {
        (
            samples_for(series.kind, &series.points),
            available_tags(&series.points),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MeasurementEvent, MetricStatistic, TagSet};

    fn engine() -> AggregationEngine {
        AggregationEngine::new(Arc::new(MeasurementCollector::new()))
    }

    #[test]
    fn test_counter_yields_single_total() {
        let engine = engine();
        engine
            .collector()
            .record(MeasurementEvent::counter("test.test7", 100.0, TagSet::new()))
            .unwrap();

        let (measurements, _) = engine.snapshot().into_parts();
        assert_eq!(measurements.len(), 1);
        let samples = measurements.get("test.test7").unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].statistic, MetricStatistic::Total);
        assert_eq!(samples[0].value, 100.0);
    }

    #[test]
    fn test_histogram_yields_total_count_max() {
        let engine = engine();
        for value in [2.0, 7.0, 4.0] {
            engine
                .collector()
                .record(MeasurementEvent::histogram("h", value, TagSet::new()))
                .unwrap();
        }

        let (samples, tags) = engine.snapshot_metric("h").unwrap();
        let stats: Vec<_> = samples.iter().map(|s| (s.statistic, s.value)).collect();
        assert_eq!(
            stats,
            vec![
                (MetricStatistic::Total, 13.0),
                (MetricStatistic::Count, 3.0),
                (MetricStatistic::Max, 7.0),
            ]
        );
        assert!(tags.is_empty());
    }

    #[test]
    fn test_available_tags_first_seen_order() {
        let engine = engine();
        let collector = engine.collector();
        collector
            .record(MeasurementEvent::counter(
                "c",
                1.0,
                TagSet::new().with("zone", "east").with("host", "h1"),
            ))
            .unwrap();
        collector
            .record(MeasurementEvent::counter(
                "c",
                1.0,
                TagSet::new().with("app", "x").with("zone", "west"),
            ))
            .unwrap();

        let (_, tags) = engine.snapshot_metric("c").unwrap();
        let keys: Vec<_> = tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(keys, vec!["zone", "host", "app"]);
        assert_eq!(tags[0].values, vec!["east", "west"]);
    }

    #[test]
    fn test_untagged_metric_has_no_available_tags() {
        let engine = engine();
        engine
            .collector()
            .record(MeasurementEvent::counter("test.test3", 1.0, TagSet::new()))
            .unwrap();

        let (_, available) = engine.snapshot().into_parts();
        assert_eq!(available.len(), 1);
        assert!(available.get("test.test3").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_metric() {
        assert!(engine().snapshot_metric("foo.bar").is_none());
    }
}
