use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::{AHashMap, AHasher};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::registry::MeasurementSink;
use super::types::{InstrumentKind, MeasurementEvent, MetricStatistic, TagSet};
use crate::error::{MetricsError, Result};

const NUM_SHARDS: usize = 16;

fn shard_for(name: &str) -> usize {
    let mut hasher = AHasher::default();
    name.hash(&mut hasher);
    (hasher.finish() as usize) % NUM_SHARDS
}

/// Running statistics for one tag combination of one metric
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub tags: TagSet,
    pub sum: f64,
    pub count: u64,
    pub max: f64,
}

impl SeriesPoint {
    fn new(tags: TagSet, value: f64) -> Self {
        SeriesPoint {
            tags,
            sum: value,
            count: 1,
            max: value,
        }
    }

    fn fold(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        if value > self.max {
            self.max = value;
        }
    }

    pub fn value_of(&self, statistic: MetricStatistic) -> f64 {
        match statistic {
            MetricStatistic::Total => self.sum,
            MetricStatistic::Count => self.count as f64,
            MetricStatistic::Max => self.max,
        }
    }
}

/// Point-in-time copy of one metric's accumulators
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub name: String,
    pub kind: InstrumentKind,
    pub points: Vec<SeriesPoint>,
}

/// Points keyed by canonical (key-sorted) tag set; each point keeps the
/// tag order it was first recorded with
#[derive(Default)]
struct BucketState {
    index: AHashMap<TagSet, usize>,
    points: Vec<SeriesPoint>,
}

impl BucketState {
    fn seeded(tags: TagSet, value: f64) -> Self {
        let mut state = BucketState::default();
        state.fold(tags, value);
        state
    }

    fn fold(&mut self, tags: TagSet, value: f64) {
        let key = tags.canonical();
        match self.index.get(&key).copied() {
            Some(i) => self.points[i].fold(value),
            None => {
                self.index.insert(key, self.points.len());
                self.points.push(SeriesPoint::new(tags, value));
            }
        }
    }
}

struct MetricBucket {
    name: String,
    kind: InstrumentKind,
    seq: u64,
    state: Mutex<BucketState>,
}

impl MetricBucket {
    fn fold(&self, tags: TagSet, value: f64) {
        self.state.lock().fold(tags, value);
    }

    fn series(&self) -> MetricSeries {
        let points = self.state.lock().points.clone();
        MetricSeries {
            name: self.name.clone(),
            kind: self.kind,
            points,
        }
    }
}

/// MeasurementCollector folds raw measurement events into per-name buckets.
///
/// **Concurrency Model:**
/// - Names are spread over `NUM_SHARDS` shards; a shard's write lock is only
///   taken when a name is seen for the first time
/// - Each name owns a bucket behind its own mutex, so producers of different
///   metrics never contend
/// - Folding an event into a bucket is a single critical section, readers
///   never see a measurement partially applied
///
/// Events are not retained: each bucket keeps one accumulator per distinct
/// tag combination.
pub struct MeasurementCollector {
    shards: Box<[RwLock<AHashMap<String, Arc<MetricBucket>>>; NUM_SHARDS]>,
    next_seq: AtomicU64,
}

impl Default for MeasurementCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementCollector {
    pub fn new() -> Self {
        MeasurementCollector {
            shards: Box::new(std::array::from_fn(|_| RwLock::new(AHashMap::new()))),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Fold one measurement into the bucket for its metric name.
    ///
    /// A new bucket is published already holding its first measurement, so
    /// a name never becomes visible without a completed event.
    pub fn record(&self, event: MeasurementEvent) -> Result<()> {
        if event.name.is_empty() {
            return Err(MetricsError::EmptyMetricName);
        }

        let shard = &self.shards[shard_for(&event.name)];
        let existing = shard.read().get(&event.name).cloned();
        let bucket = match existing {
            Some(bucket) => bucket,
            None => {
                let mut buckets = shard.write();
                let raced = buckets.get(&event.name).cloned();
                match raced {
                    Some(bucket) => bucket,
                    None => {
                        let bucket =
                            self.new_bucket(&event.name, event.kind, event.tags, event.value);
                        buckets.insert(event.name, Arc::new(bucket));
                        return Ok(());
                    }
                }
            }
        };

        if bucket.kind != event.kind {
            return Err(MetricsError::InstrumentKindMismatch {
                name: event.name,
                registered: bucket.kind,
                requested: event.kind,
            });
        }

        bucket.fold(event.tags, event.value);
        Ok(())
    }

    fn new_bucket(
        &self,
        name: &str,
        kind: InstrumentKind,
        tags: TagSet,
        value: f64,
    ) -> MetricBucket {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        debug!(metric = %name, ?kind, seq, "Created metric bucket");
        MetricBucket {
            name: name.to_string(),
            kind,
            seq,
            state: Mutex::new(BucketState::seeded(tags, value)),
        }
    }

    fn buckets(&self) -> Vec<Arc<MetricBucket>> {
        let mut all: Vec<Arc<MetricBucket>> = Vec::new();
        for shard in self.shards.iter() {
            all.extend(shard.read().values().cloned());
        }
        all.sort_by_key(|b| b.seq);
        all
    }

    /// Names observed so far, in first-seen order
    pub fn metric_names(&self) -> Vec<String> {
        self.buckets().iter().map(|b| b.name.clone()).collect()
    }

    /// Copy of every metric's accumulators, in first-seen order
    pub fn series(&self) -> Vec<MetricSeries> {
        self.buckets().iter().map(|b| b.series()).collect()
    }

    /// Copy of one metric's accumulators
    pub fn series_for(&self, name: &str) -> Option<MetricSeries> {
        let bucket = self.shards[shard_for(name)].read().get(name).cloned();
        bucket.map(|b| b.series())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shards[shard_for(name)].read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MeasurementSink for MeasurementCollector {
    fn record(&self, event: MeasurementEvent) -> Result<()> {
        MeasurementCollector::record(self, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazily_creates_buckets() {
        let collector = MeasurementCollector::new();
        assert!(collector.is_empty());

        collector
            .record(MeasurementEvent::counter("a", 1.0, TagSet::new()))
            .unwrap();
        assert!(collector.contains("a"));
        assert!(!collector.contains("b"));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_rejects_empty_name() {
        let collector = MeasurementCollector::new();
        let result = collector.record(MeasurementEvent::counter("", 1.0, TagSet::new()));
        assert!(matches!(result, Err(MetricsError::EmptyMetricName)));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_rejects_kind_change() {
        let collector = MeasurementCollector::new();
        collector
            .record(MeasurementEvent::counter("x", 1.0, TagSet::new()))
            .unwrap();
        let result = collector.record(MeasurementEvent::histogram("x", 1.0, TagSet::new()));
        assert!(matches!(
            result,
            Err(MetricsError::InstrumentKindMismatch { .. })
        ));
    }

    #[test]
    fn test_groups_by_tag_combination() {
        let collector = MeasurementCollector::new();
        let v1 = TagSet::new().with("a", "v1");
        let v2 = TagSet::new().with("a", "v2");

        for value in [1.0, 5.0, 3.0] {
            collector
                .record(MeasurementEvent::histogram("h", value, v1.clone()))
                .unwrap();
        }
        collector
            .record(MeasurementEvent::histogram("h", 10.0, v2.clone()))
            .unwrap();

        let series = collector.series_for("h").unwrap();
        assert_eq!(series.kind, InstrumentKind::Histogram);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].tags, v1);
        assert_eq!(series.points[0].sum, 9.0);
        assert_eq!(series.points[0].count, 3);
        assert_eq!(series.points[0].max, 5.0);
        assert_eq!(series.points[1].value_of(MetricStatistic::Total), 10.0);
    }

    #[test]
    fn test_names_in_first_seen_order() {
        let collector = MeasurementCollector::new();
        for name in ["zeta", "alpha", "mid", "alpha"] {
            collector
                .record(MeasurementEvent::counter(name, 1.0, TagSet::new()))
                .unwrap();
        }
        assert_eq!(collector.metric_names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_tag_order_shares_one_point() {
        let collector = MeasurementCollector::new();
        let ab = TagSet::new().with("a", "1").with("b", "2");
        let ba = TagSet::new().with("b", "2").with("a", "1");
        collector
            .record(MeasurementEvent::counter("c", 1.0, ab.clone()))
            .unwrap();
        collector
            .record(MeasurementEvent::counter("c", 2.0, ba))
            .unwrap();

        let series = collector.series_for("c").unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].tags, ab);
        assert_eq!(series.points[0].sum, 3.0);
    }

    #[test]
    fn test_new_bucket_holds_first_event() {
        let collector = MeasurementCollector::new();
        collector
            .record(MeasurementEvent::histogram("h", 4.0, TagSet::new()))
            .unwrap();

        let series = collector.series_for("h").unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].count, 1);
        assert_eq!(series.points[0].max, 4.0);
    }

    #[test]
    fn test_kind_mismatch_leaves_bucket_untouched() {
        let collector = MeasurementCollector::new();
        collector
            .record(MeasurementEvent::counter("x", 1.0, TagSet::new()))
            .unwrap();
        assert!(collector
            .record(MeasurementEvent::histogram("x", 5.0, TagSet::new()))
            .is_err());

        let series = collector.series_for("x").unwrap();
        assert_eq!(series.kind, InstrumentKind::Counter);
        assert_eq!(series.points[0].sum, 1.0);
    }

    #[test]
    fn test_max_tracks_negative_values() {
        let collector = MeasurementCollector::new();
        for value in [-5.0, -2.0, -9.0] {
            collector
                .record(MeasurementEvent::histogram("neg", value, TagSet::new()))
                .unwrap();
        }
        let series = collector.series_for("neg").unwrap();
        assert_eq!(series.points[0].max, -2.0);
    }
}
