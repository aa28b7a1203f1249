//! Core data model: measurements, tag sets, samples and collections.

use ahash::AHashMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Kind of instrument a measurement was recorded through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    Counter,
    Histogram,
}

impl InstrumentKind {
    /// Statistics reported for this kind of instrument, in output order
    pub fn statistics(&self) -> &'static [MetricStatistic] {
        match self {
            InstrumentKind::Counter => &[MetricStatistic::Total],
            InstrumentKind::Histogram => &[
                MetricStatistic::Total,
                MetricStatistic::Count,
                MetricStatistic::Max,
            ],
        }
    }
}

/// Named aggregation function applied to a set of measurement values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricStatistic {
    Total,
    Count,
    Max,
}

impl MetricStatistic {
    /// Combine two partial values of this statistic
    pub fn merge(&self, a: f64, b: f64) -> f64 {
        match self {
            MetricStatistic::Total | MetricStatistic::Count => a + b,
            MetricStatistic::Max => a.max(b),
        }
    }
}

/// Ordered key/value labels attached to a measurement.
///
/// Keys are unique; inserting an existing key replaces its value in place so
/// the first-seen key order is kept. Values are stored in their string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
    tags: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.tags.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.tags.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy with pairs sorted by key; equal for tag sets that differ only
    /// in insertion order
    pub fn canonical(&self) -> TagSet {
        let mut tags = self.tags.clone();
        tags.sort_unstable();
        TagSet { tags }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// One raw reading emitted by application code
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementEvent {
    pub name: String,
    pub value: f64,
    pub tags: TagSet,
    pub kind: InstrumentKind,
}

impl MeasurementEvent {
    pub fn new(name: impl Into<String>, value: f64, tags: TagSet, kind: InstrumentKind) -> Self {
        MeasurementEvent {
            name: name.into(),
            value,
            tags,
            kind,
        }
    }

    pub fn counter(name: impl Into<String>, value: f64, tags: TagSet) -> Self {
        Self::new(name, value, tags, InstrumentKind::Counter)
    }

    pub fn histogram(name: impl Into<String>, value: f64, tags: TagSet) -> Self {
        Self::new(name, value, tags, InstrumentKind::Histogram)
    }
}

/// One aggregated number for a metric.
///
/// Samples taken from a snapshot carry the tag combination they were
/// recorded under; re-aggregated samples carry an empty tag set. Tags are
/// never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub statistic: MetricStatistic,
    pub value: f64,
    #[serde(skip)]
    pub tags: TagSet,
}

impl MetricSample {
    pub fn new(statistic: MetricStatistic, value: f64) -> Self {
        MetricSample {
            statistic,
            value,
            tags: TagSet::new(),
        }
    }

    pub fn with_tags(statistic: MetricStatistic, value: f64, tags: TagSet) -> Self {
        MetricSample {
            statistic,
            value,
            tags,
        }
    }
}

/// Distinct values observed for one tag key across a metric's measurements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricTag {
    pub tag: String,
    pub values: Vec<String>,
}

impl MetricTag {
    pub fn new(tag: impl Into<String>) -> Self {
        MetricTag {
            tag: tag.into(),
            values: Vec::new(),
        }
    }

    /// Add a value unless it was already observed
    pub fn observe(&mut self, value: &str) {
        if !self.values.iter().any(|v| v == value) {
            self.values.push(value.to_string());
        }
    }
}

/// Mapping from metric name to `T` that iterates in insertion order
#[derive(Debug, Clone)]
pub struct MetricsCollection<T> {
    entries: Vec<(String, T)>,
    index: AHashMap<String, usize>,
}

impl<T> Default for MetricsCollection<T> {
    fn default() -> Self {
        MetricsCollection {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

impl<T> MetricsCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its original position
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Serialize> Serialize for MetricsCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
