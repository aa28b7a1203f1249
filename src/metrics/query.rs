//! Tag Filter / Query Resolver
//!
//! A filter is a conjunction of exact `key = value` matches. A sample
//! qualifies when its tag set contains every pair of the filter; extra tags
//! on the sample are ignored, and a sample lacking a filtered key never
//! qualifies. Qualifying samples are re-aggregated per statistic.

use super::types::{MetricSample, MetricStatistic, MetricsCollection, TagSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pairs: Vec<(String, String)>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        self.pairs
            .iter()
            .all(|(key, value)| tags.get(key) == Some(value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagFilter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TagFilter {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Merge samples per statistic, statistics in first-seen order
pub fn aggregate_samples<'a, I>(samples: I) -> Vec<MetricSample>
where
    I: IntoIterator<Item = &'a MetricSample>,
{
    let mut merged: Vec<(MetricStatistic, f64)> = Vec::new();
    for sample in samples {
        match merged.iter_mut().find(|(s, _)| *s == sample.statistic) {
            Some(slot) => slot.1 = sample.statistic.merge(slot.1, sample.value),
            None => merged.push((sample.statistic, sample.value)),
        }
    }
    merged
        .into_iter()
        .map(|(statistic, value)| MetricSample::new(statistic, value))
        .collect()
}

/// Re-aggregate the samples of `name` that satisfy `filter`.
///
/// Returns `None` when `name` has never been recorded and `Some(vec![])`
/// when it is known but nothing matches.
pub fn filter_and_aggregate(
    measurements: &MetricsCollection<Vec<MetricSample>>,
    name: &str,
    filter: &TagFilter,
) -> Option<Vec<MetricSample>> {
    let samples = measurements.get(name)?;
    Some(aggregate_samples(
        samples.iter().filter(|s| filter.matches(&s.tags)),
    ))
}
