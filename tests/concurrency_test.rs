//! Concurrent producers and readers
//!
//! Many threads record into overlapping metrics while readers query; every
//! reader must see whole measurements only, and the final totals must equal
//! the exact sum of everything recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use metrics_endpoint::endpoint::{MetricsEndpoint, MetricsEndpointOptions, MetricsRequest};
use metrics_endpoint::metrics::{InstrumentRegistry, MeasurementCollector, MetricStatistic, TagSet};

const PRODUCERS: usize = 8;
const EVENTS_PER_PRODUCER: usize = 5_000;

fn total_and_count(endpoint: &MetricsEndpoint, name: &str) -> Option<(f64, f64)> {
    let resp = endpoint.query(&MetricsRequest::new(name, vec![]))?;
    let detail = resp.as_detail()?;
    let value_of = |statistic: MetricStatistic| {
        detail
            .measurements
            .iter()
            .find(|s| s.statistic == statistic)
            .map(|s| s.value)
            .unwrap_or(0.0)
    };
    Some((value_of(MetricStatistic::Total), value_of(MetricStatistic::Count)))
}

#[test]
fn test_concurrent_record_and_query() {
    let collector = Arc::new(MeasurementCollector::new());
    let registry = Arc::new(InstrumentRegistry::new(collector.clone()));
    let endpoint = Arc::new(
        MetricsEndpoint::new(MetricsEndpointOptions::default(), collector.clone()).unwrap(),
    );
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let endpoint = endpoint.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut observations = 0usize;
                while !done.load(Ordering::Acquire) {
                    if let Some((total, count)) = total_and_count(&endpoint, "work.latency") {
                        // every recorded value is 2.0, so a torn fold would break this
                        assert_eq!(total, count * 2.0);
                        observations += 1;
                    }
                    let _ = endpoint.get_metrics();
                }
                observations
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let registry = registry.clone();
            thread::spawn(move || {
                let counter = registry.counter("work.items").unwrap();
                let histogram = registry.histogram("work.latency").unwrap();
                let own = registry.counter(&format!("producer.{p}")).unwrap();
                let tags = TagSet::new().with("producer", p).with("parity", p % 2);
                for _ in 0..EVENTS_PER_PRODUCER {
                    counter.increment(&tags);
                    histogram.record(2.0, &tags);
                    own.increment(&TagSet::new());
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    let expected = (PRODUCERS * EVENTS_PER_PRODUCER) as f64;
    let (total, _) = total_and_count(&endpoint, "work.items").unwrap();
    assert_eq!(total, expected);
    let (total, count) = total_and_count(&endpoint, "work.latency").unwrap();
    assert_eq!(count, expected);
    assert_eq!(total, expected * 2.0);

    let even = endpoint
        .query(&MetricsRequest::new(
            "work.items",
            vec![("parity".to_string(), "0".to_string())],
        ))
        .unwrap();
    assert_eq!(
        even.as_detail().unwrap().measurements[0].value,
        expected / 2.0
    );

    // 2 shared metrics + one per producer
    assert_eq!(collector.len(), PRODUCERS + 2);
    let resp = endpoint.list_names();
    assert_eq!(resp.as_list_names().unwrap().names.len(), PRODUCERS + 2);
}

#[test]
fn test_names_are_never_duplicated_under_contention() {
    let collector = Arc::new(MeasurementCollector::new());
    let registry = Arc::new(InstrumentRegistry::new(collector.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    registry
                        .counter(&format!("metric.{i}"))
                        .unwrap()
                        .increment(&TagSet::new());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let names = collector.metric_names();
    assert_eq!(names.len(), 50);
    assert_eq!(registry.instrument_names().len(), 50);
    let series = collector.series_for("metric.7").unwrap();
    assert_eq!(series.points[0].sum, 8.0);
}
