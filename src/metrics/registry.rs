//! Instrument Registry
//!
//! Application code records through `Counter` and `Histogram` handles. Every
//! reading becomes a `MeasurementEvent` pushed into a `MeasurementSink`
//! (normally the `MeasurementCollector`).

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::warn;

use super::types::{InstrumentKind, MeasurementEvent, TagSet};
use crate::error::{MetricsError, Result};

/// Receiver of raw measurement events
pub trait MeasurementSink: Send + Sync + 'static {
    fn record(&self, event: MeasurementEvent) -> Result<()>;
}

/// Sink that drops everything
#[derive(Clone, Default)]
pub struct NoopSink;

impl MeasurementSink for NoopSink {
    #[inline]
    fn record(&self, _event: MeasurementEvent) -> Result<()> {
        Ok(())
    }
}

/// Arc wrapper for trait object usage
pub type SharedSink = Arc<dyn MeasurementSink>;

pub fn noop_sink() -> SharedSink {
    Arc::new(NoopSink)
}

struct Instrument {
    name: String,
    kind: InstrumentKind,
    sink: SharedSink,
}

impl Instrument {
    fn emit(&self, value: f64, tags: &TagSet) {
        let event = MeasurementEvent::new(self.name.clone(), value, tags.clone(), self.kind);
        if let Err(e) = self.sink.record(event) {
            warn!(metric = %self.name, error = %e, "Dropped measurement");
        }
    }
}

/// Monotonically accumulating instrument
#[derive(Clone)]
pub struct Counter {
    inner: Arc<Instrument>,
}

impl Counter {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Add a non-negative amount
    pub fn add(&self, value: f64, tags: &TagSet) {
        if value < 0.0 || value.is_nan() {
            warn!(metric = %self.inner.name, value, "Counter increment must be non-negative");
            return;
        }
        self.inner.emit(value, tags);
    }

    pub fn increment(&self, tags: &TagSet) {
        self.add(1.0, tags);
    }
}

/// Instrument recording a distribution of values
#[derive(Clone)]
pub struct Histogram {
    inner: Arc<Instrument>,
}

impl Histogram {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn record(&self, value: f64, tags: &TagSet) {
        self.inner.emit(value, tags);
    }
}

#[derive(Default)]
struct Instruments {
    by_name: AHashMap<String, Arc<Instrument>>,
    order: Vec<String>,
}

/// Owner of all live instruments for one process (or one test)
pub struct InstrumentRegistry {
    sink: SharedSink,
    instruments: RwLock<Instruments>,
}

impl InstrumentRegistry {
    pub fn new(sink: SharedSink) -> Self {
        InstrumentRegistry {
            sink,
            instruments: RwLock::new(Instruments::default()),
        }
    }

    /// Create or get the counter called `name`
    pub fn counter(&self, name: &str) -> Result<Counter> {
        let inner = self.get_or_create(name, InstrumentKind::Counter)?;
        Ok(Counter { inner })
    }

    /// Create or get the histogram called `name`
    pub fn histogram(&self, name: &str) -> Result<Histogram> {
        let inner = self.get_or_create(name, InstrumentKind::Histogram)?;
        Ok(Histogram { inner })
    }

    /// Registered instrument names in creation order
    pub fn instrument_names(&self) -> Vec<String> {
        self.instruments.read().order.clone()
    }

    fn get_or_create(&self, name: &str, kind: InstrumentKind) -> Result<Arc<Instrument>> {
        if name.is_empty() {
            return Err(MetricsError::EmptyMetricName);
        }

        if let Some(existing) = self.instruments.read().by_name.get(name) {
            return Self::check_kind(existing, kind);
        }

        let mut instruments = self.instruments.write();
        if let Some(existing) = instruments.by_name.get(name) {
            return Self::check_kind(existing, kind);
        }

        let instrument = Arc::new(Instrument {
            name: name.to_string(),
            kind,
            sink: self.sink.clone(),
        });
        instruments
            .by_name
            .insert(name.to_string(), instrument.clone());
        instruments.order.push(name.to_string());
        Ok(instrument)
    }

    fn check_kind(existing: &Arc<Instrument>, kind: InstrumentKind) -> Result<Arc<Instrument>> {
        if existing.kind != kind {
            return Err(MetricsError::InstrumentKindMismatch {
                name: existing.name.clone(),
                registered: existing.kind,
                requested: kind,
            });
        }
        Ok(existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        events: Mutex<Vec<MeasurementEvent>>,
    }

    impl MeasurementSink for CapturingSink {
        fn record(&self, event: MeasurementEvent) -> Result<()> {
            self.events.lock().push(event);
            Ok(())
        }
    }

    #[test]
    fn test_counter_emits_events() {
        let sink = Arc::new(CapturingSink::default());
        let registry = InstrumentRegistry::new(sink.clone());

        let counter = registry.counter("http.server.requests").unwrap();
        counter.increment(&TagSet::new().with("status", 200));
        counter.add(4.0, &TagSet::new());

        let events = sink.events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, InstrumentKind::Counter);
        assert_eq!(events[0].tags.get("status"), Some("200"));
        assert_eq!(events[1].value, 4.0);
    }

    #[test]
    fn test_counter_rejects_negative() {
        let sink = Arc::new(CapturingSink::default());
        let registry = InstrumentRegistry::new(sink.clone());

        registry.counter("c").unwrap().add(-1.0, &TagSet::new());
        assert!(sink.events.lock().is_empty());
    }

    #[test]
    fn test_same_name_same_kind_is_shared() {
        let registry = InstrumentRegistry::new(noop_sink());
        let a = registry.histogram("latency").unwrap();
        let b = registry.histogram("latency").unwrap();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
        assert_eq!(registry.instrument_names(), vec!["latency"]);
    }

    #[test]
    fn test_kind_mismatch() {
        let registry = InstrumentRegistry::new(noop_sink());
        registry.counter("requests").unwrap();

        let err = registry.histogram("requests").err().unwrap();
        assert!(matches!(
            err,
            MetricsError::InstrumentKindMismatch {
                registered: InstrumentKind::Counter,
                requested: InstrumentKind::Histogram,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let registry = InstrumentRegistry::new(noop_sink());
        assert!(matches!(
            registry.counter(""),
            Err(MetricsError::EmptyMetricName)
        ));
    }
}
