use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use metrics::{
    Counter, CounterFn, Gauge, GaugeFn, Histogram, HistogramFn, Key, KeyName, Label, Metadata, Recorder,
    SharedString, Unit,
};
use parking_lot::Mutex;
use tracing::error;

use crate::{
    client::{DogStatsDClient, Error},
    writer::{MetricType, MetricValue},
};

/// A recorder that forwards metrics to a DogStatsD server.
///
/// Every update made through a metric handle is sent immediately, as its own payload: counters are sent as counts of
/// the increment, gauges as the resulting value, and histograms as the recorded value. Nothing is aggregated locally.
///
/// Registering the same key more than once returns the same handle, so the current value of a gauge and the last
/// absolute value of a counter are kept across uses of the `metrics` macros.
///
/// Since the `metrics` handles have no way to report failures, payloads that fail to send are logged and dropped.
pub struct DogStatsDRecorder {
    client: Arc<DogStatsDClient>,
    counters: Mutex<HashMap<Key, Arc<ForwardingCounter>>>,
    gauges: Mutex<HashMap<Key, Arc<ForwardingGauge>>>,
    histograms: Mutex<HashMap<Key, Arc<ForwardingHistogram>>>,
}

impl DogStatsDRecorder {
    pub(crate) fn new(client: Arc<DogStatsDClient>) -> Self {
        DogStatsDRecorder {
            client,
            counters: Mutex::new(HashMap::new()),
            gauges: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the client used to send metrics.
    pub fn client(&self) -> &Arc<DogStatsDClient> {
        &self.client
    }

    fn handle(&self, key: &Key) -> MetricHandle {
        MetricHandle {
            client: Arc::clone(&self.client),
            name: key.name().to_string(),
            tags: key.labels().map(label_to_tag).collect(),
        }
    }
}

impl Recorder for DogStatsDRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        Counter::from_arc(get_or_register(&self.counters, key, || ForwardingCounter {
            handle: self.handle(key),
            last_absolute: AtomicU64::new(0),
        }))
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(get_or_register(&self.gauges, key, || ForwardingGauge {
            handle: self.handle(key),
            value: AtomicU64::new(0.0f64.to_bits()),
        }))
    }

    fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(get_or_register(&self.histograms, key, || ForwardingHistogram {
            handle: self.handle(key),
        }))
    }
}

fn get_or_register<T, F>(handles: &Mutex<HashMap<Key, Arc<T>>>, key: &Key, init: F) -> Arc<T>
where
    F: FnOnce() -> T,
{
    let mut handles = handles.lock();
    if let Some(handle) = handles.get(key) {
        return Arc::clone(handle);
    }

    let handle = Arc::new(init());
    handles.insert(key.clone(), Arc::clone(&handle));
    handle
}

fn label_to_tag(label: &Label) -> String {
    // If the label value is empty, we treat it as a bare tag. This means all we write is something like `label_name`,
    // instead of a more naive form, like `label_name:`.
    if label.value().is_empty() {
        label.key().to_string()
    } else {
        format!("{}:{}", label.key(), label.value())
    }
}

struct MetricHandle {
    client: Arc<DogStatsDClient>,
    name: String,
    tags: Vec<String>,
}

impl MetricHandle {
    fn forward(&self, value: MetricValue<'_>, metric_type: MetricType) {
        if let Err(e) = self.client.send_metric(&self.name, value, metric_type, &self.tags, 1.0) {
            log_send_failure(&self.name, &e);
        }
    }
}

fn log_send_failure(metric_name: &str, e: &Error) {
    error!(metric_name, error = %e, "Failed to send metric.");
}

struct ForwardingCounter {
    handle: MetricHandle,
    last_absolute: AtomicU64,
}

impl CounterFn for ForwardingCounter {
    fn increment(&self, value: u64) {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        self.handle.forward(MetricValue::Integer(value), MetricType::Count);
    }

    fn absolute(&self, value: u64) {
        // Counts are deltas on the wire, so only forward how far the absolute value has moved since we last saw it.
        let previous = self.last_absolute.fetch_max(value, Ordering::AcqRel);
        if value > previous {
            self.increment(value - previous);
        }
    }
}

struct ForwardingGauge {
    handle: MetricHandle,
    value: AtomicU64,
}

impl ForwardingGauge {
    fn update<F>(&self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        let mut current = self.value.load(Ordering::Acquire);
        let new_value = loop {
            let new_value = f(f64::from_bits(current));
            match self.value.compare_exchange_weak(
                current,
                new_value.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break new_value,
                Err(actual) => current = actual,
            }
        };

        self.handle.forward(MetricValue::FloatingPoint(new_value), MetricType::Gauge);
    }
}

impl GaugeFn for ForwardingGauge {
    fn increment(&self, value: f64) {
        self.update(|current| current + value);
    }

    fn decrement(&self, value: f64) {
        self.update(|current| current - value);
    }

    fn set(&self, value: f64) {
        self.update(|_| value);
    }
}

struct ForwardingHistogram {
    handle: MetricHandle,
}

impl HistogramFn for ForwardingHistogram {
    fn record(&self, value: f64) {
        self.handle.forward(MetricValue::FloatingPoint(value), MetricType::Histogram);
    }
}
