use std::io;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::trace;

use crate::{
    event::{AlertType, Event},
    forwarder::Transport,
    process::{MemoryStats, MEMORY_METRIC_PREFIX},
    sampling,
    telemetry::{Telemetry, TelemetrySnapshot},
    writer::{MetricType, MetricValue, PayloadWriter},
};

/// Errors that could occur while sending a metric or event.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed to write the payload.
    ///
    /// The payload is not retried.
    #[error("failed to write payload to transport: {0}")]
    Transport(#[from] io::Error),

    /// The event payload exceeded the maximum payload length, and was discarded without being sent.
    #[error("event \"{title}\" payload is too big (more than 8KB), event discarded")]
    PayloadTooLarge {
        /// Title of the discarded event.
        title: String,

        /// Length of the encoded payload, in bytes.
        len: usize,
    },

    /// The memory statistics of the current process could not be read.
    #[error("failed to read process memory statistics: {0}")]
    MemoryStats(#[source] io::Error),
}

struct ClientConfig {
    namespace: String,
    event_source: String,
    global_tags: Vec<String>,
}

impl ClientConfig {
    fn new(namespace: String, global_tags: Vec<String>) -> Self {
        let mut config = ClientConfig { namespace: String::new(), event_source: String::new(), global_tags };
        config.set_namespace(namespace);
        config
    }

    fn set_namespace(&mut self, namespace: String) {
        self.event_source = event_source_from_namespace(&namespace).to_string();
        self.namespace = namespace;
    }
}

/// The event source is the namespace up to, but not including, its first `.`.
fn event_source_from_namespace(namespace: &str) -> &str {
    namespace.split_once('.').map_or(namespace, |(source, _)| source)
}

/// A client for sending metrics and events to a DogStatsD server.
///
/// Every call builds exactly one payload and writes it to the transport as a single datagram. Nothing is buffered,
/// aggregated, or retried: a call either returns after the write completes, or returns the error the transport gave.
///
/// The namespace and global tags can be changed at any time through a shared reference, and apply to every metric and
/// event sent afterwards. Each payload observes a consistent namespace/global tags pair.
///
/// Clients are built with [`DogStatsDBuilder`][crate::DogStatsDBuilder].
pub struct DogStatsDClient {
    transport: Box<dyn Transport>,
    config: RwLock<ClientConfig>,
    telemetry: Telemetry,
}

impl DogStatsDClient {
    pub(crate) fn new(transport: Box<dyn Transport>, namespace: String, global_tags: Vec<String>) -> Self {
        DogStatsDClient {
            transport,
            config: RwLock::new(ClientConfig::new(namespace, global_tags)),
            telemetry: Telemetry::default(),
        }
    }

    /// Returns the namespace prepended to every metric name.
    pub fn namespace(&self) -> String {
        self.config.read().namespace.clone()
    }

    /// Sets the namespace prepended to every metric name.
    ///
    /// The namespace is prepended as-is, so it should include its own trailing separator, such as `"myapp."`. This also
    /// changes the [event source][Self::event_source].
    pub fn set_namespace<S: Into<String>>(&self, namespace: S) {
        self.config.write().set_namespace(namespace.into());
    }

    /// Returns the default source type name for events.
    ///
    /// This is derived from the namespace, by truncating it at the first `.`: a namespace of `"myapp.web."` results in
    /// an event source of `"myapp"`.
    pub fn event_source(&self) -> String {
        self.config.read().event_source.clone()
    }

    /// Returns the tags added to every metric and event.
    pub fn global_tags(&self) -> Vec<String> {
        self.config.read().global_tags.clone()
    }

    /// Sets the tags added to every metric and event.
    ///
    /// Global tags are written after any tags given for the specific metric or event.
    pub fn set_global_tags<I, S>(&self, global_tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let global_tags = global_tags.into_iter().map(Into::into).collect();
        self.config.write().global_tags = global_tags;
    }

    /// Returns a snapshot of this client's send statistics.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Sends a gauge, which measures the value of something at a particular time.
    ///
    /// # Errors
    ///
    /// If the transport fails to write the payload, an error is returned.
    pub fn gauge(&self, name: &str, value: f64, tags: &[&str], rate: f64) -> Result<(), Error> {
        self.send_metric(name, MetricValue::FloatingPoint(value), MetricType::Gauge, tags, rate)
    }

    /// Sends a count, which tracks how many times something happened.
    ///
    /// # Errors
    ///
    /// If the transport fails to write the payload, an error is returned.
    pub fn count(&self, name: &str, value: i64, tags: &[&str], rate: f64) -> Result<(), Error> {
        self.send_metric(name, MetricValue::Integer(value), MetricType::Count, tags, rate)
    }

    /// Sends a count of `value`.
    ///
    /// # Errors
    ///
    /// If the transport fails to write the payload, an error is returned.
    pub fn increment(&self, name: &str, value: i64, tags: &[&str], rate: f64) -> Result<(), Error> {
        self.count(name, value, tags, rate)
    }

    /// Sends a count of `-value`.
    ///
    /// # Errors
    ///
    /// If the transport fails to write the payload, an error is returned.
    pub fn decrement(&self, name: &str, value: i64, tags: &[&str], rate: f64) -> Result<(), Error> {
        self.count(name, value.saturating_neg(), tags, rate)
    }

    /// Sends a histogram value, which tracks the statistical distribution of a set of values.
    ///
    /// # Errors
    ///
    /// If the transport fails to write the payload, an error is returned.
    pub fn histogram(&self, name: &str, value: f64, tags: &[&str], rate: f64) -> Result<(), Error> {
        self.send_metric(name, MetricValue::FloatingPoint(value), MetricType::Histogram, tags, rate)
    }

    /// Sends a set value, which counts the number of unique elements in a group.
    ///
    /// # Errors
    ///
    /// If the transport fails to write the payload, an error is returned.
    pub fn set(&self, name: &str, value: &str, tags: &[&str], rate: f64) -> Result<(), Error> {
        self.send_metric(name, MetricValue::Literal(value), MetricType::Set, tags, rate)
    }

    /// Sends an event to the Datadog event stream.
    ///
    /// If the event doesn't have a source type name, the client's [event source][Self::event_source] is used.
    ///
    /// # Errors
    ///
    /// If the encoded event is larger than 8192 bytes, it is discarded without being sent and an error is returned. If
    /// the transport fails to write the payload, an error is returned.
    pub fn event(&self, event: &Event) -> Result<(), Error> {
        let mut writer = PayloadWriter::new();
        let fits = {
            let config = self.config.read();
            writer.write_event(event, &config.event_source, &config.global_tags)
        };

        if !fits {
            self.telemetry.track_packet_serializer_failed(writer.len());
            return Err(Error::PayloadTooLarge { title: event.title().to_string(), len: writer.len() });
        }

        self.send(writer.as_bytes())
    }

    /// Sends an informational event.
    ///
    /// # Errors
    ///
    /// See [`event`][Self::event].
    pub fn info(&self, title: &str, text: &str, tags: &[&str]) -> Result<(), Error> {
        self.alert(AlertType::Info, title, text, tags)
    }

    /// Sends a success event.
    ///
    /// # Errors
    ///
    /// See [`event`][Self::event].
    pub fn success(&self, title: &str, text: &str, tags: &[&str]) -> Result<(), Error> {
        self.alert(AlertType::Success, title, text, tags)
    }

    /// Sends a warning event.
    ///
    /// # Errors
    ///
    /// See [`event`][Self::event].
    pub fn warning(&self, title: &str, text: &str, tags: &[&str]) -> Result<(), Error> {
        self.alert(AlertType::Warning, title, text, tags)
    }

    /// Sends an error event.
    ///
    /// # Errors
    ///
    /// See [`event`][Self::event].
    pub fn error(&self, title: &str, text: &str, tags: &[&str]) -> Result<(), Error> {
        self.alert(AlertType::Error, title, text, tags)
    }

    fn alert(&self, alert_type: AlertType, title: &str, text: &str, tags: &[&str]) -> Result<(), Error> {
        let event = Event::new(title, text).with_alert_type(alert_type).with_tags(tags.iter().copied());
        self.event(&event)
    }

    /// Reads the memory statistics of the current process and sends each of them as a gauge.
    ///
    /// Gauges are named `process.memory.<stat>`, and are subject to the namespace and global tags like any other
    /// metric.
    ///
    /// # Errors
    ///
    /// If the statistics cannot be read, or the transport fails to write any of the payloads, an error is returned.
    /// Sending stops at the first failure.
    pub fn report_memory_stats(&self, tags: &[&str]) -> Result<(), Error> {
        let stats = MemoryStats::read().map_err(Error::MemoryStats)?;

        let mut name = String::with_capacity(MEMORY_METRIC_PREFIX.len() + 24);
        for (stat, value) in stats.iter() {
            name.clear();
            name.push_str(MEMORY_METRIC_PREFIX);
            name.push_str(stat);

            self.gauge(&name, value as f64, tags, 1.0)?;
        }

        Ok(())
    }

    /// Samples, encodes, and sends a single metric.
    pub(crate) fn send_metric<T>(
        &self,
        name: &str,
        value: MetricValue<'_>,
        metric_type: MetricType,
        tags: &[T],
        rate: f64,
    ) -> Result<(), Error>
    where
        T: AsRef<str>,
    {
        let maybe_sample_rate = if rate < 1.0 {
            if !sampling::should_send(&mut rand::rng(), rate) {
                trace!(metric_name = name, rate, "Metric sampled out.");
                self.telemetry.track_point_sampled_out();
                return Ok(());
            }

            Some(rate)
        } else {
            None
        };

        let mut writer = PayloadWriter::new();
        {
            let config = self.config.read();
            writer.write_metric(
                &config.namespace,
                name,
                value,
                metric_type,
                maybe_sample_rate,
                tags,
                &config.global_tags,
            );
        }

        self.send(writer.as_bytes())
    }

    fn send(&self, payload: &[u8]) -> Result<(), Error> {
        match self.transport.send(payload) {
            Ok(_) => {
                self.telemetry.track_packet_send_succeeded(payload.len());
                Ok(())
            }
            Err(e) => {
                self.telemetry.track_packet_send_failed(payload.len());
                Err(Error::Transport(e))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        io,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    };

    use parking_lot::Mutex;

    use super::{event_source_from_namespace, DogStatsDClient, Error};
    use crate::{
        event::{AlertType, Event},
        forwarder::Transport,
        telemetry::TelemetrySnapshot,
    };

    const NO_TAGS: &[&str] = &[];

    /// Transport that records every payload written to it, optionally failing instead.
    #[derive(Default)]
    pub(crate) struct CapturingTransport {
        payloads: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl CapturingTransport {
        pub fn payloads(&self) -> Vec<String> {
            self.payloads.lock().clone()
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::Relaxed);
        }
    }

    impl Transport for CapturingTransport {
        fn send(&self, payload: &[u8]) -> io::Result<usize> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
            }

            self.payloads.lock().push(String::from_utf8(payload.to_vec()).unwrap());
            Ok(payload.len())
        }
    }

    pub(crate) fn capturing_client() -> (Arc<CapturingTransport>, DogStatsDClient) {
        let transport = Arc::new(CapturingTransport::default());
        let client = DogStatsDClient::new(Box::new(Arc::clone(&transport)), String::new(), Vec::new());
        (transport, client)
    }

    #[test]
    fn metrics() {
        let (transport, client) = capturing_client();

        client.gauge("test.gauge", 1.0, NO_TAGS, 1.0).unwrap();
        client.count("test.count", -1, &["tagA"], 1.0).unwrap();
        client.histogram("test.histogram", 2.3, &["tagA"], 1.0).unwrap();
        client.increment("test.count", 5, NO_TAGS, 1.0).unwrap();
        client.decrement("test.count", 5, NO_TAGS, 1.0).unwrap();

        client.set_namespace("flubber.");
        client.set("test.set", "uuid", &["tagA"], 1.0).unwrap();

        client.set_namespace("");
        client.set_global_tags(["tagC"]);
        client.set("test.set", "uuid", &["tagA"], 1.0).unwrap();

        assert_eq!(
            transport.payloads(),
            vec![
                "test.gauge:1.000000|g",
                "test.count:-1|c|#tagA",
                "test.histogram:2.300000|h|#tagA",
                "test.count:5|c",
                "test.count:-5|c",
                "flubber.test.set:uuid|s|#tagA",
                "test.set:uuid|s|#tagA,tagC",
            ]
        );
    }

    #[test]
    fn rate_at_or_above_one_always_sends() {
        let (transport, client) = capturing_client();

        for _ in 0..1000 {
            client.gauge("test.gauge", 1.0, NO_TAGS, 1.0).unwrap();
        }
        client.gauge("test.gauge", 1.0, NO_TAGS, 2.0).unwrap();

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 1001);
        assert!(payloads.iter().all(|payload| !payload.contains("|@")));
    }

    #[test]
    fn sampled_metrics() {
        const TRIALS: u64 = 20_000;

        let (transport, client) = capturing_client();
        for _ in 0..TRIALS {
            client.count("test.count", 1, &["tagA"], 0.5).unwrap();
        }

        let payloads = transport.payloads();
        let fraction = payloads.len() as f64 / TRIALS as f64;
        assert!((fraction - 0.5).abs() < 0.05, "sent fraction {fraction}");
        assert!(payloads.iter().all(|payload| payload == "test.count:1|c|@0.500000|#tagA"));

        let telemetry = client.telemetry();
        assert_eq!(telemetry.packets_sent + telemetry.points_sampled_out, TRIALS);
    }

    #[test]
    fn events() {
        let (transport, client) = capturing_client();
        client.set_namespace("flubber.");

        client.warning("title", "text", &["tag1", "tag2"]).unwrap();
        client.error("Error!", "some error", &["tag3"]).unwrap();
        client.info("FYI", "note", NO_TAGS).unwrap();
        client.success("Great News", "hurray", &["foo", "bar", "baz"]).unwrap();
        client.info("Unicode", "世界", NO_TAGS).unwrap();
        client
            .event(&Event::new("custom", "body").with_source_type_name("bar").with_alert_type(AlertType::Success))
            .unwrap();

        client.set_global_tags(["tagC"]);
        client.event(&Event::new("tagged", "body").with_tags(["tagA"])).unwrap();

        assert_eq!(
            transport.payloads(),
            vec![
                "_e{5,4}:title|text|t:warning|s:flubber|#tag1,tag2",
                "_e{6,10}:Error!|some error|t:error|s:flubber|#tag3",
                "_e{3,4}:FYI|note|t:info|s:flubber",
                "_e{10,6}:Great News|hurray|t:success|s:flubber|#foo,bar,baz",
                "_e{7,2}:Unicode|世界|t:info|s:flubber",
                "_e{6,4}:custom|body|t:success|s:bar",
                "_e{6,4}:tagged|body|t:info|s:flubber|#tagA,tagC",
            ]
        );
    }

    #[test]
    fn oversized_event_is_discarded() {
        let (transport, client) = capturing_client();

        let text = "a".repeat(8193);
        let err = client.error("too long", &text, NO_TAGS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "event \"too long\" payload is too big (more than 8KB), event discarded"
        );
        assert!(matches!(err, Error::PayloadTooLarge { ref title, len } if title == "too long" && len > 8192));

        assert!(transport.payloads().is_empty());
        let telemetry = client.telemetry();
        assert_eq!(telemetry.packets_sent, 0);
        assert_eq!(telemetry.packets_dropped_serializer, 1);
    }

    #[test]
    fn transport_errors_are_returned() {
        let (transport, client) = capturing_client();
        transport.set_failing(true);

        let err = client.count("test.count", 1, NO_TAGS, 1.0).unwrap_err();
        assert!(matches!(err, Error::Transport(ref e) if e.kind() == std::io::ErrorKind::ConnectionRefused));
        assert!(client.info("title", "text", NO_TAGS).is_err());

        transport.set_failing(false);
        client.count("test.count", 1, NO_TAGS, 1.0).unwrap();

        assert_eq!(
            client.telemetry(),
            TelemetrySnapshot {
                packets_sent: 1,
                bytes_sent: 14,
                packets_dropped: 2,
                packets_dropped_writer: 2,
                packets_dropped_serializer: 0,
                bytes_dropped: 14 + 25,
                points_sampled_out: 0,
            }
        );
    }

    #[test]
    fn configuration_round_trip() {
        let (_, client) = capturing_client();

        client.set_namespace("flubber.web.");
        assert_eq!(client.namespace(), "flubber.web.");
        assert_eq!(client.event_source(), "flubber");

        client.set_global_tags(["tagC", "env:prod"]);
        assert_eq!(client.global_tags(), vec!["tagC", "env:prod"]);

        client.set_global_tags(Vec::<String>::new());
        assert!(client.global_tags().is_empty());
    }

    #[test]
    fn event_source() {
        // Cases are defined as: namespace, expected event source.
        let cases = [("", ""), ("flubber.", "flubber"), ("flubber", "flubber"), ("a.b.c", "a"), (".x", "")];

        for (namespace, expected) in cases {
            assert_eq!(event_source_from_namespace(namespace), expected);
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn memory_stats() {
        let (transport, client) = capturing_client();
        client.set_namespace("flubber.");
        client.report_memory_stats(&["tagA"]).unwrap();

        let payloads = transport.payloads();
        let names: Vec<_> =
            payloads.iter().map(|payload| payload.split(':').next().unwrap()).collect();
        assert_eq!(
            names,
            [
                "flubber.process.memory.resident",
                "flubber.process.memory.peak_resident",
                "flubber.process.memory.virtual_size",
                "flubber.process.memory.peak_virtual_size",
                "flubber.process.memory.data",
                "flubber.process.memory.swap",
            ]
        );
        assert!(payloads.iter().all(|payload| payload.ends_with("|g|#tagA")));
    }

    #[test]
    fn concurrent_sends() {
        let (transport, client) = capturing_client();
        let client = Arc::new(client);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let client = Arc::clone(&client);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        client.count("test.count", i, NO_TAGS, 1.0).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 1000);
        for i in 0..4 {
            let expected = format!("test.count:{i}|c");
            assert_eq!(payloads.iter().filter(|payload| **payload == expected).count(), 250);
        }
    }
}
