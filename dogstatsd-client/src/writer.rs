use std::fmt::Write as _;

use crate::event::Event;

/// Maximum length, in bytes, of a single event payload.
///
/// The Datadog Agent silently drops event datagrams larger than this, so oversized events are rejected before they
/// ever reach the transport.
pub(crate) const MAX_EVENT_PAYLOAD_LEN: usize = 8192;

#[derive(Clone, Copy)]
pub(crate) enum MetricType {
    Count,
    Gauge,
    Histogram,
    Set,
}

impl MetricType {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            MetricType::Count => b"|c",
            MetricType::Gauge => b"|g",
            MetricType::Histogram => b"|h",
            MetricType::Set => b"|s",
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum MetricValue<'a> {
    Integer(i64),
    FloatingPoint(f64),
    Literal(&'a str),
}

struct MetricValueFormatter {
    int_writer: itoa::Buffer,
    float_writer: String,
}

impl MetricValueFormatter {
    fn new() -> Self {
        Self { int_writer: itoa::Buffer::new(), float_writer: String::new() }
    }

    /// Formats a floating-point value with exactly six fractional digits.
    fn format_fixed(&mut self, value: f64) -> &str {
        self.float_writer.clear();

        // Writing into a `String` cannot fail.
        let _ = write!(self.float_writer, "{value:.6}");
        &self.float_writer
    }

    fn format<'a>(&'a mut self, value: MetricValue<'a>) -> &'a str {
        match value {
            MetricValue::Integer(v) => self.int_writer.format(v),
            MetricValue::FloatingPoint(v) => self.format_fixed(v),
            MetricValue::Literal(v) => v,
        }
    }
}

/// Builds a single DogStatsD payload.
///
/// Every payload holds exactly one metric or one event, and is written to the transport as a single datagram without
/// a trailing newline.
pub(crate) struct PayloadWriter {
    buf: Vec<u8>,
    formatter: MetricValueFormatter,
}

impl PayloadWriter {
    /// Creates a new, empty `PayloadWriter`.
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(128), formatter: MetricValueFormatter::new() }
    }

    /// Returns the number of bytes in the current payload.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns the current payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn clear(&mut self) {
        self.buf.clear();
    }

    /// Writes a metric payload.
    ///
    /// The namespace is prepended to the metric name as-is, so any separator must already be part of it. Tags are
    /// written in the order given, with the global tags following the per-metric tags.
    #[allow(clippy::too_many_arguments)]
    pub fn write_metric<T, G>(
        &mut self,
        namespace: &str,
        name: &str,
        value: MetricValue<'_>,
        metric_type: MetricType,
        maybe_sample_rate: Option<f64>,
        tags: &[T],
        global_tags: &[G],
    ) where
        T: AsRef<str>,
        G: AsRef<str>,
    {
        self.clear();

        self.buf.extend_from_slice(namespace.as_bytes());
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(b':');

        let value_str = self.formatter.format(value);
        self.buf.extend_from_slice(value_str.as_bytes());
        self.buf.extend_from_slice(metric_type.as_bytes());

        // Only write the sample rate when we actually sampled, as 1.0 is the implied default.
        if let Some(sample_rate) = maybe_sample_rate {
            let sample_rate_str = self.formatter.format_fixed(sample_rate);

            self.buf.extend_from_slice(b"|@");
            self.buf.extend_from_slice(sample_rate_str.as_bytes());
        }

        self.write_tags(tags, global_tags);
    }

    /// Writes an event payload.
    ///
    /// `default_source` is used as the source type name when the event doesn't carry its own.
    ///
    /// Returns `true` if the event fits within [`MAX_EVENT_PAYLOAD_LEN`], or `false` if it does not. When `false` is
    /// returned, the payload must not be sent, but [`len`][Self::len] still reports the full encoded length.
    pub fn write_event<G>(&mut self, event: &Event, default_source: &str, global_tags: &[G]) -> bool
    where
        G: AsRef<str>,
    {
        self.clear();

        let title = event.title();
        let text = event.text();

        // Lengths are in characters, not bytes: the Agent uses them to split the title from the text.
        self.buf.extend_from_slice(b"_e{");
        self.buf.extend_from_slice(self.formatter.int_writer.format(title.chars().count()).as_bytes());
        self.buf.push(b',');
        self.buf.extend_from_slice(self.formatter.int_writer.format(text.chars().count()).as_bytes());
        self.buf.extend_from_slice(b"}:");
        self.buf.extend_from_slice(title.as_bytes());
        self.buf.push(b'|');
        self.buf.extend_from_slice(text.as_bytes());

        self.buf.extend_from_slice(b"|t:");
        self.buf.extend_from_slice(event.alert_type().as_str().as_bytes());

        let source = event.source_type_name().unwrap_or(default_source);
        if !source.is_empty() {
            self.write_field(b"|s:", source);
        }

        if let Some(timestamp) = event.timestamp() {
            self.buf.extend_from_slice(b"|d:");
            self.buf.extend_from_slice(self.formatter.int_writer.format(timestamp).as_bytes());
        }

        if let Some(priority) = event.priority() {
            self.write_field(b"|p:", priority.as_str());
        }

        if let Some(host) = event.host() {
            self.write_field(b"|h:", host);
        }

        if let Some(aggregation_key) = event.aggregation_key() {
            self.write_field(b"|k:", aggregation_key);
        }

        self.write_tags(event.tags(), global_tags);

        self.buf.len() <= MAX_EVENT_PAYLOAD_LEN
    }

    fn write_field(&mut self, prefix: &[u8], value: &str) {
        self.buf.extend_from_slice(prefix);
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn write_tags<T, G>(&mut self, tags: &[T], global_tags: &[G])
    where
        T: AsRef<str>,
        G: AsRef<str>,
    {
        // Write the tags specific to this payload first, and then additionally write any global tags.
        let all_tags = tags.iter().map(|tag| tag.as_ref()).chain(global_tags.iter().map(|tag| tag.as_ref()));

        let mut wrote_tag = false;
        for tag in all_tags {
            // If we haven't written a tag yet, write out the tags prefix first.
            //
            // Otherwise, write a tag separator.
            if wrote_tag {
                self.buf.push(b',');
            } else {
                self.buf.extend_from_slice(b"|#");
                wrote_tag = true;
            }

            self.buf.extend_from_slice(tag.as_bytes());
        }
    }
}
