use std::time::SystemTime;

/// Event priority.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Priority {
    /// Normal priority.
    Normal,

    /// Low priority.
    Low,
}

impl Priority {
    /// Returns the wire representation of this priority.
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

/// Event alert type.
///
/// Controls how the event is displayed in the Datadog event stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AlertType {
    /// Informational event.
    #[default]
    Info,

    /// Something succeeded.
    Success,

    /// Something might need attention.
    Warning,

    /// Something failed.
    Error,
}

impl AlertType {
    /// Returns the wire representation of this alert type.
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertType::Info => "info",
            AlertType::Success => "success",
            AlertType::Warning => "warning",
            AlertType::Error => "error",
        }
    }
}

/// An event to post to the Datadog event stream.
///
/// Only the title and text are required. All other fields are optional, and are only written to the payload when set.
/// The alert type defaults to [`AlertType::Info`], and the source type name defaults to the client's event source.
///
/// ```
/// # use dogstatsd_client::{AlertType, Event, Priority};
/// let event = Event::new("deploy finished", "rolled out build 1234")
///     .with_alert_type(AlertType::Success)
///     .with_priority(Priority::Low)
///     .with_tags(["service:checkout"]);
///
/// assert_eq!(event.title(), "deploy finished");
/// ```
#[derive(Clone, Debug)]
pub struct Event {
    title: String,
    text: String,
    date_happened: Option<SystemTime>,
    host: Option<String>,
    aggregation_key: Option<String>,
    priority: Option<Priority>,
    source_type_name: Option<String>,
    alert_type: AlertType,
    tags: Vec<String>,
}

impl Event {
    /// Creates a new `Event` with the given title and text.
    pub fn new<T, X>(title: T, text: X) -> Self
    where
        T: Into<String>,
        X: Into<String>,
    {
        Event {
            title: title.into(),
            text: text.into(),
            date_happened: None,
            host: None,
            aggregation_key: None,
            priority: None,
            source_type_name: None,
            alert_type: AlertType::default(),
            tags: Vec::new(),
        }
    }

    /// Sets when the event happened.
    ///
    /// When not set, the Datadog Agent uses the time the event was received.
    #[must_use]
    pub fn with_date_happened(mut self, date_happened: SystemTime) -> Self {
        self.date_happened = Some(date_happened);
        self
    }

    /// Sets the hostname the event is attributed to.
    #[must_use]
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the aggregation key, used to group related events together.
    #[must_use]
    pub fn with_aggregation_key<S: Into<String>>(mut self, aggregation_key: S) -> Self {
        self.aggregation_key = Some(aggregation_key.into());
        self
    }

    /// Sets the event priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the source type name.
    ///
    /// An empty name is treated as unset, falling back to the client's event source.
    #[must_use]
    pub fn with_source_type_name<S: Into<String>>(mut self, source_type_name: S) -> Self {
        let source_type_name = source_type_name.into();
        self.source_type_name = (!source_type_name.is_empty()).then_some(source_type_name);
        self
    }

    /// Sets the alert type.
    #[must_use]
    pub fn with_alert_type(mut self, alert_type: AlertType) -> Self {
        self.alert_type = alert_type;
        self
    }

    /// Sets the tags for this event, replacing any existing tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns when the event happened, if set.
    pub fn date_happened(&self) -> Option<SystemTime> {
        self.date_happened
    }

    /// Returns the hostname, if set.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the aggregation key, if set.
    pub fn aggregation_key(&self) -> Option<&str> {
        self.aggregation_key.as_deref()
    }

    /// Returns the priority, if set.
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Returns the source type name, if set.
    pub fn source_type_name(&self) -> Option<&str> {
        self.source_type_name.as_deref()
    }

    /// Returns the alert type.
    pub fn alert_type(&self) -> AlertType {
        self.alert_type
    }

    /// Returns the tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Seconds since the Unix epoch of `date_happened`.
    ///
    /// Dates before the epoch are not representable on the wire and are treated as unset.
    pub(crate) fn timestamp(&self) -> Option<u64> {
        self.date_happened
            .and_then(|date| date.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs())
    }
}
