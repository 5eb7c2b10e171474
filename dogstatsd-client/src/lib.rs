//! A client for sending metrics and events to a [DogStatsD][dsd]-compatible server.
//!
//! [dsd]: https://docs.datadoghq.com/developers/dogstatsd/
//!
//! # Usage
//!
//! ```no_run
//! # use dogstatsd_client::{DogStatsDBuilder, Event, Priority};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // First, create and configure a client.
//! //
//! // The namespace is prepended as-is to every metric name, and the global tags are added to every metric and event.
//! let client = DogStatsDBuilder::default()
//!     .with_remote_address("127.0.0.1:8125")?
//!     .with_namespace("flubber.")
//!     .with_global_tags(["us-east-1a"])
//!     .build()?;
//!
//! // Each call sends a single datagram right away.
//! client.gauge("request.duration", 1.2, &[], 1.0)?;
//! client.count("request.count", 1, &["endpoint:checkout"], 1.0)?;
//!
//! // Sample rates below 1.0 randomly drop a share of calls, and tell the server the rate so it can scale counts back
//! // up.
//! client.histogram("request.size", 512.0, &[], 0.1)?;
//!
//! // Events go to the Datadog event stream.
//! client.info("deploy", "rolled out build 1234", &[])?;
//! client.event(&Event::new("cache flushed", "manual flush").with_priority(Priority::Low))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Wire format
//!
//! Metrics are written as `<namespace><name>:<value>|<type>[|@<rate>][|#<tags>]`, where floating-point values and
//! sample rates always carry six fractional digits. Events are written as
//! `_e{<title len>,<text len>}:<title>|<text>|t:<alert type>[|s:<source>][|d:<timestamp>][|p:<priority>][|h:<host>][|k:<key>][|#<tags>]`,
//! with lengths measured in characters.
//!
//! In both cases, tags given for the specific metric or event come first, followed by the client's global tags. Tags
//! are not deduplicated.
//!
//! # Delivery
//!
//! There is no buffering, aggregation, or retrying: a metric or event is either written to the transport as a single
//! datagram, or an error is returned to the caller. Events larger than 8192 bytes are rejected without being sent, as
//! the Datadog Agent would drop them anyway.
//!
//! # `metrics` integration
//!
//! [`DogStatsDBuilder::install`] installs a [`DogStatsDRecorder`] as the global [`metrics`] recorder, forwarding every
//! counter, gauge, and histogram update through the client as it happens.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod builder;
pub use self::builder::{BuildError, DogStatsDBuilder};

mod client;
pub use self::client::{DogStatsDClient, Error};

mod event;
pub use self::event::{AlertType, Event, Priority};

mod forwarder;
pub use self::forwarder::{NopTransport, Transport};

pub mod naming;

mod process;
pub use self::process::MemoryStats;

mod recorder;
pub use self::recorder::DogStatsDRecorder;

mod sampling;

mod telemetry;
pub use self::telemetry::TelemetrySnapshot;

mod writer;
