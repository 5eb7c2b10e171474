use std::time::Duration;

use dogstatsd_client::{naming::metric_title, naming::Outcome, DogStatsDBuilder};
use metrics::{counter, gauge, histogram};
use rand::Rng as _;

fn main() {
    tracing_subscriber::fmt::init();

    let client = DogStatsDBuilder::default()
        .with_remote_address("localhost:9125")
        .expect("failed to parse remote address")
        .with_namespace("demo.")
        .with_global_tags(["env:dev"])
        .install()
        .expect("failed to install DogStatsD recorder");

    client.success("demo started", "recorder demo is running", &[]).expect("failed to send event");

    let hits = counter!(metric_title(Outcome::Hit, "HandleRequest"), "system" => "foo");
    let errors = counter!(metric_title(Outcome::Error, "HandleRequest"), "system" => "foo");
    let latency = histogram!("handle_request.latency_secs", "system" => "foo");

    let mut rng = rand::rng();

    // Loop over and over, pretending to do some work.
    loop {
        if rng.random_bool(0.95) {
            hits.increment(1);
        } else {
            errors.increment(1);
        }
        latency.record(rng.random_range(0.0..0.1));
        gauge!("in_flight").set(f64::from(rng.random_range(0..32u8)));

        if let Err(e) = client.report_memory_stats(&[]) {
            tracing::warn!(error = %e, "Failed to report memory statistics.");
        }

        std::thread::sleep(Duration::from_millis(100));
    }
}
