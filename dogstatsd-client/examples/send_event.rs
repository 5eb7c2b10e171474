use dogstatsd_client::DogStatsDBuilder;

fn main() {
    tracing_subscriber::fmt::init();

    let client = DogStatsDBuilder::default()
        .with_remote_address("127.0.0.1:8125")
        .expect("failed to parse remote address")
        .build()
        .expect("failed to build DogStatsD client");

    client
        .info("test event", "description", &["testing:yes"])
        .expect("failed to send event");

    tracing::info!("Sent.");
}
