use std::{net::UdpSocket, time::Duration};

use dogstatsd_client::{AlertType, DogStatsDBuilder, Error, Event};

fn server() -> UdpSocket {
    let server = UdpSocket::bind("127.0.0.1:0").expect("failed to bind server socket");
    server.set_read_timeout(Some(Duration::from_secs(5))).expect("failed to set read timeout");
    server
}

fn server_read(server: &UdpSocket) -> String {
    let mut buf = [0; 1024];
    let n = server.recv(&mut buf).expect("failed to read from server socket");
    String::from_utf8(buf[..n].to_vec()).expect("payload was not valid UTF-8")
}

#[test]
fn client() {
    let server = server();
    let client = DogStatsDBuilder::default()
        .with_remote_address(server.local_addr().unwrap().to_string())
        .unwrap()
        .build()
        .unwrap();

    client.gauge("test.gauge", 1.0, &[], 1.0).unwrap();
    assert_eq!(server_read(&server), "test.gauge:1.000000|g");

    client.gauge("test.gauge", 1.0, &["tagA", "tagB"], 1.0).unwrap();
    assert_eq!(server_read(&server), "test.gauge:1.000000|g|#tagA,tagB");

    client.count("test.count", -1, &["tagA"], 1.0).unwrap();
    assert_eq!(server_read(&server), "test.count:-1|c|#tagA");

    client.histogram("test.histogram", 2.3, &["tagA"], 1.0).unwrap();
    assert_eq!(server_read(&server), "test.histogram:2.300000|h|#tagA");

    client.set_namespace("flubber.");
    client.set("test.set", "uuid", &["tagA"], 1.0).unwrap();
    assert_eq!(server_read(&server), "flubber.test.set:uuid|s|#tagA");

    client.set_namespace("");
    client.set_global_tags(["tagC"]);
    client.set("test.set", "uuid", &["tagA"], 1.0).unwrap();
    assert_eq!(server_read(&server), "test.set:uuid|s|#tagA,tagC");

    assert_eq!(client.telemetry().packets_sent, 6);
}

#[test]
fn events() {
    let server = server();
    let client = DogStatsDBuilder::default()
        .with_remote_address(server.local_addr().unwrap().to_string())
        .unwrap()
        .with_namespace("flubber.")
        .build()
        .unwrap();

    client.warning("title", "text", &["tag1", "tag2"]).unwrap();
    assert_eq!(server_read(&server), "_e{5,4}:title|text|t:warning|s:flubber|#tag1,tag2");

    client.info("Unicode", "世界", &[]).unwrap();
    assert_eq!(server_read(&server), "_e{7,2}:Unicode|世界|t:info|s:flubber");

    let err = client
        .event(&Event::new("too long", "a".repeat(8193)).with_alert_type(AlertType::Error))
        .unwrap_err();
    assert!(matches!(err, Error::PayloadTooLarge { .. }));

    // Nothing was sent for the oversized event, so the next read sees the next event.
    client.success("Great News", "hurray", &["foo", "bar", "baz"]).unwrap();
    assert_eq!(server_read(&server), "_e{10,6}:Great News|hurray|t:success|s:flubber|#foo,bar,baz");
}
