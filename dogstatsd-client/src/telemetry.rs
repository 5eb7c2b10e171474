use std::sync::atomic::{AtomicU64, Ordering};

/// Client telemetry.
///
/// `Telemetry` tracks what happened to every payload the client tried to send: whether it made it to the transport,
/// was rejected before sending, or was never built at all because it was sampled out.
#[derive(Debug, Default)]
pub(crate) struct Telemetry {
    packets_sent: AtomicU64,
    bytes_sent: AtomicU64,
    packets_dropped: AtomicU64,
    packets_dropped_writer: AtomicU64,
    packets_dropped_serializer: AtomicU64,
    bytes_dropped: AtomicU64,
    points_sampled_out: AtomicU64,
}

impl Telemetry {
    /// Tracks a successful packet send.
    pub fn track_packet_send_succeeded(&self, bytes_len: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes_len as u64, Ordering::Relaxed);
    }

    /// Tracks a failed packet send.
    pub fn track_packet_send_failed(&self, bytes_len: usize) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
        self.packets_dropped_writer.fetch_add(1, Ordering::Relaxed);
        self.bytes_dropped.fetch_add(bytes_len as u64, Ordering::Relaxed);
    }

    /// Tracks a payload that was built but rejected before sending.
    pub fn track_packet_serializer_failed(&self, bytes_len: usize) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
        self.packets_dropped_serializer.fetch_add(1, Ordering::Relaxed);
        self.bytes_dropped.fetch_add(bytes_len as u64, Ordering::Relaxed);
    }

    /// Tracks a metric point that was discarded by sampling.
    pub fn track_point_sampled_out(&self) {
        self.points_sampled_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            packets_dropped_writer: self.packets_dropped_writer.load(Ordering::Relaxed),
            packets_dropped_serializer: self.packets_dropped_serializer.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
            points_sampled_out: self.points_sampled_out.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a client's send statistics.
///
/// All counters are cumulative since the client was built.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TelemetrySnapshot {
    /// Payloads written to the transport.
    pub packets_sent: u64,

    /// Bytes written to the transport.
    pub bytes_sent: u64,

    /// Payloads that were not sent, for any reason other than sampling.
    pub packets_dropped: u64,

    /// Payloads the transport failed to write.
    pub packets_dropped_writer: u64,

    /// Payloads rejected before sending because they exceeded the maximum payload length.
    pub packets_dropped_serializer: u64,

    /// Bytes belonging to dropped payloads.
    pub bytes_dropped: u64,

    /// Metric points discarded by sampling.
    pub points_sampled_out: u64,
}

#[cfg(test)]
mod tests {
    use super::{Telemetry, TelemetrySnapshot};

    #[test]
    fn snapshot() {
        let telemetry = Telemetry::default();
        telemetry.track_packet_send_succeeded(10);
        telemetry.track_packet_send_succeeded(5);
        telemetry.track_packet_send_failed(7);
        telemetry.track_packet_serializer_failed(9000);
        telemetry.track_point_sampled_out();

        assert_eq!(
            telemetry.snapshot(),
            TelemetrySnapshot {
                packets_sent: 2,
                bytes_sent: 15,
                packets_dropped: 2,
                packets_dropped_writer: 1,
                packets_dropped_serializer: 1,
                bytes_dropped: 9007,
                points_sampled_out: 1,
            }
        );
    }
}
