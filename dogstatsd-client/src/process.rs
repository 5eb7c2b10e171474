//! Process memory statistics.
//!
//! Statistics are read from `/proc/self/status`, which is only available on Linux.

use std::io;

/// Prefix of the gauge names used when reporting memory statistics.
pub(crate) const MEMORY_METRIC_PREFIX: &str = "process.memory.";

/// Memory usage of the current process, in bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemoryStats {
    /// Resident set size (`VmRSS`).
    pub resident: u64,

    /// Peak resident set size (`VmHWM`).
    pub peak_resident: u64,

    /// Virtual memory size (`VmSize`).
    pub virtual_size: u64,

    /// Peak virtual memory size (`VmPeak`).
    pub peak_virtual_size: u64,

    /// Size of the data segment, including the heap (`VmData`).
    pub data: u64,

    /// Swapped-out memory (`VmSwap`).
    pub swap: u64,
}

impl MemoryStats {
    /// Reads the memory statistics of the current process.
    ///
    /// # Errors
    ///
    /// If `/proc/self/status` cannot be read, an error is returned. On platforms other than Linux, an error of kind
    /// [`io::ErrorKind::Unsupported`] is always returned.
    pub fn read() -> io::Result<Self> {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/self/status").map(|status| Self::parse(&status))
        }

        #[cfg(not(target_os = "linux"))]
        {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "process memory statistics are only available on Linux",
            ))
        }
    }

    /// Parses memory statistics from the contents of a `/proc/<pid>/status` file.
    ///
    /// Fields that are missing or malformed are left at zero.
    pub fn parse(status: &str) -> Self {
        let mut stats = MemoryStats::default();

        for line in status.lines() {
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };

            let target = match field {
                "VmRSS" => &mut stats.resident,
                "VmHWM" => &mut stats.peak_resident,
                "VmSize" => &mut stats.virtual_size,
                "VmPeak" => &mut stats.peak_virtual_size,
                "VmData" => &mut stats.data,
                "VmSwap" => &mut stats.swap,
                _ => continue,
            };

            if let Some(bytes) = parse_kilobytes(value) {
                *target = bytes;
            }
        }

        stats
    }

    /// Returns an iterator over each statistic, named after its field.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> {
        [
            ("resident", self.resident),
            ("peak_resident", self.peak_resident),
            ("virtual_size", self.virtual_size),
            ("peak_virtual_size", self.peak_virtual_size),
            ("data", self.data),
            ("swap", self.swap),
        ]
        .into_iter()
    }
}

// Values look like `   123456 kB`.
fn parse_kilobytes(value: &str) -> Option<u64> {
    let mut parts = value.split_whitespace();
    let amount = parts.next()?.parse::<u64>().ok()?;
    match parts.next() {
        Some("kB") | None => amount.checked_mul(1024),
        Some(_) => None,
    }
}
