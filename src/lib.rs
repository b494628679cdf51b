#![cfg_attr(not(test), no_std)]

//! Firmware core for a GNSS speed logger: shared sensor state, fused-record
//! queue towards the logging consumer, and UBX configuration of the receiver
//! over serial.
//!
//! Hardware wiring (UART drivers, the GNSS driver callback, the console line
//! reader) lives in the board crates; everything here is host-testable.

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};

use core::fmt::Write;

pub mod command;
pub mod gps;
pub mod queue;
pub mod store;

pub use command::StreamSwitch;
pub use gps::GnssConfig;
pub use queue::{LogConsumer, LogProducer, LogQueue};
pub use store::{
    AccelReading, CompassReading, DisplayGps, GpsReading, Overflow, ReadingSink, SensorRecord,
    SensorStore,
};

// Build-time tunables, see build.rs.
include!(concat!(env!("OUT_DIR"), "/config.rs"));

static_assertions::const_assert!(LOGQ_SZ > 0);

/// Body of the GNSS fix callback: store the reading, and when it completes a
/// fused record and streaming is on, emit one display line.
///
/// Returns whether a record was published.
pub fn ingest_gps<W: Write>(
    store: &SensorStore<'_>,
    stream: &StreamSwitch,
    out: &mut W,
    reading: GpsReading,
) -> bool {
    let published = store.set_gps(reading);

    if published && stream.get() {
        if let Some(d) = store.display() {
            d.write_line(out)
                .and_then(|_| out.write_char('\n'))
                .inspect_err(|_| error!("failed to write stream line"))
                .ok();
        }
    }

    published
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gps(sog: u32) -> GpsReading {
        GpsReading {
            sog,
            cog: 12_345,
            hour: 12,
            minute: 34,
            millisecond: 56_789,
            lat: 600_123_456,
            lon: 51_234_567,
        }
    }

    fn compass() -> CompassReading {
        CompassReading { heading: 270_000 }
    }

    fn accel() -> AccelReading {
        AccelReading {
            roll: 1_500,
            pitch: -2_250,
        }
    }

    #[test]
    fn stream_line_on_fusion() {
        let mut q = LogQueue::new();
        let (p, mut c) = q.split();
        let store = SensorStore::new(p);
        let stream = StreamSwitch::new();
        let mut out = heapless::String::<256>::new();

        stream.set(true);

        // Only the GNSS slot is fresh: no record, no line.
        assert!(!ingest_gps(&store, &stream, &mut out, gps(0)));
        assert_eq!(out.as_str(), "");

        store.set_compass(compass());
        // Fusion completed by the accelerometer, not the ingest path: a
        // record is queued but no line is streamed.
        assert!(store.set_accel(accel()));
        assert_eq!(out.as_str(), "");

        store.set_compass(compass());
        store.set_accel(accel());
        assert!(ingest_gps(&store, &stream, &mut out, gps(1_234)));
        assert_eq!(
            out.as_str(),
            "12:34:56.789 sog: 1.234 m/s, cog: 12.345 deg\n"
        );

        assert!(c.dequeue().is_some());
        assert!(c.dequeue().is_some());
        assert!(c.dequeue().is_none());
    }

    #[test]
    fn stream_off_suppresses_line() {
        let mut q = LogQueue::new();
        let (p, _c) = q.split();
        let store = SensorStore::new(p);
        let stream = StreamSwitch::new();
        let mut out = heapless::String::<256>::new();

        stream.set(true);
        stream.set(false);

        store.set_compass(compass());
        store.set_accel(accel());
        assert!(ingest_gps(&store, &stream, &mut out, gps(1_234)));
        assert_eq!(out.as_str(), "");
    }
}
