//! Shared sensor state and the fused-record publisher.
//!
//! Three independently guarded slots hold the latest reading from each
//! sensor. A slot is `fresh` until the publisher has folded it into a
//! [`SensorRecord`], and `valid` from its first update until
//! [`SensorStore::invalidate_all`]. Once all three slots are fresh the
//! publisher snapshots them into one record and enqueues it for the logging
//! consumer; the fresh-check, snapshot and flag-clear happen inside a single
//! critical section so concurrent producers can neither double-publish nor
//! observe a half-cleared store.

use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::{CriticalSection, Mutex};
#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::queue::LogProducer;

/// Position, velocity and time from the GNSS receiver.
///
/// Fixed-point units: speed in mm/s, course in millidegrees, position in
/// degrees * 1e-7 (the u-blox convention).
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize, defmt::Format,
)]
pub struct GpsReading {
    pub sog: u32,
    pub cog: u32,
    pub hour: u8,
    pub minute: u8,
    /// Milliseconds into the minute.
    pub millisecond: u16,
    pub lat: i32,
    pub lon: i32,
}

/// Heading from the compass, millidegrees.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize, defmt::Format,
)]
pub struct CompassReading {
    pub heading: u32,
}

/// Roll and pitch from the accelerometer, millidegrees.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize, defmt::Format,
)]
pub struct AccelReading {
    pub roll: i32,
    pub pitch: i32,
}

/// One complete set of readings, queued for the logging consumer.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize, defmt::Format,
)]
pub struct SensorRecord {
    pub gps: GpsReading,
    pub compass: CompassReading,
    pub accel: AccelReading,
    pub fresh: bool,
}

/// Serialized size bound for one record on the logging wire.
pub const RECORD_WIRE_SZ: usize = SensorRecord::POSTCARD_MAX_SIZE;

const_assert!(RECORD_WIRE_SZ <= 64);

impl SensorRecord {
    /// Postcard-encode for the durable-logging consumer.
    pub fn to_bytes(&self) -> postcard::Result<heapless::Vec<u8, RECORD_WIRE_SZ>> {
        postcard::to_vec(self)
    }
}

/// Reduced view of the GNSS slot for live status output. No position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct DisplayGps {
    pub sog: u32,
    pub cog: u32,
    pub hour: u8,
    pub minute: u8,
    pub millisecond: u16,
}

impl DisplayGps {
    /// `hh:mm:ss.mmm sog: S.mmm m/s, cog: C.mmm deg`, fixed-point
    /// milli-units. Streaming consumers parse this exact format.
    pub fn write_line(&self, w: &mut impl fmt::Write) -> fmt::Result {
        write!(
            w,
            "{:02}:{:02}:{:02}.{:03} sog: {}.{:03} m/s, cog: {}.{:03} deg",
            self.hour,
            self.minute,
            self.millisecond / 1000,
            self.millisecond % 1000,
            self.sog / 1000,
            self.sog % 1000,
            self.cog / 1000,
            self.cog % 1000
        )
    }
}

impl From<GpsReading> for DisplayGps {
    fn from(g: GpsReading) -> Self {
        DisplayGps {
            sog: g.sog,
            cog: g.cog,
            hour: g.hour,
            minute: g.minute,
            millisecond: g.millisecond,
        }
    }
}

/// Producer-facing seam: sensor drivers push readings through this trait and
/// stay independent of the concrete store.
pub trait ReadingSink<T> {
    /// Store a new reading; returns whether it completed a fused record.
    fn set(&self, reading: T) -> bool;
}

/// What to do with the fresh flags when the forwarding queue is full.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Keep the flags set so the next sensor update re-attempts fusion.
    #[default]
    Retry,
    /// Clear the flags: the record is lost, and a stalled consumer is not
    /// hit by a retry burst once it catches up.
    Discard,
}

#[derive(Default, Clone, Copy)]
struct Slot<T> {
    reading: T,
    fresh: bool,
    valid: bool,
}

impl<T: Copy> Slot<T> {
    fn set(&mut self, reading: T) {
        self.reading = reading;
        self.fresh = true;
        self.valid = true;
    }

    fn get(&self) -> Option<T> {
        self.valid.then_some(self.reading)
    }

    fn invalidate(&mut self) {
        self.fresh = false;
        self.valid = false;
    }
}

/// The shared multi-sensor store. Owns the producer end of the log queue;
/// the board crate keeps it in a `static` and hands it to the sensor
/// callbacks.
pub struct SensorStore<'q> {
    gps: Mutex<RefCell<Slot<GpsReading>>>,
    compass: Mutex<RefCell<Slot<CompassReading>>>,
    accel: Mutex<RefCell<Slot<AccelReading>>>,
    log: Mutex<RefCell<LogProducer<'q>>>,
    overflow: Overflow,
    dropped: AtomicU32,
}

impl<'q> SensorStore<'q> {
    pub fn new(log: LogProducer<'q>) -> SensorStore<'q> {
        Self::with_overflow(log, Overflow::default())
    }

    pub fn with_overflow(log: LogProducer<'q>, overflow: Overflow) -> SensorStore<'q> {
        SensorStore {
            gps: Mutex::new(RefCell::new(Slot::default())),
            compass: Mutex::new(RefCell::new(Slot::default())),
            accel: Mutex::new(RefCell::new(Slot::default())),
            log: Mutex::new(RefCell::new(log)),
            overflow,
            dropped: AtomicU32::new(0),
        }
    }

    pub fn set_gps(&self, reading: GpsReading) -> bool {
        critical_section::with(|cs| {
            self.gps.borrow_ref_mut(cs).set(reading);
            self.publish(cs)
        })
    }

    pub fn set_compass(&self, reading: CompassReading) -> bool {
        critical_section::with(|cs| {
            self.compass.borrow_ref_mut(cs).set(reading);
            self.publish(cs)
        })
    }

    pub fn set_accel(&self, reading: AccelReading) -> bool {
        critical_section::with(|cs| {
            self.accel.borrow_ref_mut(cs).set(reading);
            self.publish(cs)
        })
    }

    pub fn get_gps(&self) -> Option<GpsReading> {
        critical_section::with(|cs| self.gps.borrow_ref(cs).get())
    }

    pub fn get_compass(&self) -> Option<CompassReading> {
        critical_section::with(|cs| self.compass.borrow_ref(cs).get())
    }

    pub fn get_accel(&self) -> Option<AccelReading> {
        critical_section::with(|cs| self.accel.borrow_ref(cs).get())
    }

    /// Clears every fresh and valid flag, e.g. after reconfiguring the
    /// receiver. `get_*` returns `None` until the sensor reports again.
    pub fn invalidate_all(&self) {
        critical_section::with(|cs| {
            self.gps.borrow_ref_mut(cs).invalidate();
            self.compass.borrow_ref_mut(cs).invalidate();
            self.accel.borrow_ref_mut(cs).invalidate();
        });
    }

    /// Live status projection; `None` until the GNSS slot is valid.
    pub fn display(&self) -> Option<DisplayGps> {
        self.get_gps().map(DisplayGps::from)
    }

    /// Fused records dropped on a full queue since start-up.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Publish one fused record if every slot is fresh.
    ///
    /// Runs inside the caller's critical section: the fresh-check, snapshot
    /// and flag-clear must not interleave with another producer's update.
    fn publish(&self, cs: CriticalSection) -> bool {
        let mut gps = self.gps.borrow_ref_mut(cs);
        let mut compass = self.compass.borrow_ref_mut(cs);
        let mut accel = self.accel.borrow_ref_mut(cs);

        if !(gps.fresh && compass.fresh && accel.fresh) {
            return false;
        }

        let record = SensorRecord {
            gps: gps.reading,
            compass: compass.reading,
            accel: accel.reading,
            fresh: true,
        };

        match self.log.borrow_ref_mut(cs).enqueue(record) {
            Ok(()) => {
                gps.fresh = false;
                compass.fresh = false;
                accel.fresh = false;
                true
            }
            Err(_) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("log queue full, dropping fused record ({} dropped)", dropped);

                if self.overflow == Overflow::Discard {
                    gps.fresh = false;
                    compass.fresh = false;
                    accel.fresh = false;
                }

                false
            }
        }
    }
}

impl ReadingSink<GpsReading> for SensorStore<'_> {
    fn set(&self, reading: GpsReading) -> bool {
        self.set_gps(reading)
    }
}

impl ReadingSink<CompassReading> for SensorStore<'_> {
    fn set(&self, reading: CompassReading) -> bool {
        self.set_compass(reading)
    }
}

impl ReadingSink<AccelReading> for SensorStore<'_> {
    fn set(&self, reading: AccelReading) -> bool {
        self.set_accel(reading)
    }
}
