//! Bounded queue of fused records between the sensor store and the logging
//! consumer.
//!
//! Single producer (the store's publisher), single consumer (the logging
//! collaborator). The producer side never blocks: a full queue fails the
//! enqueue immediately and the store decides what to do with the record.

use embedded_hal::blocking::delay::DelayMs;
use heapless::spsc::{Consumer, Producer, Queue};

use crate::store::SensorRecord;
use crate::LOGQ_SZ;

// The spsc queue keeps one slot as a sentinel, so N + 1 backs a capacity of
// N records.
pub type LogQueue = Queue<SensorRecord, { LOGQ_SZ + 1 }>;
pub type LogProducer<'a> = Producer<'a, SensorRecord, { LOGQ_SZ + 1 }>;
pub type LogConsumer<'a> = Consumer<'a, SensorRecord, { LOGQ_SZ + 1 }>;

/// Poll interval for [`pop_timeout`].
pub const POLL_MS: u16 = 10;

/// Consumer-side read with a bounded wait.
///
/// Dequeues the oldest record, polling until `timeout_ms` has elapsed.
/// Returns `None` when nothing arrived in time.
pub fn pop_timeout(
    consumer: &mut LogConsumer<'_>,
    delay: &mut impl DelayMs<u16>,
    timeout_ms: u16,
) -> Option<SensorRecord> {
    let mut waited = 0;

    loop {
        if let Some(record) = consumer.dequeue() {
            return Some(record);
        }

        if waited >= timeout_ms {
            return None;
        }

        delay.delay_ms(POLL_MS);
        waited = waited.saturating_add(POLL_MS);
    }
}
