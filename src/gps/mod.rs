//! GNSS receiver configuration.
//!
//! [`GnssConfig`] drives a u-blox receiver over its dedicated serial port:
//! update rate, NMEA message set and port speed. Frames are fire-and-forget;
//! the receiver sends no acknowledgement we could wait for, so every
//! transmission ends with a settle delay instead of a read-back.

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial::Write;
use nb::block;

mod wire;
pub use wire::*;

/// Supported update rates, Hz to measurement interval in ms.
pub const RATES: [(u8, u16); 3] = [(1, 1000), (5, 200), (10, 100)];

/// Settle delay after a rate or port frame.
pub const CFG_SETTLE_MS: u16 = 100;
/// Settle delay after the save frame; flash writes are slow.
pub const SAVE_SETTLE_MS: u16 = 500;
/// Settle delay after a message-rate frame.
pub const MSG_SETTLE_MS: u16 = 50;

/// Messages turned off by [`GnssConfig::disable_all_messages`].
const DISABLE_SET: [NmeaMsg; 11] = [
    NmeaMsg::Gga,
    NmeaMsg::Gll,
    NmeaMsg::Gsa,
    NmeaMsg::Gsv,
    NmeaMsg::Rmc,
    NmeaMsg::Vtg,
    NmeaMsg::Grs,
    NmeaMsg::Gst,
    NmeaMsg::Zda,
    NmeaMsg::Gbs,
    NmeaMsg::Dtm,
];

const MINIMAL_SET: [NmeaMsg; 1] = [NmeaMsg::Rmc];
const STANDARD_SET: [NmeaMsg; 3] = [NmeaMsg::Gga, NmeaMsg::Rmc, NmeaMsg::Vtg];
const MAIN_SET: [NmeaMsg; 6] = [
    NmeaMsg::Gga,
    NmeaMsg::Gll,
    NmeaMsg::Gsa,
    NmeaMsg::Gsv,
    NmeaMsg::Rmc,
    NmeaMsg::Vtg,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Not one of the supported update rates. Nothing was transmitted.
    InvalidRate(u8),
    /// The transport failed; the operation was aborted and may be retried.
    Uart(E),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Uart(e)
    }
}

/// Measurement interval for a supported rate.
pub fn interval_ms(hz: u8) -> Option<u16> {
    RATES.iter().find(|(r, _)| *r == hz).map(|(_, ms)| *ms)
}

pub struct GnssConfig<U: Write<u8>> {
    uart: U,
}

impl<U: Write<u8>> GnssConfig<U> {
    pub fn new(uart: U) -> GnssConfig<U> {
        GnssConfig { uart }
    }

    /// Set the navigation update rate. Only the rates in [`RATES`] are
    /// accepted; anything else fails without touching the receiver.
    pub fn set_refresh_rate(
        &mut self,
        delay: &mut impl DelayMs<u16>,
        hz: u8,
    ) -> Result<(), Error<U::Error>> {
        let interval = interval_ms(hz).ok_or(Error::InvalidRate(hz))?;

        debug!("gps: set refresh rate {} Hz ({} ms)", hz, interval);
        self.send(&cfg_rate(interval), CFG_SETTLE_MS, delay)
    }

    /// Persist the receiver's current configuration to its own storage.
    pub fn save(&mut self, delay: &mut impl DelayMs<u16>) -> Result<(), Error<U::Error>> {
        debug!("gps: save configuration");
        self.send(&cfg_save(), SAVE_SETTLE_MS, delay)
    }

    /// Enable or disable one NMEA message on UART1.
    pub fn set_message(
        &mut self,
        delay: &mut impl DelayMs<u16>,
        msg: NmeaMsg,
        enable: bool,
    ) -> Result<(), Error<U::Error>> {
        let rate = if enable { 1 } else { 0 };

        trace!("gps: message {} rate {}", msg, rate);
        self.send(&cfg_msg(NMEA_CLASS, msg as u8, rate), MSG_SETTLE_MS, delay)
    }

    /// Turn off every NMEA message. Receiver-side message state is additive,
    /// so the presets below run this to completion first.
    pub fn disable_all_messages(
        &mut self,
        delay: &mut impl DelayMs<u16>,
    ) -> Result<(), Error<U::Error>> {
        info!("gps: disabling all NMEA messages");
        for msg in DISABLE_SET {
            self.set_message(delay, msg, false)?;
        }

        Ok(())
    }

    /// RMC only: position, speed and time in one message.
    pub fn enable_minimal_messages(
        &mut self,
        delay: &mut impl DelayMs<u16>,
    ) -> Result<(), Error<U::Error>> {
        self.disable_all_messages(delay)?;

        info!("gps: enabling minimal NMEA messages (RMC)");
        for msg in MINIMAL_SET {
            self.set_message(delay, msg, true)?;
        }

        Ok(())
    }

    /// GGA, RMC and VTG.
    pub fn enable_standard_messages(
        &mut self,
        delay: &mut impl DelayMs<u16>,
    ) -> Result<(), Error<U::Error>> {
        self.disable_all_messages(delay)?;

        info!("gps: enabling standard NMEA messages (GGA, RMC, VTG)");
        for msg in STANDARD_SET {
            self.set_message(delay, msg, true)?;
        }

        Ok(())
    }

    /// The six main messages.
    pub fn enable_all_messages(
        &mut self,
        delay: &mut impl DelayMs<u16>,
    ) -> Result<(), Error<U::Error>> {
        info!("gps: enabling all main NMEA messages");
        for msg in MAIN_SET {
            self.set_message(delay, msg, true)?;
        }

        Ok(())
    }

    /// Switch UART1 to `baud`. Sent at the receiver's current rate; the
    /// host side must re-clock afterwards.
    pub fn set_baud(
        &mut self,
        delay: &mut impl DelayMs<u16>,
        baud: u32,
    ) -> Result<(), Error<U::Error>> {
        debug!("gps: set uart1 baud rate {}", baud);
        self.send(&cfg_prt_uart1(baud), CFG_SETTLE_MS, delay)
    }

    /// Write one frame and wait out the receiver's processing latency. No
    /// read-back: success means the bytes left the port.
    fn send(
        &mut self,
        frame: &[u8],
        settle_ms: u16,
        delay: &mut impl DelayMs<u16>,
    ) -> Result<(), Error<U::Error>> {
        for &byte in frame {
            block!(self.uart.write(byte))?;
        }
        block!(self.uart.flush())?;

        delay.delay_ms(settle_ms);

        Ok(())
    }
}
