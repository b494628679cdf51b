//! Operator command line.
//!
//! One trimmed input line maps to exactly one action: receiver
//! reconfiguration, the streaming switch, or help. The grammar is fixed and
//! case-sensitive; the byte-at-a-time line reader (echo, backspace) is the
//! console driver's job, not ours.

use core::fmt::Write as FmtWrite;
use core::sync::atomic::{AtomicBool, Ordering};

#[allow(unused_imports)]
use defmt::{debug, error, info, trace, warn};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial::Write;

use crate::gps::{self, GnssConfig};

const HELP: &str = "\nAvailable commands:\n\
    \x20 gps refresh <1|5|10>  - Set GPS update rate (Hz)\n\
    \x20 gps save              - Save GPS config to flash\n\
    \x20 stream on             - Enable GPS data streaming\n\
    \x20 stream off            - Disable GPS data streaming\n\
    \x20 help                  - Show this help\n";

/// Live-telemetry switch. Written by the command line, read by the GNSS
/// ingest path after each fusion; last write wins, nothing more is needed.
pub struct StreamSwitch {
    on: AtomicBool,
}

impl StreamSwitch {
    pub const fn new() -> StreamSwitch {
        StreamSwitch {
            on: AtomicBool::new(false),
        }
    }

    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::Relaxed);
    }

    pub fn get(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }
}

impl Default for StreamSwitch {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Cmd {
    Refresh(u8),
    Save,
    Stream(bool),
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError<'a> {
    /// `gps refresh` with an argument outside the supported rate set.
    InvalidRate(&'a str),
    Unknown(&'a str),
}

/// Map one input line to a command. Trailing line endings and spaces are
/// trimmed; an empty line is `Ok(None)`. Tokens match exactly, no
/// abbreviations.
pub fn parse(line: &str) -> Result<Option<Cmd>, ParseError<'_>> {
    let line = line.trim_end_matches(['\n', '\r', ' ']);

    if line.is_empty() {
        return Ok(None);
    }

    if let Some(arg) = line.strip_prefix("gps refresh ") {
        return match arg.parse::<u8>() {
            Ok(hz) if gps::interval_ms(hz).is_some() => Ok(Some(Cmd::Refresh(hz))),
            _ => Err(ParseError::InvalidRate(arg)),
        };
    }

    match line {
        "gps save" => Ok(Some(Cmd::Save)),
        "stream on" => Ok(Some(Cmd::Stream(true))),
        "stream off" => Ok(Some(Cmd::Stream(false))),
        "help" => Ok(Some(Cmd::Help)),
        _ => Err(ParseError::Unknown(line)),
    }
}

/// Executes parsed commands against the receiver configuration and the
/// streaming switch, reporting back on the console sink.
pub struct Interpreter<'a, U: Write<u8>> {
    gnss: GnssConfig<U>,
    stream: &'a StreamSwitch,
}

impl<'a, U: Write<u8>> Interpreter<'a, U> {
    pub fn new(gnss: GnssConfig<U>, stream: &'a StreamSwitch) -> Interpreter<'a, U> {
        Interpreter { gnss, stream }
    }

    /// Handle one input line. Every outcome, including errors, degrades to
    /// one or two lines of status text on `out`.
    pub fn handle(
        &mut self,
        line: &str,
        delay: &mut impl DelayMs<u16>,
        out: &mut impl FmtWrite,
    ) -> core::fmt::Result {
        let cmd = match parse(line) {
            Ok(None) => return Ok(()),
            Ok(Some(cmd)) => cmd,
            Err(ParseError::InvalidRate(arg)) => {
                return writeln!(
                    out,
                    "Error: Invalid rate '{}'. Use: gps refresh <1|5|10>",
                    arg
                );
            }
            Err(ParseError::Unknown(line)) => {
                writeln!(out, "Unknown command: '{}'", line)?;
                return writeln!(out, "Type 'help' for available commands");
            }
        };

        match cmd {
            Cmd::Refresh(hz) => match self.gnss.set_refresh_rate(delay, hz) {
                Ok(()) => writeln!(out, "GPS refresh rate set to {}Hz", hz),
                Err(gps::Error::InvalidRate(hz)) => writeln!(
                    out,
                    "Error: Invalid rate '{}'. Use: gps refresh <1|5|10>",
                    hz
                ),
                Err(gps::Error::Uart(_)) => writeln!(out, "Error: GPS UART not ready"),
            },
            Cmd::Save => match self.gnss.save(delay) {
                Ok(()) => writeln!(out, "GPS configuration saved"),
                Err(_) => writeln!(out, "Error: GPS UART not ready"),
            },
            Cmd::Stream(on) => {
                self.stream.set(on);
                if on {
                    writeln!(out, "GPS streaming enabled")
                } else {
                    writeln!(out, "GPS streaming disabled")
                }
            }
            Cmd::Help => out.write_str(HELP),
        }
    }
}
