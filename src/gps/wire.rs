//! UBX configuration frames for the u-blox receiver.
//!
//! Frame layout: sync (`B5 62`), class, id, little-endian payload length,
//! payload, two checksum bytes. The checksum is the 8-bit Fletcher sum over
//! class, id, length and payload. Only the CFG frames needed to set the
//! update rate, the NMEA message set and the port speed are built here;
//! transmission is the caller's job.

use heapless::Vec;
use static_assertions::const_assert_eq;

pub const SYNC1: u8 = 0xB5;
pub const SYNC2: u8 = 0x62;

pub const CLS_CFG: u8 = 0x06;

pub const CFG_PRT: u8 = 0x00;
pub const CFG_MSG: u8 = 0x01;
pub const CFG_RATE: u8 = 0x08;
pub const CFG_CFG: u8 = 0x09;

/// Class of the standard NMEA output messages.
pub const NMEA_CLASS: u8 = 0xF0;

/// Sync, class, id, length and checksum bytes around a payload.
pub const FRAME_OVERHEAD: usize = 8;

pub const RATE_FRAME_SZ: usize = FRAME_OVERHEAD + 6;
pub const SAVE_FRAME_SZ: usize = FRAME_OVERHEAD + 13;
pub const MSG_FRAME_SZ: usize = FRAME_OVERHEAD + 8;
pub const PRT_FRAME_SZ: usize = FRAME_OVERHEAD + 20;

const_assert_eq!(MSG_FRAME_SZ, 16);

/// NMEA message ids under [`NMEA_CLASS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum NmeaMsg {
    /// GPS fix data
    Gga = 0x00,
    /// Geographic position
    Gll = 0x01,
    /// DOP and active satellites
    Gsa = 0x02,
    /// Satellites in view
    Gsv = 0x03,
    /// Recommended minimum data
    Rmc = 0x04,
    /// Course over ground and ground speed
    Vtg = 0x05,
    /// Range residuals
    Grs = 0x06,
    /// Pseudorange error statistics
    Gst = 0x07,
    /// Time and date
    Zda = 0x08,
    /// Satellite fault detection
    Gbs = 0x09,
    /// Datum reference
    Dtm = 0x0A,
    /// GNSS fix data
    Gns = 0x0D,
    /// True heading and status
    Ths = 0x0E,
    /// Dual ground/water distance
    Vlw = 0x0F,
}

/// 8-bit Fletcher checksum over class, id, length and payload bytes.
pub fn checksum(data: &[u8]) -> (u8, u8) {
    let mut ck_a: u8 = 0;
    let mut ck_b: u8 = 0;

    for &byte in data {
        ck_a = ck_a.wrapping_add(byte);
        ck_b = ck_b.wrapping_add(ck_a);
    }

    (ck_a, ck_b)
}

/// Checks sync bytes, length field and checksum of a complete frame.
pub fn validate(frame: &[u8]) -> bool {
    if frame.len() < FRAME_OVERHEAD || frame[0] != SYNC1 || frame[1] != SYNC2 {
        return false;
    }

    let len = u16::from_le_bytes([frame[4], frame[5]]) as usize;
    if frame.len() != FRAME_OVERHEAD + len {
        return false;
    }

    let (ck_a, ck_b) = checksum(&frame[2..frame.len() - 2]);
    frame[frame.len() - 2] == ck_a && frame[frame.len() - 1] == ck_b
}

/// A complete frame around `payload`. `N` must be `payload.len() + 8`; the
/// per-frame size consts above keep the call sites honest.
fn frame<const N: usize>(class: u8, id: u8, payload: &[u8]) -> Vec<u8, N> {
    let mut f: Vec<u8, N> = Vec::new();

    f.extend_from_slice(&[SYNC1, SYNC2, class, id]).unwrap();
    f.extend_from_slice(&(payload.len() as u16).to_le_bytes())
        .unwrap();
    f.extend_from_slice(payload).unwrap();

    let (ck_a, ck_b) = checksum(&f[2..]);
    f.extend_from_slice(&[ck_a, ck_b]).unwrap();

    f
}

/// CFG-RATE: measurement interval in ms, one navigation solution per
/// measurement, aligned to UTC.
pub fn cfg_rate(interval_ms: u16) -> Vec<u8, RATE_FRAME_SZ> {
    let mut payload = [0u8; 6];
    payload[..2].copy_from_slice(&interval_ms.to_le_bytes());
    payload[2] = 0x01; // navRate: cycles per measurement
    payload[4] = 0x01; // timeRef

    frame(CLS_CFG, CFG_RATE, &payload)
}

/// CFG-CFG: persist the current configuration (all sections) to every
/// attached storage device.
pub fn cfg_save() -> Vec<u8, SAVE_FRAME_SZ> {
    let mut payload = [0u8; 13];
    payload[4..6].copy_from_slice(&[0xFF, 0xFF]); // saveMask: all sections
    payload[12] = 0x17; // deviceMask: BBR, flash, EEPROM, SPI flash

    frame(CLS_CFG, CFG_CFG, &payload)
}

/// CFG-MSG: per-port output rate for one message. Only UART1 is driven;
/// rate 1 means every solution, 0 disables the message.
pub fn cfg_msg(class: u8, id: u8, rate: u8) -> Vec<u8, MSG_FRAME_SZ> {
    let payload = [
        class,
        id,
        0x00, // i2c
        rate, // uart1
        0x00, // uart2
        0x00, // usb
        0x00, // spi
        0x00, // reserved
    ];

    frame(CLS_CFG, CFG_MSG, &payload)
}

/// CFG-PRT for UART1: 8N1, UBX+NMEA+RTCM in, UBX+NMEA out, at `baud`.
pub fn cfg_prt_uart1(baud: u32) -> Vec<u8, PRT_FRAME_SZ> {
    let mut payload = [0u8; 20];
    payload[0] = 0x01; // portID: UART1
    payload[4..8].copy_from_slice(&0x0000_08D0u32.to_le_bytes()); // mode: 8N1
    payload[8..12].copy_from_slice(&baud.to_le_bytes());
    payload[12..14].copy_from_slice(&0x0007u16.to_le_bytes()); // inProtoMask
    payload[14..16].copy_from_slice(&0x0003u16.to_le_bytes()); // outProtoMask

    frame(CLS_CFG, CFG_PRT, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_reference_vector() {
        // From the u-blox protocol description.
        let data = [0x06, 0x01, 0x02, 0x00, 0x01, 0x01];
        assert_eq!(checksum(&data), (0x0B, 0x34));
    }

    #[test]
    fn rate_frames() {
        assert_eq!(
            cfg_rate(1000).as_slice(),
            &[
                0xB5, 0x62, 0x06, 0x08, 0x06, 0x00, 0xE8, 0x03, 0x01, 0x00, 0x01, 0x00, 0x01, 0x39
            ]
        );
        assert_eq!(
            cfg_rate(200).as_slice(),
            &[
                0xB5, 0x62, 0x06, 0x08, 0x06, 0x00, 0xC8, 0x00, 0x01, 0x00, 0x01, 0x00, 0xDE, 0x6A
            ]
        );
        assert_eq!(
            cfg_rate(100).as_slice(),
            &[
                0xB5, 0x62, 0x06, 0x08, 0x06, 0x00, 0x64, 0x00, 0x01, 0x00, 0x01, 0x00, 0x7A, 0x12
            ]
        );
    }

    #[test]
    fn save_frame() {
        assert_eq!(
            cfg_save().as_slice(),
            &[
                0xB5, 0x62, 0x06, 0x09, 0x0D, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x17, 0x31, 0xBF
            ]
        );
    }

    #[test]
    fn msg_frame_layout() {
        let f = cfg_msg(NMEA_CLASS, NmeaMsg::Gga as u8, 1);

        assert_eq!(f.len(), MSG_FRAME_SZ);
        assert_eq!(&f[..4], &[SYNC1, SYNC2, CLS_CFG, CFG_MSG]);
        assert_eq!(&f[4..6], &[0x08, 0x00]);
        assert_eq!(f[6], NMEA_CLASS);
        assert_eq!(f[7], NmeaMsg::Gga as u8);
        assert_eq!(f[9], 1); // uart1 rate
        assert!(validate(&f));

        let off = cfg_msg(NMEA_CLASS, NmeaMsg::Vtg as u8, 0);
        assert_eq!(off[7], NmeaMsg::Vtg as u8);
        assert_eq!(off[9], 0);
        assert!(validate(&off));
    }

    #[test]
    fn prt_frame_layout() {
        let f = cfg_prt_uart1(38_400);

        assert_eq!(f.len(), PRT_FRAME_SZ);
        assert_eq!(&f[..4], &[SYNC1, SYNC2, CLS_CFG, CFG_PRT]);
        assert_eq!(&f[4..6], &[0x14, 0x00]);
        assert_eq!(f[6], 0x01); // UART1
        assert_eq!(&f[10..14], &[0xD0, 0x08, 0x00, 0x00]);
        assert_eq!(&f[14..18], &[0x00, 0x96, 0x00, 0x00]); // 38400
        assert!(validate(&f));
    }

    #[test]
    fn validate_rejects_corruption() {
        let mut f = cfg_rate(200);
        assert!(validate(&f));

        f[8] ^= 0x01;
        assert!(!validate(&f));

        assert!(!validate(&f[..6]));
        assert!(!validate(&[]));
    }
}
