//! CRC-tagged CSV lines for transmitted measurement samples.
//!
//! Each line reports one change of the observed analog pair:
//!
//! ```text
//! D,<frame_u16>,<x_u8>,<y_u8>,<crc8_hex>\n
//! ```
//!
//! with CRC-8 (polynomial 0x07, initial 0x00) over
//! `{frame_hi, frame_lo, x, y}`.

use core::fmt::Write;

use crc::{Crc, CRC_8_SMBUS};
use heapless::String;
use joybus_proto::{Command, STATUS_REPLY_LEN};

use crate::hub::TxPair;
use crate::measure::grid_sweep::SweepTarget;

/// CRC-8/SMBUS is polynomial 0x07 with initial value 0x00.
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Worst case: `D,65535,255,255,FF\n`.
pub const MAX_LINE_LEN: usize = 20;

/// A formatted telemetry line.
pub type SampleLine = String<MAX_LINE_LEN>;

/// CRC over the frame counter and the sample pair.
#[must_use]
pub fn sample_crc(frame: u16, x: u8, y: u8) -> u8 {
    CRC8.checksum(&[(frame >> 8) as u8, (frame & 0xFF) as u8, x, y])
}

/// Render one telemetry line.
#[must_use]
pub fn format_sample_line(frame: u16, x: u8, y: u8) -> SampleLine {
    let mut line = SampleLine::new();
    // Capacity covers the widest rendering; a formatting error is
    // unreachable and surfaces as a truncated line at worst.
    let _ = write!(
        line,
        "D,{},{},{},{:02X}\n",
        frame,
        x,
        y,
        sample_crc(frame, x, y)
    );
    line
}

/// Wire offsets of the swept pair within a Status reply.
#[must_use]
pub const fn wire_offsets(target: SweepTarget) -> (usize, usize) {
    match target {
        SweepTarget::Joystick => (2, 3),
        SweepTarget::CStick => (4, 5),
        // Trigger bytes under the pinned pad-facing poll mode.
        SweepTarget::Trigger => (6, 7),
    }
}

/// Watches transmitted reply pairs and emits a line whenever the observed
/// analog pair changes.
pub struct SampleLogger {
    offsets: (usize, usize),
    frame: u16,
    last: (u8, u8),
}

impl SampleLogger {
    #[must_use]
    pub const fn new(target: SweepTarget) -> Self {
        Self {
            offsets: wire_offsets(target),
            frame: 0,
            last: (0x80, 0x80),
        }
    }

    /// Restart the frame counter.
    pub fn reset(&mut self) {
        self.frame = 0;
    }

    /// Observe a transmitted pair; returns a line when the modified Status
    /// reply carries a new value of the watched pair.
    pub fn observe(&mut self, pair: &TxPair) -> Option<SampleLine> {
        if pair.raw.command() != Command::Status {
            return None;
        }
        let bytes = pair.modified.as_bytes();
        if bytes.len() < STATUS_REPLY_LEN {
            return None;
        }

        let current = (bytes[self.offsets.0], bytes[self.offsets.1]);
        if current == self.last {
            return None;
        }
        self.last = current;

        let line = format_sample_line(self.frame, current.0, current.1);
        self.frame = self.frame.wrapping_add(1);
        Some(line)
    }
}
