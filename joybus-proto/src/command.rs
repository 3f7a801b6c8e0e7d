//! Command bytes, request frames, and expected reply sizes.

use crate::types::{PollMode, RumbleMode};

/// Reply length for Id and Reset.
pub const ID_REPLY_LEN: usize = 3;
/// Reply length for Status.
pub const STATUS_REPLY_LEN: usize = 8;
/// Reply length for Origin.
pub const ORIGIN_REPLY_LEN: usize = 10;
/// Reply length for Recalibrate (same frame as Origin).
pub const RECALIBRATE_REPLY_LEN: usize = ORIGIN_REPLY_LEN;
/// Reply length for Reset (same frame as Id).
pub const RESET_REPLY_LEN: usize = ID_REPLY_LEN;
/// The largest reply on the bus.
pub const MAX_REPLY_LEN: usize = 10;

/// A Status request carries the command byte plus poll and rumble modes.
pub const STATUS_REQUEST_LEN: usize = 3;

/// Command byte at the head of every request frame.
///
/// `Invalid` never appears on the wire; it is the "nothing awaited" sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Id = 0x00,
    Status = 0x40,
    Origin = 0x41,
    Recalibrate = 0x42,
    Reset = 0xFF,
    Invalid = 0xAA,
}

impl Command {
    /// Classify a request's first byte. Unknown bytes map to `Invalid`.
    #[inline]
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Id,
            0x40 => Self::Status,
            0x41 => Self::Origin,
            0x42 => Self::Recalibrate,
            0xFF => Self::Reset,
            _ => Self::Invalid,
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Exact length of a well-formed reply to this command.
    #[inline]
    #[must_use]
    pub const fn expected_reply_len(self) -> usize {
        match self {
            Self::Id | Self::Reset => ID_REPLY_LEN,
            Self::Status => STATUS_REPLY_LEN,
            Self::Origin | Self::Recalibrate => ORIGIN_REPLY_LEN,
            Self::Invalid => 0,
        }
    }
}

/// A request frame to send toward the pad, with the reply size the sender
/// should expect back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request<const N: usize> {
    bytes: [u8; N],
    expected_reply_len: usize,
}

impl<const N: usize> Request<N> {
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub const fn command(&self) -> Command {
        Command::from_byte(self.bytes[0])
    }

    #[inline]
    #[must_use]
    pub const fn expected_reply_len(&self) -> usize {
        self.expected_reply_len
    }
}

impl Request<1> {
    pub const ID: Self = Self {
        bytes: [Command::Id as u8],
        expected_reply_len: ID_REPLY_LEN,
    };

    pub const ORIGIN: Self = Self {
        bytes: [Command::Origin as u8],
        expected_reply_len: ORIGIN_REPLY_LEN,
    };

    pub const RESET: Self = Self {
        bytes: [Command::Reset as u8],
        expected_reply_len: RESET_REPLY_LEN,
    };
}

impl Request<3> {
    pub const RECALIBRATE: Self = Self {
        bytes: [Command::Recalibrate as u8, 0x00, 0x00],
        expected_reply_len: RECALIBRATE_REPLY_LEN,
    };

    /// Build a Status request for the given poll and rumble modes.
    #[must_use]
    pub const fn status(poll_mode: PollMode, rumble_mode: RumbleMode) -> Self {
        Self {
            bytes: [
                Command::Status as u8,
                poll_mode.to_wire(),
                rumble_mode.to_wire(),
            ],
            expected_reply_len: STATUS_REPLY_LEN,
        }
    }
}
