//! Id and Reset frame codec.
//!
//! The 3-byte Id reply opens with a 16-bit little-endian capability word and
//! closes with a runtime byte packing the poll mode, rumble mode, and report
//! flags. A Reset reply reuses the exact same bytes.

use crate::bits::{read_u16_le, write_u16_le};
use crate::command::{Command, ID_REPLY_LEN};
use crate::reply::Reply;
use crate::types::{PadIdentity, PollMode, RumbleMode};

/// Capability bits within the Id reply's first two bytes.
pub mod capability {
    pub const IS_WIRELESS: u16 = 1 << 15;
    pub const SUPPORTS_WIRELESS_RECEIVE: u16 = 1 << 14;
    /// Inverted on the wire: set means rumble is NOT available.
    pub const RUMBLE_NOT_AVAILABLE: u16 = 1 << 13;
    pub const IS_GAMECUBE: u16 = 1 << 11;
    pub const WIRELESS_IS_RF: u16 = 1 << 10;
    pub const WIRELESS_STATE_FIXED: u16 = 1 << 9;
    pub const IS_STANDARD_CONTROLLER: u16 = 1 << 8;
}

/// Field layout of the Id reply's third byte.
pub mod runtime_byte {
    /// Poll mode in bits [2:0].
    pub const POLL_MASK: u8 = 0x07;
    /// Rumble mode in bits [4:3].
    pub const RUMBLE_MASK: u8 = 0x18;
    pub const RUMBLE_SHIFT: u8 = 3;
    pub const ORIGIN_NOT_SENT: u8 = 1 << 5;
    pub const ERROR_LATCHED: u8 = 1 << 6;
    pub const ERROR_LAST: u8 = 1 << 7;
}

/// Encode an identity into the 3-byte Id frame.
#[must_use]
pub fn encode_identity_bytes(identity: &PadIdentity) -> [u8; ID_REPLY_LEN] {
    let caps = &identity.capabilities;
    let mut word = 0u16;
    if caps.is_wireless {
        word |= capability::IS_WIRELESS;
    }
    if caps.supports_wireless_receive {
        word |= capability::SUPPORTS_WIRELESS_RECEIVE;
    }
    if !caps.rumble_available {
        word |= capability::RUMBLE_NOT_AVAILABLE;
    }
    if caps.is_gamecube {
        word |= capability::IS_GAMECUBE;
    }
    if caps.wireless_is_rf {
        word |= capability::WIRELESS_IS_RF;
    }
    if caps.wireless_state_fixed {
        word |= capability::WIRELESS_STATE_FIXED;
    }
    if caps.is_standard_controller {
        word |= capability::IS_STANDARD_CONTROLLER;
    }

    let runtime = &identity.runtime;
    let mut flags = runtime.poll_mode.to_wire() & runtime_byte::POLL_MASK;
    flags |= (runtime.rumble_mode.to_wire() << runtime_byte::RUMBLE_SHIFT) & runtime_byte::RUMBLE_MASK;
    if !runtime.report.origin_sent {
        flags |= runtime_byte::ORIGIN_NOT_SENT;
    }
    if runtime.report.error_latched {
        flags |= runtime_byte::ERROR_LATCHED;
    }
    if runtime.report.error_last {
        flags |= runtime_byte::ERROR_LAST;
    }

    let mut out = [0u8; ID_REPLY_LEN];
    let mut word_bytes = [0u8; 2];
    write_u16_le(word, &mut word_bytes);
    out[0] = word_bytes[0];
    out[1] = word_bytes[1];
    out[2] = flags;
    out
}

/// Encode an Id reply.
#[must_use]
pub fn encode_identity(identity: &PadIdentity) -> Reply {
    Reply::from_array(Command::Id, encode_identity_bytes(identity))
}

/// Encode a Reset reply; same bytes as Id under the Reset command.
#[must_use]
pub fn encode_reset(identity: &PadIdentity) -> Reply {
    Reply::from_array(Command::Reset, encode_identity_bytes(identity))
}

/// Refresh an identity from a received Id (or Reset) frame.
///
/// Enum fields are sanitized; a malformed poll mode lands on `Mode3`, a
/// malformed rumble mode on `Off`.
pub fn update_identity_from_id_bytes(identity: &mut PadIdentity, rx: &[u8; ID_REPLY_LEN]) {
    let word = read_u16_le(&[rx[0], rx[1]]);

    let caps = &mut identity.capabilities;
    caps.is_wireless = word & capability::IS_WIRELESS != 0;
    caps.supports_wireless_receive = word & capability::SUPPORTS_WIRELESS_RECEIVE != 0;
    caps.rumble_available = word & capability::RUMBLE_NOT_AVAILABLE == 0;
    caps.is_gamecube = word & capability::IS_GAMECUBE != 0;
    caps.wireless_is_rf = word & capability::WIRELESS_IS_RF != 0;
    caps.wireless_state_fixed = word & capability::WIRELESS_STATE_FIXED != 0;
    caps.is_standard_controller = word & capability::IS_STANDARD_CONTROLLER != 0;

    let flags = rx[2];
    let runtime = &mut identity.runtime;
    runtime.poll_mode = PollMode::sanitize(flags & runtime_byte::POLL_MASK);
    runtime.rumble_mode =
        RumbleMode::sanitize((flags & runtime_byte::RUMBLE_MASK) >> runtime_byte::RUMBLE_SHIFT);
    runtime.report.origin_sent = flags & runtime_byte::ORIGIN_NOT_SENT == 0;
    runtime.report.error_latched = flags & runtime_byte::ERROR_LATCHED != 0;
    runtime.report.error_last = flags & runtime_byte::ERROR_LAST != 0;
}

/// Decode an Id frame into a fresh identity.
#[must_use]
pub fn decode_identity(rx: &[u8; ID_REPLY_LEN]) -> PadIdentity {
    let mut identity = PadIdentity::new();
    update_identity_from_id_bytes(&mut identity, rx);
    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_controller_id_bytes() {
        // Wired standard GameCube controller with rumble: 0x0900, LE on the
        // wire, with mode3/error_last in the runtime byte.
        let identity = PadIdentity::new();
        let bytes = encode_identity_bytes(&identity);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[1], 0x09);
        assert_eq!(bytes[2] & runtime_byte::POLL_MASK, 0x03);
        assert_ne!(bytes[2] & runtime_byte::ERROR_LAST, 0);
        assert_eq!(bytes[2] & runtime_byte::ORIGIN_NOT_SENT, 0);
    }

    #[test]
    fn test_identity_round_trip() {
        let mut identity = PadIdentity::new();
        identity.capabilities.rumble_available = false;
        identity.capabilities.is_wireless = true;
        identity.capabilities.wireless_is_rf = true;
        identity.runtime.poll_mode = PollMode::Mode1;
        identity.runtime.rumble_mode = RumbleMode::Brake;
        identity.runtime.report.origin_sent = false;
        identity.runtime.report.error_latched = true;

        let bytes = encode_identity_bytes(&identity);
        let decoded = decode_identity(&bytes);
        assert_eq!(decoded, identity);
    }

    #[test]
    fn test_reset_reply_shares_id_bytes() {
        let identity = PadIdentity::new();
        let id = encode_identity(&identity);
        let reset = encode_reset(&identity);
        assert_eq!(id.as_bytes(), reset.as_bytes());
        assert_eq!(id.command(), Command::Id);
        assert_eq!(reset.command(), Command::Reset);
    }

    #[test]
    fn test_poll_mode_sanitized_on_decode() {
        let mut bytes = encode_identity_bytes(&PadIdentity::new());
        // Poll field 0x07 is out of range; must land on Mode3.
        bytes[2] = (bytes[2] & !runtime_byte::POLL_MASK) | 0x07;
        let decoded = decode_identity(&bytes);
        assert_eq!(decoded.runtime.poll_mode, PollMode::Mode3);

        // Rumble field 0x03 is out of range; must land on Off.
        bytes[2] = (bytes[2] & !runtime_byte::RUMBLE_MASK) | (0x03 << runtime_byte::RUMBLE_SHIFT);
        let decoded = decode_identity(&bytes);
        assert_eq!(decoded.runtime.rumble_mode, RumbleMode::Off);
    }
}
