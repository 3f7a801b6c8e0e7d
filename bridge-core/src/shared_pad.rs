//! Latest decoded pad state, published from the pad-side receive path.

use joybus_proto::status_wire::{decode_origin, decode_status};
use joybus_proto::identity_wire::update_identity_from_id_bytes;
use joybus_proto::{
    Command, PadIdentity, PadState, ID_REPLY_LEN, ORIGIN_REPLY_LEN, STATUS_REPLY_LEN,
};

use crate::latch::{Latch, ShadowCell};
use crate::policy::PAD_POLL_MODE;

/// Canonical description of the pad as last observed.
///
/// `publish_count` increases by one for every valid decoded reply; readers
/// compare it against a saved value to detect fresh data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadSnapshot {
    pub publish_count: u32,
    pub last_rx_command: Command,
    pub identity: PadIdentity,
    pub status: PadState,
    pub origin: PadState,
}

impl PadSnapshot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            publish_count: 0,
            last_rx_command: Command::Id,
            identity: PadIdentity::new(),
            status: PadState::neutral(),
            origin: PadState::neutral(),
        }
    }
}

impl Default for PadSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes pad replies into a shadow snapshot and publishes it.
///
/// The shadow is owned by the pad-side receive context; readers only ever
/// see fully published snapshots through the latch. Malformed frames (wrong
/// length for the command) are dropped without advancing `publish_count`,
/// which is what lets the awaiting side time out on them.
pub struct SharedPad {
    shadow: ShadowCell<PadSnapshot>,
    latch: Latch<PadSnapshot>,
}

impl SharedPad {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shadow: ShadowCell::new(PadSnapshot::new()),
            latch: Latch::new(PadSnapshot::new()),
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn load(&self) -> PadSnapshot {
        self.latch.load()
    }

    /// Record a pad reply. Pad-side receive context only.
    ///
    /// `command` is the command the reply answers (the reply itself carries
    /// no command byte); Status decodes under the pinned pad-facing poll
    /// mode.
    pub fn on_response(&self, command: Command, rx: &[u8]) {
        // SAFETY: sole writer is the pad-side receive context, per the
        // shared-state discipline of this module.
        let shadow = unsafe { self.shadow.get_mut() };

        let decoded = match command {
            Command::Status => match <&[u8; STATUS_REPLY_LEN]>::try_from(rx) {
                Ok(frame) => {
                    shadow.status = decode_status(frame, PAD_POLL_MODE);
                    true
                }
                Err(_) => false,
            },
            // Origin and Recalibrate share a frame format.
            Command::Origin | Command::Recalibrate => {
                match <&[u8; ORIGIN_REPLY_LEN]>::try_from(rx) {
                    Ok(frame) => {
                        shadow.origin = decode_origin(frame);
                        true
                    }
                    Err(_) => false,
                }
            }
            Command::Id | Command::Reset => match <&[u8; ID_REPLY_LEN]>::try_from(rx) {
                Ok(frame) => {
                    update_identity_from_id_bytes(&mut shadow.identity, frame);
                    true
                }
                Err(_) => false,
            },
            Command::Invalid => false,
        };

        if decoded {
            shadow.publish_count = shadow.publish_count.wrapping_add(1);
            shadow.last_rx_command = command;
            self.latch.publish(*shadow);
        }
    }
}

impl Default for SharedPad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joybus_proto::status_wire::{encode_origin, encode_status};
    use joybus_proto::identity_wire::encode_identity;
    use joybus_proto::{AnalogAxes, Buttons, PollMode};

    #[test]
    fn test_status_reply_published() {
        let pad = SharedPad::new();
        let mut state = PadState::neutral();
        state.input.buttons = Buttons::A | Buttons::Z;
        state.input.analog.stick_x = 0x9A;

        let reply = encode_status(&state, PollMode::Mode3);
        pad.on_response(Command::Status, reply.as_bytes());

        let snapshot = pad.load();
        assert_eq!(snapshot.publish_count, 1);
        assert_eq!(snapshot.last_rx_command, Command::Status);
        assert_eq!(snapshot.status.input.buttons, state.input.buttons);
        assert_eq!(snapshot.status.input.analog.stick_x, 0x9A);
    }

    #[test]
    fn test_origin_and_recalibrate_update_origin() {
        let pad = SharedPad::new();
        let mut state = PadState::neutral();
        state.input.analog.stick_x = 0x85;
        state.input.analog.stick_y = 0x79;

        let reply = encode_origin(&state);
        pad.on_response(Command::Origin, reply.as_bytes());
        assert_eq!(pad.load().origin.input.analog.stick_x, 0x85);

        state.input.analog.stick_x = 0x90;
        let reply = joybus_proto::status_wire::encode_recalibrate(&state);
        pad.on_response(Command::Recalibrate, reply.as_bytes());
        let snapshot = pad.load();
        assert_eq!(snapshot.origin.input.analog.stick_x, 0x90);
        assert_eq!(snapshot.publish_count, 2);
        assert_eq!(snapshot.last_rx_command, Command::Recalibrate);
    }

    #[test]
    fn test_id_reply_updates_identity() {
        let pad = SharedPad::new();
        let mut identity = PadIdentity::new();
        identity.capabilities.rumble_available = false;
        let reply = encode_identity(&identity);
        pad.on_response(Command::Id, reply.as_bytes());
        assert!(!pad.load().identity.capabilities.rumble_available);
    }

    #[test]
    fn test_length_mismatch_dropped_silently() {
        let pad = SharedPad::new();
        // A Status reply must be exactly 8 bytes.
        pad.on_response(Command::Status, &[0x00; 7]);
        pad.on_response(Command::Status, &[0x00; 9]);
        pad.on_response(Command::Id, &[0x00; 10]);
        let snapshot = pad.load();
        assert_eq!(snapshot.publish_count, 0);
        assert_eq!(snapshot.status.input.analog, AnalogAxes::neutral());
    }

    #[test]
    fn test_invalid_command_dropped() {
        let pad = SharedPad::new();
        pad.on_response(Command::Invalid, &[0x00; 8]);
        assert_eq!(pad.load().publish_count, 0);
    }
}
