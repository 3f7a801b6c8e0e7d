//! Status, Origin, and Recalibrate frame codecs.
//!
//! All three replies open with the 16-bit little-endian status word: twelve
//! button bits plus four report flags. Status replies follow with six analog
//! bytes whose layout depends on the polling mode; Origin and Recalibrate
//! always carry all eight axes at 8-bit resolution.

use crate::bits::{
    expand_4bit, high_nibble, low_nibble, pack_nibbles, read_u16_le, shrink_to_4bit, write_u16_le,
};
use crate::command::{Command, ORIGIN_REPLY_LEN, STATUS_REPLY_LEN};
use crate::reply::Reply;
use crate::types::{Buttons, PadReport, PadState, PollMode};

/// Report flag bits within the status word.
pub mod status_word {
    /// Set while the pad has not yet delivered its origin (inverted
    /// `origin_sent`).
    pub const ORIGIN_NOT_SENT: u16 = 1 << 5;
    /// An error occurred at some point since connection.
    pub const ERROR_LATCHED: u16 = 1 << 6;
    /// Mandatory: the console rejects the controller when this bit is clear.
    pub const ALWAYS_1: u16 = 1 << 7;
    pub const USE_CONTROLLER_ORIGIN: u16 = 1 << 15;
}

/// Assemble the status word from buttons and report flags.
///
/// The always-1 bit is forced high regardless of the report.
#[must_use]
pub fn encode_status_word(state: &PadState) -> u16 {
    let mut word = state.input.buttons.raw() & Buttons::MASK;

    let report = &state.report;
    if !report.origin_sent {
        word |= status_word::ORIGIN_NOT_SENT;
    }
    if report.error_latched {
        word |= status_word::ERROR_LATCHED;
    }
    word |= status_word::ALWAYS_1;
    if report.use_controller_origin {
        word |= status_word::USE_CONTROLLER_ORIGIN;
    }

    word
}

/// Extract the report flags from a status word.
#[must_use]
pub const fn decode_report_from_status_word(word: u16) -> PadReport {
    PadReport {
        origin_sent: word & status_word::ORIGIN_NOT_SENT == 0,
        error_latched: word & status_word::ERROR_LATCHED != 0,
        error_last: word & status_word::ALWAYS_1 != 0,
        use_controller_origin: word & status_word::USE_CONTROLLER_ORIGIN != 0,
    }
}

/// Extract the button bits from a status word.
#[must_use]
pub const fn decode_buttons_from_status_word(word: u16) -> Buttons {
    Buttons(word & Buttons::MASK)
}

/// Encode a Status reply for the given polling mode.
#[must_use]
pub fn encode_status(state: &PadState, poll_mode: PollMode) -> Reply {
    let mut out = [0u8; STATUS_REPLY_LEN];

    let mut word_bytes = [0u8; 2];
    write_u16_le(encode_status_word(state), &mut word_bytes);
    out[0] = word_bytes[0];
    out[1] = word_bytes[1];

    let analog = &state.input.analog;
    out[2] = analog.stick_x;
    out[3] = analog.stick_y;

    match poll_mode {
        PollMode::Mode0 => {
            out[4] = analog.c_stick_x;
            out[5] = analog.c_stick_y;
            out[6] = pack_nibbles(shrink_to_4bit(analog.l_analog), shrink_to_4bit(analog.r_analog));
            out[7] = pack_nibbles(shrink_to_4bit(analog.a_analog), shrink_to_4bit(analog.b_analog));
        }
        PollMode::Mode1 => {
            out[4] = pack_nibbles(
                shrink_to_4bit(analog.c_stick_x),
                shrink_to_4bit(analog.c_stick_y),
            );
            out[5] = analog.l_analog;
            out[6] = analog.r_analog;
            out[7] = pack_nibbles(shrink_to_4bit(analog.a_analog), shrink_to_4bit(analog.b_analog));
        }
        PollMode::Mode2 => {
            out[4] = pack_nibbles(
                shrink_to_4bit(analog.c_stick_x),
                shrink_to_4bit(analog.c_stick_y),
            );
            out[5] = pack_nibbles(shrink_to_4bit(analog.l_analog), shrink_to_4bit(analog.r_analog));
            out[6] = analog.a_analog;
            out[7] = analog.b_analog;
        }
        PollMode::Mode3 => {
            out[4] = analog.c_stick_x;
            out[5] = analog.c_stick_y;
            out[6] = analog.l_analog;
            out[7] = analog.r_analog;
        }
        PollMode::Mode4 => {
            out[4] = analog.c_stick_x;
            out[5] = analog.c_stick_y;
            out[6] = analog.a_analog;
            out[7] = analog.b_analog;
        }
    }

    Reply::from_array(Command::Status, out)
}

/// Decode a Status reply received under the given polling mode.
///
/// Axes the mode does not carry keep their rest value; 4-bit axes come back
/// with a zero low nibble.
#[must_use]
pub fn decode_status(rx: &[u8; STATUS_REPLY_LEN], poll_mode: PollMode) -> PadState {
    let word = read_u16_le(&[rx[0], rx[1]]);

    let mut state = PadState::neutral();
    state.report = decode_report_from_status_word(word);
    state.input.buttons = decode_buttons_from_status_word(word);

    let analog = &mut state.input.analog;
    analog.stick_x = rx[2];
    analog.stick_y = rx[3];

    match poll_mode {
        PollMode::Mode0 => {
            analog.c_stick_x = rx[4];
            analog.c_stick_y = rx[5];
            analog.l_analog = expand_4bit(high_nibble(rx[6]));
            analog.r_analog = expand_4bit(low_nibble(rx[6]));
            analog.a_analog = expand_4bit(high_nibble(rx[7]));
            analog.b_analog = expand_4bit(low_nibble(rx[7]));
        }
        PollMode::Mode1 => {
            analog.c_stick_x = expand_4bit(high_nibble(rx[4]));
            analog.c_stick_y = expand_4bit(low_nibble(rx[4]));
            analog.l_analog = rx[5];
            analog.r_analog = rx[6];
            analog.a_analog = expand_4bit(high_nibble(rx[7]));
            analog.b_analog = expand_4bit(low_nibble(rx[7]));
        }
        PollMode::Mode2 => {
            analog.c_stick_x = expand_4bit(high_nibble(rx[4]));
            analog.c_stick_y = expand_4bit(low_nibble(rx[4]));
            analog.l_analog = expand_4bit(high_nibble(rx[5]));
            analog.r_analog = expand_4bit(low_nibble(rx[5]));
            analog.a_analog = rx[6];
            analog.b_analog = rx[7];
        }
        PollMode::Mode3 => {
            analog.c_stick_x = rx[4];
            analog.c_stick_y = rx[5];
            analog.l_analog = rx[6];
            analog.r_analog = rx[7];
        }
        PollMode::Mode4 => {
            analog.c_stick_x = rx[4];
            analog.c_stick_y = rx[5];
            analog.a_analog = rx[6];
            analog.b_analog = rx[7];
        }
    }

    state
}

fn encode_origin_bytes(state: &PadState) -> [u8; ORIGIN_REPLY_LEN] {
    let mut out = [0u8; ORIGIN_REPLY_LEN];

    let mut word_bytes = [0u8; 2];
    write_u16_le(encode_status_word(state), &mut word_bytes);
    out[0] = word_bytes[0];
    out[1] = word_bytes[1];

    let analog = &state.input.analog;
    out[2] = analog.stick_x;
    out[3] = analog.stick_y;
    out[4] = analog.c_stick_x;
    out[5] = analog.c_stick_y;
    out[6] = analog.l_analog;
    out[7] = analog.r_analog;
    out[8] = analog.a_analog;
    out[9] = analog.b_analog;

    out
}

/// Encode an Origin reply. All axes ride at 8-bit resolution.
#[must_use]
pub fn encode_origin(state: &PadState) -> Reply {
    Reply::from_array(Command::Origin, encode_origin_bytes(state))
}

/// Encode a Recalibrate reply; same frame as Origin under a different
/// command.
#[must_use]
pub fn encode_recalibrate(state: &PadState) -> Reply {
    Reply::from_array(Command::Recalibrate, encode_origin_bytes(state))
}

/// Decode an Origin (or Recalibrate) reply.
#[must_use]
pub fn decode_origin(rx: &[u8; ORIGIN_REPLY_LEN]) -> PadState {
    let word = read_u16_le(&[rx[0], rx[1]]);

    let mut state = PadState::neutral();
    state.report = decode_report_from_status_word(word);
    state.input.buttons = decode_buttons_from_status_word(word);

    let analog = &mut state.input.analog;
    analog.stick_x = rx[2];
    analog.stick_y = rx[3];
    analog.c_stick_x = rx[4];
    analog.c_stick_y = rx[5];
    analog.l_analog = rx[6];
    analog.r_analog = rx[7];
    analog.a_analog = rx[8];
    analog.b_analog = rx[9];

    state
}

/// Decode a Recalibrate reply.
#[must_use]
pub fn decode_recalibrate(rx: &[u8; ORIGIN_REPLY_LEN]) -> PadState {
    decode_origin(rx)
}
