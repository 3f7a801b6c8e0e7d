//! Property-based round-trip laws for the frame codecs.
//!
//! Status round trips are exact for 8-bit axes and high-nibble-exact for the
//! axes a polling mode carries as 4 bits. Origin and Id round trips are
//! exact modulo enum sanitization.

use joybus_proto::status_wire::{decode_origin, decode_status, encode_origin, encode_status};
use joybus_proto::identity_wire::{decode_identity, encode_identity_bytes};
use joybus_proto::{
    AnalogAxes, Buttons, PadIdentity, PadReport, PadState, PollMode, RumbleMode,
    ORIGIN_REPLY_LEN, STATUS_REPLY_LEN,
};
use proptest::prelude::*;

prop_compose! {
    fn arb_report()(
        origin_sent in any::<bool>(),
        error_latched in any::<bool>(),
        use_controller_origin in any::<bool>(),
    ) -> PadReport {
        PadReport {
            origin_sent,
            error_latched,
            // Carried by the mandatory always-1 bit, so it decodes as true.
            error_last: true,
            use_controller_origin,
        }
    }
}

prop_compose! {
    fn arb_state()(
        report in arb_report(),
        buttons in any::<u16>(),
        stick_x in any::<u8>(),
        stick_y in any::<u8>(),
        c_stick_x in any::<u8>(),
        c_stick_y in any::<u8>(),
        l_analog in any::<u8>(),
        r_analog in any::<u8>(),
        a_analog in any::<u8>(),
        b_analog in any::<u8>(),
    ) -> PadState {
        let mut state = PadState::neutral();
        state.report = report;
        state.input.buttons = Buttons(buttons & Buttons::MASK);
        state.input.analog = AnalogAxes {
            stick_x, stick_y, c_stick_x, c_stick_y,
            l_analog, r_analog, a_analog, b_analog,
        };
        state
    }
}

prop_compose! {
    fn arb_identity()(
        is_gamecube in any::<bool>(),
        is_standard_controller in any::<bool>(),
        rumble_available in any::<bool>(),
        is_wireless in any::<bool>(),
        supports_wireless_receive in any::<bool>(),
        wireless_is_rf in any::<bool>(),
        wireless_state_fixed in any::<bool>(),
        report in arb_report(),
        error_last in any::<bool>(),
        poll in 0u8..=4,
        rumble in 0u8..=2,
    ) -> PadIdentity {
        let mut identity = PadIdentity::new();
        identity.capabilities.is_gamecube = is_gamecube;
        identity.capabilities.is_standard_controller = is_standard_controller;
        identity.capabilities.rumble_available = rumble_available;
        identity.capabilities.is_wireless = is_wireless;
        identity.capabilities.supports_wireless_receive = supports_wireless_receive;
        identity.capabilities.wireless_is_rf = wireless_is_rf;
        identity.capabilities.wireless_state_fixed = wireless_state_fixed;
        identity.runtime.report = report;
        // Unlike the status word, the Id runtime byte carries error_last as
        // its own bit, so both values must round-trip.
        identity.runtime.report.error_last = error_last;
        identity.runtime.poll_mode = PollMode::sanitize(poll);
        identity.runtime.rumble_mode = RumbleMode::sanitize(rumble);
        identity
    }
}

/// The axes a mode carries at full resolution versus as nibbles.
fn eight_bit_axes(mode: PollMode) -> [bool; 6] {
    // [c_stick_x, c_stick_y, l_analog, r_analog, a_analog, b_analog]
    match mode {
        PollMode::Mode0 => [true, true, false, false, false, false],
        PollMode::Mode1 => [false, false, true, true, false, false],
        PollMode::Mode2 => [false, false, false, false, true, true],
        PollMode::Mode3 => [true, true, true, true, false, false],
        PollMode::Mode4 => [true, true, false, false, true, true],
    }
}

fn assert_axis(mode: PollMode, carried_8bit: bool, carried_at_all: bool, sent: u8, got: u8) {
    if carried_8bit {
        assert_eq!(got, sent, "8-bit axis mismatch in {mode:?}");
    } else if carried_at_all {
        assert_eq!(got, sent & 0xF0, "4-bit axis must keep its high nibble in {mode:?}");
    } else {
        assert_eq!(got, 0, "axis not carried by {mode:?} must decode at rest");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Status round trip: exact on buttons, report, and sticks; high-nibble
    /// exact on 4-bit axes; rest value on axes the mode drops.
    #[test]
    fn prop_status_round_trip(state in arb_state(), mode_raw in 0u8..=4) {
        let mode = PollMode::sanitize(mode_raw);
        let reply = encode_status(&state, mode);
        prop_assert_eq!(reply.len(), STATUS_REPLY_LEN);
        let rx: &[u8; STATUS_REPLY_LEN] = reply.as_bytes().try_into().unwrap();
        let decoded = decode_status(rx, mode);

        prop_assert_eq!(decoded.input.buttons, state.input.buttons);
        prop_assert_eq!(decoded.report, state.report);
        prop_assert_eq!(decoded.input.analog.stick_x, state.input.analog.stick_x);
        prop_assert_eq!(decoded.input.analog.stick_y, state.input.analog.stick_y);

        let full = eight_bit_axes(mode);
        let sent = &state.input.analog;
        let got = &decoded.input.analog;
        // Modes 3 and 4 drop two axes entirely; the others nibble-pack.
        let carried = match mode {
            PollMode::Mode3 => [true, true, true, true, false, false],
            PollMode::Mode4 => [true, true, false, false, true, true],
            _ => [true; 6],
        };
        assert_axis(mode, full[0], carried[0], sent.c_stick_x, got.c_stick_x);
        assert_axis(mode, full[1], carried[1], sent.c_stick_y, got.c_stick_y);
        assert_axis(mode, full[2], carried[2], sent.l_analog, got.l_analog);
        assert_axis(mode, full[3], carried[3], sent.r_analog, got.r_analog);
        assert_axis(mode, full[4], carried[4], sent.a_analog, got.a_analog);
        assert_axis(mode, full[5], carried[5], sent.b_analog, got.b_analog);
    }

    /// Origin frames carry every axis at 8 bits, so the round trip is exact.
    #[test]
    fn prop_origin_round_trip(state in arb_state()) {
        let reply = encode_origin(&state);
        prop_assert_eq!(reply.len(), ORIGIN_REPLY_LEN);
        let rx: &[u8; ORIGIN_REPLY_LEN] = reply.as_bytes().try_into().unwrap();
        prop_assert_eq!(decode_origin(rx), state);
    }

    /// Bit 7 of status word byte 1 is always set, whatever the state.
    #[test]
    fn prop_status_always_1(state in arb_state(), mode_raw in 0u8..=4) {
        let reply = encode_status(&state, PollMode::sanitize(mode_raw));
        prop_assert_eq!(reply.as_bytes()[0] & 0x80, 0x80);
    }

    /// Identity round trip is exact once the enums are in range.
    #[test]
    fn prop_identity_round_trip(identity in arb_identity()) {
        let bytes = encode_identity_bytes(&identity);
        prop_assert_eq!(decode_identity(&bytes), identity);
    }

    /// Sanitization is total and idempotent.
    #[test]
    fn prop_sanitize_total(raw in any::<u8>()) {
        let poll = PollMode::sanitize(raw);
        prop_assert!(poll.to_wire() <= 4);
        prop_assert_eq!(PollMode::sanitize(poll.to_wire()), poll);

        let rumble = RumbleMode::sanitize(raw);
        prop_assert!(rumble.to_wire() <= 2);
        prop_assert_eq!(RumbleMode::sanitize(rumble.to_wire()), rumble);
    }
}
