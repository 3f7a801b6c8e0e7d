//! Initial responses for the measurement hub.
//!
//! Measurement mode swaps a hub under the console that no pad has ever
//! answered into. Seeding it with neutral responses for every command keeps
//! the console's first Origin/Id requests answerable before the pattern
//! generator has produced anything.

use joybus_proto::identity_wire::{encode_identity, encode_reset};
use joybus_proto::status_wire::{encode_origin, encode_recalibrate, encode_status};
use joybus_proto::{PadIdentity, PadState, Reply};

use crate::hub::SharedPadHub;
use crate::link::PadConsoleLink;
use crate::policy::PAD_POLL_MODE;
use crate::shared_console::ConsoleState;

/// Which commands to seed. Defaults to all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SeedOptions {
    pub status: bool,
    pub origin: bool,
    pub recalibrate: bool,
    pub id: bool,
    pub reset: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            status: true,
            origin: true,
            recalibrate: true,
            id: true,
            reset: true,
        }
    }
}

/// A neutral identity reflecting the console's current mode requests.
#[must_use]
pub fn identity_from_console(console: &ConsoleState) -> PadIdentity {
    let mut identity = PadIdentity::new();
    identity.runtime.poll_mode = console.poll_mode;
    identity.runtime.rumble_mode = console.rumble_mode;
    identity
}

fn feed(hub: &SharedPadHub, reply: &Reply) {
    if !reply.command().is_valid() || reply.is_empty() {
        return;
    }
    hub.on_pad_response(reply.command(), reply.as_bytes());
}

/// Seed the measurement hub with neutral responses.
pub fn seed_initial_responses(link: &PadConsoleLink, console: &ConsoleState, options: SeedOptions) {
    let hub = link.measure_pad_hub();
    let neutral = PadState::neutral();

    if options.status {
        // Seeded like the injector's output: encoded for the pinned
        // pad-facing mode the hub decodes under.
        feed(hub, &encode_status(&neutral, PAD_POLL_MODE));
    }
    if options.origin {
        feed(hub, &encode_origin(&neutral));
    }
    if options.recalibrate {
        feed(hub, &encode_recalibrate(&neutral));
    }
    if options.id || options.reset {
        let identity = identity_from_console(console);
        if options.id {
            feed(hub, &encode_identity(&identity));
        }
        if options.reset {
            feed(hub, &encode_reset(&identity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joybus_proto::{Command, PollMode, RumbleMode};

    #[test]
    fn test_seed_publishes_every_command() {
        let link = PadConsoleLink::new();
        let console = ConsoleState::new();
        seed_initial_responses(&link, &console, SeedOptions::default());

        let snapshot = link.measure_pad_hub().snapshot();
        assert_eq!(snapshot.publish_count, 5);
        assert_eq!(snapshot.last_rx_command, Command::Reset);
        assert_eq!(snapshot.status.input.analog.stick_x, 0x80);
        assert_eq!(snapshot.origin.input.analog.stick_x, 0x80);
    }

    #[test]
    fn test_seed_respects_options() {
        let link = PadConsoleLink::new();
        let console = ConsoleState::new();
        let options = SeedOptions {
            status: true,
            origin: false,
            recalibrate: false,
            id: false,
            reset: false,
        };
        seed_initial_responses(&link, &console, options);
        assert_eq!(link.measure_pad_hub().snapshot().publish_count, 1);
        // The real hub is untouched.
        assert_eq!(link.real_pad_hub().snapshot().publish_count, 0);
    }

    #[test]
    fn test_identity_reflects_console_modes() {
        let mut console = ConsoleState::new();
        console.poll_mode = PollMode::Mode1;
        console.rumble_mode = RumbleMode::On;
        let identity = identity_from_console(&console);
        assert_eq!(identity.runtime.poll_mode, PollMode::Mode1);
        assert_eq!(identity.runtime.rumble_mode, RumbleMode::On);
    }
}
