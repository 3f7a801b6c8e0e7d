//! The console's most recently expressed intent, tracked from its requests.

use joybus_proto::{Command, PollMode, RumbleMode, STATUS_REQUEST_LEN};

use crate::latch::{Latch, ShadowCell};

/// Poll and rumble modes dictated by the console, plus how many Reset
/// requests it has issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsoleState {
    pub poll_mode: PollMode,
    pub rumble_mode: RumbleMode,
    pub reset_count: u16,
}

impl ConsoleState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_mode: PollMode::Mode3,
            rumble_mode: RumbleMode::Off,
            reset_count: 0,
        }
    }
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks [`ConsoleState`] from inbound request frames.
pub struct SharedConsole {
    shadow: ShadowCell<ConsoleState>,
    latch: Latch<ConsoleState>,
}

impl SharedConsole {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shadow: ShadowCell::new(ConsoleState::new()),
            latch: Latch::new(ConsoleState::new()),
        }
    }

    #[must_use]
    pub fn load(&self) -> ConsoleState {
        self.latch.load()
    }

    /// Feed an inbound console request. Console-side receive context only.
    ///
    /// Status requests update the modes (publishing only on change); Reset
    /// bumps the reset counter; everything else leaves the state alone.
    pub fn on_request(&self, rx: &[u8]) {
        let Some(&first) = rx.first() else {
            return;
        };

        // SAFETY: sole writer is the console-side receive context.
        let shadow = unsafe { self.shadow.get_mut() };

        let updated = match Command::from_byte(first) {
            Command::Status => {
                if rx.len() >= STATUS_REQUEST_LEN {
                    let poll = PollMode::sanitize(rx[1]);
                    let rumble = RumbleMode::sanitize(rx[2]);
                    if poll != shadow.poll_mode || rumble != shadow.rumble_mode {
                        shadow.poll_mode = poll;
                        shadow.rumble_mode = rumble;
                        true
                    } else {
                        false
                    }
                } else {
                    false
                }
            }
            Command::Reset => {
                shadow.reset_count = shadow.reset_count.wrapping_add(1);
                true
            }
            _ => false,
        };

        if updated {
            self.latch.publish(*shadow);
        }
    }
}

impl Default for SharedConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_request_updates_modes() {
        let console = SharedConsole::new();
        console.on_request(&[0x40, 0x00, 0x01]);
        let state = console.load();
        assert_eq!(state.poll_mode, PollMode::Mode0);
        assert_eq!(state.rumble_mode, RumbleMode::On);
    }

    #[test]
    fn test_short_status_request_ignored() {
        let console = SharedConsole::new();
        console.on_request(&[0x40]);
        assert_eq!(console.load(), ConsoleState::new());
    }

    #[test]
    fn test_modes_sanitized() {
        let console = SharedConsole::new();
        console.on_request(&[0x40, 0x09, 0x07]);
        let state = console.load();
        assert_eq!(state.poll_mode, PollMode::Mode3);
        assert_eq!(state.rumble_mode, RumbleMode::Off);
    }

    #[test]
    fn test_reset_counts() {
        let console = SharedConsole::new();
        console.on_request(&[0xFF]);
        console.on_request(&[0xFF]);
        assert_eq!(console.load().reset_count, 2);
    }

    #[test]
    fn test_other_commands_leave_state_alone() {
        let console = SharedConsole::new();
        console.on_request(&[0x40, 0x01, 0x01]);
        let before = console.load();
        console.on_request(&[0x41]);
        console.on_request(&[0x00]);
        console.on_request(&[0x42, 0x00, 0x00]);
        console.on_request(&[]);
        assert_eq!(console.load(), before);
    }
}
