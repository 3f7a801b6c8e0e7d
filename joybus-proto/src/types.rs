//! Pad state model: buttons, analog axes, report flags, identity.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Digital button state as a bitfield.
///
/// Bit positions equal the status-word bit positions on the wire, so encoding
/// a button set is a mask-and-or away. Bits 5..7 and 15 of the status word
/// carry report flags, not buttons; they are excluded from [`Buttons::MASK`].
///
/// # Example
///
/// ```
/// use joybus_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::Z;
/// assert!(buttons.contains(Buttons::A));
/// assert!(!buttons.contains(Buttons::START));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const X: Self = Self(1 << 2);
    pub const Y: Self = Self(1 << 3);
    pub const START: Self = Self(1 << 4);

    // Bits 5..7 are report flags on the wire, not buttons.

    pub const DPAD_LEFT: Self = Self(1 << 8);
    pub const DPAD_RIGHT: Self = Self(1 << 9);
    pub const DPAD_DOWN: Self = Self(1 << 10);
    pub const DPAD_UP: Self = Self(1 << 11);

    pub const Z: Self = Self(1 << 12);
    pub const R: Self = Self(1 << 13);
    pub const L: Self = Self(1 << 14);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// All twelve button bits; everything else in the status word is a flag.
    pub const MASK: u16 = 0x7F1F;

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Get the raw bitfield value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// The eight analog axes of a standard controller.
///
/// Sticks are centered at 0x80; triggers and analog buttons rest at 0x00.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogAxes {
    pub stick_x: u8,
    pub stick_y: u8,
    pub c_stick_x: u8,
    pub c_stick_y: u8,
    pub l_analog: u8,
    pub r_analog: u8,
    pub a_analog: u8,
    pub b_analog: u8,
}

impl AnalogAxes {
    /// Stick rest position.
    pub const AXIS_CENTER: u8 = 0x80;
    /// Trigger rest position.
    pub const TRIGGER_RELEASED: u8 = 0x00;

    /// All axes at rest.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            stick_x: Self::AXIS_CENTER,
            stick_y: Self::AXIS_CENTER,
            c_stick_x: Self::AXIS_CENTER,
            c_stick_y: Self::AXIS_CENTER,
            l_analog: Self::TRIGGER_RELEASED,
            r_analog: Self::TRIGGER_RELEASED,
            a_analog: Self::TRIGGER_RELEASED,
            b_analog: Self::TRIGGER_RELEASED,
        }
    }
}

impl Default for AnalogAxes {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Complete controller input: digital buttons plus analog axes.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadInput {
    pub buttons: Buttons,
    pub analog: AnalogAxes,
}

impl PadInput {
    /// No buttons pressed, all axes at rest.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: Buttons::NONE,
            analog: AnalogAxes::neutral(),
        }
    }
}

/// Pad meta-state riding alongside the input in Status/Origin replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadReport {
    /// Origin already delivered to the console. Defaults to `true`: a `false`
    /// value makes the console re-request Origin forever.
    pub origin_sent: bool,
    /// An error occurred at some point since connection.
    pub error_latched: bool,
    /// Wire bit 7 of the status word; real controllers keep it set, and the
    /// console rejects the controller when it is clear.
    pub error_last: bool,
    pub use_controller_origin: bool,
}

impl PadReport {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            origin_sent: true,
            error_latched: false,
            error_last: true,
            use_controller_origin: false,
        }
    }
}

impl Default for PadReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Common shape of Status, Origin, and Recalibrate replies, independent of
/// the polling mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadState {
    pub report: PadReport,
    pub input: PadInput,
}

impl PadState {
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            report: PadReport::new(),
            input: PadInput::neutral(),
        }
    }
}

impl Default for PadState {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Polling mode requested by the console in a Status request.
///
/// Selects how the six trailing analog bytes of a Status reply are shared
/// between the c-stick, the triggers, and the A/B analog buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PollMode {
    Mode0 = 0,
    Mode1 = 1,
    Mode2 = 2,
    Mode3 = 3,
    Mode4 = 4,
}

impl PollMode {
    /// Map a wire byte to a mode, falling back to `Mode3` for anything out
    /// of range.
    #[inline]
    #[must_use]
    pub const fn sanitize(value: u8) -> Self {
        match value {
            0 => Self::Mode0,
            1 => Self::Mode1,
            2 => Self::Mode2,
            3 => Self::Mode3,
            4 => Self::Mode4,
            _ => Self::Mode3,
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }
}

impl Default for PollMode {
    fn default() -> Self {
        Self::Mode3
    }
}

/// Rumble motor command carried in the last byte of a Status request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RumbleMode {
    Off = 0,
    On = 1,
    Brake = 2,
}

impl RumbleMode {
    /// Map a wire byte to a mode, falling back to `Off` for anything out of
    /// range.
    #[inline]
    #[must_use]
    pub const fn sanitize(value: u8) -> Self {
        match value {
            0 => Self::Off,
            1 => Self::On,
            2 => Self::Brake,
            _ => Self::Off,
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }
}

impl Default for RumbleMode {
    fn default() -> Self {
        Self::Off
    }
}

/// Capabilities advertised in the Id reply. Invariant after boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadIdentityCapabilities {
    pub is_gamecube: bool,
    pub is_standard_controller: bool,
    pub rumble_available: bool,
    pub is_wireless: bool,
    pub supports_wireless_receive: bool,
    pub wireless_is_rf: bool,
    pub wireless_state_fixed: bool,
}

impl PadIdentityCapabilities {
    /// A wired standard controller with rumble.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            is_gamecube: true,
            is_standard_controller: true,
            rumble_available: true,
            is_wireless: false,
            supports_wireless_receive: false,
            wireless_is_rf: false,
            wireless_state_fixed: false,
        }
    }
}

impl Default for PadIdentityCapabilities {
    fn default() -> Self {
        Self::standard()
    }
}

/// Mutable part of the identity, refreshed per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadIdentityRuntime {
    pub report: PadReport,
    pub poll_mode: PollMode,
    pub rumble_mode: RumbleMode,
}

impl PadIdentityRuntime {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            report: PadReport::new(),
            poll_mode: PollMode::Mode3,
            rumble_mode: RumbleMode::Off,
        }
    }
}

impl Default for PadIdentityRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Full identity as carried by Id and Reset replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadIdentity {
    pub capabilities: PadIdentityCapabilities,
    pub runtime: PadIdentityRuntime,
}

impl PadIdentity {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capabilities: PadIdentityCapabilities::standard(),
            runtime: PadIdentityRuntime::new(),
        }
    }
}

impl Default for PadIdentity {
    fn default() -> Self {
        Self::new()
    }
}
