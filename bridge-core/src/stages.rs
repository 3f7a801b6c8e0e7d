//! The built-in transform stages for analog stick samples.
//!
//! The correction chain is origin-normalize → octagon-clamp → linear-scale →
//! inverse-LUT, applied to `stick_x`/`stick_y` only; the c-stick and the
//! triggers pass through untouched. Everything here runs from interrupt
//! context: fixed arithmetic, no divides hot enough to matter, no
//! allocation.

use joybus_proto::{AnalogAxes, PadState};
use portable_atomic::{AtomicU8, Ordering};

use crate::lut::StickLut;

/// cos(π/8) in Q15.
pub const COS_PI_8_Q15: i32 = 30_274;
/// sin(π/8) in Q15.
pub const SIN_PI_8_Q15: i32 = 12_540;
/// Octagon apothem 125 scaled by cos(π/8)·2^15.
pub const APOTHEM_125_Q15: i32 = 125 * COS_PI_8_Q15;

const CENTER: i32 = AnalogAxes::AXIS_CENTER as i32;

/// Runtime context for origin normalization.
///
/// Holds the pad's real neutral position as captured from Origin or
/// Recalibrate replies. The main loop stores, the interrupt loads.
pub struct OriginOffset {
    x: AtomicU8,
    y: AtomicU8,
}

impl OriginOffset {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            x: AtomicU8::new(AnalogAxes::AXIS_CENTER),
            y: AtomicU8::new(AnalogAxes::AXIS_CENTER),
        }
    }

    pub fn store(&self, x: u8, y: u8) {
        self.x.store(x, Ordering::Release);
        self.y.store(y, Ordering::Release);
    }

    #[must_use]
    pub fn load(&self) -> (u8, u8) {
        (self.x.load(Ordering::Acquire), self.y.load(Ordering::Acquire))
    }
}

impl Default for OriginOffset {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn clamp_axis(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Pin every analog axis to its rest position.
///
/// Used while the console is establishing its idea of the origin, so that
/// whatever the pad reports, the console sees a perfectly centered stick.
pub fn fix_neutral(state: &mut PadState) {
    let analog = &mut state.input.analog;
    analog.stick_x = AnalogAxes::AXIS_CENTER;
    analog.stick_y = AnalogAxes::AXIS_CENTER;
    analog.c_stick_x = AnalogAxes::AXIS_CENTER;
    analog.c_stick_y = AnalogAxes::AXIS_CENTER;
    analog.l_analog = AnalogAxes::TRIGGER_RELEASED;
    analog.r_analog = AnalogAxes::TRIGGER_RELEASED;
}

/// Align the pad's real neutral with the protocol neutral (128, 128).
pub fn origin_normalize(origin: &OriginOffset, state: &mut PadState) {
    let (ox, oy) = origin.load();
    let analog = &mut state.input.analog;
    let x = analog.stick_x as i32 - ox as i32 + CENTER;
    let y = analog.stick_y as i32 - oy as i32 + CENTER;
    analog.stick_x = clamp_axis(x);
    analog.stick_y = clamp_axis(y);
}

/// Radially project a centered point onto the regular octagon of apothem
/// 125 if it lies outside.
///
/// The four half-plane magnitudes |c·px ± s·py| and |s·px ± c·py| (Q15) are
/// compared against the apothem; outside, the point is scaled back along
/// its ray with integer division.
#[must_use]
pub fn octagon_clamp_point(x: u8, y: u8) -> (u8, u8) {
    let px = x as i32 - CENTER;
    let py = y as i32 - CENTER;

    if px == 0 && py == 0 {
        return (x, y);
    }

    let c0 = (COS_PI_8_Q15 * px + SIN_PI_8_Q15 * py).abs();
    let c1 = (COS_PI_8_Q15 * px - SIN_PI_8_Q15 * py).abs();
    let c2 = (SIN_PI_8_Q15 * px + COS_PI_8_Q15 * py).abs();
    let c3 = (SIN_PI_8_Q15 * px - COS_PI_8_Q15 * py).abs();
    let max_abs = c0.max(c1).max(c2).max(c3);

    if max_abs <= APOTHEM_125_Q15 {
        return (x, y);
    }

    let nx = px * APOTHEM_125_Q15 / max_abs;
    let ny = py * APOTHEM_125_Q15 / max_abs;
    (clamp_axis(nx + CENTER), clamp_axis(ny + CENTER))
}

/// Octagon clamp applied to the main stick of a pad state.
pub fn octagon_clamp(state: &mut PadState) {
    let analog = &mut state.input.analog;
    let (x, y) = octagon_clamp_point(analog.stick_x, analog.stick_y);
    analog.stick_x = x;
    analog.stick_y = y;
}

#[inline]
fn scale_4_5(v: i32) -> i32 {
    // Round-to-nearest 4v/5 without a divide: 13108 ≈ 2^16/5, and the +2
    // bias realizes the rounding. Exact for |v| ≤ 128.
    if v >= 0 {
        ((v * 4 + 2) * 13108) >> 16
    } else {
        -((((-v) * 4 + 2) * 13108) >> 16)
    }
}

/// φ(s) = (4/5)(s − 128) + 128 applied to one axis value.
#[must_use]
pub fn linear_scale_point(x: u8, y: u8) -> (u8, u8) {
    let px = scale_4_5(x as i32 - CENTER);
    let py = scale_4_5(y as i32 - CENTER);
    (clamp_axis(px + CENTER), clamp_axis(py + CENTER))
}

/// Linear 4/5 scale applied to the main stick of a pad state.
pub fn linear_scale(state: &mut PadState) {
    let analog = &mut state.input.analog;
    let (x, y) = linear_scale_point(analog.stick_x, analog.stick_y);
    analog.stick_x = x;
    analog.stick_y = y;
}

/// Replace the stick sample with its inverse-mapped value.
pub fn inverse_lut(lut: &StickLut, state: &mut PadState) {
    let analog = &mut state.input.analog;
    let (x, y) = lut.lookup(analog.stick_x, analog.stick_y);
    analog.stick_x = x;
    analog.stick_y = y;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_stick(x: u8, y: u8) -> PadState {
        let mut state = PadState::neutral();
        state.input.analog.stick_x = x;
        state.input.analog.stick_y = y;
        state
    }

    fn half_plane_max(x: u8, y: u8) -> i32 {
        let px = x as i32 - 128;
        let py = y as i32 - 128;
        let c0 = (COS_PI_8_Q15 * px + SIN_PI_8_Q15 * py).abs();
        let c1 = (COS_PI_8_Q15 * px - SIN_PI_8_Q15 * py).abs();
        let c2 = (SIN_PI_8_Q15 * px + COS_PI_8_Q15 * py).abs();
        let c3 = (SIN_PI_8_Q15 * px - COS_PI_8_Q15 * py).abs();
        c0.max(c1).max(c2).max(c3)
    }

    #[test]
    fn test_fix_neutral_pins_all_axes() {
        let mut state = state_with_stick(0, 255);
        state.input.analog.l_analog = 0x90;
        state.input.analog.c_stick_y = 0x12;
        fix_neutral(&mut state);
        assert_eq!(state.input.analog, AnalogAxes::neutral());
    }

    #[test]
    fn test_origin_normalize_shifts_center() {
        let origin = OriginOffset::new();
        origin.store(0x85, 0x7B);
        let mut state = state_with_stick(0x85, 0x7B);
        origin_normalize(&origin, &mut state);
        assert_eq!(state.input.analog.stick_x, 0x80);
        assert_eq!(state.input.analog.stick_y, 0x80);
    }

    #[test]
    fn test_origin_normalize_saturates() {
        let origin = OriginOffset::new();
        origin.store(0x00, 0xFF);
        let mut state = state_with_stick(0xFF, 0x00);
        origin_normalize(&origin, &mut state);
        assert_eq!(state.input.analog.stick_x, 255);
        assert_eq!(state.input.analog.stick_y, 0);
    }

    #[test]
    fn test_octagon_clamp_inside_unchanged() {
        for (x, y) in [(128u8, 128u8), (140, 150), (128, 253), (30, 128)] {
            assert_eq!(octagon_clamp_point(x, y), (x, y), "({x},{y}) lies inside");
        }
    }

    #[test]
    fn test_octagon_clamp_corner_projected() {
        let (x, y) = octagon_clamp_point(255, 255);
        assert!(half_plane_max(x, y) <= APOTHEM_125_Q15);
        assert!(x < 255 && y < 255);
        // Diagonal input projects onto the diagonal.
        assert_eq!(x, y);
    }

    #[test]
    fn test_octagon_clamp_center_untouched() {
        assert_eq!(octagon_clamp_point(128, 128), (128, 128));
    }

    #[test]
    fn test_linear_scale_reference_points() {
        assert_eq!(linear_scale_point(0, 0), (26, 26));
        assert_eq!(linear_scale_point(255, 255), (229, 229));
        assert_eq!(linear_scale_point(128, 128), (128, 128));
    }

    #[test]
    fn test_linear_scale_matches_rounded_ratio() {
        for s in 0u8..=255 {
            let expected = ((4.0 * (s as f64 - 128.0) / 5.0).round() + 128.0) as i32;
            let (got, _) = linear_scale_point(s, 128);
            assert_eq!(got as i32, expected, "axis value {s}");
        }
    }
}
