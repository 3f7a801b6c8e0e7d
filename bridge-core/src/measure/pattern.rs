//! The contract a test pattern fulfills.

use joybus_proto::PadState;

/// A deterministic source of synthetic pad states.
pub trait TestPattern {
    /// Rewind to the first point.
    fn reset(&mut self);

    /// Produce the state `steps` scheduled intervals after the last call
    /// and advance past it. `steps` above one means intervals were missed
    /// (catch-up scheduling).
    ///
    /// Returns `false` when the pattern is exhausted; `out` is then left
    /// untouched.
    fn sample_and_advance(&mut self, out: &mut PadState, steps: u32) -> bool;
}
