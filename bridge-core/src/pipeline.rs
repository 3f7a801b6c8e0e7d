//! Ordered, individually switchable transform stages.

use heapless::Vec;
use joybus_proto::PadState;
use portable_atomic::{AtomicU32, Ordering};

use crate::lut::StickLut;
use crate::stages::{self, OriginOffset};

/// One transform applied in place to a [`PadState`].
///
/// A closed set of variants keeps the pipeline storage tightly typed; stages
/// that need runtime context borrow it with a `'static` lifetime so they can
/// be invoked from interrupt context without further synchronization.
#[derive(Clone, Copy)]
pub enum Stage {
    /// Pin every analog axis to its rest position.
    FixNeutral,
    /// Align the pad's real neutral with the protocol neutral.
    OriginNormalize(&'static OriginOffset),
    /// Radial projection onto the octagon of apothem 125.
    OctagonClamp,
    /// The 4/5 linear scale.
    LinearScale,
    /// Table-driven inverse mapping.
    InverseLut(&'static StickLut),
    /// Arbitrary transform, mostly for tests.
    Custom(fn(&mut PadState)),
}

impl Stage {
    fn apply(&self, state: &mut PadState) {
        match self {
            Self::FixNeutral => stages::fix_neutral(state),
            Self::OriginNormalize(origin) => stages::origin_normalize(origin, state),
            Self::OctagonClamp => stages::octagon_clamp(state),
            Self::LinearScale => stages::linear_scale(state),
            Self::InverseLut(lut) => stages::inverse_lut(lut, state),
            Self::Custom(func) => func(state),
        }
    }
}

/// Fixed stage capacity of a [`Pipeline`].
pub const MAX_STAGES: usize = 16;

/// An ordered collection of up to 16 stages with a per-index enable mask.
///
/// Stages are appended once during setup (before the pipeline is shared with
/// interrupt context) and never removed; enabling and disabling afterwards
/// only touches the atomic mask, so [`apply`](Pipeline::apply) stays safe to
/// call from an interrupt while the main loop flips stages.
pub struct Pipeline {
    stages: Vec<Stage, MAX_STAGES>,
    enable_mask: AtomicU32,
}

impl Pipeline {
    pub const MAX_STAGES: usize = MAX_STAGES;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            stages: Vec::new(),
            enable_mask: AtomicU32::new(0),
        }
    }

    /// Append a stage and enable it. Returns `false` when full.
    pub fn add_stage(&mut self, stage: Stage) -> bool {
        let index = self.stages.len();
        if self.stages.push(stage).is_err() {
            return false;
        }
        self.enable_mask.fetch_or(1 << index, Ordering::Release);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Enable or disable the stage at `index`. Out-of-range indexes are
    /// ignored.
    pub fn set_enabled(&self, index: usize, enabled: bool) {
        if index >= self.stages.len() {
            return;
        }
        let bit = 1u32 << index;
        if enabled {
            self.enable_mask.fetch_or(bit, Ordering::Release);
        } else {
            self.enable_mask.fetch_and(!bit, Ordering::Release);
        }
    }

    #[must_use]
    pub fn is_enabled(&self, index: usize) -> bool {
        if index >= self.stages.len() {
            return false;
        }
        self.enable_mask.load(Ordering::Acquire) & (1 << index) != 0
    }

    /// Run the enabled stages in insertion order. Interrupt-safe.
    pub fn apply(&self, state: &mut PadState) {
        let enabled = self.enable_mask.load(Ordering::Acquire);
        for (index, stage) in self.stages.iter().enumerate() {
            if enabled & (1 << index) == 0 {
                continue;
            }
            stage.apply(state);
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// One pipeline per reply-producing command.
///
/// Only status, origin, and recalibrate carry stages in practice; id and
/// reset exist for symmetry.
pub struct PipelineSet {
    pub status: Pipeline,
    pub origin: Pipeline,
    pub recalibrate: Pipeline,
    pub id: Pipeline,
    pub reset: Pipeline,
}

impl PipelineSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: Pipeline::new(),
            origin: Pipeline::new(),
            recalibrate: Pipeline::new(),
            id: Pipeline::new(),
            reset: Pipeline::new(),
        }
    }
}

impl Default for PipelineSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_one(state: &mut PadState) {
        state.input.analog.stick_x = state.input.analog.stick_x.wrapping_add(1);
    }

    fn double(state: &mut PadState) {
        state.input.analog.stick_x = state.input.analog.stick_x.wrapping_mul(2);
    }

    #[test]
    fn test_stages_run_in_insertion_order() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.add_stage(Stage::Custom(add_one)));
        assert!(pipeline.add_stage(Stage::Custom(double)));

        let mut state = PadState::neutral();
        state.input.analog.stick_x = 10;
        pipeline.apply(&mut state);
        // (10 + 1) * 2, not 10 * 2 + 1.
        assert_eq!(state.input.analog.stick_x, 22);
    }

    #[test]
    fn test_disable_skips_without_reordering() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Stage::Custom(add_one));
        pipeline.add_stage(Stage::Custom(double));
        pipeline.set_enabled(0, false);

        let mut state = PadState::neutral();
        state.input.analog.stick_x = 10;
        pipeline.apply(&mut state);
        assert_eq!(state.input.analog.stick_x, 20);

        // Re-enabling restores the original composition.
        pipeline.set_enabled(0, true);
        let mut state = PadState::neutral();
        state.input.analog.stick_x = 10;
        pipeline.apply(&mut state);
        assert_eq!(state.input.analog.stick_x, 22);
    }

    #[test]
    fn test_apply_equals_composition_of_enabled_stages() {
        // Pipeline linearity: any enable pattern behaves as composing
        // exactly the enabled stages in insertion order.
        let stage_fns: [fn(&mut PadState); 3] = [add_one, double, add_one];
        for pattern in 0u32..8 {
            let mut pipeline = Pipeline::new();
            for func in stage_fns {
                pipeline.add_stage(Stage::Custom(func));
            }
            for index in 0..3 {
                pipeline.set_enabled(index, pattern & (1 << index) != 0);
            }

            let mut piped = PadState::neutral();
            piped.input.analog.stick_x = 7;
            pipeline.apply(&mut piped);

            let mut manual = PadState::neutral();
            manual.input.analog.stick_x = 7;
            for (index, func) in stage_fns.iter().enumerate() {
                if pattern & (1 << index) != 0 {
                    func(&mut manual);
                }
            }
            assert_eq!(
                piped.input.analog.stick_x, manual.input.analog.stick_x,
                "pattern {pattern:03b}"
            );
        }
    }

    #[test]
    fn test_capacity_limit() {
        let mut pipeline = Pipeline::new();
        for _ in 0..Pipeline::MAX_STAGES {
            assert!(pipeline.add_stage(Stage::OctagonClamp));
        }
        assert!(!pipeline.add_stage(Stage::OctagonClamp));
        assert_eq!(pipeline.len(), Pipeline::MAX_STAGES);
    }

    #[test]
    fn test_out_of_range_enable_ignored() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Stage::LinearScale);
        pipeline.set_enabled(5, true);
        assert!(!pipeline.is_enabled(5));
        assert!(pipeline.is_enabled(0));
    }
}
