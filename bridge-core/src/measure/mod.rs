//! Measurement harness: generated pad responses on a schedule.
//!
//! When measurement mode is on, the console side reads from a secondary hub
//! that a pattern generator feeds with synthetic Status responses; the
//! console never observes the switch. Transmitted samples are reported as
//! CRC-tagged CSV lines.

pub mod grid_sweep;
pub mod injector;
pub mod pattern;
pub mod schedule;
pub mod seed;
pub mod telemetry;

pub use grid_sweep::{GridSweep, GridSweepConfig, SweepTarget, U8Range};
pub use injector::PadInjector;
pub use pattern::TestPattern;
pub use schedule::{Schedule, ScheduleConfig};
pub use seed::{seed_initial_responses, SeedOptions};
pub use telemetry::SampleLogger;
