//! Interval scheduling for the pattern generator.

use crate::time::deadline_reached;

/// Cadence configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleConfig {
    pub interval_us: u32,
    /// Skip missed intervals to stay on cadence instead of emitting every
    /// pattern point late.
    pub catch_up: bool,
}

impl ScheduleConfig {
    /// One console frame at 60 Hz.
    pub const FRAME_60HZ_US: u32 = 16_667;
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_us: Self::FRAME_60HZ_US,
            catch_up: false,
        }
    }
}

/// Counts elapsed intervals between polls.
pub struct Schedule {
    interval_us: u32,
    catch_up: bool,
    armed: bool,
    next_due_us: u32,
}

impl Schedule {
    #[must_use]
    pub const fn new(config: ScheduleConfig) -> Self {
        Self {
            interval_us: config.interval_us,
            catch_up: config.catch_up,
            armed: false,
            next_due_us: 0,
        }
    }

    /// Re-arm; the next poll fires immediately.
    pub fn reset(&mut self) {
        self.armed = false;
    }

    /// Number of scheduled intervals that have elapsed; zero when not yet
    /// due. The first poll after arming always reports one step.
    pub fn poll_steps(&mut self, now_us: u32) -> u32 {
        let interval = if self.interval_us == 0 { 1 } else { self.interval_us };

        if !self.armed {
            self.armed = true;
            self.next_due_us = now_us;
        }

        if !deadline_reached(now_us, self.next_due_us) {
            return 0;
        }

        let late = now_us.wrapping_sub(self.next_due_us);
        let mut steps = 1;
        if self.catch_up {
            steps += late / interval;
            self.next_due_us = self.next_due_us.wrapping_add(steps * interval);
        } else {
            self.next_due_us = now_us.wrapping_add(interval);
        }
        steps
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(ScheduleConfig::default())
    }
}
