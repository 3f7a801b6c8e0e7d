//! Feeds generated pad responses into the measurement hub.

use joybus_proto::status_wire::encode_status;
use joybus_proto::PadState;

use crate::link::PadConsoleLink;
use crate::measure::pattern::TestPattern;
use crate::measure::schedule::Schedule;
use crate::measure::seed::{seed_initial_responses, SeedOptions};
use crate::policy::PAD_POLL_MODE;

/// Drives a [`TestPattern`] on a [`Schedule`] and publishes the generated
/// states as Status responses into the measurement hub.
///
/// Runs from the main loop; the measurement hub's receive side has no other
/// writer, so the injector plays the role the pad-side interrupt plays for
/// the real hub. A measure-mode toggle resets pattern and cadence and
/// reseeds the hub before generation starts.
pub struct PadInjector<'a, P: TestPattern> {
    link: &'a PadConsoleLink,
    schedule: Schedule,
    pattern: P,
    last_measure_epoch: u32,
}

impl<'a, P: TestPattern> PadInjector<'a, P> {
    #[must_use]
    pub fn new(link: &'a PadConsoleLink, schedule: Schedule, pattern: P) -> Self {
        Self {
            link,
            schedule,
            pattern,
            last_measure_epoch: link.load_measure_epoch(),
        }
    }

    /// Drive the generator. Non-blocking; call continuously.
    pub fn tick(&mut self, now_us: u32) {
        if self.link.consume_measure_epoch(&mut self.last_measure_epoch) {
            self.schedule.reset();
            self.pattern.reset();
            if self.link.is_measure_enabled() {
                let console = self.link.shared_console().load();
                seed_initial_responses(self.link, &console, SeedOptions::default());
            }
            // Nothing is generated on the toggle tick itself.
            return;
        }

        if !self.link.is_measure_enabled() {
            return;
        }

        let steps = self.schedule.poll_steps(now_us);
        if steps == 0 {
            return;
        }

        let mut state = PadState::neutral();
        if !self.pattern.sample_and_advance(&mut state, steps) {
            return;
        }

        // Pretend the (absent) pad was polled in the pinned mode.
        let reply = encode_status(&state, PAD_POLL_MODE);
        self.link
            .measure_pad_hub()
            .on_pad_response(reply.command(), reply.as_bytes());
    }
}
