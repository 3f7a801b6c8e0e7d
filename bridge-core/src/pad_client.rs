//! The pad-facing protocol state machine, driven from the main loop.

use joybus_proto::{Command, Request};

use crate::link::{PadConnection, PadConsoleLink};
use crate::policy::PAD_POLL_MODE;
use crate::port::Port;
use crate::shared_console::ConsoleState;
use crate::shared_pad::PadSnapshot;
use crate::time::deadline_reached;

/// Declare the pad dead after this long without a valid reply.
pub const PAD_TIMEOUT_US: u32 = 100_000;
/// Per-request reply deadline.
pub const BOOT_TIMEOUT_US: u32 = 30_000;
/// Status polling period; zero polls as fast as the port accepts, for the
/// lowest input latency.
pub const STATUS_PERIOD_US: u32 = 0;
/// Delay before retrying after a failed or timed-out send.
pub const RETRY_DELAY_US: u32 = 0;

/// Connection lifecycle toward the real pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PadClientState {
    Disconnected,
    /// Relaying a console-initiated Reset before re-initializing.
    Resetting,
    /// First Id after a reset.
    BootId,
    /// First Origin fetch.
    BootOrigin,
    /// First Recalibrate fetch.
    BootRecalibrate,
    /// First Status fetch.
    WarmStatus,
    /// Status polling established; the console side may reply.
    Ready,
}

/// Walks the real pad through its connection lifecycle and keeps polling it.
///
/// `tick` is non-blocking and meant to be called continuously from the main
/// loop. Replies arrive asynchronously through the hub (fed by the pad-side
/// receive interrupt); each tick first resolves any wait in progress, then
/// issues the request the current state calls for, so a responsive pad
/// advances one state per tick.
pub struct PadClient<'a, P: Port> {
    link: &'a PadConsoleLink,
    port: P,
    state: PadClientState,

    /// Snapshot generation at send time; any advance past it is a reply.
    await_publish_count: u32,
    response_deadline_us: u32,

    last_seen_us: u32,
    last_publish_count: u32,
    last_reset_epoch: u32,
    next_status_due_us: u32,
}

impl<'a, P: Port> PadClient<'a, P> {
    #[must_use]
    pub fn new(link: &'a PadConsoleLink, port: P) -> Self {
        Self {
            link,
            port,
            state: PadClientState::Disconnected,
            await_publish_count: 0,
            response_deadline_us: 0,
            last_seen_us: 0,
            last_publish_count: 0,
            last_reset_epoch: link.load_reset_epoch(),
            next_status_due_us: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> PadClientState {
        self.state
    }

    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Drive the state machine. Non-blocking; call continuously.
    pub fn tick(&mut self, now_us: u32, console: &ConsoleState) {
        let snapshot = self.link.real_pad_hub().snapshot();

        if snapshot.publish_count != self.last_publish_count {
            self.last_publish_count = snapshot.publish_count;
            self.last_seen_us = now_us;
        }

        let pad_alive = self.last_seen_us != 0
            && !deadline_reached(now_us, self.last_seen_us.wrapping_add(PAD_TIMEOUT_US));
        if !pad_alive && self.state != PadClientState::Disconnected {
            self.enter(PadClientState::Disconnected);
            self.next_status_due_us = 0;
        }

        if self.link.consume_reset_request(&mut self.last_reset_epoch)
            && self.state != PadClientState::Disconnected
            && self.state != PadClientState::Resetting
        {
            self.enter(PadClientState::Resetting);
        }

        self.resolve_wait(now_us, &snapshot);
        self.issue_request(now_us, console);
    }

    fn awaiting(&self) -> Command {
        self.link.pad_await().load()
    }

    fn waiting(&self) -> bool {
        self.awaiting().is_valid()
    }

    fn abort_wait(&mut self) {
        self.link.pad_await().clear();
        self.response_deadline_us = 0;
    }

    fn enter(&mut self, next: PadClientState) {
        self.state = next;
        self.abort_wait();
        self.publish_connection();
    }

    fn publish_connection(&self) {
        let connection = match self.state {
            PadClientState::Ready => PadConnection::Ready,
            PadClientState::BootId
            | PadClientState::BootOrigin
            | PadClientState::BootRecalibrate
            | PadClientState::WarmStatus => PadConnection::Booting,
            PadClientState::Disconnected | PadClientState::Resetting => {
                PadConnection::Disconnected
            }
        };
        self.link.publish_connection(connection);
    }

    /// Complete or abandon the wait in progress, advancing the state on a
    /// matching reply.
    fn resolve_wait(&mut self, now_us: u32, snapshot: &PadSnapshot) {
        if !self.waiting() {
            return;
        }

        let awaited = self.awaiting();
        let got_reply = snapshot.publish_count != self.await_publish_count
            && snapshot.last_rx_command == awaited;

        if got_reply {
            match (self.state, awaited) {
                (PadClientState::Disconnected, Command::Id)
                | (PadClientState::BootId, Command::Id) => {
                    self.enter(PadClientState::BootOrigin);
                }
                (PadClientState::Resetting, Command::Reset) => {
                    // The relay is done; forget the epoch that drove it.
                    self.last_reset_epoch = self.link.load_reset_epoch();
                    self.enter(PadClientState::BootId);
                }
                (PadClientState::BootOrigin, Command::Origin) => {
                    self.enter(PadClientState::BootRecalibrate);
                }
                (PadClientState::BootRecalibrate, Command::Recalibrate) => {
                    self.enter(PadClientState::WarmStatus);
                }
                (PadClientState::WarmStatus, Command::Status) => {
                    self.enter(PadClientState::Ready);
                    self.next_status_due_us = now_us.wrapping_add(STATUS_PERIOD_US);
                }
                (PadClientState::Ready, Command::Status) => {
                    self.next_status_due_us = now_us.wrapping_add(STATUS_PERIOD_US);
                    self.abort_wait();
                }
                _ => {}
            }
        } else if deadline_reached(now_us, self.response_deadline_us) {
            if self.state == PadClientState::Ready {
                self.next_status_due_us = now_us.wrapping_add(RETRY_DELAY_US);
            }
            self.abort_wait();
        }
    }

    /// Issue the request the current state calls for, unless still waiting.
    fn issue_request(&mut self, now_us: u32, console: &ConsoleState) {
        if self.waiting() {
            return;
        }

        match self.state {
            PadClientState::Disconnected | PadClientState::BootId => {
                let _ = self.send_request(&Request::ID, now_us, BOOT_TIMEOUT_US);
            }
            PadClientState::Resetting => {
                let _ = self.send_request(&Request::RESET, now_us, BOOT_TIMEOUT_US);
            }
            PadClientState::BootOrigin => {
                let _ = self.send_request(&Request::ORIGIN, now_us, BOOT_TIMEOUT_US);
            }
            PadClientState::BootRecalibrate => {
                let _ = self.send_request(&Request::RECALIBRATE, now_us, BOOT_TIMEOUT_US);
            }
            PadClientState::WarmStatus => {
                let request = Request::status(PAD_POLL_MODE, console.rumble_mode);
                let _ = self.send_request(&request, now_us, BOOT_TIMEOUT_US);
            }
            PadClientState::Ready => {
                if self.next_status_due_us == 0 || deadline_reached(now_us, self.next_status_due_us)
                {
                    let request = Request::status(PAD_POLL_MODE, console.rumble_mode);
                    if self.send_request(&request, now_us, BOOT_TIMEOUT_US) {
                        self.next_status_due_us = now_us.wrapping_add(STATUS_PERIOD_US);
                    } else {
                        self.next_status_due_us = now_us.wrapping_add(RETRY_DELAY_US);
                    }
                }
            }
        }
    }

    /// Arm the wait, then transmit. The wait condition (awaited command,
    /// deadline, snapshot generation) is fixed before the frame leaves so a
    /// fast reply cannot race it.
    fn send_request<const N: usize>(
        &mut self,
        request: &Request<N>,
        now_us: u32,
        timeout_us: u32,
    ) -> bool {
        if self.waiting() {
            return false;
        }

        self.response_deadline_us = now_us.wrapping_add(timeout_us);
        self.link.pad_await().store(request.command());
        self.await_publish_count = self.link.real_pad_hub().snapshot().publish_count;

        if !self.port.send_now(request.as_slice()) {
            self.abort_wait();
            return false;
        }
        true
    }
}
