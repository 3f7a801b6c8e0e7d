//! The carrier shared between the pad-facing and console-facing clients.

use joybus_proto::Command;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::hub::SharedPadHub;
use crate::pipeline::PipelineSet;
use crate::shared_console::SharedConsole;

/// Pad connection state as seen from the console side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PadConnection {
    Disconnected = 0,
    /// Initialization (Id, Origin, Recalibrate) in progress.
    Booting = 1,
    /// Status polling established.
    Ready = 2,
}

impl PadConnection {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Booting,
            2 => Self::Ready,
            _ => Self::Disconnected,
        }
    }
}

/// The command the pad client is currently waiting a reply for.
///
/// Written by the main loop when a request goes out, read by the pad-side
/// receive interrupt to attribute the incoming frame.
pub struct AwaitedCommand {
    command: AtomicU8,
}

impl AwaitedCommand {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            command: AtomicU8::new(Command::Invalid as u8),
        }
    }

    pub fn store(&self, command: Command) {
        self.command.store(command.to_byte(), Ordering::Release);
    }

    pub fn clear(&self) {
        self.store(Command::Invalid);
    }

    #[must_use]
    pub fn load(&self) -> Command {
        Command::from_byte(self.command.load(Ordering::Acquire))
    }
}

impl Default for AwaitedCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the two bus endpoints share.
///
/// The epoch counters model edge-triggered console→pad notifications: each
/// `publish_*` increments, each `consume_*` compares against the caller's
/// last-seen value and fires exactly once per increment. This is the only
/// signaling surface from the console interrupt to the pad-side main loop.
pub struct PadConsoleLink {
    connection: AtomicU8,
    reset_epoch: AtomicU32,
    origin_epoch: AtomicU32,
    recalibrate_epoch: AtomicU32,
    pad_await: AwaitedCommand,
    real_pad_hub: SharedPadHub,
    shared_console: SharedConsole,
    pipelines: PipelineSet,

    // Measurement harness: a second hub the console side can be switched to.
    measure_pad_hub: SharedPadHub,
    measure_enabled: AtomicBool,
    measure_epoch: AtomicU32,
}

impl PadConsoleLink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection: AtomicU8::new(PadConnection::Disconnected as u8),
            reset_epoch: AtomicU32::new(0),
            origin_epoch: AtomicU32::new(0),
            recalibrate_epoch: AtomicU32::new(0),
            pad_await: AwaitedCommand::new(),
            real_pad_hub: SharedPadHub::new(),
            shared_console: SharedConsole::new(),
            pipelines: PipelineSet::new(),
            measure_pad_hub: SharedPadHub::new(),
            measure_enabled: AtomicBool::new(false),
            measure_epoch: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn real_pad_hub(&self) -> &SharedPadHub {
        &self.real_pad_hub
    }

    #[must_use]
    pub fn measure_pad_hub(&self) -> &SharedPadHub {
        &self.measure_pad_hub
    }

    /// The hub the console side currently reads from.
    #[must_use]
    pub fn active_pad_hub(&self) -> &SharedPadHub {
        if self.is_measure_enabled() {
            &self.measure_pad_hub
        } else {
            &self.real_pad_hub
        }
    }

    #[must_use]
    pub fn shared_console(&self) -> &SharedConsole {
        &self.shared_console
    }

    #[must_use]
    pub fn pipelines(&self) -> &PipelineSet {
        &self.pipelines
    }

    /// Mutable pipeline access for setup, before the link is shared.
    pub fn pipelines_mut(&mut self) -> &mut PipelineSet {
        &mut self.pipelines
    }

    #[must_use]
    pub fn pad_await(&self) -> &AwaitedCommand {
        &self.pad_await
    }

    // --- Pad → console: connection state ---

    pub fn publish_connection(&self, state: PadConnection) {
        self.connection.store(state as u8, Ordering::Release);
    }

    #[must_use]
    pub fn connection(&self) -> PadConnection {
        PadConnection::from_u8(self.connection.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_pad_ready(&self) -> bool {
        matches!(self.connection(), PadConnection::Ready)
    }

    // --- Console → pad: request epochs ---

    pub fn publish_reset_request(&self) {
        self.reset_epoch.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publish_origin_request(&self) {
        self.origin_epoch.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publish_recalibrate_request(&self) {
        self.recalibrate_epoch.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn load_reset_epoch(&self) -> u32 {
        self.reset_epoch.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn load_origin_epoch(&self) -> u32 {
        self.origin_epoch.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn load_recalibrate_epoch(&self) -> u32 {
        self.recalibrate_epoch.load(Ordering::Relaxed)
    }

    /// True exactly once per published reset request, from the caller's
    /// perspective tracked in `last_seen`.
    #[must_use]
    pub fn consume_reset_request(&self, last_seen: &mut u32) -> bool {
        Self::consume_epoch(&self.reset_epoch, last_seen)
    }

    #[must_use]
    pub fn consume_origin_request(&self, last_seen: &mut u32) -> bool {
        Self::consume_epoch(&self.origin_epoch, last_seen)
    }

    #[must_use]
    pub fn consume_recalibrate_request(&self, last_seen: &mut u32) -> bool {
        Self::consume_epoch(&self.recalibrate_epoch, last_seen)
    }

    // --- Measurement harness ---

    pub fn enable_measure(&self) {
        self.measure_enabled.store(true, Ordering::Release);
        self.measure_epoch.fetch_add(1, Ordering::Relaxed);
    }

    pub fn disable_measure(&self) {
        self.measure_enabled.store(false, Ordering::Release);
        self.measure_epoch.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_measure_enabled(&self) -> bool {
        self.measure_enabled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn load_measure_epoch(&self) -> u32 {
        self.measure_epoch.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn consume_measure_epoch(&self, last_seen: &mut u32) -> bool {
        Self::consume_epoch(&self.measure_epoch, last_seen)
    }

    fn consume_epoch(epoch: &AtomicU32, last_seen: &mut u32) -> bool {
        let current = epoch.load(Ordering::Relaxed);
        if current == *last_seen {
            return false;
        }
        *last_seen = current;
        true
    }
}

impl Default for PadConsoleLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_round_trip() {
        let link = PadConsoleLink::new();
        assert_eq!(link.connection(), PadConnection::Disconnected);
        assert!(!link.is_pad_ready());
        link.publish_connection(PadConnection::Ready);
        assert!(link.is_pad_ready());
        link.publish_connection(PadConnection::Booting);
        assert_eq!(link.connection(), PadConnection::Booting);
    }

    #[test]
    fn test_epoch_fires_once_per_publish() {
        let link = PadConsoleLink::new();
        let mut last_seen = link.load_reset_epoch();

        assert!(!link.consume_reset_request(&mut last_seen));
        link.publish_reset_request();
        assert!(link.consume_reset_request(&mut last_seen));
        assert!(!link.consume_reset_request(&mut last_seen));

        // Two publishes between consumes collapse into one edge; the count
        // is preserved in the epoch value itself.
        link.publish_reset_request();
        link.publish_reset_request();
        assert!(link.consume_reset_request(&mut last_seen));
        assert!(!link.consume_reset_request(&mut last_seen));
        assert_eq!(link.load_reset_epoch(), 3);
    }

    #[test]
    fn test_epochs_are_independent() {
        let link = PadConsoleLink::new();
        let mut origin_seen = link.load_origin_epoch();
        let mut recalibrate_seen = link.load_recalibrate_epoch();

        link.publish_origin_request();
        assert!(link.consume_origin_request(&mut origin_seen));
        assert!(!link.consume_recalibrate_request(&mut recalibrate_seen));

        link.publish_recalibrate_request();
        assert!(link.consume_recalibrate_request(&mut recalibrate_seen));
    }

    #[test]
    fn test_awaited_command() {
        let link = PadConsoleLink::new();
        assert_eq!(link.pad_await().load(), Command::Invalid);
        link.pad_await().store(Command::Status);
        assert_eq!(link.pad_await().load(), Command::Status);
        link.pad_await().clear();
        assert_eq!(link.pad_await().load(), Command::Invalid);
    }

    #[test]
    fn test_active_hub_switches_with_measure_mode() {
        let link = PadConsoleLink::new();
        assert!(core::ptr::eq(link.active_pad_hub(), link.real_pad_hub()));
        link.enable_measure();
        assert!(core::ptr::eq(link.active_pad_hub(), link.measure_pad_hub()));
        link.disable_measure();
        assert!(core::ptr::eq(link.active_pad_hub(), link.real_pad_hub()));
    }

    #[test]
    fn test_measure_epoch_tracks_toggles() {
        let link = PadConsoleLink::new();
        let mut seen = link.load_measure_epoch();
        link.enable_measure();
        assert!(link.consume_measure_epoch(&mut seen));
        link.disable_measure();
        assert!(link.consume_measure_epoch(&mut seen));
        assert!(!link.consume_measure_epoch(&mut seen));
    }
}
