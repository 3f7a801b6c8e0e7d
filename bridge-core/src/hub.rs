//! The pad hub: received pad state plus the last reply pair sent onward.

use joybus_proto::{Command, Reply};

use crate::latch::{Latch, ShadowCell};
use crate::shared_pad::{PadSnapshot, SharedPad};

/// The last reply transmitted to the console, before and after the
/// transform pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxPair {
    /// Generation of this pair; bumps on every transmitted reply.
    pub publish_count: u32,
    /// `publish_count` of the pad snapshot the pair was derived from.
    pub raw_publish_count: u32,
    pub raw: Reply,
    pub modified: Reply,
}

impl TxPair {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            publish_count: 0,
            raw_publish_count: 0,
            raw: Reply::empty(),
            modified: Reply::empty(),
        }
    }
}

impl Default for TxPair {
    fn default() -> Self {
        Self::new()
    }
}

/// Composes the receive side ([`SharedPad`]) with the transmit-pair latch.
///
/// The receive side is written by the pad-facing receive context; the
/// transmit pair by the console-facing one. Both are read from the main
/// loop.
pub struct SharedPadHub {
    rx: SharedPad,
    tx: Latch<TxPair>,
    tx_publish_count: ShadowCell<u32>,
}

impl SharedPadHub {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx: SharedPad::new(),
            tx: Latch::new(TxPair::new()),
            tx_publish_count: ShadowCell::new(0),
        }
    }

    /// Record a pad reply. Pad-side receive context only.
    pub fn on_pad_response(&self, command: Command, rx: &[u8]) {
        self.rx.on_response(command, rx);
    }

    /// Latest decoded pad snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PadSnapshot {
        self.rx.load()
    }

    /// Record the reply pair just sent to the console. Console-side
    /// context only.
    pub fn publish_tx(&self, raw_publish_count: u32, raw: Reply, modified: Reply) {
        // SAFETY: sole writer is the console-side context.
        let count = unsafe { self.tx_publish_count.get_mut() };
        *count = count.wrapping_add(1);
        self.tx.publish(TxPair {
            publish_count: *count,
            raw_publish_count,
            raw,
            modified,
        });
    }

    /// Latest transmitted reply pair.
    #[must_use]
    pub fn last_tx(&self) -> TxPair {
        self.tx.load()
    }

    /// Copy out the transmit pair if it changed since `last_publish_count`,
    /// updating the caller's bookmark.
    pub fn consume_tx_if_new(&self, last_publish_count: &mut u32, out: &mut TxPair) -> bool {
        let current = self.tx.load();
        if current.publish_count != *last_publish_count {
            *last_publish_count = current.publish_count;
            *out = current;
            true
        } else {
            false
        }
    }
}

impl Default for SharedPadHub {
    fn default() -> Self {
        Self::new()
    }
}
