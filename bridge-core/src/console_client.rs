//! The console-facing responder, run entirely in interrupt context.

use joybus_proto::identity_wire::{encode_identity, encode_reset};
use joybus_proto::status_wire::{encode_origin, encode_recalibrate, encode_status};
use joybus_proto::{Command, Reply};

use crate::link::PadConsoleLink;
use crate::port::FrameHandler;

/// Answers console requests from the latest pad snapshot.
///
/// Every inbound frame updates the console-state tracking. A reply is only
/// produced while a real pad is Ready behind the bridge; until then the
/// console sees silence and retries, exactly as with an unresponsive
/// controller. All work is bounded, non-allocating, and lock-free, as the
/// body runs between two bus frames.
pub struct ConsoleClient<'a> {
    link: &'a PadConsoleLink,
}

impl<'a> ConsoleClient<'a> {
    #[must_use]
    pub const fn new(link: &'a PadConsoleLink) -> Self {
        Self { link }
    }

    /// Handle one console request frame; returns the reply length.
    pub fn respond(&self, rx: &[u8], tx: &mut [u8]) -> usize {
        let Some(&first) = rx.first() else {
            return 0;
        };

        self.link.shared_console().on_request(rx);

        if !self.link.is_pad_ready() {
            return 0;
        }

        let hub = self.link.active_pad_hub();
        let snapshot = hub.snapshot();
        let console = self.link.shared_console().load();
        let pipelines = self.link.pipelines();

        let (raw, modified): (Reply, Reply) = match Command::from_byte(first) {
            Command::Status => {
                let raw = encode_status(&snapshot.status, console.poll_mode);
                let mut state = snapshot.status;
                pipelines.status.apply(&mut state);
                (raw, encode_status(&state, console.poll_mode))
            }
            Command::Origin => {
                // Ask the main loop to refresh the pad's origin too.
                self.link.publish_origin_request();

                let raw = encode_origin(&snapshot.origin);
                let mut state = snapshot.origin;
                pipelines.origin.apply(&mut state);
                (raw, encode_origin(&state))
            }
            Command::Recalibrate => {
                self.link.publish_recalibrate_request();

                let raw = encode_recalibrate(&snapshot.origin);
                let mut state = snapshot.origin;
                pipelines.recalibrate.apply(&mut state);
                (raw, encode_recalibrate(&state))
            }
            Command::Id => {
                // The pad is polled in the pinned mode; the console must
                // still see the modes it asked for.
                let mut identity = snapshot.identity;
                identity.runtime.poll_mode = console.poll_mode;
                identity.runtime.rumble_mode = console.rumble_mode;
                let raw = encode_identity(&identity);
                (raw, raw)
            }
            Command::Reset => {
                self.link.publish_reset_request();

                let mut identity = snapshot.identity;
                identity.runtime.poll_mode = console.poll_mode;
                identity.runtime.rumble_mode = console.rumble_mode;
                let raw = encode_reset(&identity);
                (raw, raw)
            }
            Command::Invalid => return 0,
        };

        let bytes = modified.as_bytes();
        if bytes.is_empty() || tx.len() < bytes.len() {
            return 0;
        }
        tx[..bytes.len()].copy_from_slice(bytes);

        hub.publish_tx(snapshot.publish_count, raw, modified);
        bytes.len()
    }
}

impl FrameHandler for ConsoleClient<'_> {
    fn on_frame(&self, rx: &[u8], tx: &mut [u8]) -> usize {
        self.respond(rx, tx)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::link::PadConnection;
    use crate::pipeline::Stage;
    use joybus_proto::status_wire::decode_status;
    use joybus_proto::{PadState, PollMode, RumbleMode, STATUS_REPLY_LEN};

    fn ready_link() -> PadConsoleLink {
        let link = PadConsoleLink::new();
        link.publish_connection(PadConnection::Ready);
        // Give the hub a decoded status to serve.
        let mut state = PadState::neutral();
        state.input.analog.stick_x = 0xC0;
        state.input.analog.stick_y = 0x40;
        let reply = encode_status(&state, PollMode::Mode3);
        link.real_pad_hub()
            .on_pad_response(Command::Status, reply.as_bytes());
        link
    }

    #[test]
    fn test_empty_request_ignored() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];
        assert_eq!(client.respond(&[], &mut tx), 0);
    }

    #[test]
    fn test_no_reply_until_ready() {
        let link = PadConsoleLink::new();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];
        assert_eq!(client.respond(&[0x40, 0x03, 0x00], &mut tx), 0);
        // The console state still gets tracked.
        assert_eq!(link.shared_console().load().poll_mode, PollMode::Mode3);
    }

    #[test]
    fn test_status_reply_follows_console_modes() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];

        let len = client.respond(&[0x40, 0x03, 0x01], &mut tx);
        assert_eq!(len, STATUS_REPLY_LEN);

        let state = link.shared_console().load();
        assert_eq!(state.poll_mode, PollMode::Mode3);
        assert_eq!(state.rumble_mode, RumbleMode::On);

        let rx: &[u8; STATUS_REPLY_LEN] = tx[..len].try_into().unwrap();
        let decoded = decode_status(rx, PollMode::Mode3);
        assert_eq!(decoded.input.analog.stick_x, 0xC0);
    }

    #[test]
    fn test_status_pipeline_applies_to_modified_only() {
        let link = ready_link();
        // Safe to leak in tests; the link setup phase needs &mut.
        let link: &'static mut PadConsoleLink = std::boxed::Box::leak(std::boxed::Box::new(link));
        link.pipelines_mut().status.add_stage(Stage::FixNeutral);
        let link: &PadConsoleLink = link;

        let client = ConsoleClient::new(link);
        let mut tx = [0u8; 16];
        let len = client.respond(&[0x40, 0x03, 0x00], &mut tx);
        assert_eq!(len, STATUS_REPLY_LEN);

        // The wire reply is neutralized.
        let rx: &[u8; STATUS_REPLY_LEN] = tx[..len].try_into().unwrap();
        let decoded = decode_status(rx, PollMode::Mode3);
        assert_eq!(decoded.input.analog.stick_x, 0x80);

        // The published pair keeps the raw value alongside.
        let pair = link.real_pad_hub().last_tx();
        assert_eq!(pair.raw.as_bytes()[2], 0xC0);
        assert_eq!(pair.modified.as_bytes()[2], 0x80);
    }

    #[test]
    fn test_origin_publishes_epoch() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];
        let before = link.load_origin_epoch();
        let len = client.respond(&[0x41], &mut tx);
        assert_eq!(len, 10);
        assert_eq!(link.load_origin_epoch(), before + 1);
    }

    #[test]
    fn test_reset_publishes_epoch_and_replies_identity() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];
        let before = link.load_reset_epoch();
        let len = client.respond(&[0xFF], &mut tx);
        assert_eq!(len, 3);
        assert_eq!(link.load_reset_epoch(), before + 1);
    }

    #[test]
    fn test_id_overrides_runtime_modes() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];

        // Console asks for Mode1 + rumble on via a Status request first.
        client.respond(&[0x40, 0x01, 0x01], &mut tx);
        let len = client.respond(&[0x00], &mut tx);
        assert_eq!(len, 3);
        // Byte 2 bits [2:0] carry the poll mode, bits [4:3] the rumble.
        assert_eq!(tx[2] & 0x07, 0x01);
        assert_eq!((tx[2] & 0x18) >> 3, 0x01);
    }

    #[test]
    fn test_unknown_command_silent() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 16];
        assert_eq!(client.respond(&[0x7E], &mut tx), 0);
    }

    #[test]
    fn test_tiny_tx_buffer_fails_silently() {
        let link = ready_link();
        let client = ConsoleClient::new(&link);
        let mut tx = [0u8; 4];
        assert_eq!(client.respond(&[0x40, 0x03, 0x00], &mut tx), 0);
    }
}
