//! Bridge-wide policy constants.

use joybus_proto::PollMode;

/// Polling mode used toward the real pad, always, regardless of what the
/// console asked for.
///
/// Mode3 keeps full 8-bit resolution on the stick and trigger axes at the
/// cost of the A/B analog fields, which real hardware leaves unused. The
/// console-requested mode is still honored on the reply side.
pub const PAD_POLL_MODE: PollMode = PollMode::Mode3;
