//! Wire-level GameCube controller (joybus) protocol types and codecs.
//!
//! This crate captures everything that crosses the joybus wire, without any
//! platform dependencies. It can be used both in embedded `no_std`
//! environments and on host for testing.
//!
//! # Overview
//!
//! - [`types`]: Pad state model ([`PadState`], [`Buttons`], [`PadIdentity`])
//! - [`command`]: Command bytes, request frames, expected reply sizes
//! - [`reply`]: Owned fixed-capacity reply frames ([`Reply`])
//! - [`status_wire`]: Status/Origin/Recalibrate frame codecs
//! - [`identity_wire`]: Id/Reset frame codec
//! - [`bits`]: Little-endian and nibble helpers shared by the codecs
//!
//! # Protocol
//!
//! The console drives a request/reply protocol over a half-duplex open-drain
//! bus. Requests are 1 or 3 bytes; replies are 3, 8, or 10 bytes depending on
//! the command:
//!
//! | Command       | Request            | Reply |
//! |---------------|--------------------|-------|
//! | `Id` (0x00)   | `{0x00}`           | 3     |
//! | `Status`      | `{0x40, poll, rumble}` | 8 |
//! | `Origin`      | `{0x41}`           | 10    |
//! | `Recalibrate` | `{0x42, 0x00, 0x00}` | 10  |
//! | `Reset`       | `{0xFF}`           | 3     |
//!
//! Status replies carry a 16-bit little-endian status word (buttons plus
//! report flags) followed by six analog bytes whose layout is selected by the
//! polling mode the console requested. See [`status_wire`] for the per-mode
//! layouts and [`identity_wire`] for the capability bit map.
//!
//! # Features
//!
//! - **`defmt`**: derive `defmt::Format` on public types for embedded logging

#![no_std]

pub mod bits;
pub mod command;
pub mod identity_wire;
pub mod reply;
pub mod status_wire;
pub mod types;

pub use command::{
    Command, Request, ID_REPLY_LEN, MAX_REPLY_LEN, ORIGIN_REPLY_LEN, RECALIBRATE_REPLY_LEN,
    RESET_REPLY_LEN, STATUS_REPLY_LEN, STATUS_REQUEST_LEN,
};
pub use reply::Reply;
pub use types::{
    AnalogAxes, Buttons, PadIdentity, PadIdentityCapabilities, PadIdentityRuntime, PadInput,
    PadReport, PadState, PollMode, RumbleMode,
};
