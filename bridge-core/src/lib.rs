//! Platform-agnostic core of a man-in-the-middle joybus bridge.
//!
//! The bridge sits between a real controller ("pad") and its console on a
//! half-duplex open-drain bus. It impersonates a controller toward the
//! console while acting as a console toward the real pad, reshaping analog
//! stick samples in flight.
//!
//! # Architecture
//!
//! Two execution contexts share state without blocking:
//!
//! - The **main loop** drives [`PadClient`], a protocol state machine that
//!   walks the real pad through identify → origin → recalibrate → polling
//!   and keeps liveness watch.
//! - **Interrupt context** runs [`ConsoleClient`] on every inbound console
//!   frame: it classifies the request, snapshots the latest pad state from
//!   the hub, runs the transform [`Pipeline`], and encodes the reply within
//!   the inter-frame deadline.
//!
//! The two meet only through the [`PadConsoleLink`] carrier: latched
//! snapshots ([`Latch`]), monotonic epoch counters for console-initiated
//! side effects, and atomic mode/connection flags.
//!
//! # Modules
//!
//! - [`latch`]: single-writer double-buffered publication
//! - [`pipeline`] / [`stages`] / [`lut`]: the stick-geometry transform chain
//! - [`shared_pad`] / [`shared_console`] / [`hub`] / [`link`]: shared state
//! - [`pad_client`] / [`console_client`]: the two protocol endpoints
//! - [`port`]: traits toward the physical bit-shifter
//! - [`measure`]: generated test patterns and telemetry
//!
//! # Features
//!
//! - **`std`**: standard library support for host testing
//! - **`defmt`**: derive `defmt::Format` on public types

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod console_client;
pub mod hub;
pub mod latch;
pub mod link;
pub mod lut;
pub mod measure;
pub mod pad_client;
pub mod pipeline;
pub mod policy;
pub mod port;
pub mod shared_console;
pub mod shared_pad;
pub mod stages;
pub mod time;

pub use console_client::ConsoleClient;
pub use hub::{SharedPadHub, TxPair};
pub use latch::Latch;
pub use link::{PadConnection, PadConsoleLink};
pub use lut::StickLut;
pub use pad_client::{PadClient, PadClientState};
pub use pipeline::{Pipeline, PipelineSet, Stage};
pub use port::{FrameHandler, Port};
pub use shared_console::{ConsoleState, SharedConsole};
pub use shared_pad::{PadSnapshot, SharedPad};
pub use stages::OriginOffset;
