//! RP2040 board layer for the joybus MITM bridge.
//!
//! Everything the platform-agnostic core leaves outside: the PIO open-drain
//! port driver with DMA, the shared-IRQ dispatch registry, and the board
//! bring-up used by the `bridge` and `measure` binaries.
//!
//! # Hardware configuration
//!
//! | Function            | GPIO | Description                     |
//! |---------------------|------|---------------------------------|
//! | Bus to the real pad | 15   | Half-duplex open-drain joybus   |
//! | Bus to the console  | 16   | Half-duplex open-drain joybus   |
//! | Boot button         | 26   | Hold to enter the USB bootloader|
//! | LED                 | 25   | On-board LED (power indicator)  |
//!
//! Each bus direction owns one PIO state machine (PIO0 for the pad side,
//! PIO1 for the console side), one DMA channel, and one pin.
//!
//! # Features
//!
//! - **`dev-panic`** (default): `panic-probe`, panic info over RTT
//! - **`prod-panic`**: `panic-reset`, silent reset

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Enable only one of `dev-panic` and `prod-panic`");

#[cfg(not(any(feature = "dev-panic", feature = "prod-panic")))]
compile_error!("Enable one of `dev-panic` and `prod-panic`");

pub mod dispatch;
pub mod pio_prog;
pub mod port;

pub use port::{JoybusPioPort, PortConfig, PioBlock};

/// The linker places this boot block at the start of the image; the ROM
/// bootloader needs it to get the program running.
#[link_section = ".boot2"]
#[used]
pub static BOOT2_FIRMWARE: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;
