//! Seams toward the physical bit-shifter.
//!
//! The physical layer delivers complete inbound frames and accepts outbound
//! ones; everything else about it (PIO programs, DMA, pins) stays outside
//! this crate.

/// Outbound side of a bus port.
pub trait Port {
    /// Start transmitting a frame immediately.
    ///
    /// Returns `false` without transmitting when a transmission is already
    /// in flight or the frame does not fit; the caller decides whether to
    /// retry.
    fn send_now(&self, frame: &[u8]) -> bool;
}

impl<T: Port + ?Sized> Port for &T {
    fn send_now(&self, frame: &[u8]) -> bool {
        (**self).send_now(frame)
    }
}

/// Inbound side of a bus port.
///
/// Invoked from the receive-complete interrupt with the received frame and
/// a transmit buffer. A non-zero return value asks the port to transmit
/// that many bytes of `tx` as the reply; zero means silence.
pub trait FrameHandler: Sync {
    fn on_frame(&self, rx: &[u8], tx: &mut [u8]) -> usize;
}
