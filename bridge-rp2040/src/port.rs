//! The PIO open-drain joybus port.
//!
//! Each port owns one PIO state machine, one DMA channel, and one pin.
//! Reception runs continuously: DMA drains the RX FIFO into a work buffer
//! until the state machine flags end-of-frame, at which point the frame is
//! handed to the [`FrameHandler`] and its reply, if any, is transmitted
//! back before reception restarts. The main loop can also push a frame of
//! its own with [`send_now`](JoybusPioPort::send_now).
//!
//! The driver works at register level below the HAL's typed PIO/DMA
//! wrappers because the receive→reply turnaround runs inside the interrupt
//! and re-arms DMA dynamically, which the ownership-based transfer API
//! does not express.

use core::cell::UnsafeCell;

use bridge_core::FrameHandler;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use rp2040_hal::pac;

use crate::dispatch;
use crate::pio_prog::JoybusProgram;

/// Longest frame on the bus.
pub const MAX_FRAME_BYTES: usize = 16;
/// RX keeps one extra byte for the flushed stop-bit remainder.
pub const RX_BUFFER_BYTES: usize = MAX_FRAME_BYTES + 1;
/// TX sends data bytes only; the stop bit comes from the PIO program.
pub const TX_BUFFER_BYTES: usize = MAX_FRAME_BYTES;

/// `set pins, 0` — park the output register at the driven-low level.
const INSTR_SET_PINS_0: u32 = 0xE000;
/// `set pindirs, 1` — release the line (output enable is inverted).
const INSTR_SET_PINDIRS_1: u32 = 0xE081;

/// Which PIO block a port lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PioBlock {
    Pio0 = 0,
    Pio1 = 1,
}

impl PioBlock {
    pub(crate) fn register_block(self) -> &'static pac::pio0::RegisterBlock {
        // SAFETY: shared register block; each port only touches its own
        // state machine's registers plus the W1C interrupt flags.
        match self {
            Self::Pio0 => unsafe { &*pac::PIO0::ptr() },
            Self::Pio1 => unsafe { &*pac::PIO1::ptr() },
        }
    }
}

/// Static description of the resources a port claims.
#[derive(Clone, Copy, Debug)]
pub struct PortConfig {
    pub block: PioBlock,
    /// State machine index, 0..=3. Doubles as the interrupt flag index
    /// (the program raises `irq 0 rel`).
    pub sm: usize,
    pub pin: u8,
    /// DMA channel index, exclusively owned by this port.
    pub dma_channel: usize,
    /// Integer divider from `clk_sys` down to the 4 MHz PIO clock.
    pub clock_divider: u16,
}

/// A half-duplex joybus endpoint.
///
/// Construct with [`new`](Self::new), pin into a static, then [`activate`]
/// (Self::activate) to register the interrupt route and start receiving.
pub struct JoybusPioPort {
    config: PortConfig,
    rx_start: u8,
    tx_start: u8,
    handler: &'static dyn FrameHandler,

    tx_busy: AtomicBool,
    rx_ready: AtomicBool,
    rx_bad: AtomicBool,
    rx_length: AtomicU32,

    // Owned by the port's interrupt context (and `send_now` under a
    // critical section for the TX buffer).
    rx_work: UnsafeCell<[u8; RX_BUFFER_BYTES]>,
    rx_frame: UnsafeCell<[u8; RX_BUFFER_BYTES]>,
    tx_frame: UnsafeCell<[u8; TX_BUFFER_BYTES]>,
}

// The UnsafeCell buffers are only touched from the port's own interrupt
// context, or under a critical section that excludes it.
unsafe impl Sync for JoybusPioPort {}

impl JoybusPioPort {
    /// Claim the configured resources and load the program.
    ///
    /// The caller guarantees exclusive use of the state machine, DMA
    /// channel, and pin named in `config`. The pin never drives low before
    /// the state machine is ready: its output enable is forced off until
    /// the released direction is latched.
    pub fn new(
        config: PortConfig,
        program: &JoybusProgram,
        handler: &'static dyn FrameHandler,
        resets: &mut pac::RESETS,
    ) -> Self {
        // Release PIO and DMA from reset before touching them.
        resets.reset().modify(|_, w| {
            w.pio0().clear_bit();
            w.pio1().clear_bit();
            w.dma().clear_bit();
            w.io_bank0().clear_bit();
            w.pads_bank0().clear_bit()
        });
        while resets.reset_done().read().pio0().bit_is_clear()
            || resets.reset_done().read().pio1().bit_is_clear()
            || resets.reset_done().read().dma().bit_is_clear()
        {}

        let port = Self {
            config,
            rx_start: program.rx_start,
            tx_start: program.tx_start,
            handler,
            tx_busy: AtomicBool::new(false),
            rx_ready: AtomicBool::new(false),
            rx_bad: AtomicBool::new(false),
            rx_length: AtomicU32::new(0),
            rx_work: UnsafeCell::new([0; RX_BUFFER_BYTES]),
            rx_frame: UnsafeCell::new([0; RX_BUFFER_BYTES]),
            tx_frame: UnsafeCell::new([0; TX_BUFFER_BYTES]),
        };

        port.load_program(program);
        port.configure_state_machine();
        port.configure_pin();
        port
    }

    /// Register the interrupt route, enable the state machine, and start
    /// receiving.
    pub fn activate(&'static self) {
        dispatch::register(self.config.block, self.config.sm, self);

        let pio = self.config.block.register_block();
        pio.ctrl().modify(|r, w| unsafe {
            w.sm_enable().bits(r.sm_enable().bits() | (1 << self.config.sm))
        });
        self.start_receive();
    }

    fn load_program(&self, program: &JoybusProgram) {
        let pio = self.config.block.register_block();
        // The block runs only this program, loaded at offset zero; both
        // entry-point offsets are absolute.
        for (index, instruction) in program.program.code.iter().enumerate() {
            pio.instr_mem(index)
                .write(|w| unsafe { w.bits(*instruction as u32) });
        }
    }

    fn configure_state_machine(&self) {
        let pio = self.config.block.register_block();
        let sm = pio.sm(self.config.sm);

        sm.sm_clkdiv()
            .write(|w| unsafe { w.int().bits(self.config.clock_divider).frac().bits(0) });

        // MSB-first with per-byte auto push/pull: shift left both ways.
        // 8-bit DMA writes reach the FIFO on every byte lane, so the OSR's
        // top byte is the data byte either way.
        sm.sm_shiftctrl().write(|w| unsafe {
            w.autopull().set_bit();
            w.pull_thresh().bits(8);
            w.autopush().set_bit();
            w.push_thresh().bits(8);
            w.out_shiftdir().clear_bit();
            w.in_shiftdir().clear_bit()
        });

        sm.sm_pinctrl().write(|w| unsafe {
            w.set_base().bits(self.config.pin);
            w.set_count().bits(1);
            w.in_base().bits(self.config.pin)
        });

        sm.sm_execctrl().write(|w| unsafe {
            w.jmp_pin().bits(self.config.pin);
            w.wrap_bottom().bits(0);
            w.wrap_top().bits(31)
        });

        // Park the output level low and the direction released, then jump
        // to the receive entry.
        sm.sm_instr().write(|w| unsafe { w.bits(INSTR_SET_PINS_0) });
        sm.sm_instr().write(|w| unsafe { w.bits(INSTR_SET_PINDIRS_1) });
        sm.sm_instr()
            .write(|w| unsafe { w.bits(self.rx_start as u32) });
    }

    fn configure_pin(&self) {
        let pin = self.config.pin as usize;
        // SAFETY: the caller handed this pin to the port exclusively.
        let io = unsafe { &*pac::IO_BANK0::ptr() };
        let pads = unsafe { &*pac::PADS_BANK0::ptr() };

        pads.gpio(pin).write(|w| {
            w.ie().set_bit();
            w.schmitt().set_bit();
            w.pue().clear_bit();
            w.pde().clear_bit();
            w.od().clear_bit()
        });

        // Route to the PIO with the output enable forced off while the
        // direction settles, then flip to inverted OE for open drain.
        io.gpio(pin).gpio_ctrl().write(|w| {
            match self.config.block {
                PioBlock::Pio0 => w.funcsel().pio0(),
                PioBlock::Pio1 => w.funcsel().pio1(),
            };
            w.oeover().disable()
        });
        io.gpio(pin).gpio_ctrl().modify(|_, w| w.oeover().invert());
    }

    fn dma(&self) -> &'static pac::dma::RegisterBlock {
        // SAFETY: each port only programs its own exclusively-owned channel.
        unsafe { &*pac::DMA::ptr() }
    }

    fn dreq_rx(&self) -> u8 {
        (self.config.block as u8) * 8 + self.config.sm as u8 + 4
    }

    fn dreq_tx(&self) -> u8 {
        (self.config.block as u8) * 8 + self.config.sm as u8
    }

    fn abort_dma(&self) {
        let dma = self.dma();
        dma.chan_abort()
            .write(|w| unsafe { w.bits(1 << self.config.dma_channel) });
        while dma.chan_abort().read().bits() != 0 {}
    }

    /// Re-arm reception into the work buffer.
    fn start_receive(&self) {
        let pio = self.config.block.register_block();
        let dma = self.dma();
        let channel = dma.ch(self.config.dma_channel);

        self.abort_dma();

        channel.ch_read_addr().write(|w| unsafe {
            w.bits(pio.rxf(self.config.sm).as_ptr() as u32)
        });
        channel
            .ch_write_addr()
            .write(|w| unsafe { w.bits(self.rx_work.get() as u32) });
        channel
            .ch_trans_count()
            .write(|w| unsafe { w.bits(RX_BUFFER_BYTES as u32) });
        channel.ch_ctrl_trig().write(|w| unsafe {
            w.data_size().size_byte();
            w.incr_read().clear_bit();
            w.incr_write().set_bit();
            w.treq_sel().bits(self.dreq_rx());
            w.chain_to().bits(self.config.dma_channel as u8);
            w.en().set_bit()
        });
    }

    /// Harvest the received frame after the end-of-frame interrupt.
    fn finish_receive_from_irq(&self) {
        let dma = self.dma();
        let remaining = dma.ch(self.config.dma_channel).ch_trans_count().read().bits();
        let received = RX_BUFFER_BYTES as u32 - remaining;

        self.abort_dma();

        self.rx_length.store(0, Ordering::Relaxed);
        self.rx_ready.store(false, Ordering::Relaxed);
        self.rx_bad.store(false, Ordering::Relaxed);

        // A real frame is at least one data byte plus the stop remainder.
        if received < 2 {
            self.rx_bad.store(true, Ordering::Relaxed);
            return;
        }

        let frame_length = (received - 1) as usize;
        // SAFETY: interrupt context owns both buffers; DMA into rx_work is
        // stopped.
        unsafe {
            let work = &*self.rx_work.get();
            let frame = &mut *self.rx_frame.get();
            frame[..frame_length].copy_from_slice(&work[..frame_length]);
        }
        self.rx_length.store(frame_length as u32, Ordering::Relaxed);
        self.rx_ready.store(true, Ordering::Relaxed);
    }

    /// Stream `nbytes` from the TX buffer out of the wire.
    fn start_transmit_from_irq(&self, nbytes: usize) {
        let pio = self.config.block.register_block();
        let dma = self.dma();
        let channel = dma.ch(self.config.dma_channel);

        // The program's bit loop runs count+1 times.
        let bits = (nbytes * 8 - 1) as u32;
        pio.txf(self.config.sm).write(|w| unsafe { w.bits(bits) });

        channel
            .ch_read_addr()
            .write(|w| unsafe { w.bits(self.tx_frame.get() as u32) });
        channel.ch_write_addr().write(|w| unsafe {
            w.bits(pio.txf(self.config.sm).as_ptr() as u32)
        });
        channel
            .ch_trans_count()
            .write(|w| unsafe { w.bits(nbytes as u32) });
        channel.ch_ctrl_trig().write(|w| unsafe {
            w.data_size().size_byte();
            w.incr_read().set_bit();
            w.incr_write().clear_bit();
            w.treq_sel().bits(self.dreq_tx());
            w.chain_to().bits(self.config.dma_channel as u8);
            w.en().set_bit()
        });

        // Force the state machine onto the transmit entry; it pulls the
        // bit count first, then the DMA-fed bytes.
        pio.sm(self.config.sm)
            .sm_instr()
            .write(|w| unsafe { w.bits(self.tx_start as u32) });
    }

    /// One interrupt flag from this port's state machine.
    pub(crate) fn on_pio_irq(&self) {
        // A pending flag while transmitting is the transmit-complete
        // notification.
        if self.tx_busy.load(Ordering::Acquire) {
            self.tx_busy.store(false, Ordering::Release);
            self.start_receive();
            return;
        }

        self.finish_receive_from_irq();

        let mut tx_length = 0;
        if self.rx_ready.load(Ordering::Relaxed) {
            let length = self.rx_length.load(Ordering::Relaxed) as usize;
            if length > 0 {
                // SAFETY: interrupt context owns both frame buffers.
                let (rx, tx) = unsafe { (&*self.rx_frame.get(), &mut *self.tx_frame.get()) };
                tx_length = self.handler.on_frame(&rx[..length], tx).min(TX_BUFFER_BYTES);
            }
        }

        if tx_length > 0 {
            self.tx_busy.store(true, Ordering::Release);
            self.start_transmit_from_irq(tx_length);
        } else {
            self.start_receive();
        }
    }
}

impl bridge_core::Port for JoybusPioPort {
    /// Transmit a frame from the main loop.
    ///
    /// Fails without side effects when a transmission is already running.
    /// Interrupts are held off while the buffer is primed so the port's
    /// own interrupt cannot observe a half-written frame.
    fn send_now(&self, frame: &[u8]) -> bool {
        if frame.is_empty() || frame.len() > TX_BUFFER_BYTES {
            return false;
        }

        critical_section::with(|_cs| {
            if self.tx_busy.load(Ordering::Acquire) {
                return false;
            }
            // SAFETY: inside the critical section the interrupt path is
            // excluded from the TX buffer.
            unsafe {
                (*self.tx_frame.get())[..frame.len()].copy_from_slice(frame);
            }
            self.abort_dma();
            self.tx_busy.store(true, Ordering::Release);
            self.start_transmit_from_irq(frame.len());
            true
        })
    }
}

impl Drop for JoybusPioPort {
    fn drop(&mut self) {
        dispatch::unregister(self.config.block, self.config.sm, self);

        let pio = self.config.block.register_block();
        pio.ctrl().modify(|r, w| unsafe {
            w.sm_enable().bits(r.sm_enable().bits() & !(1 << self.config.sm))
        });
        self.abort_dma();

        // Back to a high-impedance pin.
        let io = unsafe { &*pac::IO_BANK0::ptr() };
        io.gpio(self.config.pin as usize)
            .gpio_ctrl()
            .write(|w| w.funcsel().null().oeover().disable());
    }
}
