//! Shared-IRQ dispatch for the PIO interrupt lines.
//!
//! Multiple ports can share one physical PIO interrupt line, distinguished
//! by their state machine's interrupt flag bit. This registry routes each
//! pending flag to the owning port; registration and removal run under a
//! critical section so the tables never change under the dispatcher's feet.

use core::cell::RefCell;

use critical_section::Mutex;
use rp2040_hal::pac::{self, interrupt};

use crate::port::{JoybusPioPort, PioBlock};

/// Only interrupt flags 0..=3 are routable to the NVIC lines.
pub const MAX_IRQ_FLAGS: usize = 4;

type OwnerTable = [[Option<&'static JoybusPioPort>; MAX_IRQ_FLAGS]; 2];

static OWNERS: Mutex<RefCell<OwnerTable>> = Mutex::new(RefCell::new([[None; MAX_IRQ_FLAGS]; 2]));

/// Register `port` as the owner of `flag` on its PIO block and enable the
/// interrupt path down to the NVIC.
///
/// Panics if the slot is already taken; two ports claiming one flag is a
/// wiring error, not a runtime condition.
pub fn register(block: PioBlock, flag: usize, port: &'static JoybusPioPort) {
    assert!(flag < MAX_IRQ_FLAGS);

    critical_section::with(|cs| {
        let mut owners = OWNERS.borrow_ref_mut(cs);
        let slot = &mut owners[block as usize][flag];
        assert!(slot.is_none(), "PIO irq flag already owned");
        *slot = Some(port);
    });

    let pio = block.register_block();
    // Clear a stale flag, then route it to interrupt line 0.
    pio.irq().write(|w| unsafe { w.bits(1 << flag) });
    pio.sm_irq(0)
        .irq_inte()
        .modify(|r, w| unsafe { w.bits(r.bits() | (1 << (8 + flag))) });

    unsafe {
        match block {
            PioBlock::Pio0 => pac::NVIC::unmask(pac::Interrupt::PIO0_IRQ_0),
            PioBlock::Pio1 => pac::NVIC::unmask(pac::Interrupt::PIO1_IRQ_0),
        }
    }
}

/// Remove a registration and mute the flag's interrupt source.
pub fn unregister(block: PioBlock, flag: usize, port: &JoybusPioPort) {
    if flag >= MAX_IRQ_FLAGS {
        return;
    }

    critical_section::with(|cs| {
        let mut owners = OWNERS.borrow_ref_mut(cs);
        let slot = &mut owners[block as usize][flag];
        if let Some(owner) = slot {
            if core::ptr::eq(*owner, port) {
                *slot = None;
            }
        }
    });

    let pio = block.register_block();
    pio.sm_irq(0)
        .irq_inte()
        .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << (8 + flag))) });
    pio.irq().write(|w| unsafe { w.bits(1 << flag) });
}

/// Walk the pending owned flags of one PIO block, clearing each and calling
/// its owner.
fn dispatch(block: PioBlock) {
    let pio = block.register_block();
    let pending = pio.irq().read().bits();

    for flag in 0..MAX_IRQ_FLAGS {
        if pending & (1 << flag) == 0 {
            continue;
        }
        pio.irq().write(|w| unsafe { w.bits(1 << flag) });

        let owner = critical_section::with(|cs| OWNERS.borrow_ref(cs)[block as usize][flag]);
        if let Some(port) = owner {
            port.on_pio_irq();
        }
    }
}

#[interrupt]
fn PIO0_IRQ_0() {
    dispatch(PioBlock::Pio0);
}

#[interrupt]
fn PIO1_IRQ_0() {
    dispatch(PioBlock::Pio1);
}
