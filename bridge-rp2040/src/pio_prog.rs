//! The joybus PIO program.
//!
//! One program serves both bus directions; each direction runs its own
//! state machine on its own PIO block. The bus is open drain behind an
//! inverted output enable with the output register held at zero, so
//! `set pindirs, 0` drives the line low and `set pindirs, 1` releases it
//! to the pull-up.
//!
//! Timing is 4 MHz PIO clock, 5 cycles per 1.25 µs quarter-bit, ~5 µs per
//! bit. A transmitted bit is a low lead-in, the (inverted) data level, and
//! a trailing release; a received bit is sampled 2 µs after the falling
//! edge. End of frame is a line gap longer than a bit cell, which flushes
//! the stop-bit remainder and raises the state machine's interrupt flag.

use pio::Program;

/// Assembled program plus its entry points.
pub struct JoybusProgram {
    pub program: Program<{ pio::RP2040_MAX_PROGRAM_SIZE }>,
    pub rx_start: u8,
    pub tx_start: u8,
}

/// Assemble the joybus program.
#[must_use]
pub fn joybus_program() -> JoybusProgram {
    let assembled = pio_proc::pio_asm!(
        "; --- transmit: driver preloads (bit_count - 1), then DMA feeds bytes",
        "public tx_start:",
        "    pull block",
        "    out y, 32",
        "tx_bit:",
        "    out x, 1",
        "    set pindirs, 0 [4]      ; low lead-in, 1.25 us",
        "    jmp !x tx_zero",
        "    set pindirs, 1 [8]      ; release high for a one, 2.5 us",
        "    jmp tx_tail",
        "tx_zero:",
        "    set pindirs, 0 [8]      ; keep low for a zero",
        "tx_tail:",
        "    set pindirs, 1 [3]      ; trailing release, 1.25 us",
        "    jmp y-- tx_bit",
        "    set pindirs, 0 [4]      ; stop bit lead",
        "    set pindirs, 1",
        "    irq 0 rel               ; transmit complete",
        "; --- receive: sample mid-bit, detect the inter-frame gap",
        "public rx_start:",
        "    wait 1 pin 0            ; line idle before the first edge",
        "rx_bit:",
        "    wait 0 pin 0 [7]        ; falling edge, then 2 us to mid-bit",
        "    in pins, 1",
        "    wait 1 pin 0            ; line released again",
        "    set x, 15",
        "rx_gap:",
        "    jmp pin rx_gap_tick     ; still high: count the gap",
        "    jmp rx_bit              ; low again: next bit of the frame",
        "rx_gap_tick:",
        "    jmp x-- rx_gap [1]",
        "    push                    ; gap exceeded: flush the stop remainder",
        "    irq 0 rel               ; receive complete",
        "    jmp rx_start",
    );

    JoybusProgram {
        program: assembled.program,
        rx_start: assembled.public_defines.rx_start as u8,
        tx_start: assembled.public_defines.tx_start as u8,
    }
}
