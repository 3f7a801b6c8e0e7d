//! The bridge firmware: real pad in, corrected pad out.
//!
//! Boots in origin-fix mode, where the console is shown a perfectly
//! centered stick while it latches its origin. Holding L+R+DpadUp+Start+Y
//! toggles the correction pipeline (origin-normalize, octagon clamp, 4/5
//! scale, inverse LUT); the rumble motor pulses once when correction turns
//! on and twice when it turns off.

#![no_std]
#![no_main]

use bridge_core::stages::OriginOffset;
use bridge_core::{
    ConsoleClient, FrameHandler, PadClient, PadConsoleLink, Stage, StickLut, TxPair,
};
use bridge_rp2040::pio_prog::joybus_program;
use bridge_rp2040::{JoybusPioPort, PioBlock, PortConfig};
use defmt::info;
use defmt_rtt as _;
use embedded_hal::digital::{InputPin, OutputPin};
use joybus_proto::{Buttons, Command, RumbleMode};
use rp2040_hal::{self as hal, clocks::init_clocks_and_plls, pac, Sio, Watchdog};
use static_cell::{ConstStaticCell, StaticCell};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

const XTAL_FREQ_HZ: u32 = 12_000_000;

/// clk_sys 125 MHz down to the 4 MHz joybus PIO clock.
const PIO_CLOCK_DIVIDER: u16 = 31;

const PIN_TO_REAL_PAD: u8 = 15;
const PIN_TO_REAL_CONSOLE: u8 = 16;

/// Status pipeline layout: stage 0 pins neutral during origin fix, stages
/// 1..=4 are the correction chain.
const STAGE_FIX_NEUTRAL: usize = 0;
const CORRECTION_STAGES: core::ops::RangeInclusive<usize> = 1..=4;

static LINK: StaticCell<PadConsoleLink> = StaticCell::new();
static ORIGIN_OFFSET: OriginOffset = OriginOffset::new();
static FORWARD_LUT: ConstStaticCell<StickLut> = ConstStaticCell::new(StickLut::ZEROED);
static INVERSE_LUT: ConstStaticCell<StickLut> = ConstStaticCell::new(StickLut::ZEROED);
static PAD_RESPONDER: StaticCell<PadResponder> = StaticCell::new();
static CONSOLE_CLIENT: StaticCell<ConsoleClient<'static>> = StaticCell::new();
static PAD_PORT: StaticCell<JoybusPioPort> = StaticCell::new();
static CONSOLE_PORT: StaticCell<JoybusPioPort> = StaticCell::new();

/// Pad-side receive path: attribute the reply to the awaited command and
/// feed the hub. Never replies on the pad bus.
struct PadResponder {
    link: &'static PadConsoleLink,
}

impl FrameHandler for PadResponder {
    fn on_frame(&self, rx: &[u8], _tx: &mut [u8]) -> usize {
        let awaited = self.link.pad_await().load();
        if awaited.is_valid() {
            self.link.real_pad_hub().on_pad_response(awaited, rx);
        }
        0
    }
}

/// Rumble pulse playback for mode-change acknowledgment.
struct RumblePulses {
    remaining: u8,
    motor_on: bool,
    phase_start_us: u32,
}

impl RumblePulses {
    const ON_US: u32 = 150_000;
    const OFF_US: u32 = 100_000;

    const fn new() -> Self {
        Self {
            remaining: 0,
            motor_on: false,
            phase_start_us: 0,
        }
    }

    fn start(&mut self, pulses: u8, now_us: u32) {
        self.remaining = pulses;
        self.motor_on = true;
        self.phase_start_us = now_us;
    }

    fn tick(&mut self, now_us: u32) -> RumbleMode {
        if !self.motor_on && self.remaining == 0 {
            return RumbleMode::Off;
        }
        let elapsed = now_us.wrapping_sub(self.phase_start_us);
        if self.motor_on {
            if elapsed >= Self::ON_US {
                self.motor_on = false;
                self.phase_start_us = now_us;
                self.remaining = self.remaining.saturating_sub(1);
            }
            return RumbleMode::On;
        }
        if elapsed >= Self::OFF_US {
            self.motor_on = true;
            self.phase_start_us = now_us;
        }
        RumbleMode::Off
    }
}

#[derive(Clone, Copy, PartialEq)]
enum BridgeMode {
    OriginFix,
    Correction,
}

#[hal::entry]
fn main() -> ! {
    info!("bridge firmware starting");

    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    let clocks = init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Power indicator on, boot button armed.
    let mut led = pins.gpio25.into_push_pull_output();
    let _ = led.set_high();
    let mut boot_button = pins.gpio26.into_pull_up_input();

    // Build the inverse LUT from the forward model once at startup.
    let forward = FORWARD_LUT.take();
    forward.fill_forward_model();
    let inverse = INVERSE_LUT.take();
    inverse.fill_inverse_of(forward);
    let inverse: &'static StickLut = inverse;

    // The link and its pipelines; configuration happens before any
    // interrupt can observe them.
    let link = LINK.init(PadConsoleLink::new());
    {
        let pipelines = link.pipelines_mut();
        pipelines.origin.add_stage(Stage::FixNeutral);
        pipelines.recalibrate.add_stage(Stage::FixNeutral);

        pipelines.status.add_stage(Stage::FixNeutral);
        pipelines.status.add_stage(Stage::OriginNormalize(&ORIGIN_OFFSET));
        pipelines.status.add_stage(Stage::OctagonClamp);
        pipelines.status.add_stage(Stage::LinearScale);
        pipelines.status.add_stage(Stage::InverseLut(inverse));
        for index in CORRECTION_STAGES {
            pipelines.status.set_enabled(index, false);
        }
    }
    let link: &'static PadConsoleLink = link;

    // The two bus endpoints.
    let program = joybus_program();
    let pad_responder = PAD_RESPONDER.init(PadResponder { link });
    let pad_port: &'static JoybusPioPort = PAD_PORT.init(JoybusPioPort::new(
        PortConfig {
            block: PioBlock::Pio0,
            sm: 0,
            pin: PIN_TO_REAL_PAD,
            dma_channel: 0,
            clock_divider: PIO_CLOCK_DIVIDER,
        },
        &program,
        pad_responder,
        &mut pac.RESETS,
    ));

    let console_client = CONSOLE_CLIENT.init(ConsoleClient::new(link));
    let console_port: &'static JoybusPioPort = CONSOLE_PORT.init(JoybusPioPort::new(
        PortConfig {
            block: PioBlock::Pio1,
            sm: 0,
            pin: PIN_TO_REAL_CONSOLE,
            dma_channel: 1,
            clock_divider: PIO_CLOCK_DIVIDER,
        },
        &program,
        console_client,
        &mut pac.RESETS,
    ));

    pad_port.activate();
    console_port.activate();

    let mut pad_client = PadClient::new(link, pad_port);

    info!("bridge ready: origin-fix mode (L+R+DpadUp+Start+Y toggles correction)");

    let mut mode = BridgeMode::OriginFix;
    let mut rumble = RumblePulses::new();
    let mut previous_combo = false;
    let mut pad_was_ready = false;
    let mut last_origin_publish_count = 0u32;
    let mut last_tx_publish_count = link.real_pad_hub().last_tx().publish_count;
    let mut last_debug_log_us = 0u32;
    const DEBUG_LOG_INTERVAL_US: u32 = 500_000;

    loop {
        if boot_button.is_low().unwrap_or(false) {
            cortex_m::asm::delay(XTAL_FREQ_HZ / 10);
            if boot_button.is_low().unwrap_or(false) {
                info!("boot button held, entering USB bootloader");
                hal::rom_data::reset_to_usb_boot(0, 0);
            }
        }

        let now_us = timer.get_counter_low();

        // Rumble pulses override the console's rumble request while active.
        let mut console_state = link.shared_console().load();
        let pulse = rumble.tick(now_us);
        if pulse != RumbleMode::Off {
            console_state.rumble_mode = pulse;
        }
        pad_client.tick(now_us, &console_state);

        let snapshot = link.real_pad_hub().snapshot();

        // Track the pad's reported origin for the normalize stage.
        if snapshot.publish_count != last_origin_publish_count {
            last_origin_publish_count = snapshot.publish_count;
            if matches!(
                snapshot.last_rx_command,
                Command::Origin | Command::Recalibrate
            ) {
                let ox = snapshot.origin.input.analog.stick_x;
                let oy = snapshot.origin.input.analog.stick_y;
                ORIGIN_OFFSET.store(ox, oy);
                info!("origin updated: ({=u8}, {=u8})", ox, oy);
            }
        }

        // Mode toggle on the button combo's rising edge.
        if snapshot.last_rx_command == Command::Status {
            let buttons = snapshot.status.input.buttons;
            let combo = buttons.contains(
                Buttons::L | Buttons::R | Buttons::DPAD_UP | Buttons::START | Buttons::Y,
            );
            if combo && !previous_combo {
                let pipelines = link.pipelines();
                match mode {
                    BridgeMode::OriginFix => {
                        mode = BridgeMode::Correction;
                        pipelines.status.set_enabled(STAGE_FIX_NEUTRAL, false);
                        for index in CORRECTION_STAGES {
                            pipelines.status.set_enabled(index, true);
                        }
                        rumble.start(1, now_us);
                        info!("mode: correction");
                    }
                    BridgeMode::Correction => {
                        mode = BridgeMode::OriginFix;
                        pipelines.status.set_enabled(STAGE_FIX_NEUTRAL, true);
                        for index in CORRECTION_STAGES {
                            pipelines.status.set_enabled(index, false);
                        }
                        rumble.start(2, now_us);
                        info!("mode: origin-fix");
                    }
                }
            }
            previous_combo = combo;
        }

        // Periodic stage-by-stage debug trace of the last transmitted reply.
        let mut last_tx = TxPair::new();
        if link
            .real_pad_hub()
            .consume_tx_if_new(&mut last_tx_publish_count, &mut last_tx)
            && last_tx.raw.command() == Command::Status
            && now_us.wrapping_sub(last_debug_log_us) >= DEBUG_LOG_INTERVAL_US
        {
            last_debug_log_us = now_us;
            let raw = snapshot.status.input.analog;
            let tx_bytes = last_tx.modified.as_bytes();
            let (tx_x, tx_y) = (tx_bytes[2], tx_bytes[3]);
            let (ox, oy) = ORIGIN_OFFSET.load();
            info!(
                "tx trace: origin=({=u8},{=u8}) raw=({=u8},{=u8}) wire=({=u8},{=u8})",
                ox, oy, raw.stick_x, raw.stick_y, tx_x, tx_y
            );
        }

        let ready = link.is_pad_ready();
        if ready && !pad_was_ready {
            info!("pad ready, console replies enabled");
            pad_was_ready = true;
        } else if !ready && pad_was_ready {
            info!("pad lost, console replies disabled");
            pad_was_ready = false;
        }
    }
}
