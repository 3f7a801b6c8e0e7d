//! The measurement firmware: generated stick patterns instead of pad input.
//!
//! Holding Z on the real pad switches the console over to a synthetic
//! grid sweep; DpadUp switches back. Every transmitted sample change is
//! reported as a CRC-tagged CSV line (`D,<frame>,<x>,<y>,<crc8>`).

#![no_std]
#![no_main]

use bridge_core::measure::{
    GridSweep, GridSweepConfig, PadInjector, SampleLogger, Schedule, ScheduleConfig, SweepTarget,
    U8Range,
};
use bridge_core::{ConsoleClient, FrameHandler, PadClient, PadConsoleLink, Stage, TxPair};
use bridge_rp2040::pio_prog::joybus_program;
use bridge_rp2040::{JoybusPioPort, PioBlock, PortConfig};
use defmt::info;
use defmt_rtt as _;
use embedded_hal::digital::{InputPin, OutputPin};
use joybus_proto::{Buttons, Command, PadState};
use rp2040_hal::{self as hal, clocks::init_clocks_and_plls, pac, Sio, Watchdog};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

const XTAL_FREQ_HZ: u32 = 12_000_000;
const PIO_CLOCK_DIVIDER: u16 = 31;

const PIN_TO_REAL_PAD: u8 = 15;
const PIN_TO_REAL_CONSOLE: u8 = 16;

/// The swept axis pair. Change and rebuild to sweep another target.
const MEASURE_TARGET: SweepTarget = SweepTarget::Joystick;

/// Sample pattern cadence: every ten 60 Hz frames.
const MEASURE_INTERVAL_US: u32 = ScheduleConfig::FRAME_60HZ_US * 10;

static LINK: StaticCell<PadConsoleLink> = StaticCell::new();
static PAD_RESPONDER: StaticCell<PadResponder> = StaticCell::new();
static CONSOLE_CLIENT: StaticCell<ConsoleClient<'static>> = StaticCell::new();
static PAD_PORT: StaticCell<JoybusPioPort> = StaticCell::new();
static CONSOLE_PORT: StaticCell<JoybusPioPort> = StaticCell::new();

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

#[hal::entry]
fn main() -> ! {
    info!("measurement firmware starting");

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

    let mut led = pins.gpio25.into_push_pull_output();
    let _ = led.set_high();
    let mut boot_button = pins.gpio26.into_pull_up_input();

    let link = LINK.init(PadConsoleLink::new());
    {
        // Real-pad responses stay neutralized; the sweep supplies the data.
        let pipelines = link.pipelines_mut();
        pipelines.origin.add_stage(Stage::FixNeutral);
        pipelines.recalibrate.add_stage(Stage::FixNeutral);
        pipelines.status.add_stage(Stage::FixNeutral);
    }
    let link: &'static PadConsoleLink = link;

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

    let schedule = Schedule::new(ScheduleConfig {
        interval_us: MEASURE_INTERVAL_US,
        catch_up: false,
    });
    let pattern = GridSweep::new(GridSweepConfig {
        x: U8Range::FULL,
        y: U8Range::FULL,
        looped: true,
        target: MEASURE_TARGET,
        base: PadState::neutral(),
    });
    let mut injector = PadInjector::new(link, schedule, pattern);
    let mut logger = SampleLogger::new(MEASURE_TARGET);

    info!("measurement ready: hold Z to start the sweep, DpadUp to stop");

    let mut pad_was_ready = false;
    let mut last_measure_epoch = link.load_measure_epoch();
    let mut last_tx_publish_count = link.active_pad_hub().last_tx().publish_count;

    loop {
        if boot_button.is_low().unwrap_or(false) {
            cortex_m::asm::delay(XTAL_FREQ_HZ / 10);
            if boot_button.is_low().unwrap_or(false) {
                info!("boot button held, entering USB bootloader");
                hal::rom_data::reset_to_usb_boot(0, 0);
            }
        }

        let now_us = timer.get_counter_low();
        let console_state = link.shared_console().load();
        pad_client.tick(now_us, &console_state);
        injector.tick(now_us);

        // Z on the real pad starts the sweep, DpadUp ends it.
        let real_snapshot = link.real_pad_hub().snapshot();
        if real_snapshot.last_rx_command == Command::Status {
            let buttons = real_snapshot.status.input.buttons;
            if buttons.contains(Buttons::Z) && !link.is_measure_enabled() {
                logger.reset();
                link.enable_measure();
            } else if buttons.contains(Buttons::DPAD_UP) && link.is_measure_enabled() {
                link.disable_measure();
            }
        }

        if link.consume_measure_epoch(&mut last_measure_epoch) {
            last_tx_publish_count = link.active_pad_hub().last_tx().publish_count;
            if link.is_measure_enabled() {
                info!("sweep enabled");
            } else {
                info!("sweep disabled");
            }
        }

        // Report each transmitted sample change as a CSV line.
        let mut last_tx = TxPair::new();
        if link
            .active_pad_hub()
            .consume_tx_if_new(&mut last_tx_publish_count, &mut last_tx)
            && link.is_measure_enabled()
        {
            if let Some(line) = logger.observe(&last_tx) {
                info!("{=str}", line.as_str().trim_end());
            }
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
