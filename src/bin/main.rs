#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_rp::adc::{Adc, Async, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::flash::Flash;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use embassy_usb::class::cdc_acm::State;
use embassy_usb::{Builder, Config as UsbConfig};
use flappy_adapter::usb_serial::{serve_receiver, serve_sender};
use flappy_adapter::{
    configure_usb_serial, scale_adc, ultrasonic, Adapter, Buzzer, EdgeSource, EventRegister,
    FlashScoreStore, PolledLines, RttScreen, SevenSegment, TickScheduler, Tone, UltrasonicRanger,
    UsbSerialLink, TICK_INTERVAL_MS,
};
use portable_atomic::{AtomicU16, Ordering};
use static_cell::StaticCell;

#[cfg(feature = "melody")]
use flappy_adapter::MelodySequencer;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
    ADC_IRQ_FIFO => embassy_rp::adc::InterruptHandler;
});

/// Event flags set from the edge and tick tasks, drained by the
/// adapter loop. Coalescing semantics: repeats before a drain merge.
static EVENTS: EventRegister = EventRegister::new();

/// Tick counter and per-mode sampling gates.
static TICKS: TickScheduler = TickScheduler::new();

/// Latest score for the display scan task.
static SCORE: AtomicU16 = AtomicU16::new(0);

/// Tone requests for the buzzer task (latest value wins; a new tone
/// replaces one not yet started).
static TONES: Signal<CriticalSectionRawMutex, Tone> = Signal::new();

/// USB device configuration buffers.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// CDC-ACM class state.
static CDC_STATE: StaticCell<State> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("flappy-adapter starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Flappy Adapter");
    usb_config.product = Some("Sensor Game Input Adapter");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure the CDC serial class
    let cdc_state = CDC_STATE.init(State::new());
    let (usb_tx, usb_rx) = configure_usb_serial(&mut builder, cdc_state);

    // Build the USB device
    let usb_device = builder.build();

    // --- Sensor inputs ---
    // Level-polled lines, read once per adapter pass.
    let lines = PolledLines::new(
        Input::new(p.PIN_0, Pull::Down),
        Input::new(p.PIN_1, Pull::Down),
    );

    // Edge-interrupt buttons.
    let flap_button = Input::new(p.PIN_2, Pull::Down);
    let dive_button = Input::new(p.PIN_3, Pull::Down);
    let glide_button = Input::new(p.PIN_4, Pull::Down);

    // Potentiometer / infrared sensor share the one analog channel.
    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let pot = AdcChannel::new_pin(p.PIN_26, Pull::None);

    // Ultrasonic ranger.
    let ranger = ultrasonic(
        Output::new(p.PIN_14, Level::Low),
        Input::new(p.PIN_15, Pull::Down),
    );

    // --- Feedback outputs ---
    let display = SevenSegment::new(
        [
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
            Output::new(p.PIN_8, Level::Low),
            Output::new(p.PIN_9, Level::Low),
            Output::new(p.PIN_10, Level::Low),
            Output::new(p.PIN_11, Level::Low),
            Output::new(p.PIN_12, Level::Low),
        ],
        [
            Output::new(p.PIN_16, Level::Low),
            Output::new(p.PIN_17, Level::Low),
            Output::new(p.PIN_18, Level::Low),
            Output::new(p.PIN_19, Level::Low),
        ],
    );
    let buzzer = Buzzer::new(Output::new(p.PIN_22, Level::Low));

    // On-board LED for link error indication.
    let led = Output::new(p.PIN_25, Level::Low);

    // --- Score store and adapter core ---
    let store = FlashScoreStore::new(Flash::new_blocking(p.FLASH));
    let adapter = Adapter::new(store, RttScreen::new());

    spawner.spawn(usb_task(usb_device)).unwrap();
    spawner.spawn(usb_rx_task(usb_rx)).unwrap();
    spawner.spawn(usb_tx_task(usb_tx)).unwrap();
    spawner
        .spawn(edge_task(flap_button, dive_button, glide_button))
        .unwrap();
    spawner.spawn(tick_task(adc, pot)).unwrap();
    spawner.spawn(scan_task(display)).unwrap();
    spawner.spawn(buzzer_task(buzzer)).unwrap();
    spawner
        .spawn(adapter_task(adapter, ranger, lines, led))
        .unwrap();

    info!("flappy-adapter initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Receive task - reassembles USB packets into command lines.
#[embassy_executor::task]
async fn usb_rx_task(rx: embassy_usb::class::cdc_acm::Receiver<'static, Driver<'static, USB>>) {
    serve_receiver(rx).await;
}

/// Transmit task - drains reply lines to the host.
#[embassy_executor::task]
async fn usb_tx_task(tx: embassy_usb::class::cdc_acm::Sender<'static, Driver<'static, USB>>) {
    serve_sender(tx).await;
}

/// Edge capture task - latches button edges into the event register.
///
/// Setting a flag is the whole interrupt-side contract; the adapter
/// loop decides whether the active mode reports it.
#[embassy_executor::task]
async fn edge_task(
    mut flap: Input<'static>,
    mut dive: Input<'static>,
    mut glide: Input<'static>,
) {
    #[cfg(feature = "melody")]
    let mut melody = MelodySequencer::new();

    loop {
        match select3(
            flap.wait_for_rising_edge(),
            dive.wait_for_rising_edge(),
            glide.wait_for_rising_edge(),
        )
        .await
        {
            Either3::First(()) => {
                EVENTS.set_edge(EdgeSource::Flap);
                #[cfg(feature = "melody")]
                TONES.signal(melody.next_note());
            }
            Either3::Second(()) => EVENTS.set_edge(EdgeSource::Dive),
            Either3::Third(()) => EVENTS.set_edge(EdgeSource::Glide),
        }
        // Contact settle time before re-arming the edge waits.
        Timer::after_millis(20).await;
    }
}

/// Tick task - 10 ms heartbeat driving the 100 ms sampling pulse.
#[embassy_executor::task]
async fn tick_task(mut adc: Adc<'static, Async>, mut pot: AdcChannel<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    loop {
        ticker.next().await;
        if TICKS.on_tick() {
            if TICKS.wants_analog() {
                match adc.read(&mut pot).await {
                    Ok(raw) => EVENTS.set_sample(scale_adc(raw)),
                    Err(e) => error!("adc read failed: {:?}", e),
                }
            }
            if TICKS.wants_range() {
                EVENTS.set_range_due();
            }
        }
    }
}

/// Display scan task - one digit per 2 ms step.
#[embassy_executor::task]
async fn scan_task(mut display: SevenSegment) {
    let mut ticker = Ticker::every(Duration::from_millis(2));
    loop {
        ticker.next().await;
        display.step(SCORE.load(Ordering::Relaxed));
    }
}

/// Buzzer task - plays requested tones to completion.
#[embassy_executor::task]
async fn buzzer_task(mut buzzer: Buzzer) {
    loop {
        let tone = TONES.wait().await;
        buzzer.play(tone).await;
    }
}

/// Adapter task - the cooperative main loop.
#[embassy_executor::task]
async fn adapter_task(
    mut adapter: Adapter<FlashScoreStore<'static>, RttScreen>,
    mut ranger: UltrasonicRanger,
    lines: PolledLines,
    mut led: Output<'static>,
) {
    let mut link = UsbSerialLink;
    loop {
        match adapter.poll(&EVENTS, &TICKS, &mut link, &mut ranger, lines.levels()) {
            Ok(Some(tone)) => TONES.signal(tone),
            Ok(None) => {}
            Err(e) => {
                error!("link error: {:?}", e);
                led.toggle();
            }
        }
        SCORE.store(adapter.score().clamp(0, 9999) as u16, Ordering::Relaxed);
        Timer::after_millis(1).await;
    }
}
