//! PhoneAlarm Firmware: Main Entry Point
//!
//! Single cooperative loop gated by a hardware tick.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter                       LogEventSink            │
//! │  (Sensor + Indicator)                  (EventSink)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  VoltageSampler · Controller · Blink patterns          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  gptimer ISR ──▶ SYSTEM_TICKS + task notify ──▶ control loop   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{error, info};

use phonealarm::adapters::hardware::HardwareAdapter;
use phonealarm::adapters::log_sink::LogEventSink;
use phonealarm::app::service::AppService;
use phonealarm::config::AlarmConfig;
use phonealarm::drivers::hw_init::{self, GpioInput};
use phonealarm::drivers::hw_timer::{self, SYSTEM_TICKS, TimerPlan};
use phonealarm::drivers::status_led::StatusLed;
use phonealarm::drivers::watchdog::Watchdog;
use phonealarm::pins;
use phonealarm::sensors::presence::PresenceDetector;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PhoneAlarm v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Build-time configuration ───────────────────────────
    let config = AlarmConfig::DEFAULT;
    config.validate().context("invalid build-time configuration")?;
    info!(
        "Config: HIGH={} mV LOW={} mV, arming after {} ms, {} startup blinks",
        config.voltage_high_mv,
        config.voltage_low_mv,
        config.ms_from_ticks(config.arming_delay_ticks),
        config.startup_blinks
    );

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Bring-up failure is critical: log and halt until the
        // watchdog or a power cycle resets the board.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let led = StatusLed::new(config.led_brightness);
    let presence = PresenceDetector::new(GpioInput::new(pins::PRESENCE_GPIO), pins::PRESENCE_POLARITY);
    let mut hw = HardwareAdapter::new(presence, led);
    let mut sink = LogEventSink::new();

    // ── 4. Tick timer ─────────────────────────────────────────
    let plan = TimerPlan::for_clock(pins::TICK_TIMER_RESOLUTION_HZ, config.tick_period_us)
        .context("tick period not representable")?;
    hw_timer::start_tick_timer(&plan).context("tick timer")?;
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 5. Application ────────────────────────────────────────
    let mut app = AppService::new(config);
    app.start(SYSTEM_TICKS.now(), &mut hw, &mut sink);
    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    // Sleep on the tick ISR's task notification; the timeout keeps the
    // watchdog fed if the timer ever stops.
    let wait_ms = (config.watchdog_timeout_ms / 4).max(1);
    loop {
        if hw_timer::wait_for_tick(&SYSTEM_TICKS, wait_ms) {
            app.poll(&SYSTEM_TICKS, &mut hw, &mut sink);
        }
        watchdog.feed();
    }
}
