//! HardwareAdapter against the host simulation of the peripherals.
//!
//! The simulated pins are process-wide statics, so everything that drives
//! them lives in a single test.

use phonealarm::adapters::hardware::HardwareAdapter;
use phonealarm::adapters::log_sink::LogEventSink;
use phonealarm::app::events::{AppEvent, StatusReport};
use phonealarm::app::ports::{EventSink, IndicatorPort, SensorPort};
use phonealarm::app::service::AppService;
use phonealarm::config::AlarmConfig;
use phonealarm::drivers::hw_init::{self, GpioInput};
use phonealarm::drivers::status_led::StatusLed;
use phonealarm::error::SensorError;
use phonealarm::fsm::StateId;
use phonealarm::pins;
use phonealarm::sensors::presence::PresenceDetector;

#[test]
fn adapter_drives_simulated_board() {
    hw_init::init_peripherals().expect("sim init never fails");
    let config = AlarmConfig::DEFAULT;
    let presence = PresenceDetector::new(GpioInput::new(pins::PRESENCE_GPIO), pins::PRESENCE_POLARITY);
    let mut hw = HardwareAdapter::new(presence, StatusLed::new(config.led_brightness));
    assert_eq!(hw_init::sim_led_duty(), 0);

    // Presence follows the board polarity.
    hw_init::sim_set_presence_level(true);
    assert!(hw.phone_present());
    hw_init::sim_set_presence_level(false);
    assert!(!hw.phone_present());

    // ADC path, including the stalled conversion.
    hw_init::sim_set_vsupply_raw(3_750);
    assert_eq!(hw.sample_voltage_raw(config.adc_max_wait_us), Ok(3_750));
    hw_init::sim_set_adc_stalled(true);
    assert_eq!(
        hw.sample_voltage_raw(config.adc_max_wait_us),
        Err(SensorError::AdcTimeout)
    );
    hw_init::sim_set_adc_stalled(false);

    // LED uses the configured brightness.
    hw.on();
    assert_eq!(hw_init::sim_led_duty(), config.led_brightness);
    hw.toggle();
    assert_eq!(hw_init::sim_led_duty(), 0);
    assert!(!hw.is_lit());

    // Whole service on the simulated board: phone on pad, engine running.
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config);
    hw_init::sim_set_presence_level(true);
    app.start(0, &mut hw, &mut sink);
    app.run_cycle(0, &mut hw, &mut sink);
    assert_eq!(app.state(), StateId::CarOnPhoneOn);
    assert_eq!(app.voltage_mv(), Some(15_000));
    hw_init::sim_set_presence_level(false);
}

#[test]
fn log_sink_renders_every_event() {
    let mut sink = LogEventSink::new();
    let status = StatusReport {
        state: StateId::CarOffPhoneOn,
        phone_present: true,
        voltage_mv: Some(12_480),
        armed: true,
        led_lit: false,
        adc_fallbacks: 0,
        tick_overruns: 0,
        uptime_ticks: 42,
    };
    for event in [
        AppEvent::Started(StateId::Startup),
        AppEvent::StateChanged {
            from: StateId::CarOnPhoneOn,
            to: StateId::CarOffPhoneOn,
            phone_present: true,
            voltage_mv: Some(14_000),
        },
        AppEvent::AlarmArmed,
        AppEvent::VoltageFallback { last_good_mv: None },
        AppEvent::Heartbeat(status),
    ] {
        sink.emit(&event);
    }
}
