//! The control loop as `main` runs it: ISR ticks, `poll`, events.

use crate::mock_hw::{LogSink, MockHardware};

use phonealarm::app::events::AppEvent;
use phonealarm::app::service::AppService;
use phonealarm::config::AlarmConfig;
use phonealarm::drivers::hw_timer::TickSource;
use phonealarm::fsm::StateId;

#[test]
fn one_cycle_per_interrupt() {
    let ticks = TickSource::new();
    let mut app = AppService::new(AlarmConfig::DEFAULT);
    let mut hw = MockHardware::new(false, 15_000);
    let mut sink = LogSink::new();
    app.start(ticks.now(), &mut hw, &mut sink);

    let mut cycles = 0;
    for _ in 0..600 {
        ticks.on_interrupt();
        // The loop spins several times per tick.
        for _ in 0..3 {
            if app.poll(&ticks, &mut hw, &mut sink) {
                cycles += 1;
            }
        }
    }
    assert_eq!(cycles, 600);
    assert_eq!(app.state(), StateId::CarOnPhoneOff);
    assert_eq!(app.build_status(hw.lit).tick_overruns, 0);
}

#[test]
fn stalled_loop_reports_overruns_and_patterns_catch_up() {
    let ticks = TickSource::new();
    let mut app = AppService::new(AlarmConfig::DEFAULT);
    let mut hw = MockHardware::new(false, 15_000);
    let mut sink = LogSink::new();
    app.start(ticks.now(), &mut hw, &mut sink);

    // The loop only gets to run every fifth tick.
    for _ in 0..200 {
        for _ in 0..5 {
            ticks.on_interrupt();
        }
        assert!(app.poll(&ticks, &mut hw, &mut sink));
    }
    assert_eq!(ticks.now(), 1_000);
    assert_eq!(app.build_status(hw.lit).tick_overruns, 800);
    // Startup completes on elapsed time despite the collapsed ticks.
    assert_eq!(app.state(), StateId::CarOnPhoneOff);
}

#[test]
fn conversions_follow_cadence_and_wait_bound() {
    let config = AlarmConfig::DEFAULT;
    let ticks = TickSource::new();
    let mut app = AppService::new(config);
    let mut hw = MockHardware::new(false, 15_000);
    let mut sink = LogSink::new();
    app.start(ticks.now(), &mut hw, &mut sink);

    for _ in 0..500 {
        ticks.on_interrupt();
        app.poll(&ticks, &mut hw, &mut sink);
    }
    assert_eq!(hw.conversions, 500 / config.sample_interval_ticks);
    assert_eq!(hw.last_wait_us, Some(config.adc_max_wait_us));
}

#[test]
fn heartbeat_reports_status() {
    let config = AlarmConfig {
        heartbeat_interval_ticks: 100,
        ..AlarmConfig::DEFAULT
    };
    let ticks = TickSource::new();
    let mut app = AppService::new(config);
    let mut hw = MockHardware::new(true, 15_000);
    let mut sink = LogSink::new();
    app.start(ticks.now(), &mut hw, &mut sink);

    for _ in 0..250 {
        ticks.on_interrupt();
        app.poll(&ticks, &mut hw, &mut sink);
    }

    let beats: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Heartbeat(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(beats.len(), 2);
    let last = beats[1];
    assert_eq!(last.state, StateId::CarOnPhoneOn);
    assert!(last.phone_present);
    assert_eq!(last.voltage_mv, Some(15_000));
    assert!(!last.armed);
    assert_eq!(last.uptime_ticks, 200);
}

#[test]
fn adc_outage_falls_back_to_last_good() {
    let ticks = TickSource::new();
    let mut app = AppService::new(AlarmConfig::DEFAULT);
    let mut hw = MockHardware::new(true, 14_400);
    let mut sink = LogSink::new();
    app.start(ticks.now(), &mut hw, &mut sink);

    for _ in 0..10 {
        ticks.on_interrupt();
        app.poll(&ticks, &mut hw, &mut sink);
    }
    assert_eq!(app.state(), StateId::CarOnPhoneOn);

    hw.raw = None;
    for _ in 0..200 {
        ticks.on_interrupt();
        app.poll(&ticks, &mut hw, &mut sink);
    }
    assert_eq!(app.voltage_mv(), Some(14_400));
    assert_eq!(
        sink.count(|e| *e == AppEvent::VoltageFallback { last_good_mv: Some(14_400) }),
        4
    );
}
