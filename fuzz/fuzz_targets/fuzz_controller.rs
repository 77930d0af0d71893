//! Fuzz target: `Controller::tick`
//!
//! Each input byte is one tick: bit 0 is presence, bit 1 drops the voltage
//! sample, bits 2..=7 pick a supply level around the hysteresis band, and
//! the high bits of every fourth byte stretch the gap since the previous
//! tick.  Asserts the controller's structural invariants on every step.
//!
//! cargo fuzz run fuzz_controller

#![no_main]

use libfuzzer_sys::fuzz_target;
use phonealarm::config::AlarmConfig;
use phonealarm::drivers::led_patterns::LedCommand;
use phonealarm::fsm::{Controller, StateId};

fuzz_target!(|data: &[u8]| {
    let config = AlarmConfig {
        arming_delay_ticks: 20,
        slow_blink_interval_ticks: 3,
        ..AlarmConfig::DEFAULT
    };
    let mut controller = Controller::new(config);
    let mut now: u32 = u32::MAX - 64;
    let start = controller.start(now);
    assert_eq!(start.as_slice(), &[LedCommand::Off]);

    let mut was_armed = false;
    for (i, byte) in data.iter().enumerate() {
        let gap = if i % 4 == 3 { u32::from(byte >> 5) * 7 + 1 } else { 1 };
        now = now.wrapping_add(gap);

        let present = byte & 1 != 0;
        let voltage = (byte & 2 == 0).then(|| 14_000 + u32::from(byte >> 2) * 20);

        let before = controller.state();
        let step = controller.tick(now, present, voltage);
        let after = controller.state();

        match step.transition {
            Some((from, to)) => {
                assert_eq!(from, before);
                assert_eq!(to, after);
                assert_ne!(from, to);
                assert_ne!(to, StateId::Startup, "nothing re-enters Startup");
                assert_eq!(to.phone_on(), Some(present), "target follows presence");
            }
            None => assert_eq!(before, after),
        }

        // Voltage inside the band or unknown never flips the vehicle half.
        let decisive = voltage.is_some_and(|v| v < config.voltage_low_mv || v > config.voltage_high_mv);
        if !decisive && before != StateId::Startup {
            assert_eq!(before.car_on(), after.car_on());
        }

        // Alarm only exists in the risk state and fires its edge once.
        let armed = controller.is_armed();
        if armed {
            assert_eq!(after, StateId::CarOffPhoneOn);
        }
        assert_eq!(step.armed_now, armed && !was_armed);
        if step.armed_now {
            assert!(step.transition.is_none());
        }
        was_armed = armed;

        assert!(step.commands.as_slice().len() <= 4);
    }
});
