//! End-to-end alarm scenarios through AppService with mock hardware.
//!
//! Voltages change at the sampler's cadence, so a new supply level takes
//! effect on the next sample tick rather than immediately.

use crate::mock_hw::{LedCall, Rig};

use phonealarm::app::events::AppEvent;
use phonealarm::config::AlarmConfig;
use phonealarm::fsm::StateId;

const DELAY: u32 = AlarmConfig::DEFAULT.arming_delay_ticks;
const CADENCE: u32 = AlarmConfig::DEFAULT.sample_interval_ticks;

/// Phone on the pad, engine just switched off.  Returns the tick the risk
/// state was entered on.
fn enter_risk_state(rig: &mut Rig) -> u32 {
    rig.hw.present = true;
    rig.step();
    assert_eq!(rig.app.state(), StateId::CarOnPhoneOn);
    rig.hw.set_mv(14_000);
    rig.run_until_state(StateId::CarOffPhoneOn, CADENCE + 1)
        .expect("low voltage must reach the risk state within one sample")
}

fn armed_rig() -> Rig {
    let mut rig = Rig::settled_car_on();
    let entry = enter_risk_state(&mut rig);
    rig.run(DELAY + 1);
    assert!(rig.app.is_armed(), "armed after {} ticks from {entry}", DELAY + 1);
    rig
}

// ── Scenario A: power-on with engine running, pad empty ──────

#[test]
fn scenario_a_startup_settles_car_on_phone_off() {
    let mut rig = Rig::start(false, 15_000);
    let settled = rig.run_until_state(StateId::CarOnPhoneOff, 1_000);

    assert_eq!(settled, Some(552));
    assert_eq!(rig.hw.activity_ticks(), vec![0, 110, 220, 330, 440, 550]);
    assert!(!rig.hw.lit, "LED must be off after the attention pattern");
    assert_eq!(rig.sink.transitions(), vec![(StateId::Startup, StateId::CarOnPhoneOff)]);
}

// ── Scenario B: phone placed while driving ───────────────────

#[test]
fn scenario_b_phone_placed_while_car_on() {
    let mut rig = Rig::settled_car_on();
    rig.hw.present = true;
    rig.step();

    assert_eq!(rig.app.state(), StateId::CarOnPhoneOn);
    assert!(!rig.hw.lit);
}

// ── Scenario C: engine off with phone on pad ─────────────────

#[test]
fn scenario_c_engine_off_arms_after_delay() {
    let mut rig = Rig::settled_car_on();
    let entry = enter_risk_state(&mut rig);
    let calls_before = rig.hw.calls.len();

    rig.run(DELAY);
    assert!(!rig.hw.lit, "LED stays off during the arming delay");
    assert!(
        rig.hw.calls[calls_before..].iter().all(|(_, c)| *c == LedCall::Off),
        "no LED activity before the delay has elapsed"
    );
    assert!(!rig.app.is_armed());

    rig.step();
    assert!(rig.app.is_armed());
    assert!(rig.hw.lit, "first fast-blink toggle on tick {}", entry + DELAY + 1);
    assert_eq!(rig.hw.calls.last(), Some(&(entry + DELAY + 1, LedCall::Toggle)));
    assert_eq!(rig.sink.count(|e| *e == AppEvent::AlarmArmed), 1);
}

#[test]
fn armed_alarm_alternates_burst_and_quiet() {
    let mut rig = armed_rig();
    let armed_at = rig.now - 1;

    let toggles_between = |rig: &Rig, from: u32, to: u32| {
        rig.hw
            .calls
            .iter()
            .filter(|(t, c)| *c == LedCall::Toggle && (from..to).contains(t))
            .count()
    };

    rig.run(199);
    assert_eq!(toggles_between(&rig, armed_at, armed_at + 100), 50);
    assert_eq!(toggles_between(&rig, armed_at + 100, armed_at + 200), 0);
    assert!(!rig.hw.lit, "quiet half of the duty cycle keeps the LED off");

    rig.step();
    assert!(rig.hw.lit, "next burst starts with a toggle");
}

// ── Scenario D: phone removed while alarming ─────────────────

#[test]
fn scenario_d_phone_removed_disarms() {
    let mut rig = armed_rig();
    rig.hw.present = false;
    rig.step();

    assert_eq!(rig.app.state(), StateId::CarOffPhoneOff);
    assert!(!rig.hw.lit);
    assert!(!rig.app.is_armed());

    // Putting the phone back restarts the full delay.
    rig.hw.present = true;
    rig.step();
    assert_eq!(rig.app.state(), StateId::CarOffPhoneOn);
    rig.run(DELAY);
    assert!(!rig.app.is_armed(), "arming timer was discarded, not paused");
}

#[test]
fn engine_restart_silences_alarm() {
    let mut rig = armed_rig();
    rig.hw.set_mv(15_000);
    rig.run_until_state(StateId::CarOnPhoneOn, CADENCE + 1)
        .expect("alternator voltage leaves the risk state");
    assert!(!rig.hw.lit);
    assert!(!rig.app.is_armed());
}

// ── Scenario E: engine started with pad empty ────────────────

#[test]
fn scenario_e_engine_start_from_car_off() {
    let mut rig = Rig::settled_car_on();
    rig.hw.set_mv(14_000);
    rig.run_until_state(StateId::CarOffPhoneOff, CADENCE + 1)
        .expect("low voltage reaches CarOff_PhoneOff");

    rig.hw.set_mv(15_000);
    assert!(rig.run_until_state(StateId::CarOnPhoneOff, CADENCE + 1).is_some());
    assert!(!rig.hw.lit);
}

// ── Hysteresis and startup variants ──────────────────────────

#[test]
fn band_voltage_holds_either_side() {
    let mut rig = Rig::settled_car_on();
    rig.hw.set_mv(14_450);
    rig.run(10 * CADENCE);
    assert_eq!(rig.app.state(), StateId::CarOnPhoneOff);

    rig.hw.set_mv(14_000);
    rig.run_until_state(StateId::CarOffPhoneOff, CADENCE + 1);
    rig.hw.set_mv(14_450);
    rig.run(10 * CADENCE);
    assert_eq!(rig.app.state(), StateId::CarOffPhoneOff);
}

#[test]
fn startup_on_low_supply_goes_car_off() {
    let mut rig = Rig::start(false, 12_600);
    rig.step();
    assert_eq!(rig.app.state(), StateId::CarOffPhoneOff);
}

#[test]
fn startup_with_phone_present_skips_pattern() {
    let mut rig = Rig::start(true, 15_000);
    rig.step();
    assert_eq!(rig.app.state(), StateId::CarOnPhoneOn);
    assert!(!rig.hw.lit);
}

#[test]
fn dead_adc_never_triggers_voltage_transitions() {
    let mut rig = Rig::start(false, 15_000);
    rig.hw.raw = None;
    rig.run(2_000);

    assert_eq!(rig.app.state(), StateId::CarOnPhoneOff);
    assert_eq!(rig.app.voltage_mv(), None);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::VoltageFallback { last_good_mv: None })),
        (2_000 / CADENCE) as usize
    );
}
