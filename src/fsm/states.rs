//! Transition table and per-state actions.
//!
//! [`evaluate`] is the whole decision table as a pure function of the
//! current state and the tick's inputs.  The enter/exit/update actions only
//! touch the pattern generators and the arming timer and push LED commands.
//!
//! ```text
//!                      present
//!   CarOn_PhoneOff ─────────────▶ CarOn_PhoneOn
//!        ▲     │   ◀───────────── │     ▲
//!   >HIGH│     │<LOW   absent     │<LOW │>HIGH
//!        │     ▼                  ▼     │
//!   CarOff_PhoneOff ◀──────────── CarOff_PhoneOn   (risk: arming, fast blink)
//!                   ─────────────▶
//!                      present
//!
//!  Startup ──[done, absent]──▶ CarOn_PhoneOff
//!          ──[present]───────▶ CarOn_PhoneOn
//!          ──[< LOW]─────────▶ CarOff_PhoneOff   (when startup checks voltage)
//! ```

use super::StateId;
use super::context::{Commands, FsmContext, Inputs, Thresholds};
use crate::config::AlarmConfig;
use crate::drivers::hw_timer::Tick;
use crate::drivers::led_patterns::LedCommand;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Transition table
// ═══════════════════════════════════════════════════════════════════════════

/// Next state for `state` given `inputs`, or `None` to stay.
///
/// Conditions are checked in priority order; the first match wins.
pub fn evaluate(state: StateId, inputs: &Inputs, config: &AlarmConfig) -> Option<StateId> {
    let t = Thresholds::from_config(config);
    let present = inputs.phone_present;

    match state {
        StateId::Startup => {
            if inputs.pattern_done && !present {
                Some(StateId::CarOnPhoneOff)
            } else if present {
                Some(StateId::CarOnPhoneOn)
            } else if config.startup_checks_voltage && inputs.below_low(&t) {
                Some(StateId::CarOffPhoneOff)
            } else {
                None
            }
        }
        StateId::CarOnPhoneOff => {
            if present {
                Some(StateId::CarOnPhoneOn)
            } else if inputs.below_low(&t) {
                Some(StateId::CarOffPhoneOff)
            } else {
                None
            }
        }
        StateId::CarOnPhoneOn => {
            if !present {
                Some(StateId::CarOnPhoneOff)
            } else if inputs.below_low(&t) {
                Some(StateId::CarOffPhoneOn)
            } else {
                None
            }
        }
        StateId::CarOffPhoneOn => {
            if !present {
                Some(StateId::CarOffPhoneOff)
            } else if inputs.above_high(&t) {
                Some(StateId::CarOnPhoneOn)
            } else {
                None
            }
        }
        StateId::CarOffPhoneOff => {
            if present {
                Some(StateId::CarOffPhoneOn)
            } else if inputs.above_high(&t) {
                Some(StateId::CarOnPhoneOff)
            } else {
                None
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Dispatch
// ═══════════════════════════════════════════════════════════════════════════

pub fn on_enter(state: StateId, ctx: &mut FsmContext, now: Tick, cmds: &mut Commands) {
    match state {
        StateId::Startup => startup_enter(ctx, now, cmds),
        StateId::CarOffPhoneOn => risk_enter(ctx, now, cmds),
        StateId::CarOnPhoneOff | StateId::CarOnPhoneOn | StateId::CarOffPhoneOff => {
            cmds.push(LedCommand::Off);
        }
    }
}

pub fn on_exit(state: StateId, ctx: &mut FsmContext, cmds: &mut Commands) {
    match state {
        StateId::Startup => startup_exit(ctx),
        StateId::CarOffPhoneOn => risk_exit(ctx, cmds),
        StateId::CarOnPhoneOff | StateId::CarOnPhoneOn | StateId::CarOffPhoneOff => {}
    }
}

/// Per-tick work for a state that is not being left this tick.
pub fn on_update(state: StateId, ctx: &mut FsmContext, now: Tick, cmds: &mut Commands) {
    match state {
        StateId::Startup => startup_update(ctx, now, cmds),
        StateId::CarOffPhoneOn => risk_update(ctx, now, cmds),
        StateId::CarOnPhoneOff | StateId::CarOnPhoneOn | StateId::CarOffPhoneOff => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  STARTUP: power-on attention blink
// ═══════════════════════════════════════════════════════════════════════════

fn startup_enter(ctx: &mut FsmContext, now: Tick, cmds: &mut Commands) {
    cmds.push(LedCommand::Off);
    ctx.blink_done = false;
    ctx.slow_blink.start(ctx.config.startup_blinks, now);
    info!("STARTUP: {} attention blinks", ctx.config.startup_blinks);
}

fn startup_exit(ctx: &mut FsmContext) {
    ctx.slow_blink.reset();
    ctx.blink_done = false;
}

fn startup_update(ctx: &mut FsmContext, now: Tick, cmds: &mut Commands) {
    let step = ctx.slow_blink.poll(now);
    if step.toggle {
        cmds.push(LedCommand::Toggle);
    }
    if step.done {
        debug!("STARTUP: attention pattern done");
        ctx.blink_done = true;
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CAROFF_PHONEON: engine off with a phone on the pad
// ═══════════════════════════════════════════════════════════════════════════

fn risk_enter(ctx: &mut FsmContext, now: Tick, cmds: &mut Commands) {
    cmds.push(LedCommand::Off);
    ctx.fast_blink.reset();
    ctx.arming.start(now);
    ctx.alarm_active = false;
    info!(
        "RISK: phone left on pad with engine off, alarm in {} ticks",
        ctx.config.arming_delay_ticks
    );
}

fn risk_exit(ctx: &mut FsmContext, cmds: &mut Commands) {
    cmds.push(LedCommand::Off);
    ctx.fast_blink.reset();
    ctx.arming.clear();
    ctx.alarm_active = false;
}

fn risk_update(ctx: &mut FsmContext, now: Tick, cmds: &mut Commands) {
    let armed = ctx.arming.is_armed(now);
    if armed && !ctx.alarm_active {
        ctx.alarm_active = true;
        ctx.armed_now = true;
    }
    if let Some(cmd) = ctx.fast_blink.poll(now, armed) {
        cmds.push(cmd);
    }
}
