//! Data threaded through every state handler.
//!
//! [`Inputs`] is the read-only sensor snapshot for one tick.  [`FsmContext`]
//! owns everything a state may mutate: the two blink generators, the
//! arming timer and the pattern/alarm flags.  [`Commands`] collects
//! the indicator actions produced during the tick.

use crate::config::AlarmConfig;
use crate::drivers::hw_timer::{Tick, ticks_between};
use crate::drivers::led_patterns::{FastBlink, LedCommand, SlowBlink};

// ---------------------------------------------------------------------------
// Inputs (read-only to state handlers)
// ---------------------------------------------------------------------------

/// Sensor snapshot as seen by the controller on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inputs {
    /// A phone rests on the pad.
    pub phone_present: bool,
    /// Latest cached supply voltage; `None` until the first good sample.
    pub voltage_mv: Option<u32>,
    /// The startup attention pattern has finished.
    pub pattern_done: bool,
}

/// The two sides of the hysteresis band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub high_mv: u32,
    pub low_mv: u32,
}

impl Thresholds {
    pub fn from_config(config: &AlarmConfig) -> Self {
        Self {
            high_mv: config.voltage_high_mv,
            low_mv: config.voltage_low_mv,
        }
    }
}

impl Inputs {
    /// Supply has fallen below LOW.  Unknown voltage never qualifies.
    pub fn below_low(&self, t: &Thresholds) -> bool {
        self.voltage_mv.is_some_and(|v| v < t.low_mv)
    }

    /// Supply has risen above HIGH.  Unknown voltage never qualifies.
    pub fn above_high(&self, t: &Thresholds) -> bool {
        self.voltage_mv.is_some_and(|v| v > t.high_mv)
    }
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Upper bound on indicator actions in one tick (enter + pattern).
pub const MAX_COMMANDS: usize = 4;

/// Ordered indicator actions for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commands(heapless::Vec<LedCommand, MAX_COMMANDS>);

impl Commands {
    pub fn new() -> Self {
        Self(heapless::Vec::new())
    }

    pub fn push(&mut self, cmd: LedCommand) {
        if self.0.push(cmd).is_err() {
            debug_assert!(false, "more than {MAX_COMMANDS} LED commands in one tick");
        }
    }

    pub fn as_slice(&self) -> &[LedCommand] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedCommand> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Arming timer
// ---------------------------------------------------------------------------

/// Counts ticks since entry into the risk state.  Discarded, not paused,
/// on exit.
#[derive(Debug, Clone, Copy)]
pub struct ArmingTimer {
    delay_ticks: u32,
    entered_at: Option<Tick>,
}

impl ArmingTimer {
    pub fn new(delay_ticks: u32) -> Self {
        Self {
            delay_ticks,
            entered_at: None,
        }
    }

    pub fn start(&mut self, now: Tick) {
        self.entered_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.entered_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.entered_at.is_some()
    }

    /// Armed once the state has been held for longer than the delay, i.e.
    /// on the tick after the delay has fully elapsed.
    pub fn is_armed(&self, now: Tick) -> bool {
        self.entered_at
            .is_some_and(|at| ticks_between(at, now) > self.delay_ticks)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// Mutable state owned by the controller and lent to state handlers.
pub struct FsmContext {
    pub config: AlarmConfig,
    pub slow_blink: SlowBlink,
    pub fast_blink: FastBlink,
    pub arming: ArmingTimer,
    /// Latched when the startup pattern reports done; cleared on exit.
    pub blink_done: bool,
    /// FastBlink is driving the LED (arming delay elapsed).
    pub alarm_active: bool,
    /// `alarm_active` went high during the current tick.
    pub armed_now: bool,
}

impl FsmContext {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            slow_blink: SlowBlink::new(config.slow_blink_interval_ticks),
            fast_blink: FastBlink::new(
                config.fast_toggle_interval_ticks,
                config.fast_duty_window_ticks,
            ),
            arming: ArmingTimer::new(config.arming_delay_ticks),
            blink_done: false,
            alarm_active: false,
            armed_now: false,
            config,
        }
    }
}
