//! Phone charge alarm state machine.
//!
//! The five states are a plain enum.  Each tick the controller:
//!
//! 1. builds an [`Inputs`](context::Inputs) snapshot,
//! 2. asks [`states::evaluate`] for the next state,
//! 3. on a transition runs `on_exit(current)` then `on_enter(next)`,
//!    otherwise runs `on_update(current)`.
//!
//! Every LED action is returned as data in a [`Step`]; the controller never
//! touches hardware.

pub mod context;
pub mod states;

use core::fmt;

use context::{Commands, FsmContext, Inputs};
use log::info;

use crate::config::AlarmConfig;
use crate::drivers::hw_timer::Tick;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Power-on attention blink.
    Startup = 0,
    /// Vehicle powered, pad empty.
    CarOnPhoneOff = 1,
    /// Vehicle powered, phone charging.
    CarOnPhoneOn = 2,
    /// Vehicle unpowered, phone still on the pad.
    CarOffPhoneOn = 3,
    /// Vehicle unpowered, pad empty.
    CarOffPhoneOff = 4,
}

impl StateId {
    pub const COUNT: usize = 5;

    pub const ALL: [StateId; Self::COUNT] = [
        Self::Startup,
        Self::CarOnPhoneOff,
        Self::CarOnPhoneOn,
        Self::CarOffPhoneOn,
        Self::CarOffPhoneOff,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Startup => "Startup",
            Self::CarOnPhoneOff => "CarOn_PhoneOff",
            Self::CarOnPhoneOn => "CarOn_PhoneOn",
            Self::CarOffPhoneOn => "CarOff_PhoneOn",
            Self::CarOffPhoneOff => "CarOff_PhoneOff",
        }
    }

    /// Vehicle half of the state; `None` for Startup.
    pub const fn car_on(self) -> Option<bool> {
        match self {
            Self::Startup => None,
            Self::CarOnPhoneOff | Self::CarOnPhoneOn => Some(true),
            Self::CarOffPhoneOn | Self::CarOffPhoneOff => Some(false),
        }
    }

    /// Pad half of the state; `None` for Startup.
    pub const fn phone_on(self) -> Option<bool> {
        match self {
            Self::Startup => None,
            Self::CarOnPhoneOn | Self::CarOffPhoneOn => Some(true),
            Self::CarOnPhoneOff | Self::CarOffPhoneOff => Some(false),
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Step (one tick's outcome)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// `(from, to)` when the state changed this tick.
    pub transition: Option<(StateId, StateId)>,
    /// LED actions, in order.
    pub commands: Commands,
    /// The alarm armed this tick.
    pub armed_now: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the current state and every piece of state-local data.
pub struct Controller {
    state: StateId,
    ctx: FsmContext,
}

impl Controller {
    /// A controller sitting in `Startup`.  Call [`start`](Self::start)
    /// before the first [`tick`](Self::tick).
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            state: StateId::Startup,
            ctx: FsmContext::new(config),
        }
    }

    /// Run Startup's enter action at `now`.
    pub fn start(&mut self, now: Tick) -> Commands {
        info!("FSM starting in state: {}", self.state);
        self.state = StateId::Startup;
        let mut cmds = Commands::new();
        states::on_enter(self.state, &mut self.ctx, now, &mut cmds);
        cmds
    }

    /// Advance by one tick with the latest sensor snapshot.
    pub fn tick(&mut self, now: Tick, phone_present: bool, voltage_mv: Option<u32>) -> Step {
        let inputs = Inputs {
            phone_present,
            voltage_mv,
            pattern_done: self.ctx.blink_done,
        };
        self.ctx.armed_now = false;

        let mut step = Step::default();
        match states::evaluate(self.state, &inputs, &self.ctx.config) {
            Some(next) => {
                let from = self.state;
                info!("FSM transition: {from} -> {next}");
                states::on_exit(from, &mut self.ctx, &mut step.commands);
                self.state = next;
                states::on_enter(next, &mut self.ctx, now, &mut step.commands);
                step.transition = Some((from, next));
            }
            None => {
                states::on_update(self.state, &mut self.ctx, now, &mut step.commands);
            }
        }

        step.armed_now = self.ctx.armed_now;
        if step.armed_now {
            info!("FSM: alarm armed in {}", self.state);
        }
        step
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    /// FastBlink is driving the LED.
    pub fn is_armed(&self) -> bool {
        self.ctx.alarm_active
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.ctx.config
    }
}
