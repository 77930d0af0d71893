//! Blink pattern generators for the single status LED.
//!
//! Both generators are deterministic functions of the ticks elapsed since
//! they were started.  They never read the LED; they emit [`LedCommand`]s
//! that the caller applies to the indicator.
//!
//! | Pattern    | Use                         | Timing (defaults)                  |
//! |------------|-----------------------------|------------------------------------|
//! | SlowBlink  | power-on attention, N blinks| one toggle per 1.1 s, 2N toggles   |
//! | FastBlink  | alarm in the risk state     | toggle every 20 ms, 1 s on / 1 s off|
//!
//! Missed ticks do not shift a pattern: toggles are derived from elapsed
//! time, and at most one toggle is emitted per poll.

use super::hw_timer::{Tick, ticks_between};

/// Indicator actions produced by patterns and the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    Off,
    Toggle,
}

// ═══════════════════════════════════════════════════════════════
//  SlowBlink
// ═══════════════════════════════════════════════════════════════

/// Result of one [`SlowBlink::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlowBlinkStep {
    /// Toggle the LED this tick.
    pub toggle: bool,
    /// All `2N` toggles have been emitted; the generator has reset itself.
    pub done: bool,
}

/// Plays `N` blinks (`2N` toggles), one toggle per interval.
#[derive(Debug, Clone)]
pub struct SlowBlink {
    interval_ticks: u32,
    started_at: Option<Tick>,
    toggles: u16,
    target_toggles: u16,
}

impl SlowBlink {
    pub fn new(interval_ticks: u32) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            started_at: None,
            toggles: 0,
            target_toggles: 0,
        }
    }

    /// (Re)start with `blinks` blinks.  The first toggle is due immediately.
    pub fn start(&mut self, blinks: u8, now: Tick) {
        self.started_at = Some(now);
        self.toggles = 0;
        self.target_toggles = u16::from(blinks) * 2;
    }

    /// Abandon the pattern and zero the counters.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.toggles = 0;
        self.target_toggles = 0;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Toggles emitted since the last start.
    pub fn toggles(&self) -> u16 {
        self.toggles
    }

    /// Advance to `now`.
    ///
    /// Reports `done` on the first poll after the final toggle and resets
    /// itself, so it can be restarted with any count.  A generator that is
    /// not running does nothing.
    pub fn poll(&mut self, now: Tick) -> SlowBlinkStep {
        let Some(origin) = self.started_at else {
            return SlowBlinkStep::default();
        };

        if self.toggles >= self.target_toggles {
            self.reset();
            return SlowBlinkStep { toggle: false, done: true };
        }

        let elapsed = ticks_between(origin, now);
        let due = (elapsed / self.interval_ticks).saturating_add(1);
        if due > u32::from(self.toggles) {
            self.toggles += 1;
            return SlowBlinkStep { toggle: true, done: false };
        }

        SlowBlinkStep::default()
    }
}

// ═══════════════════════════════════════════════════════════════
//  FastBlink
// ═══════════════════════════════════════════════════════════════

/// Alarm flicker: forced off until armed, then toggles at a fixed
/// interval, optionally gated by alternating burst/quiet windows.
#[derive(Debug, Clone)]
pub struct FastBlink {
    toggle_interval_ticks: u32,
    duty_window_ticks: Option<u32>,
    started_at: Option<Tick>,
    last_slot: Option<u32>,
}

impl FastBlink {
    pub fn new(toggle_interval_ticks: u32, duty_window_ticks: Option<u32>) -> Self {
        Self {
            toggle_interval_ticks: toggle_interval_ticks.max(1),
            duty_window_ticks: duty_window_ticks.map(|w| w.max(1)),
            started_at: None,
            last_slot: None,
        }
    }

    /// Begin the burst timeline at `now`.
    pub fn start(&mut self, now: Tick) {
        self.started_at = Some(now);
        self.last_slot = None;
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.last_slot = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether `now` falls in a toggling window.
    pub fn in_burst(&self, now: Tick) -> bool {
        let Some(origin) = self.started_at else {
            return false;
        };
        match self.duty_window_ticks {
            Some(window) => (ticks_between(origin, now) / window) % 2 == 0,
            None => true,
        }
    }

    /// Command for this tick.  While `armed` is false the LED is forced off
    /// and the timeline does not advance.  Starts itself on the first
    /// armed poll.
    pub fn poll(&mut self, now: Tick, armed: bool) -> Option<LedCommand> {
        if !armed {
            self.reset();
            return Some(LedCommand::Off);
        }
        if !self.is_running() {
            self.start(now);
        }

        if !self.in_burst(now) {
            self.last_slot = None;
            return Some(LedCommand::Off);
        }

        let origin = self.started_at.unwrap_or(now);
        let slot = ticks_between(origin, now) / self.toggle_interval_ticks;
        if self.last_slot == Some(slot) {
            return None;
        }
        self.last_slot = Some(slot);
        Some(LedCommand::Toggle)
    }
}
