//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the state machine and the voltage sampler.  It
//! exposes a hardware-agnostic API; all I/O flows through port traits
//! injected at call sites, so the whole service is testable with mocks.
//!
//! ```text
//!  SensorPort ────▶ ┌────────────────────────────┐ ──▶ EventSink
//!                   │        AppService          │
//!  IndicatorPort ◀──│  Sampler · Controller      │
//!                   └────────────────────────────┘
//!                              ▲
//!                        TickSource (ISR)
//! ```

use log::{info, warn};

use crate::config::AlarmConfig;
use crate::drivers::hw_timer::{Tick, TickSource, ticks_between};
use crate::drivers::led_patterns::LedCommand;
use crate::fsm::{Controller, StateId, Step};
use crate::sensors::voltage::VoltageSampler;

use super::events::{AppEvent, StatusReport};
use super::ports::{EventSink, IndicatorPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: AlarmConfig,
    controller: Controller,
    sampler: VoltageSampler,
    phone_present: bool,
    started_at: Tick,
    last_heartbeat: Tick,
    last_tick: Tick,
    tick_overruns: u32,
}

impl AppService {
    /// Construct the service.  Does **not** start the controller; call
    /// [`start`](Self::start) next.
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            controller: Controller::new(config),
            sampler: VoltageSampler::new(&config),
            config,
            phone_present: false,
            started_at: 0,
            last_heartbeat: 0,
            last_tick: 0,
            tick_overruns: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Startup` at tick `now`.
    pub fn start(&mut self, now: Tick, led: &mut impl IndicatorPort, sink: &mut impl EventSink) {
        self.started_at = now;
        self.last_heartbeat = now;
        self.last_tick = now;
        let cmds = self.controller.start(now);
        apply(led, cmds.as_slice());
        sink.emit(&AppEvent::Started(self.controller.state()));
        info!("AppService started in {}", self.controller.state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle if the tick source has signalled a new tick.
    ///
    /// Returns `true` when a cycle ran.  Ticks that fired while the loop
    /// was busy are collapsed into this one; the patterns catch up from
    /// elapsed time.
    pub fn poll(
        &mut self,
        ticks: &TickSource,
        hw: &mut (impl SensorPort + IndicatorPort),
        sink: &mut impl EventSink,
    ) -> bool {
        if !ticks.tick_elapsed() {
            return false;
        }
        let overruns = ticks.overruns();
        if overruns != self.tick_overruns {
            warn!(
                "tick overrun: loop missed {} tick(s) ({} total)",
                overruns.wrapping_sub(self.tick_overruns),
                overruns
            );
            self.tick_overruns = overruns;
        }
        self.run_cycle(ticks.now(), hw, sink);
        true
    }

    /// One full cycle at tick `now`: sample → evaluate → indicator → events.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`IndicatorPort`] to avoid a double mutable borrow.
    pub fn run_cycle(
        &mut self,
        now: Tick,
        hw: &mut (impl SensorPort + IndicatorPort),
        sink: &mut impl EventSink,
    ) -> Step {
        self.last_tick = now;

        // 1. Voltage, on its own cadence
        let fallbacks = self.sampler.fallbacks();
        let voltage_mv = self
            .sampler
            .maybe_refresh(now, |max_wait_us| hw.sample_voltage_raw(max_wait_us));
        if self.sampler.fallbacks() != fallbacks {
            sink.emit(&AppEvent::VoltageFallback {
                last_good_mv: voltage_mv,
            });
        }

        // 2. Presence, every tick
        self.phone_present = hw.phone_present();

        // 3. Controller
        let step = self.controller.tick(now, self.phone_present, voltage_mv);

        // 4. Indicator
        apply(hw, step.commands.as_slice());

        // 5. Events
        if let Some((from, to)) = step.transition {
            sink.emit(&AppEvent::StateChanged {
                from,
                to,
                phone_present: self.phone_present,
                voltage_mv,
            });
        }
        if step.armed_now {
            sink.emit(&AppEvent::AlarmArmed);
        }
        if ticks_between(self.last_heartbeat, now) >= self.config.heartbeat_interval_ticks {
            self.last_heartbeat = now;
            sink.emit(&AppEvent::Heartbeat(self.build_status(hw.is_lit())));
        }

        step
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot for heartbeats and diagnostics.
    pub fn build_status(&self, led_lit: bool) -> StatusReport {
        StatusReport {
            state: self.controller.state(),
            phone_present: self.phone_present,
            voltage_mv: self.sampler.current(),
            armed: self.controller.is_armed(),
            led_lit,
            adc_fallbacks: self.sampler.fallbacks(),
            tick_overruns: self.tick_overruns,
            uptime_ticks: ticks_between(self.started_at, self.last_tick),
        }
    }

    pub fn state(&self) -> StateId {
        self.controller.state()
    }

    /// Cached supply voltage.
    pub fn voltage_mv(&self) -> Option<u32> {
        self.sampler.current()
    }

    pub fn is_armed(&self) -> bool {
        self.controller.is_armed()
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }
}

/// Translate controller commands into indicator calls.
fn apply(led: &mut impl IndicatorPort, cmds: &[LedCommand]) {
    for cmd in cmds {
        match cmd {
            LedCommand::Off => led.off(),
            LedCommand::Toggle => led.toggle(),
        }
    }
}
