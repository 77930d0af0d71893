//! Mock hardware adapter for integration tests.
//!
//! Records every indicator call so tests can assert on the full LED
//! history without touching real GPIO/PWM registers.  Sensor values are
//! plain fields the test rewrites between ticks.

use phonealarm::app::events::AppEvent;
use phonealarm::app::ports::{EventSink, IndicatorPort, SensorPort};
use phonealarm::app::service::AppService;
use phonealarm::config::AlarmConfig;
use phonealarm::drivers::hw_timer::Tick;
use phonealarm::error::SensorError;
use phonealarm::fsm::StateId;

/// Raw ADC code for `mv` at the default calibration.
pub fn raw_for_mv(mv: u32) -> u16 {
    (mv / AlarmConfig::DEFAULT.adc_mv_per_code) as u16
}

// ── Indicator call record ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCall {
    On,
    Off,
    Toggle,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub present: bool,
    /// `None` makes every conversion time out.
    pub raw: Option<u16>,
    pub lit: bool,
    pub calls: Vec<(Tick, LedCall)>,
    pub conversions: u32,
    pub last_wait_us: Option<u32>,
    /// Tick stamped onto recorded calls; set by [`Rig`].
    pub now: Tick,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(present: bool, mv: u32) -> Self {
        Self {
            present,
            raw: Some(raw_for_mv(mv)),
            lit: false,
            calls: Vec::new(),
            conversions: 0,
            last_wait_us: None,
            now: 0,
        }
    }

    pub fn set_mv(&mut self, mv: u32) {
        self.raw = Some(raw_for_mv(mv));
    }

    /// Ticks at which the LED was toggled or switched on.
    pub fn activity_ticks(&self) -> Vec<Tick> {
        self.calls
            .iter()
            .filter(|(_, c)| *c != LedCall::Off)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl SensorPort for MockHardware {
    fn phone_present(&mut self) -> bool {
        self.present
    }

    fn sample_voltage_raw(&mut self, max_wait_us: u32) -> Result<u16, SensorError> {
        self.conversions += 1;
        self.last_wait_us = Some(max_wait_us);
        self.raw.ok_or(SensorError::AdcTimeout)
    }
}

impl IndicatorPort for MockHardware {
    fn on(&mut self) {
        self.lit = true;
        self.calls.push((self.now, LedCall::On));
    }

    fn off(&mut self) {
        self.lit = false;
        self.calls.push((self.now, LedCall::Off));
    }

    fn toggle(&mut self) {
        self.lit = !self.lit;
        self.calls.push((self.now, LedCall::Toggle));
    }

    fn is_lit(&self) -> bool {
        self.lit
    }
}

// ── LogSink (records events) ──────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig: service + mocks + clock ──────────────────────────────

pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub sink: LogSink,
    pub now: Tick,
}

#[allow(dead_code)]
impl Rig {
    pub fn start(present: bool, mv: u32) -> Self {
        Self::start_with(AlarmConfig::DEFAULT, present, mv)
    }

    pub fn start_with(config: AlarmConfig, present: bool, mv: u32) -> Self {
        let mut rig = Self {
            app: AppService::new(config),
            hw: MockHardware::new(present, mv),
            sink: LogSink::new(),
            now: 0,
        };
        rig.app.start(rig.now, &mut rig.hw, &mut rig.sink);
        rig
    }

    /// Run one cycle at the current tick, then advance the clock.
    pub fn step(&mut self) {
        self.hw.now = self.now;
        self.app.run_cycle(self.now, &mut self.hw, &mut self.sink);
        self.now = self.now.wrapping_add(1);
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until `state` is reached; returns the tick it was entered on.
    pub fn run_until_state(&mut self, state: StateId, limit: u32) -> Option<Tick> {
        for _ in 0..limit {
            let at = self.now;
            self.step();
            if self.app.state() == state {
                return Some(at);
            }
        }
        None
    }

    /// Settle into `CarOn_PhoneOff` through a full startup pattern.
    pub fn settled_car_on() -> Self {
        let mut rig = Self::start(false, 15_000);
        rig.run_until_state(StateId::CarOnPhoneOff, 1_000);
        rig
    }
}
