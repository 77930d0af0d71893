//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The LED stays reserved for
//! blink semantics; these events are the only diagnostic channel.

use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service entered its initial state.
    Started(StateId),

    /// The controller moved between states.
    StateChanged {
        from: StateId,
        to: StateId,
        phone_present: bool,
        voltage_mv: Option<u32>,
    },

    /// The arming delay elapsed in the risk state; fast blink begins.
    AlarmArmed,

    /// A voltage conversion failed and the last good value was kept.
    VoltageFallback { last_good_mv: Option<u32> },

    /// Periodic status snapshot.
    Heartbeat(StatusReport),
}

/// Point-in-time status suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub state: StateId,
    pub phone_present: bool,
    pub voltage_mv: Option<u32>,
    pub armed: bool,
    pub led_lit: bool,
    pub adc_fallbacks: u32,
    pub tick_overruns: u32,
    pub uptime_ticks: u32,
}
