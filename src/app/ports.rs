//! Port traits: the boundary between the alarm logic and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, indicator, event sinks) implement these
//! traits.  The [`AppService`](super::service::AppService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: presence and raw supply voltage.
pub trait SensorPort {
    /// `true` when a phone rests on the pad, polarity already resolved.
    fn phone_present(&mut self) -> bool;

    /// One blocking ADC conversion of the supply divider.
    ///
    /// Must return within `max_wait_us`, with
    /// [`SensorError::AdcTimeout`] if the conversion has not completed.
    fn sample_voltage_raw(&mut self, max_wait_us: u32) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The single status LED.  Brightness is fixed at bring-up.
pub trait IndicatorPort {
    fn on(&mut self);

    fn off(&mut self);

    fn toggle(&mut self);

    /// Last commanded level.
    fn is_lit(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
