//! Hardware adapter: bridges real peripherals to the domain port traits.
//!
//! Owns the presence detector and the status LED and forwards voltage
//! conversions to the bounded ADC read, exposing them through
//! [`SensorPort`] and [`IndicatorPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs.

use embedded_hal::digital::InputPin;

use crate::app::ports::{IndicatorPort, SensorPort};
use crate::drivers::hw_init::{self, GpioInput};
use crate::drivers::status_led::StatusLed;
use crate::error::SensorError;
use crate::sensors::presence::PresenceDetector;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P = GpioInput> {
    presence: PresenceDetector<P>,
    led: StatusLed,
}

impl<P: InputPin> HardwareAdapter<P> {
    pub fn new(presence: PresenceDetector<P>, led: StatusLed) -> Self {
        Self { presence, led }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: InputPin> SensorPort for HardwareAdapter<P> {
    fn phone_present(&mut self) -> bool {
        self.presence.is_present()
    }

    fn sample_voltage_raw(&mut self, max_wait_us: u32) -> Result<u16, SensorError> {
        hw_init::adc_read_bounded(max_wait_us)
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<P: InputPin> IndicatorPort for HardwareAdapter<P> {
    fn on(&mut self) {
        self.led.on();
    }

    fn off(&mut self) {
        self.led.off();
    }

    fn toggle(&mut self) {
        self.led.toggle();
    }

    fn is_lit(&self) -> bool {
        self.led.is_lit()
    }
}
