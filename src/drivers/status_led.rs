//! Single-colour status LED driver.
//!
//! One LEDC PWM channel drives the LED.  "On" means the fixed brightness
//! chosen at boot; the controller only ever switches it on, off or toggles.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty register via hw_init.
//! On host/test: hw_init stores the duty in an atomic.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLed {
    brightness: u8,
    lit: bool,
}

impl StatusLed {
    /// Create the driver and force the LED off.
    pub fn new(brightness: u8) -> Self {
        let mut led = Self {
            brightness,
            lit: true,
        };
        led.off();
        led
    }

    pub fn on(&mut self) {
        hw_init::ledc_set(pins::LEDC_CH_LED, self.brightness);
        self.lit = true;
    }

    pub fn off(&mut self) {
        hw_init::ledc_set(pins::LEDC_CH_LED, 0);
        self.lit = false;
    }

    pub fn toggle(&mut self) {
        if self.lit { self.off() } else { self.on() }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
