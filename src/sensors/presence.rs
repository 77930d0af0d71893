//! Phone-on-pad presence detector.
//!
//! An IR reflective switch under the charging pad changes level when a
//! phone covers it.  Which raw level means "present" depends on the sensor
//! variant, so the detector resolves polarity once here and the rest of
//! the firmware only ever sees `phone_present`.
//!
//! No debouncing: the controller re-reads every tick and no transition is
//! sticky, so a single bad read corrects itself on the next tick.

use embedded_hal::digital::{Error as _, InputPin};
use log::warn;

/// Raw pin level that means "phone on pad".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// Internal pull resistor direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

impl Polarity {
    /// Pull toward the inactive level so an open sensor reads as absent.
    pub const fn idle_pull(self) -> Pull {
        match self {
            Self::ActiveHigh => Pull::Down,
            Self::ActiveLow => Pull::Up,
        }
    }

    /// Map a raw level to presence.
    pub const fn is_active(self, level_high: bool) -> bool {
        match self {
            Self::ActiveHigh => level_high,
            Self::ActiveLow => !level_high,
        }
    }
}

pub struct PresenceDetector<P> {
    pin: P,
    polarity: Polarity,
    read_failed: bool,
}

impl<P: InputPin> PresenceDetector<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self {
            pin,
            polarity,
            read_failed: false,
        }
    }

    /// `true` when a phone rests on the pad.
    ///
    /// A pin error reads as absent, the same as an open sensor.  Only the
    /// first failure of a run is logged.
    pub fn is_present(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => {
                self.read_failed = false;
                self.polarity.is_active(high)
            }
            Err(e) => {
                if !self.read_failed {
                    warn!("presence: GPIO read failed ({:?}), reporting absent", e.kind());
                }
                self.read_failed = true;
                false
            }
        }
    }
}
