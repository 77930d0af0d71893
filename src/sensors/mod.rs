//! Sensor inputs to the controller.
//!
//! - [`presence`]: phone-on-pad digital input, polarity resolved.
//! - [`voltage`]: cadence-limited, cached supply voltage.

pub mod presence;
pub mod voltage;
