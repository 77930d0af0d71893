//! Hardware initialisation, tick timer, LED driver and blink patterns.

pub mod hw_init;
pub mod hw_timer;
pub mod led_patterns;
pub mod status_led;
pub mod watchdog;
