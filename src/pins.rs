//! GPIO / peripheral pin assignments for the PhoneAlarm board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

use crate::sensors::presence::Polarity;

// ---------------------------------------------------------------------------
// Status LED (PWM)
// ---------------------------------------------------------------------------

/// LEDC output driving the status LED through a series resistor.
pub const LED_GPIO: i32 = 4;
/// LEDC channel reserved for the status LED.
pub const LEDC_CH_LED: u32 = 0;
/// LEDC frequency for the status LED (1 kHz).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// Presence sensor (IR reflective switch under the pad)
// ---------------------------------------------------------------------------

/// Digital input.  The sensor drives the line high while a phone covers
/// it.  The internal pull is chosen from the polarity (see
/// [`Polarity::idle_pull`]) so a disconnected sensor reads as absent.
pub const PRESENCE_GPIO: i32 = 5;
/// Raw level that means "phone on pad".
pub const PRESENCE_POLARITY: Polarity = Polarity::ActiveHigh;

// ---------------------------------------------------------------------------
// Vehicle supply sense (ADC1)
// ---------------------------------------------------------------------------

/// Resistive divider tap on the 12 V rail.  ADC1 channel 2 (GPIO 3 on ESP32-S3).
pub const VSUPPLY_ADC_GPIO: i32 = 3;
pub const ADC1_CH_VSUPPLY: u32 = 2;

// ---------------------------------------------------------------------------
// Tick timer
// ---------------------------------------------------------------------------

/// gptimer counting resolution.  The alarm count is derived from this,
/// so changing it does not change the tick period.
pub const TICK_TIMER_RESOLUTION_HZ: u32 = 1_000_000;
