//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `14.52V` style rendering, `?` before the first reading.
struct Volts(Option<u32>);

impl core::fmt::Display for Volts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(mv) => write!(f, "{}.{:02}V", mv / 1000, (mv % 1000) / 10),
            None => f.write_str("?"),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged {
                from,
                to,
                phone_present,
                voltage_mv,
            } => {
                info!(
                    "STATE | {} -> {} | phone={} | vsupply={}",
                    from,
                    to,
                    if *phone_present { "ON" } else { "OFF" },
                    Volts(*voltage_mv),
                );
            }
            AppEvent::AlarmArmed => {
                info!("ARMED | phone left charging with engine off, alarming");
            }
            AppEvent::VoltageFallback { last_good_mv } => {
                warn!("ADC   | conversion failed, holding {}", Volts(*last_good_mv));
            }
            AppEvent::Heartbeat(s) => {
                info!(
                    "STATUS | state={} | phone={} | vsupply={} | armed={} | led={} | \
                     adc_fallbacks={} | overruns={} | uptime={} ticks",
                    s.state,
                    if s.phone_present { "ON" } else { "OFF" },
                    Volts(s.voltage_mv),
                    s.armed,
                    if s.led_lit { "on" } else { "off" },
                    s.adc_fallbacks,
                    s.tick_overruns,
                    s.uptime_ticks,
                );
            }
        }
    }
}
