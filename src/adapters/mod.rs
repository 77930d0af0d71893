//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                    |
//! |------------|----------------|--------------------------------|
//! | `hardware` | SensorPort     | presence GPIO, supply ADC      |
//! |            | IndicatorPort  | LEDC status LED                |
//! | `log_sink` | EventSink      | Serial log output              |

pub mod hardware;
pub mod log_sink;
