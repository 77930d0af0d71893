//! Application core: alarm orchestration with zero direct I/O.
//!
//! The service wires the tick source, the voltage sampler and the state
//! machine together.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
