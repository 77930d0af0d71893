//! Vehicle supply voltage sampler.
//!
//! The ADC is slow relative to the tick, so the supply is sampled on a
//! coarser cadence (every `sample_interval_ticks`) and the controller reads
//! the cached millivolt value in between.  A failed or timed-out conversion
//! keeps the last good value; the controller never sees a sensor error.

use log::{debug, warn};

use crate::config::AlarmConfig;
use crate::drivers::hw_timer::{Tick, ticks_between};
use crate::error::SensorError;

pub struct VoltageSampler {
    interval_ticks: u32,
    mv_per_code: u32,
    max_wait_us: u32,
    last_refresh: Option<Tick>,
    cached_mv: Option<u32>,
    refreshes: u32,
    fallbacks: u32,
}

impl VoltageSampler {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            interval_ticks: config.sample_interval_ticks.max(1),
            mv_per_code: config.adc_mv_per_code,
            max_wait_us: config.adc_max_wait_us,
            last_refresh: None,
            cached_mv: None,
            refreshes: 0,
            fallbacks: 0,
        }
    }

    /// Whether a conversion is due at `now`.  The first call is always due.
    pub fn is_due(&self, now: Tick) -> bool {
        self.last_refresh
            .is_none_or(|at| ticks_between(at, now) >= self.interval_ticks)
    }

    /// Sample through `convert` if the cadence has elapsed, then return the
    /// cached reading.
    ///
    /// `convert` receives the maximum wait in microseconds and must return
    /// within it.  On error the previous reading is kept and the failure is
    /// counted; the cadence still advances so a dead ADC is not retried
    /// every tick.
    pub fn maybe_refresh<F>(&mut self, now: Tick, convert: F) -> Option<u32>
    where
        F: FnOnce(u32) -> Result<u16, SensorError>,
    {
        if !self.is_due(now) {
            return self.cached_mv;
        }
        self.last_refresh = Some(now);

        match convert(self.max_wait_us) {
            Ok(raw) => {
                let mv = u32::from(raw).saturating_mul(self.mv_per_code);
                debug!("vsupply: raw={raw} -> {mv} mV");
                self.cached_mv = Some(mv);
                self.refreshes = self.refreshes.wrapping_add(1);
            }
            Err(e) => {
                self.fallbacks = self.fallbacks.wrapping_add(1);
                match self.cached_mv {
                    Some(mv) => warn!("vsupply: {e}, holding last good {mv} mV"),
                    None => warn!("vsupply: {e}, no reading yet"),
                }
            }
        }
        self.cached_mv
    }

    /// Latest good reading, `None` before the first successful conversion.
    pub fn current(&self) -> Option<u32> {
        self.cached_mv
    }

    /// Successful conversions since boot.
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    /// Conversions that failed and fell back to the cached value.
    pub fn fallbacks(&self) -> u32 {
        self.fallbacks
    }
}
