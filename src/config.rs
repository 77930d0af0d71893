//! System configuration parameters
//!
//! Every tunable of the charge alarm lives here.  Values are fixed at build
//! time; there is no runtime configuration surface and nothing persists
//! across power loss.  All timing is expressed in ticks of `tick_period_us`.

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmConfig {
    // --- Timing ---
    /// Wall-clock length of one tick (microseconds).
    pub tick_period_us: u32,
    /// Voltage refresh cadence (ticks).
    pub sample_interval_ticks: u32,

    // --- Voltage thresholds (hysteresis band) ---
    /// Supply above this means the engine is running (mV).
    pub voltage_high_mv: u32,
    /// Supply below this means the engine is off (mV).
    pub voltage_low_mv: u32,

    // --- ADC ---
    /// Raw-code-to-millivolt calibration factor.
    pub adc_mv_per_code: u32,
    /// Upper bound on a single conversion before falling back (microseconds).
    pub adc_max_wait_us: u32,

    // --- Patterns ---
    /// Number of attention blinks played at power-on.
    pub startup_blinks: u8,
    /// Ticks between slow-blink toggles.
    pub slow_blink_interval_ticks: u32,
    /// Ticks between fast-blink toggles while alarming.
    pub fast_toggle_interval_ticks: u32,
    /// Length of each burst/quiet half of the alarm duty cycle (ticks).
    /// `None` toggles continuously once armed.
    pub fast_duty_window_ticks: Option<u32>,
    /// Ticks in `CarOff_PhoneOn` before the alarm becomes active.
    pub arming_delay_ticks: u32,

    // --- Indicator ---
    /// Static PWM duty of the LED when lit (0-255).
    pub led_brightness: u8,

    // --- Behaviour ---
    /// Leave Startup for `CarOff_PhoneOff` when booting on a low supply.
    pub startup_checks_voltage: bool,

    // --- Housekeeping ---
    /// Ticks between status heartbeats.
    pub heartbeat_interval_ticks: u32,
    /// Main-loop watchdog timeout (milliseconds).
    pub watchdog_timeout_ms: u32,
}

impl AlarmConfig {
    pub const DEFAULT: Self = Self {
        // Timing
        tick_period_us: 10_000,   // 10 ms
        sample_interval_ticks: 50, // 500 ms

        // Thresholds: alternator charging vs resting lead-acid
        voltage_high_mv: 14_600,
        voltage_low_mv: 14_300,

        // 12-bit code through a 1:5.6 divider, 16.38 V full scale
        adc_mv_per_code: 4,
        adc_max_wait_us: 500,

        // Patterns
        startup_blinks: 3,
        slow_blink_interval_ticks: 110,  // 1.1 s
        fast_toggle_interval_ticks: 2,   // 20 ms
        fast_duty_window_ticks: Some(100), // 1 s burst, 1 s quiet
        arming_delay_ticks: 1_500,       // 15 s

        // Indicator
        led_brightness: 0x14,

        startup_checks_voltage: true,

        // Housekeeping
        heartbeat_interval_ticks: 6_000, // 1/min
        watchdog_timeout_ms: 2_000,
    };

    /// Check the invariants the controller relies on.  Called once at boot.
    pub fn validate(&self) -> Result<()> {
        if self.tick_period_us == 0 {
            return Err(Error::Config("tick_period_us must be non-zero"));
        }
        if self.voltage_low_mv >= self.voltage_high_mv {
            return Err(Error::Config("voltage_low_mv must be below voltage_high_mv"));
        }
        if self.sample_interval_ticks == 0 {
            return Err(Error::Config("sample_interval_ticks must be non-zero"));
        }
        if self.adc_mv_per_code == 0 {
            return Err(Error::Config("adc_mv_per_code must be non-zero"));
        }
        if self.slow_blink_interval_ticks == 0 || self.fast_toggle_interval_ticks == 0 {
            return Err(Error::Config("blink intervals must be non-zero"));
        }
        if self.fast_duty_window_ticks == Some(0) {
            return Err(Error::Config("fast_duty_window_ticks must be non-zero when set"));
        }
        if self.heartbeat_interval_ticks == 0 {
            return Err(Error::Config("heartbeat_interval_ticks must be non-zero"));
        }
        let loop_period_ms = self.tick_period_us.div_ceil(1000);
        if self.watchdog_timeout_ms <= loop_period_ms {
            return Err(Error::Config("watchdog timeout shorter than one tick"));
        }
        Ok(())
    }

    /// Whole ticks covering `ms` milliseconds (rounded up, saturating).
    pub fn ticks_from_ms(&self, ms: u32) -> u32 {
        let ticks = (u64::from(ms) * 1000).div_ceil(u64::from(self.tick_period_us));
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Milliseconds spanned by `ticks`.
    pub fn ms_from_ticks(&self, ticks: u32) -> u64 {
        u64::from(ticks) * u64::from(self.tick_period_us) / 1000
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = assert!(
    AlarmConfig::DEFAULT.voltage_low_mv < AlarmConfig::DEFAULT.voltage_high_mv,
    "hysteresis band must not be empty"
);
