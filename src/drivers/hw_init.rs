//! One-shot hardware peripheral initialization.
//!
//! Configures the presence input, the supply-sense ADC channel and the LEDC
//! channel for the status LED using raw ESP-IDF sys calls.  Called once from
//! `main()` before the control loop starts.
//!
//! ## Dual-target design
//!
//! On ESP-IDF every accessor talks to the peripheral.  On host/test the
//! same functions read and write atomics so the adapters can be exercised
//! without hardware (`sim_*` helpers inject values).

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::error::SensorError;
use crate::pins;

#[cfg(target_os = "espidf")]
use crate::sensors::presence::Pull;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    TimerStartFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::TimerStartFailed(rc) => write!(f, "tick timer start failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_presence_input()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): peripheral init skipped (presence pull {:?}, vsupply GPIO{})",
        pins::PRESENCE_POLARITY.idle_pull(),
        pins::VSUPPLY_ADC_GPIO
    );
    Ok(())
}

// ── ADC (continuous, supply sense) ────────────────────────────
//
// The oneshot driver blocks inside the conversion with no caller-side
// bound.  The continuous driver is started for each read and its frame
// queue is polled without blocking, so the loop owns the deadline.

/// Bytes per conversion result in the DMA frame (TYPE2 format).
const ADC_RESULT_BYTES: usize = 4;
/// DMA frame size; must be a multiple of `ADC_RESULT_BYTES`.
#[cfg(target_os = "espidf")]
const ADC_FRAME_BYTES: usize = 64;

/// Latest raw code for `channel` in a TYPE2 continuous-mode frame.
///
/// Each result is a little-endian word: data in bits 0..=11, channel in
/// bits 13..=16.  Trailing partial results are ignored.
pub fn decode_frame(frame: &[u8], channel: u32) -> Option<u16> {
    frame
        .chunks_exact(ADC_RESULT_BYTES)
        .filter_map(|b| <[u8; ADC_RESULT_BYTES]>::try_from(b).ok())
        .map(u32::from_le_bytes)
        .filter(|word| (word >> 13) & 0xF == channel)
        .map(|word| (word & 0xFFF) as u16)
        .next_back()
}

/// Poll `poll` until it yields a sample or `max_wait_us` has passed on
/// `now_us`.
///
/// `poll` returns `Ok(None)` while no result is ready.  It is called at
/// least once, even with a zero bound.  Errors from `poll` end the wait.
pub fn wait_for_sample(
    max_wait_us: u32,
    mut now_us: impl FnMut() -> i64,
    mut poll: impl FnMut() -> Result<Option<u16>, SensorError>,
) -> Result<u16, SensorError> {
    let deadline = now_us().saturating_add(i64::from(max_wait_us));
    loop {
        if let Some(raw) = poll()? {
            return Ok(raw);
        }
        if now_us() >= deadline {
            return Err(SensorError::AdcTimeout);
        }
    }
}

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_continuous_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_continuous_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let handle_cfg = adc_continuous_handle_cfg_t {
        max_store_buf_size: (ADC_FRAME_BYTES * 4) as u32,
        conv_frame_size: ADC_FRAME_BYTES as u32,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_continuous_new_handle(&handle_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let mut pattern = adc_digi_pattern_config_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12 as u8,
        channel: pins::ADC1_CH_VSUPPLY as u8,
        unit: adc_unit_t_ADC_UNIT_1 as u8,
        bit_width: adc_bitwidth_t_ADC_BITWIDTH_12 as u8,
    };
    let cfg = adc_continuous_config_t {
        pattern_num: 1,
        adc_pattern: &mut pattern,
        sample_freq_hz: 20_000,
        conv_mode: adc_digi_convert_mode_t_ADC_CONV_SINGLE_UNIT_1,
        format: adc_digi_output_format_t_ADC_DIGI_OUTPUT_FORMAT_TYPE2,
    };
    let ret = unsafe { adc_continuous_config(adc1_handle(), &cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!(
        "hw_init: ADC1 CH{} on GPIO{} configured (vsupply)",
        pins::ADC1_CH_VSUPPLY,
        pins::VSUPPLY_ADC_GPIO
    );
    Ok(())
}

/// One conversion of the supply divider, bounded by `max_wait_us`.
///
/// Starts the converter, polls the frame queue with a zero timeout until a
/// result for the supply channel arrives or the deadline on
/// `esp_timer_get_time` passes, then stops the converter again.  A stuck
/// conversion therefore costs at most `max_wait_us` of loop time.
#[cfg(target_os = "espidf")]
pub fn adc_read_bounded(max_wait_us: u32) -> Result<u16, SensorError> {
    // SAFETY: adc1_handle() contract: single-threaded main-loop access only.
    let handle = unsafe { adc1_handle() };
    if unsafe { adc_continuous_start(handle) } != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }

    let mut frame = [0u8; ADC_FRAME_BYTES];
    let result = wait_for_sample(
        max_wait_us,
        // SAFETY: esp_timer_get_time is a plain counter read.
        || unsafe { esp_timer_get_time() },
        || {
            let mut len: u32 = 0;
            // SAFETY: `frame` outlives the call; zero timeout never blocks.
            let ret = unsafe {
                adc_continuous_read(handle, frame.as_mut_ptr(), frame.len() as u32, &mut len, 0)
            };
            if ret == ESP_ERR_TIMEOUT as i32 {
                return Ok(None);
            }
            if ret != ESP_OK as i32 {
                return Err(SensorError::AdcReadFailed);
            }
            Ok(decode_frame(&frame[..len as usize], pins::ADC1_CH_VSUPPLY))
        },
    );

    // SAFETY: same handle, same task.
    unsafe {
        adc_continuous_stop(handle);
    }
    result
}

#[cfg(not(target_os = "espidf"))]
static SIM_VSUPPLY_RAW: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_ADC_STALLED: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_vsupply_raw(raw: u16) {
    SIM_VSUPPLY_RAW.store(raw, Ordering::Relaxed);
}

/// Make every simulated conversion hang until the wait bound expires.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_stalled(stalled: bool) {
    SIM_ADC_STALLED.store(stalled, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn adc_read_bounded(max_wait_us: u32) -> Result<u16, SensorError> {
    let origin = std::time::Instant::now();
    wait_for_sample(
        max_wait_us,
        || i64::try_from(origin.elapsed().as_micros()).unwrap_or(i64::MAX),
        || {
            if SIM_ADC_STALLED.load(Ordering::Relaxed) {
                Ok(None)
            } else {
                Ok(Some(SIM_VSUPPLY_RAW.load(Ordering::Relaxed)))
            }
        },
    )
}

// ── GPIO input (presence) ─────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_presence_input() -> Result<(), HwInitError> {
    let (pull_up_en, pull_down_en) = match pins::PRESENCE_POLARITY.idle_pull() {
        Pull::Up => (
            gpio_pullup_t_GPIO_PULLUP_ENABLE,
            gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        ),
        Pull::Down => (
            gpio_pullup_t_GPIO_PULLUP_DISABLE,
            gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        ),
    };
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::PRESENCE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en,
        pull_down_en,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!(
        "hw_init: presence input GPIO{} ({:?}, pull {:?})",
        pins::PRESENCE_GPIO,
        pins::PRESENCE_POLARITY,
        pins::PRESENCE_POLARITY.idle_pull()
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
static SIM_PRESENCE_HIGH: AtomicBool = AtomicBool::new(false);

/// Drive the simulated presence line to a raw level.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_presence_level(high: bool) {
    SIM_PRESENCE_HIGH.store(high, Ordering::Relaxed);
}

/// A configured GPIO input exposed through `embedded-hal`.
pub struct GpioInput {
    pin: i32,
}

impl GpioInput {
    /// Wrap a pin already configured by [`init_peripherals`].
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    #[cfg(target_os = "espidf")]
    fn level(&self) -> bool {
        // SAFETY: gpio_get_level is a read-only register access on an
        // already-configured input pin.
        (unsafe { gpio_get_level(self.pin) }) != 0
    }

    #[cfg(not(target_os = "espidf"))]
    fn level(&self) -> bool {
        SIM_PRESENCE_HIGH.load(Ordering::Relaxed)
    }
}

impl ErrorType for GpioInput {
    type Error = Infallible;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

// ── LEDC PWM (status LED) ─────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // SAFETY: Called from single main-task context via init_peripherals().
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: pins::LEDC_CH_LED,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::LED_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!("hw_init: LEDC CH{} on GPIO{} (status LED)", pins::LEDC_CH_LED, pins::LED_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: the LED channel was configured in init_ledc(); duty register
    // writes are race-free since only the main loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_LED_DUTY: AtomicU8 = AtomicU8::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, duty: u8) {
    SIM_LED_DUTY.store(duty, Ordering::Relaxed);
}

/// Duty last written to the simulated LED channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_led_duty() -> u8 {
    SIM_LED_DUTY.load(Ordering::Relaxed)
}
