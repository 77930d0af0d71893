//! Tick source driven by a hardware periodic timer.
//!
//! The timer interrupt does two things only: bump the tick counter and
//! raise the "tick elapsed" flag.  Everything else runs in the main loop,
//! which consumes the flag once per iteration.
//!
//! ```text
//!  gptimer alarm ──▶ on_interrupt() ──▶ count += 1, pending = true
//!                                              │
//!  main loop ◀── tick_elapsed() / now() ◀──────┤
//!      ▲                                       │
//!      └──── wait_for_tick() ◀── task notify ◀──┘
//! ```
//!
//! The loop sleeps in [`wait_for_tick`] on a FreeRTOS task notification
//! given by the ISR, so it wakes once per hardware tick regardless of the
//! RTOS tick rate.
//!
//! ## Wrap policy
//!
//! The counter is a free-running `u32` that wraps at `u32::MAX`.  Nothing
//! reads it modulo anything: patterns and the arming delay capture an
//! origin tick and use [`ticks_between`], which is wrap-safe.  At 10 ms per
//! tick the counter wraps after ~497 days.
//!
//! The counter is a single 32-bit atomic, so the main loop can never
//! observe a torn update.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::TimerError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// One timing unit (~10 ms).
pub type Tick = u32;

/// Ticks from `origin` to `now`, correct across a counter wrap.
pub const fn ticks_between(origin: Tick, now: Tick) -> u32 {
    now.wrapping_sub(origin)
}

// ---------------------------------------------------------------------------
// Timer plan: clock-independent tick period
// ---------------------------------------------------------------------------

/// Alarm programming for one tick at a given timer clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPlan {
    /// Timer counting frequency.
    pub resolution_hz: u32,
    /// Counts between alarms.
    pub alarm_count: u32,
}

impl TimerPlan {
    /// Compute the alarm count that makes one tick last `period_us` at
    /// `resolution_hz`, rounded to the nearest count.
    pub fn for_clock(resolution_hz: u32, period_us: u32) -> Result<Self, TimerError> {
        let counts = (u64::from(resolution_hz) * u64::from(period_us) + 500_000) / 1_000_000;
        if counts == 0 {
            return Err(TimerError::PeriodTooShort);
        }
        let alarm_count = u32::try_from(counts).map_err(|_| TimerError::PeriodTooLong)?;
        Ok(Self {
            resolution_hz,
            alarm_count,
        })
    }

    /// Tick period actually produced after rounding (nanoseconds).
    pub fn achieved_period_ns(&self) -> u64 {
        u64::from(self.alarm_count) * 1_000_000_000 / u64::from(self.resolution_hz)
    }
}

// ---------------------------------------------------------------------------
// Tick source
// ---------------------------------------------------------------------------

/// Single-writer (ISR) / single-reader (main loop) tick counter.
pub struct TickSource {
    count: AtomicU32,
    pending: AtomicBool,
    overruns: AtomicU32,
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
            pending: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
        }
    }

    /// Interrupt body.  Lock-free, no sensor access, no blocking.
    pub fn on_interrupt(&self) {
        self.count.fetch_add(1, Ordering::Release);
        if self.pending.swap(true, Ordering::Release) {
            // The loop did not consume the previous tick in time.
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// `true` exactly once per elapsed interval; clears the flag.
    pub fn tick_elapsed(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }

    /// A tick is waiting to be consumed.  Does not clear the flag.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Current tick count.
    pub fn now(&self) -> Tick {
        self.count.load(Ordering::Acquire)
    }

    /// Ticks elapsed since `origin`.
    pub fn ticks_since(&self, origin: Tick) -> u32 {
        ticks_between(origin, self.now())
    }

    /// Ticks that fired while the previous one was still pending.
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

/// The tick source fed by the hardware timer.
pub static SYSTEM_TICKS: TickSource = TickSource::new();

// ---------------------------------------------------------------------------
// Hardware timer (ESP-IDF gptimer)
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: gptimer_handle_t = core::ptr::null_mut();

/// Task woken by every tick; set by [`start_tick_timer`].
#[cfg(target_os = "espidf")]
static TICK_TASK: core::sync::atomic::AtomicPtr<tskTaskControlBlock> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_alarm_cb(
    _timer: gptimer_handle_t,
    _edata: *const gptimer_alarm_event_data_t,
    _ctx: *mut core::ffi::c_void,
) -> bool {
    SYSTEM_TICKS.on_interrupt();

    let task = TICK_TASK.load(Ordering::Acquire);
    if task.is_null() {
        return false;
    }
    let mut woken: BaseType_t = 0;
    // SAFETY: ISR-safe notify on a task handle that lives for the whole
    // program (the main task never exits).
    unsafe { vTaskGenericNotifyGiveFromISR(task, 0, &mut woken) };
    woken != 0
}

/// Block until the tick ISR fires or `timeout_ms` passes.
///
/// Returns `true` when a tick is waiting.  Ticks that arrive while the loop
/// is busy collapse into one notification; the overrun counter on
/// [`TickSource`] still records them.
#[cfg(target_os = "espidf")]
pub fn wait_for_tick(ticks: &TickSource, timeout_ms: u32) -> bool {
    if ticks.is_pending() {
        return true;
    }
    let rtos_ticks = (u64::from(timeout_ms) * u64::from(configTICK_RATE_HZ)).div_ceil(1000).max(1);
    // SAFETY: waits on the calling task's own notification slot 0.
    let taken = unsafe { ulTaskGenericNotifyTake(0, 1, rtos_ticks as TickType_t) };
    taken != 0 || ticks.is_pending()
}

/// Host stand-in for [`wait_for_tick`]: yields until a tick is pending or
/// the timeout passes.
#[cfg(not(target_os = "espidf"))]
pub fn wait_for_tick(ticks: &TickSource, timeout_ms: u32) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(u64::from(timeout_ms));
    while !ticks.is_pending() {
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::yield_now();
    }
    true
}

/// Start the periodic tick interrupt.
#[cfg(target_os = "espidf")]
pub fn start_tick_timer(plan: &TimerPlan) -> Result<(), crate::drivers::hw_init::HwInitError> {
    use crate::drivers::hw_init::HwInitError;

    // SAFETY: TICK_TIMER is written here once at boot from the single
    // main-task context before the alarm callback can fire.  The callback
    // only touches the atomics inside SYSTEM_TICKS and notifies TICK_TASK.
    unsafe {
        TICK_TASK.store(xTaskGetCurrentTaskHandle(), Ordering::Release);

        let cfg = gptimer_config_t {
            clk_src: soc_periph_gptimer_clk_src_t_GPTIMER_CLK_SRC_DEFAULT,
            direction: gptimer_count_direction_t_GPTIMER_COUNT_UP,
            resolution_hz: plan.resolution_hz,
            ..Default::default()
        };
        let ret = gptimer_new_timer(&cfg, &raw mut TICK_TIMER);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerStartFailed(ret));
        }

        let cbs = gptimer_event_callbacks_t {
            on_alarm: Some(tick_alarm_cb),
        };
        let ret = gptimer_register_event_callbacks(TICK_TIMER, &cbs, core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerStartFailed(ret));
        }

        let mut alarm = gptimer_alarm_config_t {
            alarm_count: u64::from(plan.alarm_count),
            reload_count: 0,
            ..Default::default()
        };
        alarm.flags.set_auto_reload_on_alarm(1);
        let ret = gptimer_set_alarm_action(TICK_TIMER, &alarm);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerStartFailed(ret));
        }

        let ret = gptimer_enable(TICK_TIMER);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerStartFailed(ret));
        }
        let ret = gptimer_start(TICK_TIMER);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerStartFailed(ret));
        }
    }

    info!(
        "hw_timer: tick every {} counts @ {} Hz ({} ns)",
        plan.alarm_count,
        plan.resolution_hz,
        plan.achieved_period_ns()
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tick_timer(plan: &TimerPlan) -> Result<(), crate::drivers::hw_init::HwInitError> {
    log::info!(
        "hw_timer(sim): tick timer not started ({} counts @ {} Hz)",
        plan.alarm_count,
        plan.resolution_hz
    );
    Ok(())
}
