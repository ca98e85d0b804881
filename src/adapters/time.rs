//! Monotonic time source for the control loop and debounce logic.

/// Monotonic clock abstraction. `uptime_ms` never goes backwards; the
/// epoch is boot.
pub trait Clock {
    fn uptime_ms(&self) -> u64;

    /// Park the current task. Bring-up polling and the main loop pacing
    /// go through the clock so simulations can run in virtual time.
    fn sleep_ms(&self, ms: u32);
}

// ---------------------------------------------------------------------------
// Device clock (esp_timer)
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub struct MonotonicClock;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
impl MonotonicClock {
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
impl Clock for MonotonicClock {
    fn uptime_ms(&self) -> u64 {
        // esp_timer_get_time is microseconds since boot, 64-bit.
        let us = unsafe { esp_idf_sys::esp_timer_get_time() };
        (us / 1000) as u64
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

// ---------------------------------------------------------------------------
// Host clock (std Instant)
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
pub struct MonotonicClock {
    epoch: std::time::Instant,
}

#[cfg(not(target_os = "espidf"))]
impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Clock for MonotonicClock {
    fn uptime_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

// ---------------------------------------------------------------------------
// Virtual-time clock for tests
// ---------------------------------------------------------------------------

/// Test clock where `sleep_ms` advances virtual time instantly.
#[cfg(not(target_os = "espidf"))]
pub struct SimClock {
    now_ms: core::cell::Cell<u64>,
}

#[cfg(not(target_os = "espidf"))]
impl SimClock {
    pub const fn new() -> Self {
        Self {
            now_ms: core::cell::Cell::new(0),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Clock for SimClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}
