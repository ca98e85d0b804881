//! System configuration parameters
//!
//! All tunable timing and limit parameters for the servolink controller.
//! Values are compile-time defaults; the web/provisioning layer can hand a
//! modified copy to [`DeviceService`](crate::app::service::DeviceService)
//! at construction.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Smoothing ---
    /// Low-pass filter coefficient applied at boot (0.0–1.0).
    pub default_filter: f32,
    /// Servo target applied to every channel at boot (degrees).
    pub boot_servo_angle: u8,

    // --- Protocol ---
    /// Frames longer than this are dropped before parsing (bytes).
    pub max_frame_len: usize,

    // --- Connectivity ---
    /// Managed-network join timeout (milliseconds).
    pub wifi_join_timeout_ms: u32,
    /// Join status poll interval during bring-up (milliseconds).
    pub wifi_join_poll_ms: u32,

    // --- Timing ---
    /// Sensor broadcast interval (milliseconds). Sampling itself runs
    /// every loop iteration; only the network send is rate-limited.
    pub broadcast_interval_ms: u32,
    /// Persistence debounce window (milliseconds).
    pub persist_debounce_ms: u32,
    /// Main loop sleep between iterations (milliseconds).
    pub loop_sleep_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            default_filter: 0.9,
            boot_servo_angle: 90,

            max_frame_len: 128,

            wifi_join_timeout_ms: 8_000,
            wifi_join_poll_ms: 500,

            broadcast_interval_ms: 100,
            persist_debounce_ms: 1_000,
            loop_sleep_ms: 10,
        }
    }
}

/// Tone sequence submitted when the switch goes active in auto-mapping
/// mode and the sequencer is idle.
pub const DEFAULT_TONE_SEQUENCE: &str = "880,60,150;0,0,100;660,60,250";
