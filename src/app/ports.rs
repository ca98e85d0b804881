//! Port traits — the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, peer channel, storage) implement
//! these traits.  The [`DeviceService`](super::service::DeviceService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and the whole control loop runs against mocks on the host.

use crate::sensors::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Sample every analog, capacitive, and digital input.
    fn read_all(&mut self) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    /// Position a servo channel (angle 0–180, already clamped upstream).
    fn write_servo(&mut self, index: usize, angle: u8);

    /// Drive a discrete LED channel.
    fn write_led(&mut self, index: usize, on: bool);

    /// Apply a tone to the buzzer PWM channel.
    /// `freq_hz == 0` or `volume == 0` must silence the output.
    fn write_tone(&mut self, freq_hz: u16, volume: u8);

    /// Silence the buzzer immediately.
    fn silence(&mut self);

    /// Drive the connectivity indicator line.
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Peer port (driven adapter: domain → connected network clients)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the peer channel.  The inbound side is the
/// [`FrameInbox`](super::inbox::FrameInbox) drained by the main loop.
pub trait PeerPort {
    /// Send one text frame to every connected peer.  Best-effort:
    /// delivery failures are the adapter's problem, not the domain's.
    fn broadcast(&mut self, payload: &[u8]);

    /// Number of currently connected peers (0 ⇒ broadcast is a no-op).
    fn peer_count(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage, namespaced per subsystem
/// (`"id"`, `"wlan"`, `"sound"`, `"control"`).
///
/// Write operations MUST be atomic — no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively; the in-memory
/// simulation achieves it trivially.
pub trait StoragePort {
    /// Copy a stored value into `buf`, returning how many bytes landed.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Store a value, replacing any previous one atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Remove a key; removing an absent key is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Probe for a key without copying its value out.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Failure modes of [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// No value stored under the requested key.
    NotFound,
    /// No space left in the backing partition.
    Full,
    /// Any other driver-level failure.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
