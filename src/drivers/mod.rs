//! Hardware drivers: LEDC servo/buzzer output, sensor sampling, GPIO,
//! and the task watchdog.  Pure duty-cycle math lives beside each
//! driver so it is testable on the host; register access is confined to
//! [`hw_init`] and gated to the device target.

pub mod buzzer;
pub mod hw_init;
pub mod indicator;
pub mod servo;
pub mod watchdog;
