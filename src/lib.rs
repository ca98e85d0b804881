//! servolink: networked servo / LED / tone controller core for ESP32.
//!
//! Hexagonal layout: `app` holds the domain core and port traits,
//! `adapters` binds the ports to ESP-IDF services (with host
//! simulations beside each one), `drivers` owns register-level access.
//! Everything except `drivers::hw_init` and the `espidf` halves of the
//! adapters compiles and runs on the host, which is where the test
//! suite lives.

pub mod actuators;
pub mod adapters;
pub mod app;
pub mod config;
pub mod connectivity;
pub mod drivers;
pub mod error;
pub mod identity;
pub mod persist;
pub mod pins;
pub mod protocol;
pub mod sensors;
pub mod tone;
