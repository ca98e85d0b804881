//! Driven adapters: implementations of the port traits over ESP-IDF
//! services, with host simulations beside each one.

pub mod hardware;
pub mod log_sink;
pub mod mdns;
pub mod nvs;
pub mod peers;
pub mod time;
pub mod wifi;
