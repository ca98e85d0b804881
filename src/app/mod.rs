//! Application layer: port traits, domain commands and events, the
//! inbound frame queue, and the [`DeviceService`](service::DeviceService)
//! control core.

pub mod commands;
pub mod events;
pub mod inbox;
pub mod ports;
pub mod service;
