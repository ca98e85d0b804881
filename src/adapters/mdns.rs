//! mDNS responder: publishes the device as `<name>.local` and announces
//! the peer channel service so clients can discover controllers without
//! knowing IP addresses.

/// Service type announced for the peer text channel.
pub const SERVICE_TYPE: &str = "_servolink";
pub const SERVICE_PROTO: &str = "_tcp";
pub const SERVICE_PORT: u16 = 80;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod platform {
    use esp_idf_svc::mdns::EspMdns;
    use log::info;

    use super::{SERVICE_PORT, SERVICE_PROTO, SERVICE_TYPE};

    /// Owns the responder; dropping it withdraws the announcement.
    pub struct MdnsResponder {
        _mdns: EspMdns,
    }

    impl MdnsResponder {
        pub fn announce(hostname: &str) -> anyhow::Result<Self> {
            let mut mdns = EspMdns::take()?;
            mdns.set_hostname(hostname)?;
            mdns.set_instance_name(hostname)?;
            mdns.add_service(None, SERVICE_TYPE, SERVICE_PROTO, SERVICE_PORT, &[])?;
            info!("mdns: announced {hostname}.local");
            Ok(Self { _mdns: mdns })
        }
    }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub use platform::MdnsResponder;

#[cfg(not(target_os = "espidf"))]
pub struct MdnsResponder {
    hostname: std::string::String,
}

#[cfg(not(target_os = "espidf"))]
impl MdnsResponder {
    pub fn announce(hostname: &str) -> anyhow::Result<Self> {
        log::info!("mdns(sim): announced {hostname}.local");
        Ok(Self {
            hostname: hostname.into(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}
