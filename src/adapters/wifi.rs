//! WiFi driver adapter: managed-station join and soft-AP fallback.

use core::fmt;

/// Driver-side failures surfaced to the bring-up state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiDriverError {
    MacRejected,
    JoinFailed,
    ApFailed,
}

impl fmt::Display for WifiDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacRejected => write!(f, "driver rejected MAC override"),
            Self::JoinFailed => write!(f, "join request failed"),
            Self::ApFailed => write!(f, "soft-AP start failed"),
        }
    }
}

/// Port over the platform WiFi driver.  [`bring_up`] drives this; it
/// never touches the platform API directly.
///
/// [`bring_up`]: crate::connectivity::bring_up
pub trait WifiPort {
    /// Override the station MAC before associating.
    fn apply_mac(&mut self, mac: &[u8; 6]) -> Result<(), WifiDriverError>;

    /// Begin association with the managed network (non-blocking).
    fn join(&mut self, ssid: &str, passphrase: &str) -> Result<(), WifiDriverError>;

    /// Poll association + DHCP completion.
    fn is_joined(&self) -> bool;

    /// Station IPv4 address once joined.
    fn local_ip(&self) -> Option<[u8; 4]>;

    /// Tear down the station attempt and host an open soft-AP instead.
    fn start_ap(&mut self, ssid: &str) -> Result<(), WifiDriverError>;
}

// ---------------------------------------------------------------------------
// Device implementation (esp-idf-svc)
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod platform {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
    };
    use log::error;

    use super::{WifiDriverError, WifiPort};

    pub struct EspWifiAdapter {
        driver: EspWifi<'static>,
    }

    impl EspWifiAdapter {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
        ) -> anyhow::Result<Self> {
            Ok(Self {
                driver: EspWifi::new(modem, sysloop, Some(nvs))?,
            })
        }
    }

    impl WifiPort for EspWifiAdapter {
        fn apply_mac(&mut self, mac: &[u8; 6]) -> Result<(), WifiDriverError> {
            self.driver
                .driver_mut()
                .set_mac(esp_idf_svc::wifi::WifiDeviceId::Sta, *mac)
                .map_err(|e| {
                    error!("wifi: set_mac: {e}");
                    WifiDriverError::MacRejected
                })
        }

        fn join(&mut self, ssid: &str, passphrase: &str) -> Result<(), WifiDriverError> {
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|()| WifiDriverError::JoinFailed)?,
                password: passphrase
                    .try_into()
                    .map_err(|()| WifiDriverError::JoinFailed)?,
                auth_method: AuthMethod::WPA2Personal,
                ..Default::default()
            });
            let mut attempt = || -> anyhow::Result<()> {
                self.driver.set_configuration(&config)?;
                self.driver.start()?;
                self.driver.connect()?;
                Ok(())
            };
            attempt().map_err(|e| {
                error!("wifi: join: {e}");
                WifiDriverError::JoinFailed
            })
        }

        fn is_joined(&self) -> bool {
            self.driver.is_connected().unwrap_or(false)
                && self
                    .driver
                    .sta_netif()
                    .get_ip_info()
                    .map(|info| !info.ip.is_unspecified())
                    .unwrap_or(false)
        }

        fn local_ip(&self) -> Option<[u8; 4]> {
            self.driver
                .sta_netif()
                .get_ip_info()
                .ok()
                .map(|info| info.ip.octets())
        }

        fn start_ap(&mut self, ssid: &str) -> Result<(), WifiDriverError> {
            let config = Configuration::AccessPoint(AccessPointConfiguration {
                ssid: ssid.try_into().map_err(|()| WifiDriverError::ApFailed)?,
                auth_method: AuthMethod::None,
                ..Default::default()
            });
            let mut attempt = || -> anyhow::Result<()> {
                self.driver.stop()?;
                self.driver.set_configuration(&config)?;
                self.driver.start()?;
                Ok(())
            };
            attempt().map_err(|e| {
                error!("wifi: start_ap: {e}");
                WifiDriverError::ApFailed
            })
        }
    }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub use platform::EspWifiAdapter;

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

/// Scripted WiFi driver for tests: joins after a virtual delay, never
/// joins, rejects outright, or fails everything.
#[cfg(not(target_os = "espidf"))]
pub struct SimWifi {
    behaviour: SimBehaviour,
    join_elapsed_ms: core::cell::Cell<u64>,
    joined: core::cell::Cell<bool>,
    applied_mac: Option<[u8; 6]>,
    ap_ssid: Option<std::string::String>,
}

#[cfg(not(target_os = "espidf"))]
enum SimBehaviour {
    JoinsAfter { delay_ms: u64, ip: [u8; 4] },
    NeverJoins,
    Rejecting,
    Broken,
}

#[cfg(not(target_os = "espidf"))]
impl SimWifi {
    pub fn joining_after_ms(delay_ms: u64, ip: [u8; 4]) -> Self {
        Self::with(SimBehaviour::JoinsAfter { delay_ms, ip })
    }

    pub fn never_joins() -> Self {
        Self::with(SimBehaviour::NeverJoins)
    }

    pub fn rejecting() -> Self {
        Self::with(SimBehaviour::Rejecting)
    }

    pub fn broken() -> Self {
        Self::with(SimBehaviour::Broken)
    }

    fn with(behaviour: SimBehaviour) -> Self {
        Self {
            behaviour,
            join_elapsed_ms: core::cell::Cell::new(0),
            joined: core::cell::Cell::new(false),
            applied_mac: None,
            ap_ssid: None,
        }
    }

    pub fn applied_mac(&self) -> Option<[u8; 6]> {
        self.applied_mac
    }

    pub fn ap_ssid(&self) -> Option<&str> {
        self.ap_ssid.as_deref()
    }

    /// The poll cadence of `is_joined` stands in for elapsed time: each
    /// poll accounts for one poll interval (500 ms in the default
    /// config).
    const POLL_STEP_MS: u64 = 500;
}

#[cfg(not(target_os = "espidf"))]
impl WifiPort for SimWifi {
    fn apply_mac(&mut self, mac: &[u8; 6]) -> Result<(), WifiDriverError> {
        if matches!(self.behaviour, SimBehaviour::Broken) {
            return Err(WifiDriverError::MacRejected);
        }
        self.applied_mac = Some(*mac);
        Ok(())
    }

    fn join(&mut self, _ssid: &str, _passphrase: &str) -> Result<(), WifiDriverError> {
        match self.behaviour {
            SimBehaviour::Rejecting | SimBehaviour::Broken => Err(WifiDriverError::JoinFailed),
            _ => Ok(()),
        }
    }

    fn is_joined(&self) -> bool {
        if let SimBehaviour::JoinsAfter { delay_ms, .. } = self.behaviour {
            let elapsed = self.join_elapsed_ms.get() + Self::POLL_STEP_MS;
            self.join_elapsed_ms.set(elapsed);
            if elapsed >= delay_ms {
                self.joined.set(true);
            }
        }
        self.joined.get()
    }

    fn local_ip(&self) -> Option<[u8; 4]> {
        match self.behaviour {
            SimBehaviour::JoinsAfter { ip, .. } if self.joined.get() => Some(ip),
            _ => None,
        }
    }

    fn start_ap(&mut self, ssid: &str) -> Result<(), WifiDriverError> {
        if matches!(self.behaviour, SimBehaviour::Broken) {
            return Err(WifiDriverError::ApFailed);
        }
        self.ap_ssid = Some(ssid.into());
        Ok(())
    }
}
