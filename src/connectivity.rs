//! Network bring-up state machine.
//!
//! Boot tries to join the managed network with stored (or default)
//! credentials, polling until the join timeout elapses.  On timeout the
//! device falls back to hosting its own soft-AP named after the device
//! identity, so the controller is always reachable even on a fresh site
//! with no infrastructure.  The machine is one-shot: whatever state it
//! settles in holds until restart, and network failure is never fatal.

use log::{info, warn};
use serde::Serialize;

use crate::adapters::time::Clock;
use crate::adapters::wifi::WifiPort;
use crate::error::ConnectivityError;
use crate::identity::{Credentials, DeviceIdentity};

/// Connectivity lifecycle.  `Idle → ConnectingManaged` at boot, then
/// either `ConnectedManaged` (join succeeded within the timeout) or
/// `ApFallback` (anything else).  Terminal per boot cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    /// Not yet started.
    Idle,
    /// Join request issued, waiting for association + DHCP.
    ConnectingManaged,
    /// On the managed network; payload is the station IPv4 address.
    ConnectedManaged { ip: [u8; 4] },
    /// Hosting the open fallback soft-AP named after the device.
    ApFallback,
}

impl ConnectivityState {
    /// Whether the indicator LED should be lit (managed join succeeded).
    pub fn indicator_on(&self) -> bool {
        matches!(self, Self::ConnectedManaged { .. })
    }
}

/// Bring the network up, blocking until a terminal state is reached.
///
/// The stored MAC is applied before the join so the device keeps its
/// DHCP lease identity.  Failure is never fatal: every error path ends
/// in [`ApFallback`](ConnectivityState::ApFallback), reachability
/// permitting.
pub fn bring_up<W, C>(
    wifi: &mut W,
    clock: &C,
    identity: &DeviceIdentity,
    creds: &Credentials,
    timeout_ms: u32,
    poll_ms: u32,
) -> ConnectivityState
where
    W: WifiPort,
    C: Clock,
{
    if let Err(e) = wifi.apply_mac(&identity.mac) {
        warn!("connectivity: MAC override failed: {e}");
    }

    match join_with_timeout(wifi, clock, creds, timeout_ms, poll_ms) {
        Ok(ip) => {
            info!(
                "connectivity: joined '{}' as {}.{}.{}.{}",
                creds.ssid, ip[0], ip[1], ip[2], ip[3]
            );
            return ConnectivityState::ConnectedManaged { ip };
        }
        Err(e) => warn!("connectivity: {e}, starting AP fallback"),
    }

    if let Err(e) = wifi.start_ap(&identity.name) {
        // Peers cannot reach us, but the local control loop still runs.
        warn!("connectivity: AP fallback failed: {e}");
    } else {
        info!("connectivity: soft-AP '{}' up", identity.name);
    }
    ConnectivityState::ApFallback
}

fn join_with_timeout<W, C>(
    wifi: &mut W,
    clock: &C,
    creds: &Credentials,
    timeout_ms: u32,
    poll_ms: u32,
) -> Result<[u8; 4], ConnectivityError>
where
    W: WifiPort,
    C: Clock,
{
    wifi.join(&creds.ssid, &creds.passphrase)
        .map_err(|_| ConnectivityError::JoinRejected)?;

    let deadline = clock.uptime_ms() + u64::from(timeout_ms);
    loop {
        if wifi.is_joined() {
            return Ok(wifi.local_ip().unwrap_or([0, 0, 0, 0]));
        }
        if clock.uptime_ms() >= deadline {
            return Err(ConnectivityError::JoinTimeout);
        }
        clock.sleep_ms(poll_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::time::SimClock;
    use crate::adapters::wifi::SimWifi;
    use heapless::String;

    fn creds() -> Credentials {
        Credentials {
            ssid: String::try_from("testnet").unwrap(),
            passphrase: String::try_from("pw").unwrap(),
        }
    }

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            name: String::try_from("esp-TestBotA1").unwrap(),
            mac: [0x02, 1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn successful_join_reports_station_ip() {
        let clock = SimClock::new();
        let mut wifi = SimWifi::joining_after_ms(1_500, [192, 168, 4, 7]);
        let state = bring_up(&mut wifi, &clock, &identity(), &creds(), 8_000, 500);
        assert_eq!(
            state,
            ConnectivityState::ConnectedManaged { ip: [192, 168, 4, 7] }
        );
        assert_eq!(wifi.applied_mac(), Some([0x02, 1, 2, 3, 4, 5]));
        assert!(state.indicator_on());
    }

    #[test]
    fn timeout_falls_back_to_access_point() {
        let clock = SimClock::new();
        let mut wifi = SimWifi::never_joins();
        let state = bring_up(&mut wifi, &clock, &identity(), &creds(), 8_000, 500);
        assert_eq!(state, ConnectivityState::ApFallback);
        // The fallback network is named after the device.
        assert_eq!(wifi.ap_ssid(), Some("esp-TestBotA1"));
        assert!(!state.indicator_on());
        // The poll loop must have given up close to the timeout.
        let elapsed = clock.uptime_ms();
        assert!((8_000..9_000).contains(&elapsed), "elapsed {elapsed}");
    }

    #[test]
    fn rejected_join_skips_the_wait() {
        let clock = SimClock::new();
        let mut wifi = SimWifi::rejecting();
        let state = bring_up(&mut wifi, &clock, &identity(), &creds(), 8_000, 500);
        assert_eq!(state, ConnectivityState::ApFallback);
        assert!(clock.uptime_ms() < 500);
    }

    #[test]
    fn total_driver_failure_still_resolves_to_fallback() {
        let clock = SimClock::new();
        let mut wifi = SimWifi::broken();
        let state = bring_up(&mut wifi, &clock, &identity(), &creds(), 1_000, 100);
        assert_eq!(state, ConnectivityState::ApFallback);
        assert!(!state.indicator_on());
    }
}
