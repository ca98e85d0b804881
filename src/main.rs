//! Firmware entry point: peripheral bring-up, network join, then the
//! cooperative control loop.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
fn main() -> anyhow::Result<()> {
    device::run()
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
fn main() {
    eprintln!("servolink: this binary targets ESP-IDF; run the test suite on the host instead");
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod device {
    use anyhow::anyhow;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{info, warn};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use servolink::adapters::hardware::HardwareAdapter;
    use servolink::adapters::log_sink::LogEventSink;
    use servolink::adapters::mdns::MdnsResponder;
    use servolink::adapters::nvs::NvsStorage;
    use servolink::adapters::peers::PeerHub;
    use servolink::adapters::time::{Clock, MonotonicClock};
    use servolink::adapters::wifi::EspWifiAdapter;
    use servolink::app::events::{AppEvent, EventSink};
    use servolink::app::ports::{ActuatorPort, PeerPort};
    use servolink::app::service::DeviceService;
    use servolink::config::SystemConfig;
    use servolink::connectivity::{self, ConnectivityState};
    use servolink::drivers::watchdog::WatchdogGuard;
    use servolink::identity;

    pub fn run() -> anyhow::Result<()> {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;

        let config = SystemConfig::default();
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs_partition = EspDefaultNvsPartition::take()?;

        let mut storage = NvsStorage::new(nvs_partition.clone());
        let mut rng = seed_rng();
        let identity = identity::load_or_create_identity(&mut storage, &mut rng)
            .map_err(|e| anyhow!("identity: {e}"))?;
        let creds = identity::load_or_default_credentials(&mut storage);
        info!("booting as '{}'", identity.name);

        let clock = MonotonicClock::new();
        let mut wifi = EspWifiAdapter::new(peripherals.modem, sysloop, nvs_partition)?;
        let state = connectivity::bring_up(
            &mut wifi,
            &clock,
            &identity,
            &creds,
            config.wifi_join_timeout_ms,
            config.wifi_join_poll_ms,
        );
        let mut sink = LogEventSink;
        sink.emit(AppEvent::ConnectivitySettled(state));

        // mDNS only makes sense on the managed network; AP clients get
        // the gateway address directly.
        let _mdns = match state {
            ConnectivityState::ConnectedManaged { .. } => {
                match MdnsResponder::announce(&identity.name) {
                    Ok(responder) => Some(responder),
                    Err(e) => {
                        warn!("mdns: {e}");
                        None
                    }
                }
            }
            _ => None,
        };

        let mut hw = HardwareAdapter::init().map_err(|e| anyhow!("hardware: {e}"))?;
        hw.set_indicator(state.indicator_on());

        let mut peers = PeerHub::start()?;
        let watchdog = WatchdogGuard::subscribe().map_err(|e| anyhow!("watchdog: {e}"))?;
        let mut service = DeviceService::new(config.clone(), &storage);

        let status = serde_json::to_string(&service.status_report(
            &identity.name,
            &identity.mac_string(),
            state,
        ))?;
        info!("control loop starting: {status}");
        loop {
            let now_ms = clock.uptime_ms();

            while let Some(frame) = peers.pop_frame() {
                service.handle_frame(&frame, now_ms, &mut sink);
            }
            if peers.take_greeting_pending() {
                for frame in service.greeting_frames() {
                    peers.broadcast(frame.as_bytes());
                }
            }

            service.tick(&mut hw, &mut peers, &mut storage, &mut sink, now_ms);

            watchdog.feed();
            clock.sleep_ms(config.loop_sleep_ms);
        }
    }

    fn seed_rng() -> SmallRng {
        let seed = u64::from(unsafe { esp_idf_svc::sys::esp_random() }) << 32
            | u64::from(unsafe { esp_idf_svc::sys::esp_random() });
        SmallRng::seed_from_u64(seed)
    }
}
