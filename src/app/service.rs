//! Domain core: the per-iteration control logic.
//!
//! [`DeviceService`] owns all mutable control state (actuator bank, tone
//! sequencer, persistence gateway, auto-map flag) and talks to the world
//! only through the port traits, so the full loop runs against
//! simulations on the host.
//!
//! Per-iteration order is fixed:
//!
//! 1. sample sensors
//! 2. rate-limited broadcast
//! 3. auto-mapping (if enabled)
//! 4. smoothing step + actuator writes
//! 5. tone sequencer
//! 6. debounced persistence flush

use core::fmt::Write as _;

use heapless::String;
use serde::Serialize;

use crate::actuators::ActuatorBank;
use crate::app::commands::{Command, MAX_TONE_TEXT};
use crate::app::events::{AppEvent, EventSink};
use crate::app::ports::{ActuatorPort, PeerPort, SensorPort, StoragePort};
use crate::config::{DEFAULT_TONE_SEQUENCE, SystemConfig};
use crate::connectivity::ConnectivityState;
use crate::persist::{self, Aggregate, PersistGateway, PersistSource};
use crate::pins::{NUM_LEDS, NUM_POTIS, NUM_SERVOS};
use crate::protocol;
use crate::sensors::{self, SensorSnapshot, BROADCAST_BUF_LEN};
use crate::tone::{ToneOutput, ToneSequencer};

/// Touch readings below this count as a touch (capacitance loads the
/// oscillator down).
const TOUCH_THRESHOLD: u16 = 40;

/// Read-only device snapshot served to the out-of-process web layer.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport<'a> {
    pub name: &'a str,
    pub mac: &'a str,
    pub connectivity: ConnectivityState,
    pub auto_map: bool,
    pub filter: f32,
    pub tone_playing: bool,
    pub sensors: SensorSnapshot,
}

/// Control core. One instance per device, driven by the main loop.
pub struct DeviceService {
    config: SystemConfig,
    actuators: ActuatorBank,
    sequencer: ToneSequencer,
    persist: PersistGateway,
    auto_map: bool,
    tone_text: String<MAX_TONE_TEXT>,
    last_broadcast_ms: Option<u64>,
    last_switch: bool,
    last_snapshot: SensorSnapshot,
}

impl DeviceService {
    /// Construct the core, restoring persisted settings from storage.
    pub fn new<S: StoragePort>(config: SystemConfig, storage: &S) -> Self {
        let actuators = ActuatorBank::new(config.boot_servo_angle, config.default_filter);
        let persist_gw = PersistGateway::new(config.persist_debounce_ms);
        let auto_map = persist::load_auto_map(storage);
        let tone_text = persist::load_tone_text(storage);
        Self {
            config,
            actuators,
            sequencer: ToneSequencer::new(),
            persist: persist_gw,
            auto_map,
            tone_text,
            last_broadcast_ms: None,
            last_switch: false,
            last_snapshot: SensorSnapshot::default(),
        }
    }

    pub fn auto_map(&self) -> bool {
        self.auto_map
    }

    pub fn actuators(&self) -> &ActuatorBank {
        &self.actuators
    }

    pub fn tone_text(&self) -> &str {
        &self.tone_text
    }

    // ── Inbound frames ─────────────────────────────────────────────

    /// Parse and apply one peer frame. Malformed frames are discarded
    /// without feedback, matching the wire contract.
    pub fn handle_frame<E: EventSink>(&mut self, frame: &[u8], now_ms: u64, sink: &mut E) {
        if frame.len() > self.config.max_frame_len {
            sink.emit(AppEvent::FrameDiscarded { len: frame.len() });
            return;
        }
        let Some(command) = protocol::parse(frame) else {
            sink.emit(AppEvent::FrameDiscarded { len: frame.len() });
            return;
        };
        self.apply(command, now_ms, sink);
        sink.emit(AppEvent::CommandApplied);
    }

    fn apply<E: EventSink>(&mut self, command: Command, now_ms: u64, sink: &mut E) {
        match command {
            Command::SetServoTarget { index, angle } => {
                self.actuators.set_servo_target(index, angle);
            }
            Command::SetLedState { index, on } => {
                self.actuators.set_led(index, on);
            }
            Command::SetPotiControl(on) => {
                if self.auto_map != on {
                    self.auto_map = on;
                    self.persist.mark_dirty(Aggregate::AutoMap, now_ms);
                }
            }
            Command::SetFilter(filter) => {
                self.actuators.set_filter(filter);
            }
            Command::SetToneSequence(text) => {
                let steps = self.sequencer.submit(&text, now_ms);
                self.tone_text = text;
                self.persist.mark_dirty(Aggregate::ToneText, now_ms);
                sink.emit(AppEvent::ToneStarted { steps });
            }
        }
    }

    // ── Control loop ───────────────────────────────────────────────

    /// One control-loop iteration.
    pub fn tick<H, P, S, E>(
        &mut self,
        hw: &mut H,
        peers: &mut P,
        storage: &mut S,
        sink: &mut E,
        now_ms: u64,
    ) where
        H: SensorPort + ActuatorPort,
        P: PeerPort,
        S: StoragePort,
        E: EventSink,
    {
        let snapshot = hw.read_all();
        self.last_snapshot = snapshot;

        self.broadcast_if_due(&snapshot, peers, sink, now_ms);

        if self.auto_map {
            self.apply_auto_map(&snapshot, now_ms, sink);
        }
        self.last_switch = snapshot.switches[0];

        self.actuators.step_smoothing();
        for i in 0..NUM_SERVOS {
            hw.write_servo(i, self.actuators.servo_position(i));
        }
        for i in 0..NUM_LEDS {
            hw.write_led(i, self.actuators.led(i));
        }

        match self.sequencer.tick(now_ms) {
            ToneOutput::Unchanged => {}
            ToneOutput::Play { freq_hz, volume } => hw.write_tone(freq_hz, volume),
            ToneOutput::Silence => {
                hw.silence();
                sink.emit(AppEvent::ToneFinished);
            }
        }

        let source = PersistSource {
            auto_map: self.auto_map,
            tone_text: &self.tone_text,
        };
        let (flushed, failed) = self.persist.tick(storage, &source, now_ms);
        if flushed > 0 {
            sink.emit(AppEvent::PersistFlushed { ok: true });
        }
        if failed > 0 {
            sink.emit(AppEvent::PersistFlushed { ok: false });
        }
    }

    fn broadcast_if_due<P: PeerPort, E: EventSink>(
        &mut self,
        snapshot: &SensorSnapshot,
        peers: &mut P,
        sink: &mut E,
        now_ms: u64,
    ) {
        let due = match self.last_broadcast_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.config.broadcast_interval_ms),
        };
        if !due || peers.peer_count() == 0 {
            return;
        }
        self.last_broadcast_ms = Some(now_ms);

        let mut buf = [0u8; BROADCAST_BUF_LEN];
        match sensors::encode_broadcast(snapshot, &mut buf) {
            Some(len) => peers.broadcast(&buf[..len]),
            None => sink.emit(AppEvent::BroadcastSkipped),
        }
    }

    /// Map local inputs onto outputs when the poti toggle is on.
    ///
    /// Potis drive their matching servos raw-to-degrees; the two servo
    /// channels without a poti mirror channel 0.  Touch pad 0 drives
    /// LED 0, and a switch press fires the default jingle if the
    /// sequencer is free.
    fn apply_auto_map<E: EventSink>(
        &mut self,
        snapshot: &SensorSnapshot,
        now_ms: u64,
        sink: &mut E,
    ) {
        for i in 0..NUM_POTIS {
            // Readings above the 12-bit range saturate at full deflection.
            let angle = (u32::from(snapshot.potis[i]) * 180 / 4095).min(180) as u8;
            self.actuators.set_servo_target(i, angle);
        }
        let mirrored = self.actuators.servo_target(0);
        for i in NUM_POTIS..NUM_SERVOS {
            self.actuators.set_servo_target(i, mirrored);
        }

        self.actuators.set_led(0, snapshot.touch[0] < TOUCH_THRESHOLD);

        let pressed = snapshot.switches[0] && !self.last_switch;
        if pressed && self.sequencer.is_idle() {
            let steps = self.sequencer.submit(DEFAULT_TONE_SEQUENCE, now_ms);
            sink.emit(AppEvent::ToneStarted { steps });
        }
    }

    // ── Peer-facing reports ────────────────────────────────────────

    /// State-sync frames sent when a peer connects, so its UI reflects
    /// the device instead of stale defaults.  Each frame echoes the
    /// command grammar, letting clients reuse their command parser.
    pub fn greeting_frames(&self) -> heapless::Vec<String<24>, { NUM_SERVOS + NUM_LEDS + 2 }> {
        let mut frames = heapless::Vec::new();
        for i in 0..NUM_SERVOS {
            let mut f = String::new();
            let _ = write!(f, "servo:{i}:{}", self.actuators.servo_target(i));
            let _ = frames.push(f);
        }
        for i in 0..NUM_LEDS {
            let mut f = String::new();
            let _ = write!(f, "led:{i}:{}", u8::from(self.actuators.led(i)));
            let _ = frames.push(f);
        }
        let mut f = String::new();
        let _ = write!(f, "poti:{}", if self.auto_map { "on" } else { "off" });
        let _ = frames.push(f);
        let mut f = String::new();
        let _ = write!(f, "filter:{}", self.actuators.filter());
        let _ = frames.push(f);
        frames
    }

    /// One-shot structured status for the web layer and boot log:
    /// identity (name and station MAC), connectivity, control flags, and
    /// the latest sensor snapshot.
    pub fn status_report<'a>(
        &self,
        name: &'a str,
        mac: &'a str,
        connectivity: ConnectivityState,
    ) -> StatusReport<'a> {
        StatusReport {
            name,
            mac,
            connectivity,
            auto_map: self.auto_map,
            filter: self.actuators.filter(),
            tone_playing: !self.sequencer.is_idle(),
            sensors: self.last_snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_sink::RecordingEventSink;
    use crate::adapters::nvs::NvsStorage;

    fn service(storage: &NvsStorage) -> DeviceService {
        DeviceService::new(SystemConfig::default(), storage)
    }

    #[test]
    fn boot_restores_persisted_auto_map() {
        let mut storage = NvsStorage::new();
        storage.write("control", "poti", &[1]).unwrap();
        storage.write("sound", "seq", b"440,50,100").unwrap();

        let svc = service(&storage);
        assert!(svc.auto_map());
        assert_eq!(svc.tone_text(), "440,50,100");
    }

    #[test]
    fn malformed_frame_emits_discard_only() {
        let storage = NvsStorage::new();
        let mut svc = service(&storage);
        let mut sink = RecordingEventSink::new();

        svc.handle_frame(b"servo:99:10", 0, &mut sink);
        assert_eq!(
            sink.events,
            vec![AppEvent::FrameDiscarded { len: 11 }]
        );
        assert_eq!(svc.actuators().servo_target(0), 90);
    }

    #[test]
    fn servo_frame_updates_target_not_position() {
        let storage = NvsStorage::new();
        let mut svc = service(&storage);
        let mut sink = RecordingEventSink::new();

        svc.handle_frame(b"servo:1:180", 0, &mut sink);
        assert_eq!(svc.actuators().servo_target(1), 180);
        // Position only moves through smoothing in tick().
        assert!((svc.actuators().servo_current(1) - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn poti_toggle_marks_persistence_once() {
        let storage = NvsStorage::new();
        let mut svc = service(&storage);
        let mut sink = RecordingEventSink::new();

        svc.handle_frame(b"poti:on", 0, &mut sink);
        assert!(svc.auto_map());
        // Redundant re-send of the same state is not a mutation.
        svc.handle_frame(b"poti:on", 10, &mut sink);
        assert!(svc.auto_map());
    }

    #[test]
    fn status_report_serialises_for_the_web_layer() {
        let storage = NvsStorage::new();
        let svc = service(&storage);
        let report = svc.status_report(
            "esp-TestBotA1",
            "02:AB:00:1F:FF:7C",
            ConnectivityState::ConnectedManaged { ip: [192, 168, 0, 5] },
        );

        let json = serde_json::to_string(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "esp-TestBotA1");
        assert_eq!(value["mac"], "02:AB:00:1F:FF:7C");
        assert_eq!(value["connectivity"]["connected_managed"]["ip"][0], 192);
        assert_eq!(value["auto_map"], false);
        assert_eq!(value["sensors"]["potis"][0], 0);
    }

    #[test]
    fn greeting_echoes_state_in_command_grammar() {
        let storage = NvsStorage::new();
        let mut svc = service(&storage);
        let mut sink = RecordingEventSink::new();
        svc.handle_frame(b"servo:0:45", 0, &mut sink);
        svc.handle_frame(b"led:2:1", 0, &mut sink);

        let frames = svc.greeting_frames();
        let texts: Vec<&str> = frames.iter().map(|f| f.as_str()).collect();
        assert!(texts.contains(&"servo:0:45"));
        assert!(texts.contains(&"servo:5:90"));
        assert!(texts.contains(&"led:2:1"));
        assert!(texts.contains(&"poti:off"));
        assert!(texts.contains(&"filter:0.9"));

        // Every greeting frame must survive our own parser.
        for frame in &frames {
            assert!(crate::protocol::parse(frame.as_bytes()).is_some(), "{frame}");
        }
    }
}
