//! End-to-end control loop tests against the host simulations: frames
//! in through the peer hub, actuator writes and broadcasts out through
//! the recorded hardware adapter.

#![cfg(not(target_os = "espidf"))]

use servolink::adapters::hardware::HardwareAdapter;
use servolink::adapters::log_sink::RecordingEventSink;
use servolink::adapters::nvs::NvsStorage;
use servolink::adapters::peers::PeerHub;
use servolink::app::events::AppEvent;
use servolink::app::service::DeviceService;
use servolink::config::SystemConfig;
use servolink::persist;
use servolink::pins::NUM_SERVOS;

struct Rig {
    service: DeviceService,
    hw: HardwareAdapter,
    peers: PeerHub,
    storage: NvsStorage,
    sink: RecordingEventSink,
    now_ms: u64,
}

impl Rig {
    fn new() -> Self {
        let storage = NvsStorage::new();
        Self::with_storage(storage)
    }

    fn with_storage(storage: NvsStorage) -> Self {
        Self {
            service: DeviceService::new(SystemConfig::default(), &storage),
            hw: HardwareAdapter::init().unwrap(),
            peers: PeerHub::start().unwrap(),
            storage,
            sink: RecordingEventSink::new(),
            now_ms: 0,
        }
    }

    fn send(&mut self, frame: &[u8]) {
        self.peers.inject_frame(frame);
    }

    /// One 10 ms loop iteration: drain frames, then tick.
    fn step(&mut self) {
        while let Some(frame) = self.peers.pop_frame() {
            self.service
                .handle_frame(&frame, self.now_ms, &mut self.sink);
        }
        self.service.tick(
            &mut self.hw,
            &mut self.peers,
            &mut self.storage,
            &mut self.sink,
            self.now_ms,
        );
        self.now_ms += 10;
    }

    fn run_ms(&mut self, ms: u64) {
        for _ in 0..ms / 10 {
            self.step();
        }
    }
}

// ── Scenario: overrange servo angle saturates ──────────────────────

#[test]
fn overrange_servo_angle_is_clamped_to_180() {
    let mut rig = Rig::new();
    rig.send(b"servo:2:250");
    rig.step();
    assert_eq!(rig.service.actuators().servo_target(2), 180);
}

// ── Scenario: out-of-range filter is ignored, next one applies ─────

#[test]
fn rejected_filter_keeps_prior_value() {
    let mut rig = Rig::new();
    rig.send(b"filter:1.7");
    rig.step();
    assert!((rig.service.actuators().filter() - 0.9).abs() < f32::EPSILON);

    rig.send(b"filter:0.3");
    rig.step();
    assert!((rig.service.actuators().filter() - 0.3).abs() < f32::EPSILON);
}

// ── Scenario: tone sequence plays through and goes idle ────────────

#[test]
fn tone_sequence_plays_both_steps_then_silences() {
    let mut rig = Rig::new();
    rig.send(b"sound:1000,80,200;800,60,300;");
    rig.step();
    assert_eq!(rig.hw.last_tone(), Some((1000, 80)));

    // 200 ms in, the second step takes over.
    rig.run_ms(250);
    assert_eq!(rig.hw.last_tone(), Some((800, 60)));
    assert_eq!(rig.hw.silenced, 0);

    // Past 500 ms total the sequencer is idle and silenced the output.
    rig.run_ms(300);
    assert_eq!(rig.hw.silenced, 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ToneFinished)), 1);
}

#[test]
fn new_sound_command_replaces_playing_sequence() {
    let mut rig = Rig::new();
    rig.send(b"sound:1000,80,5000");
    rig.step();
    assert_eq!(rig.hw.last_tone(), Some((1000, 80)));

    rig.send(b"sound:500,40,100");
    rig.step();
    assert_eq!(rig.hw.last_tone(), Some((500, 40)));
    rig.run_ms(200);
    assert_eq!(rig.hw.silenced, 1);
}

// ── Scenario: debounced persistence coalesces toggles ──────────────

#[test]
fn poti_toggle_within_window_persists_once_with_final_value() {
    let mut rig = Rig::new();
    rig.send(b"poti:on");
    rig.step();
    rig.send(b"poti:off");
    rig.step();

    // Still inside the 1000 ms window: nothing written yet.
    rig.run_ms(500);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::PersistFlushed { .. })),
        0
    );

    rig.run_ms(600);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::PersistFlushed { .. })),
        1
    );
    assert!(!persist::load_auto_map(&rig.storage));
}

#[test]
fn failed_flush_is_reported_once() {
    let mut rig = Rig::new();
    rig.storage.fail_writes = true;
    rig.send(b"poti:on");
    rig.step();
    rig.run_ms(1500);

    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PersistFlushed { ok: false })),
        1
    );
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PersistFlushed { ok: true })),
        0
    );
    assert!(!persist::load_auto_map(&rig.storage));
}

#[test]
fn persisted_settings_survive_a_reboot() {
    let mut rig = Rig::new();
    rig.send(b"poti:on");
    rig.send(b"sound:440,50,100");
    rig.step();
    rig.run_ms(1500);

    let rebooted = Rig::with_storage(rig.storage);
    assert!(rebooted.service.auto_map());
    assert_eq!(rebooted.service.tone_text(), "440,50,100");
}

// ── Smoothing through the full loop ────────────────────────────────

#[test]
fn servo_motion_is_smoothed_not_stepped() {
    let mut rig = Rig::new();
    rig.send(b"servo:0:180");
    rig.step();

    // First write is one filter step from 90, far from the target.
    let first = rig.hw.last_servo_angle(0).unwrap();
    assert!(first < 100, "first write jumped to {first}");

    // The exponential settles fractionally below the target and the
    // hardware write truncates, so the final angle is within one degree.
    rig.run_ms(3000);
    let settled = rig.hw.last_servo_angle(0).unwrap();
    assert!(settled >= 179, "settled at {settled}");
    assert!((rig.service.actuators().servo_current(0) - 180.0).abs() < 0.5);
}

#[test]
fn repeated_servo_command_is_idempotent() {
    let mut once = Rig::new();
    once.send(b"servo:0:120");
    once.run_ms(500);

    let mut twice = Rig::new();
    twice.send(b"servo:0:120");
    twice.step();
    twice.send(b"servo:0:120");
    twice.run_ms(490);

    assert_eq!(twice.service.actuators().servo_target(0), 120);
    // Same target, same elapsed iterations: identical trajectory.
    assert_eq!(once.hw.last_servo_angle(0), twice.hw.last_servo_angle(0));
}

#[test]
fn led_commands_reach_the_hardware() {
    let mut rig = Rig::new();
    rig.send(b"led:1:1");
    rig.step();
    assert_eq!(rig.hw.last_led_state(1), Some(true));

    rig.send(b"led:1:0");
    rig.step();
    assert_eq!(rig.hw.last_led_state(1), Some(false));
}

// ── Broadcast cadence ──────────────────────────────────────────────

#[test]
fn broadcasts_only_with_peers_and_at_interval() {
    let mut rig = Rig::new();
    rig.run_ms(500);
    assert!(rig.peers.sent.is_empty());

    rig.peers.connect_peer();
    rig.hw.snapshot.potis[0] = 1234;
    rig.run_ms(1000);

    // 100 ms interval over 1000 ms: 10 sends, one per interval.
    let sends = rig.peers.sent.len();
    assert!((9..=11).contains(&sends), "got {sends} broadcasts");

    let last: serde_json::Value =
        serde_json::from_str(rig.peers.sent_text().last().unwrap()).unwrap();
    assert_eq!(last["poti0"], 1234);
    assert_eq!(last["switch0"], 0);
}

// ── Auto-mapping ───────────────────────────────────────────────────

#[test]
fn auto_map_drives_servos_from_potis_and_mirrors_channel_zero() {
    let mut rig = Rig::new();
    rig.send(b"poti:on");
    rig.hw.snapshot.potis = [4095, 0, 2048, 1024];
    rig.step();

    let targets: Vec<u8> = (0..NUM_SERVOS)
        .map(|i| rig.service.actuators().servo_target(i))
        .collect();
    assert_eq!(targets[0], 180);
    assert_eq!(targets[1], 0);
    assert_eq!(targets[2], 90);
    // Channels without a poti mirror channel 0.
    assert_eq!(targets[4], 180);
    assert_eq!(targets[5], 180);
}

#[test]
fn auto_map_clamps_overrange_adc_readings() {
    let mut rig = Rig::new();
    rig.send(b"poti:on");
    rig.hw.snapshot.potis = [u16::MAX, 4096, 0, 0];
    rig.step();

    // Readings past the 12-bit range must saturate, not wrap.
    assert_eq!(rig.service.actuators().servo_target(0), 180);
    assert_eq!(rig.service.actuators().servo_target(1), 180);
}

#[test]
fn auto_map_touch_drives_led_and_switch_fires_jingle() {
    let mut rig = Rig::new();
    rig.send(b"poti:on");
    rig.hw.snapshot.touch[0] = 12; // touched (below threshold)
    rig.step();
    assert_eq!(rig.hw.last_led_state(0), Some(true));

    rig.hw.snapshot.touch[0] = 80;
    rig.step();
    assert_eq!(rig.hw.last_led_state(0), Some(false));

    // Rising switch edge starts the default jingle exactly once.
    rig.hw.snapshot.switches[0] = true;
    rig.step();
    rig.step();
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ToneStarted { .. })), 1);
    assert!(rig.hw.last_tone().is_some());
}

#[test]
fn manual_servo_commands_win_when_auto_map_is_off() {
    let mut rig = Rig::new();
    rig.hw.snapshot.potis = [4095; 4];
    rig.send(b"servo:0:10");
    rig.run_ms(2000);
    // Potis at full scale but mapping disabled: target stays manual.
    assert_eq!(rig.service.actuators().servo_target(0), 10);
}

// ── Malformed traffic does not disturb state ───────────────────────

#[test]
fn garbage_frames_leave_state_untouched() {
    let mut rig = Rig::new();
    rig.send(b"servo:0:45");
    rig.step();

    for frame in [
        b"servo:9:90".as_slice(),
        b"filter:99",
        b"poti:maybe",
        b"\xff\xfe",
        b"sound:",
        b"nonsense",
    ] {
        rig.send(frame);
    }
    rig.run_ms(100);

    assert_eq!(rig.service.actuators().servo_target(0), 45);
    assert!((rig.service.actuators().filter() - 0.9).abs() < f32::EPSILON);
    assert!(!rig.service.auto_map());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FrameDiscarded { .. })), 6);
}
