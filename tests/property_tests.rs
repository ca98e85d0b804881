//! Property-based tests for the parser, smoothing, sequencer, and
//! persistence debounce.

#![cfg(not(target_os = "espidf"))]

use proptest::prelude::*;

use servolink::actuators::ActuatorBank;
use servolink::adapters::nvs::NvsStorage;
use servolink::app::commands::Command;
use servolink::persist::{self, Aggregate, PersistGateway, PersistSource};
use servolink::pins::NUM_SERVOS;
use servolink::protocol;
use servolink::tone::{self, TonePlayback, ToneOutput, ToneSequencer};

proptest! {
    // ── Parser totality ────────────────────────────────────────────

    #[test]
    fn parser_never_panics_on_arbitrary_bytes(frame in proptest::collection::vec(any::<u8>(), 0..200)) {
        let _ = protocol::parse(&frame);
    }

    #[test]
    fn parser_never_panics_on_structured_garbage(
        verb in "[a-z]{0,8}",
        a in any::<i64>(),
        b in any::<i64>(),
    ) {
        let frame = format!("{verb}:{a}:{b}");
        let _ = protocol::parse(frame.as_bytes());
    }

    // ── Angle clamp ────────────────────────────────────────────────

    #[test]
    fn servo_angles_always_clamp_into_range(index in 0usize..NUM_SERVOS, angle in -1000i32..1000) {
        let frame = format!("servo:{index}:{angle}");
        match protocol::parse(frame.as_bytes()) {
            Some(Command::SetServoTarget { index: i, angle: applied }) => {
                prop_assert_eq!(i, index);
                prop_assert_eq!(i32::from(applied), angle.clamp(0, 180));
            }
            other => prop_assert!(false, "expected servo command, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_filter_is_always_rejected(value in prop_oneof![
        1.0001f32..1e6,
        -1e6f32..-0.0001,
    ]) {
        let frame = format!("filter:{value}");
        prop_assert_eq!(protocol::parse(frame.as_bytes()), None);
    }

    // ── Smoothing convergence ──────────────────────────────────────

    #[test]
    fn smoothing_converges_within_the_analytic_bound(
        target in 0u8..=180,
        filter in 0.0f32..0.99,
    ) {
        let mut bank = ActuatorBank::new(90, filter);
        bank.set_servo_target(0, target);

        // |current - T| shrinks by `filter` per tick from at most 180:
        // ticks needed = ceil(ln(180/0.5) / ln(1/filter)), capped for
        // filter -> 0 where one tick suffices.
        let ticks = if filter < 0.01 {
            1
        } else {
            ((180.0f32 / 0.5).ln() / (1.0 / filter).ln()).ceil() as usize + 1
        };
        for _ in 0..ticks {
            bank.step_smoothing();
        }
        prop_assert!((bank.servo_current(0) - f32::from(target)).abs() < 1.0);
    }

    #[test]
    fn smoothing_is_monotone_and_bounded(
        start in 0u8..=180,
        target in 0u8..=180,
        filter in 0.0f32..=1.0,
    ) {
        let mut bank = ActuatorBank::new(start, filter);
        bank.set_servo_target(0, target);
        let mut prev = bank.servo_current(0);
        for _ in 0..100 {
            bank.step_smoothing();
            let now = bank.servo_current(0);
            if f32::from(target) >= f32::from(start) {
                prop_assert!(now >= prev - 1e-3 && now <= 180.0);
            } else {
                prop_assert!(now <= prev + 1e-3 && now >= 0.0);
            }
            prev = now;
        }
    }

    // ── Tone sequencer termination ─────────────────────────────────

    #[test]
    fn well_formed_sequences_terminate_on_schedule(
        steps in proptest::collection::vec((1u16..5000, 0u8..=100, 1u32..1000), 1..10),
    ) {
        let text: String = steps
            .iter()
            .map(|(f, v, d)| format!("{f},{v},{d}"))
            .collect::<Vec<_>>()
            .join(";");
        let total: u64 = steps.iter().map(|(_, _, d)| u64::from(*d)).sum();

        let mut seq = ToneSequencer::new();
        seq.submit(&text, 0);
        prop_assert_eq!(seq.state(), TonePlayback::Playing);

        // Tick at 1 ms granularity; must silence exactly at the sum of
        // durations and never after.
        let mut silenced_at = None;
        for now in 0..=total + 10 {
            if seq.tick(now) == ToneOutput::Silence {
                silenced_at = Some(now);
                break;
            }
        }
        prop_assert_eq!(silenced_at, Some(total));
        prop_assert!(seq.is_idle());
    }

    #[test]
    fn tone_parser_never_panics(text in ".{0,96}") {
        let _ = tone::parse_steps(&text);
    }

    // ── Debounce coalescing ────────────────────────────────────────

    #[test]
    fn n_mutations_in_one_window_write_once(
        mark_offsets in proptest::collection::vec(0u64..1000, 1..20),
        final_value in any::<bool>(),
    ) {
        let mut storage = NvsStorage::new();
        let mut gw = PersistGateway::new(1000);
        let mut mark_offsets = mark_offsets;
        mark_offsets.sort_unstable();
        for offset in &mark_offsets {
            gw.mark_dirty(Aggregate::AutoMap, *offset);
        }

        let text = heapless::String::new();
        let src = PersistSource { auto_map: final_value, tone_text: &text };
        let first = mark_offsets[0];

        // Nothing flushes before the window anchored to the first mark.
        prop_assert_eq!(gw.tick(&mut storage, &src, first + 999), (0, 0));
        prop_assert_eq!(gw.tick(&mut storage, &src, first + 1000), (1, 0));
        // Window closed: no further writes without a new mutation.
        prop_assert_eq!(gw.tick(&mut storage, &src, first + 5000), (0, 0));
        prop_assert_eq!(persist::load_auto_map(&storage), final_value);
    }
}
