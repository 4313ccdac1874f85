// End-to-end runs of the engine on simulated devices and virtual time.

mod common;

use std::time::Duration;

use common::{approx, config, spec, REVEAL_LEN};
use spot_core::{
    EngineParams, ExperienceState, FocusNotice, FocusPhase, Readiness, ResourceId, SensorKind,
    SpotError, StartupData, TargetId,
};
use spot_host::{AmbienceBed, AudioLibrary, Session, TraceBuilder};

fn session_with(yaws: &[f32], library: AudioLibrary) -> Session {
    let specs = yaws
        .iter()
        .enumerate()
        .map(|(i, y)| spec(&format!("t{i}"), *y))
        .collect();
    let params = EngineParams {
        seed: Some(9),
        ..Default::default()
    };
    Session::new(
        StartupData::new(config(), specs),
        params,
        library,
        &[SensorKind::RotationVector],
    )
    .expect("session starts")
}

fn session(yaws: &[f32]) -> Session {
    session_with(yaws, AudioLibrary::default())
}

#[test]
fn starts_ready_on_the_idle_bed() {
    let s = session(&[8.0]);
    assert_eq!(s.engine().state(), ExperienceState::Ready);
    assert_eq!(s.devices().ambience_bed, AmbienceBed::Idle);
    assert_eq!(s.devices().ambience_volume, 1.0);
    assert_eq!(s.presentation().experience, vec![ExperienceState::Ready]);
}

#[test]
fn samples_before_touch_are_ignored() {
    let mut s = session(&[8.0]);
    let report = s.run(&TraceBuilder::new().hold(0, 100, 20, 0.0).build());
    assert_eq!(report.samples_ignored, 6);
    assert_eq!(report.samples_processed, 0);
    assert_eq!(s.devices().binds, 0);
    assert_eq!(s.engine().focus().phase(), FocusPhase::Idle);
}

#[test]
fn approaching_targets_crossfade_with_ambience() {
    let mut s = session(&[8.0, 20.0, 60.0, -90.0]);
    s.run(&TraceBuilder::new().touch(0).hold(20, 500, 20, 0.0).build());

    assert_eq!(s.devices().ambience_bed, AmbienceBed::Active);
    assert_eq!(s.devices().binds, 2, "only two resources in the pool");
    assert_eq!(s.engine().pool().readiness(ResourceId(0)), Some(Readiness::Ready));

    let devices = s.devices();
    let r0 = devices.volume_of(ResourceId(0)).unwrap();
    let r1 = devices.volume_of(ResourceId(1)).unwrap();
    assert!(approx(r0, 0.8 - 0.8 * 8.0 / 30.0), "8° target at {r0}");
    assert!(approx(r1, 0.8 - 0.8 * 20.0 / 30.0), "20° target at {r1}");
    assert!(approx(devices.ambience_volume, 0.2 + 0.8 * 8.0 / 30.0));
    assert_eq!(devices.bound_assets[&ResourceId(0)], "t0.ogg");
}

#[test]
fn dwelling_reveals_text_then_solos_the_target() {
    let mut s = session(&[8.0, 20.0, 60.0]);
    let report = s.run(&TraceBuilder::new().touch(0).hold(20, 4000, 20, 0.0).build());

    assert_eq!(report.focused, 1);
    assert_eq!(s.engine().focus().focused_target(), Some(TargetId(0)));
    assert_eq!(s.devices().haptic_pulses, vec![Duration::from_millis(100)]);

    let devices = s.devices();
    assert_eq!(devices.volume_of(ResourceId(0)), Some(1.0), "focused target at full");
    assert_eq!(devices.volume_of(ResourceId(1)), Some(0.0), "others muted");
    assert_eq!(devices.ambience_volume, 0.0);

    let shown = s.presentation();
    assert_eq!(shown.shown_text('_'), "DescCat1 Disc - 2");
    assert_eq!(shown.reveals.len(), REVEAL_LEN);
    assert_eq!(shown.notices.first().copied(), Some(FocusNotice::Started(TargetId(0))));
    assert_eq!(shown.notices.last().copied(), Some(FocusNotice::Focused(TargetId(0))));
}

#[test]
fn focus_completes_on_schedule() {
    let mut s = session(&[8.0]);
    s.run(&TraceBuilder::new().touch(0).aim(20, 0.0).build());
    // Pre-focus delay ends at 1.02s with the first character
    s.advance_to(Duration::from_millis(1019));
    assert_eq!(s.engine().focus().phase(), FocusPhase::PreFocusDelay);
    s.advance_to(Duration::from_millis(1020));
    assert_eq!(s.engine().focus().phase(), FocusPhase::Revealing);
    assert_eq!(s.presentation().reveals.len(), 1);
    // Remaining characters over the next 16 steps of 2s / 17
    s.advance_to(Duration::from_millis(1020 + 1880 - 10));
    assert_eq!(s.engine().focus().phase(), FocusPhase::Revealing);
    s.advance_to(Duration::from_millis(1020 + 1890));
    assert_eq!(s.engine().focus().phase(), FocusPhase::Focused);
}

#[test]
fn looking_away_mid_reveal_restores_the_mix() {
    let mut s = session(&[8.0, 20.0]);
    let trace = TraceBuilder::new()
        .touch(0)
        .hold(20, 1500, 20, 0.0)
        .hold(1520, 3500, 20, 25.0)
        .build();
    let report = s.run(&trace);

    assert_eq!(report.focused, 0);
    assert!(s.devices().haptic_pulses.is_empty());
    let shown = s.presentation();
    assert!(shown.notices.contains(&FocusNotice::Cleared(TargetId(0))));
    // t1 at 5° starts its own sequence on the next sample
    assert_eq!(shown.focus, Some(TargetId(1)));
    assert_eq!(s.engine().focus().target(), Some(TargetId(1)));
}

#[test]
fn leaving_a_focused_target_restores_the_mix_on_the_same_sample() {
    let mut s = session(&[8.0]);
    s.run(&TraceBuilder::new().touch(0).hold(20, 4000, 20, 0.0).build());
    assert!(s.engine().focus().is_focused());
    assert_eq!(s.devices().ambience_volume, 0.0);

    // One sample with t0 20° away
    s.run(&TraceBuilder::new().aim(4020, 28.0).build());
    assert_eq!(s.engine().focus().phase(), FocusPhase::Idle);

    let expected_spot = 0.8 - 0.8 * 20.0 / 30.0;
    let expected_ambience = 0.2 + 0.8 * 20.0 / 30.0;
    let levels = s.engine().levels();
    assert!(approx(levels.get(TargetId(0)).unwrap(), expected_spot), "{levels:?}");
    assert!(approx(levels.ambience, expected_ambience), "{levels:?}");
    let devices = s.devices();
    let r0 = devices.volume_of(ResourceId(0)).unwrap();
    assert!(approx(r0, expected_spot), "t0 still at focused level {r0}");
    assert!(
        approx(devices.ambience_volume, expected_ambience),
        "ambience still muted after focus cleared: {}",
        devices.ambience_volume
    );
}

#[test]
fn stillness_pauses_then_settles_to_ready() {
    let mut s = session(&[8.0, 20.0]);
    let trace = TraceBuilder::new()
        .touch(0)
        .hold(20, 100, 20, 0.0)
        .wait(5100)
        .wait(8000)
        .build();
    let report = s.run(&trace);

    assert_eq!(report.pauses, 1, "idle timeout pauses once");
    assert_eq!(report.final_state, Some(ExperienceState::Ready));
    assert_eq!(
        s.presentation().experience,
        vec![
            ExperienceState::Ready,
            ExperienceState::Playing,
            ExperienceState::Pausing,
            ExperienceState::Ready
        ]
    );
    let devices = s.devices();
    assert_eq!(devices.releases, 2);
    assert_eq!(devices.ambience_bed, AmbienceBed::Idle);
    assert_eq!(devices.ambience_volume, 1.0);
    assert_eq!(s.engine().pool().available_count(), 2);
    assert_eq!(s.engine().focus().phase(), FocusPhase::Idle);
}

#[test]
fn pausing_is_not_ready_until_transition_ends() {
    let mut s = session(&[8.0]);
    s.run(&TraceBuilder::new().touch(0).aim(20, 0.0).pause(500).touch(1000).build());
    assert_eq!(s.engine().state(), ExperienceState::Pausing);
    assert_eq!(s.report().rejected_commands, 1, "touch during pausing is rejected");

    s.advance_to(Duration::from_millis(2500));
    assert_eq!(s.engine().state(), ExperienceState::Ready);
    s.run(&TraceBuilder::new().touch(2600).aim(2620, 0.0).build());
    assert_eq!(s.engine().state(), ExperienceState::Playing);
    assert_eq!(s.engine().focus().phase(), FocusPhase::PreFocusDelay);
}

#[test]
fn pause_keeps_loads_in_flight_but_silent() {
    let mut s = session(&[8.0, 20.0]);
    s.run(&TraceBuilder::new().touch(0).aim(20, 0.0).pause(50).wait(400).build());

    let engine = s.engine();
    assert_eq!(engine.pool().in_use_count(), 2, "preparing resources are not released");
    assert!(engine.pool().is_consistent(engine.registry()));
    let devices = s.devices();
    assert_eq!(devices.volume_of(ResourceId(0)), Some(0.0));
    assert_eq!(devices.volume_of(ResourceId(1)), Some(0.0));
}

#[test]
fn commands_outside_their_state_are_rejected() {
    let mut s = session(&[8.0]);
    s.run(&TraceBuilder::new().pause(0).touch(10).touch(20).build());
    assert_eq!(s.report().rejected_commands, 2);
    assert_eq!(s.engine().state(), ExperienceState::Playing);
}

#[test]
fn failed_asset_stays_silent() {
    let library = AudioLibrary::restricted_to(["t1.ogg"], Duration::from_millis(100));
    let mut s = session_with(&[8.0, 20.0], library);
    s.run(&TraceBuilder::new().touch(0).hold(20, 600, 20, 0.0).build());

    assert_eq!(s.engine().pool().readiness(ResourceId(0)), Some(Readiness::Failed));
    let devices = s.devices();
    assert_eq!(devices.volume_of(ResourceId(0)), Some(0.0));
    assert!(devices.volume_of(ResourceId(1)).unwrap() > 0.0);
}

#[test]
fn rejected_samples_keep_the_previous_aim() {
    let mut s = session(&[8.0]);
    let trace = TraceBuilder::new()
        .touch(0)
        .aim(20, 0.0)
        .push(
            40,
            spot_host::TraceAction::Sample {
                values: [f32::NAN, 0.0, 0.0],
                scalar: None,
            },
        )
        .build();
    let report = s.run(&trace);
    assert_eq!(report.samples_rejected, 1);
    assert!(s.engine().aim().is_some());
    assert_eq!(s.engine().focus().target(), Some(TargetId(0)));
}

#[test]
fn pool_stays_consistent_through_a_sweep() {
    let mut s = session(&[8.0, 20.0, 35.0, -15.0, -50.0, 90.0]);
    let trace = TraceBuilder::new()
        .touch(0)
        .sweep(20, 30, -120.0, 120.0, 200)
        .sweep(6100, 10, 120.0, -60.0, 100)
        .build();
    for event in &trace {
        s.apply(event);
        let engine = s.engine();
        assert!(
            engine.pool().is_consistent(engine.registry()),
            "inconsistent after {event:?}"
        );
    }
}

#[test]
fn missing_sensor_refuses_to_start() {
    let err = Session::new(
        StartupData::new(config(), vec![]),
        EngineParams::default(),
        AudioLibrary::default(),
        &[],
    )
    .err()
    .expect("no sensor");
    assert_eq!(
        err.downcast_ref::<SpotError>(),
        Some(&SpotError::NoOrientationSource)
    );
}

#[test]
fn demo_trace_focuses_and_ends_ready() {
    let startup = spot_host::parse_startup_toml(include_str!("../demos/startup.toml")).unwrap();
    let trace = spot_host::parse_trace(include_str!("../demos/trace.jsonl")).unwrap();
    let params = EngineParams {
        seed: Some(1),
        ..Default::default()
    };
    let mut s = Session::new(
        startup,
        params,
        AudioLibrary::default(),
        &[SensorKind::GeomagneticRotationVector],
    )
    .unwrap();
    let report = s.run(&trace);
    assert!(report.focused >= 1, "{report:?}");
    assert_eq!(report.final_state, Some(ExperienceState::Ready));
    assert_eq!(s.engine().accuracy(), spot_core::SensorAccuracy::Unreliable);
}
