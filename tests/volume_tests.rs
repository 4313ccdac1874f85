// Spot and ambience level mapping.

mod common;

use common::{aim_at, approx, pool, registry, SECONDARY};
use spot_core::volume::{ambience_volume, compute, spot_volume};
use spot_core::TargetId;

#[test]
fn spot_level_falls_linearly_to_secondary() {
    let id = TargetId(0);
    assert!(approx(spot_volume(id, 0.0, SECONDARY, None), 0.8));
    assert!(approx(spot_volume(id, 15.0, SECONDARY, None), 0.4));
    assert!(approx(spot_volume(id, 30.0, SECONDARY, None), 0.0));
    assert_eq!(spot_volume(id, 90.0, SECONDARY, None), 0.0, "clamped below zero");
}

#[test]
fn focus_solos_the_focused_target() {
    let focused = Some(TargetId(1));
    assert_eq!(spot_volume(TargetId(1), 9.0, SECONDARY, focused), 1.0);
    assert_eq!(spot_volume(TargetId(0), 2.0, SECONDARY, focused), 0.0);
}

#[test]
fn ambience_dips_as_aim_nears_a_target() {
    assert!(approx(ambience_volume(Some(0.0), SECONDARY, false), 0.2));
    assert!(approx(ambience_volume(Some(15.0), SECONDARY, false), 0.6));
    assert_eq!(ambience_volume(Some(30.0), SECONDARY, false), 1.0);
    assert_eq!(ambience_volume(Some(120.0), SECONDARY, false), 1.0);
    assert_eq!(ambience_volume(None, SECONDARY, false), 1.0, "no targets at all");
}

#[test]
fn ambience_is_muted_while_focused() {
    assert_eq!(ambience_volume(Some(3.0), SECONDARY, true), 0.0);
}

#[test]
fn compute_covers_only_targets_holding_resources() {
    let (mut pool, _) = pool(1);
    let mut reg = registry(&[15.0, 20.0]);
    aim_at(&mut reg, 0.0);
    pool.reallocate(&mut reg, SECONDARY);

    let levels = compute(&reg, SECONDARY, None);
    assert_eq!(levels.targets.len(), 1);
    assert!(approx(levels.get(TargetId(0)).unwrap(), 0.4));
    assert_eq!(levels.get(TargetId(1)), None);
    assert!(approx(levels.ambience, 0.6));
}

#[test]
fn compute_with_focus() {
    let (mut pool, _) = pool(2);
    let mut reg = registry(&[5.0, 20.0]);
    aim_at(&mut reg, 0.0);
    pool.reallocate(&mut reg, SECONDARY);

    let levels = compute(&reg, SECONDARY, Some(TargetId(0)));
    assert_eq!(levels.get(TargetId(0)), Some(1.0));
    assert_eq!(levels.get(TargetId(1)), Some(0.0));
    assert_eq!(levels.ambience, 0.0);
}
