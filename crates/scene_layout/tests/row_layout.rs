//! Row layout behavior across multiple models.

use core_units::{Length, SceneUnit};
use glam::Vec3;
use scene_layout::{layout_row, LayoutInput};

fn model(min: Vec3, max: Vec3, height: f64) -> LayoutInput {
    LayoutInput {
        aabb_min: min,
        aabb_max: max,
        height: Some(Length(height)),
        width_override: None,
        unit: None,
    }
}

fn world_x_range(input: &LayoutInput, p: &scene_layout::Placement) -> (f32, f32) {
    (
        p.target.x + input.aabb_min.x * p.scale,
        p.target.x + input.aabb_max.x * p.scale,
    )
}

#[test]
fn neighbours_sit_flush_with_fixed_gap() {
    let inputs = [
        model(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 1.0, 0.5), 1.7),
        model(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0), 4.3),
    ];
    let row = layout_row(&inputs, 0.5);
    let (a0, a1) = world_x_range(&inputs[0], &row.placements[0]);
    let (b0, b1) = world_x_range(&inputs[1], &row.placements[1]);
    assert!(a0.abs() < 1e-5, "row starts at x=0, got {a0}");
    assert!((b0 - a1 - 0.5).abs() < 1e-4, "gap must be 0.5, got {}", b0 - a1);
    assert!((row.scene_width - b1).abs() < 1e-4);
}

#[test]
fn off_center_origin_still_packs_flush() {
    // Mesh authored entirely in negative X, floating above the floor.
    let shifted = model(Vec3::new(-7.0, 2.0, 0.0), Vec3::new(-5.0, 4.0, 1.0), 2.0);
    let row = layout_row(&[shifted], 0.5);
    let p = row.placements[0];
    let (x0, _) = world_x_range(&shifted, &p);
    assert!(x0.abs() < 1e-5);
    // Scaled bounds floor lands on y = 0.
    let floor = p.target.y + shifted.aabb_min.y * p.scale;
    assert!(floor.abs() < 1e-5);
}

#[test]
fn shared_base_unit_shrinks_everything() {
    let human = model(Vec3::ZERO, Vec3::ONE, 1.7);
    let mut moon = model(Vec3::ZERO, Vec3::splat(2.0), 3_474_800.0);
    moon.unit = Some(SceneUnit(0.001));
    let lone = layout_row(&[human], 0.5).placements[0];
    let row = layout_row(&[human, moon], 0.5);
    // The human shrinks by the moon's unit; both share one factor.
    assert!((row.placements[0].scale - lone.scale * 0.001).abs() < 1e-9);
    assert!((row.placements[1].scale - 3_474.8 / 2.0).abs() < 1e-2);
}

#[test]
fn scene_width_has_no_trailing_gap() {
    let inputs = [
        model(Vec3::ZERO, Vec3::ONE, 1.0),
        model(Vec3::ZERO, Vec3::ONE, 1.0),
        model(Vec3::ZERO, Vec3::ONE, 1.0),
    ];
    let row = layout_row(&inputs, 0.5);
    assert!((row.scene_width - (3.0 + 2.0 * 0.5)).abs() < 1e-5);
}
