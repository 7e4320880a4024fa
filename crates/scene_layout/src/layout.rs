//! Scale normalization and flush row placement.
//!
//! The rule set:
//! - All visible models share one base unit: the smallest `unit` among them,
//!   identity when none declares one. Heights are meters; `unit` rescales
//!   meters into scene units so planet-sized bodies stay addressable in f32.
//! - Each model is scaled so its reference dimension (bounds height, or
//!   bounds width when a width override is set) matches its real-world size
//!   times the base unit.
//! - Models pack left to right along +X with a fixed gap. Targets compensate
//!   for the mesh origin via the scaled bounds, so bodies sit flush and rest
//!   on y = 0 no matter where the author put the pivot.

use core_units::{Length, SceneUnit};
use glam::Vec3;

/// Per-model facts the layout needs: object-space bounds plus catalog sizing.
/// Callers pass visible, loaded models in catalog order.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput {
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,
    pub height: Option<Length>,
    pub width_override: Option<Length>,
    pub unit: Option<SceneUnit>,
}

/// Where a model should end up and how big it is once there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub target: Vec3,
    /// Scaled bounds width along X, used for row accounting.
    pub width: f32,
}

#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    pub placements: Vec<Placement>,
    /// Sum of scaled widths plus gaps (no trailing gap).
    pub scene_width: f32,
}

/// Smallest declared unit wins so the largest body fits; identity otherwise.
pub fn base_unit(inputs: &[LayoutInput]) -> SceneUnit {
    inputs
        .iter()
        .filter_map(|i| i.unit)
        .reduce(SceneUnit::min)
        .unwrap_or(SceneUnit::ONE)
}

/// Compute scales and targets for a row of models separated by `gap`.
pub fn layout_row(inputs: &[LayoutInput], gap: f32) -> RowLayout {
    let unit = base_unit(inputs);
    let mut placements = Vec::with_capacity(inputs.len());
    let mut running = 0.0f32;
    for (i, input) in inputs.iter().enumerate() {
        let size = input.aabb_max - input.aabb_min;
        let (reference, target_dim) = match input.width_override {
            Some(w) => (size.x, w),
            None => (size.y, input.height.unwrap_or(Length(0.0))),
        };
        let target_scene = target_dim * unit;
        let scale = if reference > f32::EPSILON && target_scene > 0.0 {
            (target_scene / reference as f64) as f32
        } else {
            log::warn!(
                "layout: degenerate reference dimension ({reference}) or target ({target_scene}); keeping unit scale"
            );
            1.0
        };
        let width = size.x * scale;
        let center_z = 0.5 * (input.aabb_min.z + input.aabb_max.z);
        let target = Vec3::new(
            running - input.aabb_min.x * scale,
            -input.aabb_min.y * scale,
            -center_z * scale,
        );
        placements.push(Placement { scale, target, width });
        running += width;
        if i + 1 < inputs.len() {
            running += gap;
        }
    }
    RowLayout { placements, scene_width: running }
}

/// Frame-rate-independent smoothing: the fraction of remaining distance to
/// cover this frame, equivalent to `per_frame` per tick at 60 Hz.
pub fn smooth_factor(per_frame: f32, dt: f32) -> f32 {
    1.0 - (1.0 - per_frame.clamp(0.0, 1.0)).powf(60.0 * dt)
}

/// Where the camera should look: the row midpoint, never below the floor.
pub fn focus_target(scene_width: f32, current: Vec3) -> Vec3 {
    Vec3::new(scene_width * 0.5, current.y.max(0.0), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(min: Vec3, max: Vec3, height: f64) -> LayoutInput {
        LayoutInput {
            aabb_min: min,
            aabb_max: max,
            height: Some(Length(height)),
            width_override: None,
            unit: None,
        }
    }

    #[test]
    fn base_unit_is_min_of_declared() {
        let mut a = input(Vec3::ZERO, Vec3::ONE, 1.0);
        let mut b = input(Vec3::ZERO, Vec3::ONE, 1.0);
        assert_eq!(f64::from(base_unit(&[a, b])), 1.0);
        a.unit = Some(SceneUnit(0.1));
        b.unit = Some(SceneUnit(0.001));
        assert_eq!(f64::from(base_unit(&[a, b])), 0.001);
    }

    #[test]
    fn height_drives_scale() {
        let row = layout_row(&[input(Vec3::ZERO, Vec3::new(1.0, 2.0, 1.0), 1.7)], 0.5);
        let p = row.placements[0];
        assert!((p.scale - 0.85).abs() < 1e-6);
        assert!((p.width - 0.85).abs() < 1e-6);
    }

    #[test]
    fn width_override_uses_x_extent() {
        let mut i = input(Vec3::ZERO, Vec3::new(4.0, 1.0, 1.0), 0.0);
        i.height = None;
        i.width_override = Some(Length(100.0));
        let row = layout_row(&[i], 0.5);
        assert!((row.placements[0].scale - 25.0).abs() < 1e-4);
        assert!((row.placements[0].width - 100.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_bounds_keep_unit_scale() {
        let row = layout_row(&[input(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), 1.7)], 0.5);
        assert_eq!(row.placements[0].scale, 1.0);
    }

    #[test]
    fn smooth_factor_matches_reference_rate() {
        assert!((smooth_factor(0.1, 1.0 / 60.0) - 0.1).abs() < 1e-6);
        // Two 30 Hz frames cover the same ground as four 60 Hz frames.
        let slow = smooth_factor(0.1, 1.0 / 30.0);
        let fast = smooth_factor(0.1, 1.0 / 60.0);
        let two_fast = 1.0 - (1.0 - fast) * (1.0 - fast);
        assert!((slow - two_fast).abs() < 1e-6);
    }

    #[test]
    fn focus_never_sinks_below_floor() {
        let f = focus_target(10.0, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(f, Vec3::new(5.0, 0.0, 0.0));
        let f = focus_target(10.0, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(f.y, 2.0);
    }
}
