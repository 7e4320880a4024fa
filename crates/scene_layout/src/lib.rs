//! scene_layout: pure scale normalization, row layout and camera control.
//!
//! Everything here is CPU math over `glam` types; no GPU handles, no IO.
//! The renderer feeds model bounds in and reads placements and view
//! matrices out, which keeps this crate fully unit-testable.

pub mod layout;
pub mod orbit;

pub use layout::{base_unit, focus_target, layout_row, smooth_factor, LayoutInput, Placement, RowLayout};
pub use orbit::OrbitCamera;
