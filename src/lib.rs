// Root app shell and re-exports for workspace crates used by bins.
pub use assets_gltf;
pub use core_units;
pub use data_runtime;
pub use platform_winit;
pub use render_wgpu;
pub use scene_layout;
