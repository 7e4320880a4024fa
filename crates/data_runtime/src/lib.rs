//! data_runtime: data schemas and loaders for the viewer.
//!
//! Owns the model catalog (what can be shown and how tall it really is)
//! and the viewer TOML config, so the renderer and platform layers can
//! depend on a stable data API.

pub mod catalog;
pub mod viewer_cfg;

use std::path::PathBuf;

/// Resolve the runtime data directory.
///
/// `SIZEVIEW_DATA` overrides; otherwise prefer the top-level workspace
/// `data/` so tests and tools can run from any crate.
pub fn data_root() -> PathBuf {
    if let Ok(dir) = std::env::var("SIZEVIEW_DATA") {
        return PathBuf::from(dir);
    }
    let here = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let ws = here.join("../../data");
    if ws.is_dir() { ws } else { here.join("data") }
}
