//! Model catalog: the fixed table of comparable objects.
//!
//! The compiled-in copy of `data/models.json` is the source of truth; a file
//! named `models.json` under the data root replaces it wholesale when present.

use anyhow::{bail, Context, Result};
use core_units::{Length, SceneUnit};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const EMBEDDED: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/models.json"));

/// One catalog row. Exactly one of `height_m`/`width_override_m` drives the
/// reference dimension; `unit` shrinks the whole scene when this model is on.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    /// Mesh location relative to `<data_root>/models/`.
    pub path: String,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub width_override_m: Option<f64>,
    #[serde(default)]
    pub unit: Option<f64>,
}

impl ModelEntry {
    pub fn height(&self) -> Option<Length> {
        self.height_m.map(Length)
    }

    pub fn width_override(&self) -> Option<Length> {
        self.width_override_m.map(Length)
    }

    pub fn scene_unit(&self) -> Option<SceneUnit> {
        self.unit.map(SceneUnit)
    }
}

/// Parse and validate a catalog JSON document.
pub fn parse(json: &str) -> Result<Vec<ModelEntry>> {
    let entries: Vec<ModelEntry> = serde_json::from_str(json).context("parse catalog json")?;
    let mut seen: HashSet<&str> = HashSet::new();
    for e in &entries {
        if e.name.is_empty() {
            bail!("catalog entry with empty name");
        }
        if !seen.insert(e.name.as_str()) {
            bail!("duplicate catalog entry: {}", e.name);
        }
        if e.path.is_empty() {
            bail!("catalog entry {}: empty path", e.name);
        }
        if e.height_m.is_none() && e.width_override_m.is_none() {
            bail!("catalog entry {}: needs height_m or width_override_m", e.name);
        }
        if let Some(u) = e.unit {
            if !(u > 0.0) {
                bail!("catalog entry {}: unit must be > 0 (got {})", e.name, u);
            }
        }
    }
    Ok(entries)
}

/// Load the catalog: `<data_root>/models.json` when present, else the
/// embedded default table.
pub fn load_default(data_root: &Path) -> Result<Vec<ModelEntry>> {
    let path = data_root.join("models.json");
    if path.is_file() {
        let txt = std::fs::read_to_string(&path)
            .with_context(|| format!("read catalog: {}", path.display()))?;
        return parse(&txt).with_context(|| format!("catalog: {}", path.display()));
    }
    parse(EMBEDDED).context("embedded catalog")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses_and_validates() {
        let entries = parse(EMBEDDED).expect("embedded catalog");
        assert_eq!(entries.len(), 35);
        let human = entries.iter().find(|e| e.name == "human").expect("human");
        assert_eq!(human.height_m, Some(1.7));
        let train = entries.iter().find(|e| e.name == "100 meter").expect("train");
        assert!(train.height_m.is_none());
        assert_eq!(train.width_override_m, Some(100.0));
        let moon = entries.iter().find(|e| e.name == "moon").expect("moon");
        assert_eq!(moon.unit, Some(0.001));
        assert!((f64::from(moon.height().expect("height")) - 3_474_800.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_entry_without_dimension() {
        let json = r#"[{ "name": "box", "path": "box/scene.glb" }]"#;
        let err = parse(json).expect_err("must fail");
        assert!(err.to_string().contains("box"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"[
            { "name": "cat", "path": "a.glb", "height_m": 1.0 },
            { "name": "cat", "path": "b.glb", "height_m": 2.0 }
        ]"#;
        assert!(parse(json).is_err());
    }

    #[test]
    fn rejects_non_positive_unit() {
        let json = r#"[{ "name": "moon", "path": "moon.glb", "height_m": 1.0, "unit": 0.0 }]"#;
        assert!(parse(json).is_err());
    }
}
