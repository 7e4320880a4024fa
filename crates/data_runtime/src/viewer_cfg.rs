//! Viewer configuration loaded from data/config/viewer.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerCfg {
    pub window_title: Option<String>,
    /// Gap between neighbouring models in scene units.
    pub gap: Option<f32>,
    /// Revolutions per 30 seconds while the camera idles; negative reverses.
    pub auto_rotate_speed: Option<f32>,
    /// Orbit smoothing factor per frame at 60 Hz.
    pub damping: Option<f32>,
    pub font_path: Option<String>,
    pub default_enabled: Option<Vec<String>>,
}

impl Default for ViewerCfg {
    fn default() -> Self {
        Self {
            window_title: Some("sizeview".to_string()),
            gap: Some(0.5),
            auto_rotate_speed: Some(-2.0),
            damping: Some(0.05),
            font_path: None,
            default_enabled: Some(vec!["human".to_string()]),
        }
    }
}

impl ViewerCfg {
    pub fn window_title(&self) -> &str {
        self.window_title.as_deref().unwrap_or("sizeview")
    }

    pub fn gap(&self) -> f32 {
        self.gap.unwrap_or(0.5)
    }

    pub fn auto_rotate_speed(&self) -> f32 {
        self.auto_rotate_speed.unwrap_or(-2.0)
    }

    pub fn damping(&self) -> f32 {
        self.damping.unwrap_or(0.05)
    }

    pub fn default_enabled(&self) -> &[String] {
        self.default_enabled.as_deref().unwrap_or(&[])
    }

    pub fn font_path(&self) -> Option<&Path> {
        self.font_path.as_deref().map(Path::new)
    }
}

pub fn load_default(data_root: &Path) -> Result<ViewerCfg> {
    let path = data_root.join("config/viewer.toml");
    let mut cfg = if path.is_file() {
        let txt =
            std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str::<ViewerCfg>(&txt).context("parse viewer TOML")?
    } else {
        ViewerCfg::default()
    };
    // Env overrides for quick tuning (optional)
    if let Ok(p) = std::env::var("SIZEVIEW_FONT") {
        cfg.font_path = Some(p);
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ViewerCfg::default();
        assert_eq!(cfg.gap(), 0.5);
        assert_eq!(cfg.auto_rotate_speed(), -2.0);
        assert_eq!(cfg.default_enabled(), ["human".to_string()]);
    }

    #[test]
    fn partial_toml_keeps_missing_keys_none() {
        let cfg: ViewerCfg = toml::from_str("gap = 1.25\n").expect("parse");
        assert_eq!(cfg.gap(), 1.25);
        assert!(cfg.window_title.is_none());
        assert_eq!(cfg.damping(), 0.05);
    }
}
