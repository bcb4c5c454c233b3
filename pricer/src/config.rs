//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory. The matching
//! thresholds are empirically tuned and deliberately kept here rather than as
//! hard-coded constants.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Acceptance bound for the tooltip corner markers.
    pub corner_threshold: f32,
    /// Acceptance bound for item name templates.
    pub item_threshold: f32,
    /// Acceptance bound for the potential marker templates.
    pub potential_threshold: f32,
    /// Acceptance bound for inventory icon templates.
    pub inventory_threshold: f32,

    /// Template pyramid scale factors.
    pub template_scales: vision::ScaleSet,

    /// Hotkey names; the listener itself is wired up by the shell.
    pub hotkeys: Hotkeys,
    pub overlay: Overlay,

    /// Relative tooltip title band used by the OCR fallback.
    pub title_band: TitleBand,

    /// Dump intermediate recognition images for debugging.
    pub save_debug_images: bool,

    /// Template directory override; defaults to the local data dir.
    pub template_root: Option<PathBuf>,
    /// Price store override; defaults to the local data dir.
    pub price_store: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corner_threshold: 0.60,
            item_threshold: 0.85,
            potential_threshold: 0.90,
            inventory_threshold: 0.80,
            template_scales: vision::ScaleSet::default(),
            hotkeys: Hotkeys::default(),
            overlay: Overlay::default(),
            title_band: TitleBand::default(),
            save_debug_images: false,
            template_root: None,
            price_store: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub item_check: String,
    pub inventory_scan: String,
    pub template_capture: String,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            item_check: "F1".to_string(),
            inventory_scan: "F2".to_string(),
            template_capture: "F3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Overlay {
    pub duration_ms: u32,
    pub inventory_duration_ms: u32,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            duration_ms: 4000,
            inventory_duration_ms: 4000,
        }
    }
}

/// Tooltip title band in frame-relative coordinates (each value in 0..=1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleBand {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Default for TitleBand {
    fn default() -> Self {
        Self {
            x1: 0.24,
            y1: 0.06,
            x2: 0.92,
            y2: 0.18,
        }
    }
}

impl TitleBand {
    pub fn clamped(self) -> Self {
        let c = |v: f32| v.clamp(0.0, 1.0);
        Self {
            x1: c(self.x1),
            y1: c(self.y1),
            x2: c(self.x2),
            y2: c(self.y2),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("pricer.json"))
    }

    /// Load configuration from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("failed to load config; using defaults: {err:#}");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        let mut cfg: Config = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        cfg.title_band = cfg.title_band.clamped();
        Ok(cfg)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// Template directory, honoring the override.
    pub fn template_root(&self) -> PathBuf {
        self.template_root.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pricer")
                .join("templates")
        })
    }

    /// Price store path, honoring the override.
    pub fn price_store_path(&self) -> PathBuf {
        self.price_store.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pricer")
                .join("prices.json")
        })
    }
}
