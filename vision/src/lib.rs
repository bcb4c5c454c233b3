mod geometry;
pub use geometry::*;
mod template;
pub use template::*;
mod store;
pub use store::*;
mod matching;
pub use matching::*;

pub mod classify;
pub mod corner;
pub mod inventory;

pub use corner::{DetectionOutcome, DetectionReport};
pub use inventory::InventoryMatch;

use std::path::PathBuf;

/// Recognition engine: owns the template cache and the diagnostics of the
/// most recent corner detection.
pub struct Engine {
    templates: TemplateStore,
    last_detection: DetectionReport,
}

impl Engine {
    pub fn new(template_root: impl Into<PathBuf>, scales: ScaleSet) -> Self {
        Self {
            templates: TemplateStore::new(template_root, scales),
            last_detection: DetectionReport::default(),
        }
    }

    pub fn templates(&mut self) -> &mut TemplateStore {
        &mut self.templates
    }

    /// Drop all cached templates (called after a new sample is saved).
    pub fn invalidate(&mut self) {
        self.templates.invalidate();
    }

    /// Locate the tooltip rectangle on a full capture.
    ///
    /// Diagnostics for the attempt (scores, relaxed thresholds, failure
    /// reason) stay queryable through [`Engine::last_detection`].
    pub fn detect_roi(&mut self, capture: &image::RgbImage, threshold: f32) -> Option<Rect> {
        self.templates.refresh();
        let (rect, report) = corner::detect(&self.templates, capture, threshold);
        self.last_detection = report;
        rect
    }

    pub fn last_detection(&self) -> &DetectionReport {
        &self.last_detection
    }

    pub fn identify_item(&mut self, roi: &image::RgbImage, threshold: f32) -> Option<(String, f32)> {
        self.templates.refresh();
        classify::identify_item(&self.templates, roi, threshold)
    }

    pub fn classify_potential(&mut self, roi: &image::RgbImage, threshold: f32) -> (u8, f32) {
        self.templates.refresh();
        classify::classify_potential(&self.templates, roi, threshold)
    }

    pub fn scan_inventory(
        &mut self,
        region: &image::RgbImage,
        threshold: f32,
        max_per_item: usize,
        suppress_iou: f32,
    ) -> Vec<InventoryMatch> {
        self.templates.refresh();
        inventory::scan(&self.templates, region, threshold, max_per_item, suppress_iou)
    }
}
