//! Reference templates and their multi-scale pyramids.
//!
//! A template is a small grayscale crop saved by the user (an item name band,
//! an inventory icon, a potential marker, a tooltip corner). Matching runs
//! against several pre-scaled variants so the tooltip can be recognized at
//! slightly different UI scales without rescaling the capture itself.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::GrayImage;

/// Templates smaller than this on either side are rejected at load time and
/// pyramid levels never shrink below it.
pub const MIN_TEMPLATE_SIDE: u32 = 6;

/// The set of scale factors a pyramid is built for.
///
/// Factors outside 0.4..=2.5 are dropped; an empty set falls back to the
/// defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleSet(Vec<f32>);

impl Default for ScaleSet {
    fn default() -> Self {
        Self(vec![0.75, 0.85, 0.95, 1.0, 1.1, 1.25])
    }
}

impl ScaleSet {
    pub fn new(factors: impl IntoIterator<Item = f32>) -> Self {
        let factors: Vec<f32> = factors
            .into_iter()
            .filter(|s| (0.4..=2.5).contains(s))
            .collect();
        if factors.is_empty() {
            return Self::default();
        }
        Self(factors)
    }

    pub fn factors(&self) -> &[f32] {
        &self.0
    }
}

/// A loaded grayscale template plus its pre-scaled pyramid.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    modified: Option<SystemTime>,
    levels: Vec<GrayImage>,
}

impl Template {
    /// Load a template from disk and build its pyramid.
    ///
    /// Unreadable or undersized files are skipped with a warning (`None`).
    pub fn load(path: &Path, scales: &ScaleSet) -> Option<Self> {
        let base = match image::open(path) {
            Ok(img) => img.to_luma8(),
            Err(err) => {
                log::warn!("failed to load template {}: {err}", path.display());
                return None;
            }
        };
        if base.width() < MIN_TEMPLATE_SIDE || base.height() < MIN_TEMPLATE_SIDE {
            log::warn!(
                "template too small (skip): {} ({}x{})",
                path.display(),
                base.width(),
                base.height()
            );
            return None;
        }

        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        let mut levels = Vec::with_capacity(scales.factors().len());
        for &s in scales.factors() {
            if (s - 1.0).abs() < 1e-3 {
                levels.push(base.clone());
                continue;
            }
            let w = ((base.width() as f32 * s).round() as u32).max(MIN_TEMPLATE_SIDE);
            let h = ((base.height() as f32 * s).round() as u32).max(MIN_TEMPLATE_SIDE);
            levels.push(resize_gray(&base, w, h, s < 1.0));
        }

        Some(Self {
            path: path.to_path_buf(),
            modified,
            levels,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// All pyramid levels, in scale-set order.
    pub fn levels(&self) -> &[GrayImage] {
        &self.levels
    }
}

/// Resize a grayscale image with `fast_image_resize`.
///
/// Area (box) filtering when shrinking, CatmullRom when enlarging.
fn resize_gray(img: &GrayImage, width: u32, height: u32, shrinking: bool) -> GrayImage {
    let src = fast_image_resize::images::ImageRef::new(
        img.width(),
        img.height(),
        img.as_raw(),
        fast_image_resize::PixelType::U8,
    )
    .expect("fast_image_resize: ImageRef::new failed");

    let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8);

    let filter = if shrinking {
        fast_image_resize::FilterType::Box
    } else {
        fast_image_resize::FilterType::CatmullRom
    };
    let options = fast_image_resize::ResizeOptions::new()
        .resize_alg(fast_image_resize::ResizeAlg::Convolution(filter));

    let mut resizer = fast_image_resize::Resizer::new();
    resizer
        .resize(&src, &mut dst, &Some(options))
        .expect("fast_image_resize: resize failed");

    GrayImage::from_raw(width, height, dst.into_vec())
        .expect("resized buffer has the advertised dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| image::Luma([if (x + y) % 2 == 0 { 255 } else { 0 }]))
    }

    #[test]
    fn scale_set_filters_out_of_range() {
        let s = ScaleSet::new([0.1, 0.8, 1.0, 3.0]);
        assert_eq!(s.factors(), &[0.8, 1.0]);
    }

    #[test]
    fn scale_set_empty_falls_back_to_default() {
        let s = ScaleSet::new([]);
        assert_eq!(s.factors(), ScaleSet::default().factors());
    }

    #[test]
    fn pyramid_has_one_level_per_factor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("name_a.png");
        checker(32, 16).save(&path).unwrap();

        let tpl = Template::load(&path, &ScaleSet::default()).unwrap();
        assert_eq!(tpl.levels().len(), 6);
        // The 1.0 level keeps the original dimensions.
        assert!(tpl.levels().iter().any(|l| l.width() == 32 && l.height() == 16));
        // A shrunk level exists and respects the minimum side.
        assert!(tpl.levels().iter().all(|l| l.width() >= MIN_TEMPLATE_SIDE && l.height() >= MIN_TEMPLATE_SIDE));
    }

    #[test]
    fn undersized_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("name_tiny.png");
        checker(3, 3).save(&path).unwrap();
        assert!(Template::load(&path, &ScaleSet::default()).is_none());
    }

    #[test]
    fn unreadable_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("name_bad.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(Template::load(&path, &ScaleSet::default()).is_none());
    }
}
