//! Normalized cross-correlation matching over template pyramids.

use image::{GrayImage, RgbImage};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};

use crate::Template;

/// Best correlation peak for a pyramid sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub score: f32,
    pub x: u32,
    pub y: u32,
    /// Dimensions of the pyramid level that produced the peak.
    pub width: u32,
    pub height: u32,
}

/// Prepare a capture for matching: grayscale, contrast normalization, light
/// blur to suppress UI glow artifacts.
pub fn prepare_capture(image: &RgbImage) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let eq = imageproc::contrast::equalize_histogram(&gray);
    imageproc::filter::gaussian_blur_f32(&eq, 0.8)
}

/// Best peak across every level of every template.
///
/// Levels that do not fit strictly inside the search image are skipped.
pub fn best_match(haystack: &GrayImage, templates: &[Template]) -> Option<Match> {
    let mut best: Option<Match> = None;
    for template in templates {
        for level in template.levels() {
            if level.width() >= haystack.width() || level.height() >= haystack.height() {
                continue;
            }
            let surface = match_template(haystack, level, MatchTemplateMethod::CrossCorrelationNormalized);
            let extremes = find_extremes(&surface);
            let score = extremes.max_value;
            if best.map_or(true, |b| score > b.score) {
                let (x, y) = extremes.max_value_location;
                best = Some(Match {
                    score,
                    x,
                    y,
                    width: level.width(),
                    height: level.height(),
                });
            }
        }
    }
    best
}

/// Best score alone, 0.0 when no level fits.
pub fn best_score(haystack: &GrayImage, templates: &[Template]) -> f32 {
    best_match(haystack, templates).map_or(0.0, |m| m.score)
}

/// Threshold-then-relax acceptance policy.
///
/// Returns the threshold actually used: the requested one when the score
/// clears it, the relaxed bound `max(floor, threshold - margin)` when the
/// score only clears that, `None` otherwise.
pub fn relaxed_accept(score: f32, threshold: f32, margin: f32, floor: f32) -> Option<f32> {
    if score >= threshold {
        return Some(threshold);
    }
    let relaxed = floor.max(threshold - margin);
    if score >= relaxed { Some(relaxed) } else { None }
}
