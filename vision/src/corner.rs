//! Tooltip boundary detection via corner marker templates.
//!
//! The tooltip is framed by two distinctive glyphs; we find the top-left one
//! anywhere on the frame, then restrict the bottom-right search to the region
//! below-and-right of it so decorations above the tooltip can't hijack the
//! match. Each attempt leaves a full diagnostics record for the caller.

use image::RgbImage;

use crate::{Rect, TemplateStore, best_match, prepare_capture, relaxed_accept};

const TL_RELAX_MARGIN: f32 = 0.08;
const BR_RELAX_MARGIN: f32 = 0.05;
const RELAX_FLOOR: f32 = 0.52;

/// Minimum usable bottom-right search window, and the minimum width/height of
/// an accepted tooltip rectangle.
const MIN_WINDOW: u32 = 8;
const MIN_RECT_SIDE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum DetectionOutcome {
    #[default]
    NotRun,
    Ok,
    NoTemplates,
    TopLeftNotFound,
    SearchWindowDegenerate,
    BottomRightNotFound,
    GeometryInvalid,
}

/// Snapshot of the most recent detection attempt.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DetectionReport {
    pub outcome: DetectionOutcome,
    pub threshold: f32,
    pub scales: Vec<f32>,
    pub top_left_score: Option<f32>,
    pub bottom_right_score: Option<f32>,
    pub top_left_threshold_used: Option<f32>,
    pub bottom_right_threshold_used: Option<f32>,
    pub rect: Option<Rect>,
}

pub fn detect(store: &TemplateStore, capture: &RgbImage, threshold: f32) -> (Option<Rect>, DetectionReport) {
    let mut report = DetectionReport {
        outcome: DetectionOutcome::NotRun,
        threshold,
        scales: store.scales().factors().to_vec(),
        ..Default::default()
    };

    let (tl_templates, br_templates) = store.corner_templates();
    if tl_templates.is_empty() || br_templates.is_empty() {
        report.outcome = DetectionOutcome::NoTemplates;
        return (None, report);
    }

    let gray = prepare_capture(capture);

    let Some(tl) = best_match(&gray, tl_templates) else {
        report.outcome = DetectionOutcome::TopLeftNotFound;
        return (None, report);
    };
    report.top_left_score = Some(tl.score);

    let Some(used_tl) = relaxed_accept(tl.score, threshold, TL_RELAX_MARGIN, RELAX_FLOOR) else {
        report.outcome = DetectionOutcome::TopLeftNotFound;
        log::info!("top-left marker score {:.3} below threshold {:.2} — no crop", tl.score, threshold);
        return (None, report);
    };
    if used_tl < threshold {
        log::debug!(
            "relaxing top-left threshold from {threshold:.2} to {used_tl:.2} for score {:.3}",
            tl.score
        );
    }
    report.top_left_threshold_used = Some(used_tl);

    // Only search below-and-right of the top-left marker, at least half a
    // marker inward, so the bottom-right glyph can't match above the tooltip.
    let rx1 = (tl.x + (tl.width / 2).max(2)).min(gray.width().saturating_sub(1));
    let ry1 = (tl.y + (tl.height / 2).max(2)).min(gray.height().saturating_sub(1));
    if gray.width() - rx1 < MIN_WINDOW || gray.height() - ry1 < MIN_WINDOW {
        report.outcome = DetectionOutcome::SearchWindowDegenerate;
        return (None, report);
    }
    let window = image::imageops::crop_imm(&gray, rx1, ry1, gray.width() - rx1, gray.height() - ry1).to_image();

    let Some(br) = best_match(&window, br_templates) else {
        report.outcome = DetectionOutcome::BottomRightNotFound;
        return (None, report);
    };
    report.bottom_right_score = Some(br.score);

    let Some(used_br) = relaxed_accept(br.score, used_tl, BR_RELAX_MARGIN, RELAX_FLOOR) else {
        report.outcome = DetectionOutcome::BottomRightNotFound;
        log::info!(
            "corner scores tl={:.3} br={:.3} (< {:.2}) — no crop",
            tl.score,
            br.score,
            used_tl
        );
        return (None, report);
    };
    if used_br < used_tl {
        log::debug!(
            "relaxing bottom-right threshold from {used_tl:.2} to {used_br:.2} for score {:.3}",
            br.score
        );
    }
    report.bottom_right_threshold_used = Some(used_br);

    let (br_x, br_y) = (rx1 + br.x, ry1 + br.y);

    // Inset each marker's box inward by a sixteenth of its size so the glyph
    // itself stays outside the crop.
    let x1 = tl.x + (tl.width / 16).max(2);
    let y1 = tl.y + (tl.height / 16).max(2);
    let x2 = (br_x + br.width).saturating_sub((br.width / 16).max(2));
    let y2 = (br_y + br.height).saturating_sub((br.height / 16).max(2));

    if x2 <= x1 + MIN_RECT_SIDE || y2 <= y1 + MIN_RECT_SIDE {
        report.outcome = DetectionOutcome::GeometryInvalid;
        log::info!("corner geometry invalid tl=({x1},{y1}) br=({x2},{y2})");
        return (None, report);
    }

    let rect = Rect {
        x: x1,
        y: y1,
        w: x2 - x1,
        h: y2 - y1,
    };
    report.outcome = DetectionOutcome::Ok;
    report.rect = Some(rect);
    (Some(rect), report)
}
