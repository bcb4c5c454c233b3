//! Multi-instance icon search over an inventory capture.

use image::RgbImage;
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};

use crate::{Rect, Template, TemplateStore, prepare_capture};

/// IoU bound for merging overlapping detections of the *same* item before the
/// cross-item pass applies the caller's `suppress_iou`.
const PER_ITEM_SUPPRESS_IOU: f32 = 0.4;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InventoryMatch {
    pub item: String,
    pub score: f32,
    pub rect: Rect,
}

/// Locate every known item's icon templates inside `region`.
///
/// Per item: greedily extract correlation peaks, zeroing a template-sized
/// block around each so the same icon is not re-detected, keeping at most
/// `max_per_item` non-overlapping peaks. Across items: keep candidates in
/// descending score order unless they overlap an already-kept rectangle by
/// more than `suppress_iou`. The result is sorted by descending score.
pub fn scan(
    store: &TemplateStore,
    region: &RgbImage,
    threshold: f32,
    max_per_item: usize,
    suppress_iou: f32,
) -> Vec<InventoryMatch> {
    let gray = prepare_capture(region);

    let mut candidates: Vec<InventoryMatch> = Vec::new();
    for (item, templates) in store.items() {
        if templates.icons.is_empty() {
            continue;
        }
        for m in collect_item_matches(&gray, &templates.icons, threshold, max_per_item) {
            candidates.push(InventoryMatch {
                item: item.to_string(),
                score: m.0,
                rect: m.1,
            });
        }
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<InventoryMatch> = Vec::new();
    for candidate in candidates {
        if kept.iter().any(|k| k.rect.iou(&candidate.rect) > suppress_iou) {
            continue;
        }
        kept.push(candidate);
    }
    kept
}

/// Greedy peak extraction for one item's icon pyramid.
fn collect_item_matches(
    gray: &image::GrayImage,
    icons: &[Template],
    threshold: f32,
    max_per_item: usize,
) -> Vec<(f32, Rect)> {
    let mut raw: Vec<(f32, Rect)> = Vec::new();

    for icon in icons {
        for level in icon.levels() {
            if level.width() >= gray.width() || level.height() >= gray.height() {
                continue;
            }
            let mut surface = match_template(gray, level, MatchTemplateMethod::CrossCorrelationNormalized);
            loop {
                let extremes = find_extremes(&surface);
                if extremes.max_value < threshold {
                    break;
                }
                let (x, y) = extremes.max_value_location;
                raw.push((
                    extremes.max_value,
                    Rect {
                        x,
                        y,
                        w: level.width(),
                        h: level.height(),
                    },
                ));
                zero_block(&mut surface, x, y, level.width(), level.height());
            }
        }
    }

    raw.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut accepted: Vec<(f32, Rect)> = Vec::new();
    for (score, rect) in raw {
        if accepted.iter().any(|(_, kept)| kept.iou(&rect) > PER_ITEM_SUPPRESS_IOU) {
            continue;
        }
        accepted.push((score, rect));
        if accepted.len() >= max_per_item {
            break;
        }
    }
    accepted
}

fn zero_block(surface: &mut image::ImageBuffer<image::Luma<f32>, Vec<f32>>, x: u32, y: u32, w: u32, h: u32) {
    let x2 = (x + w).min(surface.width());
    let y2 = (y + h).min(surface.height());
    for yy in y..y2 {
        for xx in x..x2 {
            surface.put_pixel(xx, yy, image::Luma([0.0]));
        }
    }
}
