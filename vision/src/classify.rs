//! Item identification and potential-slot classification for a tooltip ROI.

use image::RgbImage;

use crate::{TemplateStore, best_score, prepare_capture, relaxed_accept};

pub const ITEM_THRESHOLD: f32 = 0.85;
const ITEM_RELAX_MARGIN: f32 = 0.07;
const ITEM_RELAX_FLOOR: f32 = 0.72;

pub const POTENTIAL_THRESHOLD: f32 = 0.90;
const POTENTIAL_RELAX_MARGIN: f32 = 0.08;
const POTENTIAL_RELAX_FLOOR: f32 = 0.78;

/// Match the ROI against every known item's name templates.
///
/// Returns the best item and its score when it clears `threshold`, or the
/// relaxed bound `max(0.72, threshold - 0.07)` (logged); `None` otherwise.
pub fn identify_item(store: &TemplateStore, roi: &RgbImage, threshold: f32) -> Option<(String, f32)> {
    let gray = prepare_capture(roi);

    let mut best: Option<(&str, f32)> = None;
    for (item, templates) in store.items() {
        if templates.names.is_empty() {
            continue;
        }
        let score = best_score(&gray, &templates.names);
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((item, score));
        }
    }

    let (item, score) = best?;
    match relaxed_accept(score, threshold, ITEM_RELAX_MARGIN, ITEM_RELAX_FLOOR) {
        Some(used) if used < threshold => {
            log::info!("template match '{item}' accepted at {score:.3} (relaxed from {threshold:.2})");
            Some((item.to_string(), score))
        }
        Some(_) => Some((item.to_string(), score)),
        None => {
            log::debug!("best template score {score:.3} for '{item}' below relaxed threshold");
            None
        }
    }
}

/// Classify the 0-4 potential level of a tooltip ROI.
///
/// Slots 1-4 each have a global marker template; slot 0 has none, so when no
/// marker clears even the relaxed bound the result is slot 0 with the best
/// sub-threshold score observed. This is a normal outcome, not an error.
pub fn classify_potential(store: &TemplateStore, roi: &RgbImage, threshold: f32) -> (u8, f32) {
    let gray = prepare_capture(roi);

    let mut best_slot = 0u8;
    let mut best = 0.0f32;
    for slot in 1..=4u8 {
        let templates = store.potential_templates(slot);
        if templates.is_empty() {
            continue;
        }
        let score = best_score(&gray, templates);
        if score > best {
            best = score;
            best_slot = slot;
        }
    }

    if best_slot == 0 {
        return (0, best);
    }
    match relaxed_accept(best, threshold, POTENTIAL_RELAX_MARGIN, POTENTIAL_RELAX_FLOOR) {
        Some(used) if used < threshold => {
            log::info!("potential {best_slot} detected at {best:.3} (relaxed from {threshold:.2})");
            (best_slot, best)
        }
        Some(_) => (best_slot, best),
        None => {
            log::debug!("best potential score {best:.3} for slot {best_slot} below relaxed threshold");
            (0, best)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScaleSet;
    use crate::TemplateStore;
    use image::{GrayImage, RgbImage};

    fn pattern(w: u32, h: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let mut v = x
                .wrapping_mul(0x9E37_79B1)
                ^ y.wrapping_mul(0x85EB_CA77)
                ^ seed.wrapping_mul(0xC2B2_AE3D);
            v ^= v >> 13;
            v = v.wrapping_mul(0x27D4_EB2F);
            image::Luma([(v >> 8) as u8])
        })
    }

    fn to_rgb(gray: &GrayImage) -> RgbImage {
        RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
            let v = gray.get_pixel(x, y).0[0];
            image::Rgb([v, v, v])
        })
    }

    fn paste(dst: &mut GrayImage, src: &GrayImage, x: u32, y: u32) {
        for sy in 0..src.height() {
            for sx in 0..src.width() {
                dst.put_pixel(x + sx, y + sy, *src.get_pixel(sx, sy));
            }
        }
    }

    fn seeded_store(dir: &std::path::Path) -> (TemplateStore, GrayImage, GrayImage, GrayImage) {
        let sword = pattern(48, 14, 11);
        let bow = pattern(48, 14, 22);
        let lp2 = pattern(18, 18, 33);

        std::fs::create_dir_all(dir.join("sword")).unwrap();
        std::fs::create_dir_all(dir.join("bow")).unwrap();
        std::fs::create_dir_all(dir.join("lp")).unwrap();
        sword.save(dir.join("sword/name_1.png")).unwrap();
        bow.save(dir.join("bow/name_1.png")).unwrap();
        lp2.save(dir.join("lp/2lp.png")).unwrap();
        pattern(18, 18, 44).save(dir.join("lp/1lp.png")).unwrap();
        pattern(18, 18, 55).save(dir.join("lp/3lp.png")).unwrap();

        let mut store = TemplateStore::new(dir, ScaleSet::new([1.0]));
        store.refresh();
        (store, sword, bow, lp2)
    }

    #[test]
    fn identifies_the_matching_item() {
        let dir = tempfile::tempdir().unwrap();
        let (store, sword, _, _) = seeded_store(dir.path());

        let mut roi = pattern(120, 60, 77);
        paste(&mut roi, &sword, 20, 10);

        let (item, score) = identify_item(&store, &to_rgb(&roi), 0.6).expect("item should match");
        assert_eq!(item, "sword");
        assert!(score >= 0.6, "score = {score}");
    }

    #[test]
    fn unknown_roi_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _, _, _) = seeded_store(dir.path());

        let roi = pattern(120, 60, 88);
        assert!(identify_item(&store, &to_rgb(&roi), 0.99).is_none());
    }

    #[test]
    fn classifies_the_visible_potential_marker() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _, _, lp2) = seeded_store(dir.path());

        let mut roi = pattern(100, 50, 99);
        paste(&mut roi, &lp2, 60, 20);

        let (slot, score) = classify_potential(&store, &to_rgb(&roi), 0.85);
        assert_eq!(slot, 2);
        assert!(score >= 0.85, "score = {score}");
    }

    #[test]
    fn no_marker_means_slot_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _, _, _) = seeded_store(dir.path());

        let roi = pattern(100, 50, 123);
        let (slot, score) = classify_potential(&store, &to_rgb(&roi), 0.99);
        assert_eq!(slot, 0);
        assert!(score > 0.0 && score < 0.99);
    }
}
