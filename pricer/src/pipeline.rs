//! Single-shot recognition pipelines.
//!
//! Both entry points take an already-captured frame: `check_item` resolves
//! the tooltip under the cursor to a price, `scan_inventory` finds every
//! known icon in an inventory region. Capture and rendering stay outside.

use anyhow::Result;
use image::RgbImage;

use data::{FindOptions, LpValue, PriceDb};
use vision::{Engine, Rect};

use crate::Config;
use crate::format;

const FIND_THRESHOLD: u32 = 80;
const INVENTORY_FIND_THRESHOLD: u32 = 70;
const INVENTORY_MAX_PER_ITEM: usize = 3;
const INVENTORY_SUPPRESS_IOU: f32 = 0.35;
/// At most this many hints per item survive deduplication.
const INVENTORY_HINT_CAP: usize = 9;

pub struct Pricer {
    engine: Engine,
    db: PriceDb,
    config: Config,
}

/// Outcome of a tooltip check.
#[derive(Debug, Clone)]
pub enum ItemCheck {
    Identified(ItemReading),
    /// No name template cleared the (relaxed) threshold; the caller should
    /// offer to capture a new sample.
    TemplateMissing {
        roi: Option<Rect>,
        potential: u8,
        potential_score: f32,
        overlay_text: String,
    },
}

#[derive(Debug, Clone)]
pub struct ItemReading {
    pub item: String,
    pub score: f32,
    pub potential: u8,
    pub potential_score: f32,
    pub roi: Option<Rect>,
    /// Resolved slot value, when the knowledge base knows the item.
    pub price: Option<LpValue>,
    /// Two lines: item name with its potential, then the price or a
    /// "not in the table" note.
    pub overlay_text: String,
}

/// One recognized inventory icon with its per-potential price lines.
#[derive(Debug, Clone)]
pub struct InventoryHint {
    pub item: String,
    pub score: f32,
    pub rect: Rect,
    pub lines: Vec<String>,
}

impl Pricer {
    pub fn open(config: Config) -> Result<Self> {
        let engine = Engine::new(config.template_root(), config.template_scales.clone());
        let db = PriceDb::open(config.price_store_path())?;
        Ok(Self { engine, db, config })
    }

    pub fn db(&self) -> &PriceDb {
        &self.db
    }

    pub fn engine(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the tooltip in `capture` to an item and a price.
    pub fn check_item(&mut self, capture: &RgbImage) -> ItemCheck {
        let roi_rect = self.engine.detect_roi(capture, self.config.corner_threshold);
        log::debug!("corner detection: {:?}", self.engine.last_detection());

        let roi_img = match roi_rect {
            Some(rect) => image::imageops::crop_imm(capture, rect.x, rect.y, rect.w, rect.h).to_image(),
            None => {
                log::info!("corner ROI not found; falling back to the full capture");
                capture.clone()
            }
        };

        let (potential, potential_score) = self
            .engine
            .classify_potential(&roi_img, self.config.potential_threshold);

        let Some((item, score)) = self.engine.identify_item(&roi_img, self.config.item_threshold) else {
            return ItemCheck::TemplateMissing {
                roi: roi_rect,
                potential,
                potential_score,
                overlay_text: format!("Шаблон не найден (ЛП {potential})\nСоздайте новый образец"),
            };
        };

        let price = self.lookup_price(&item, potential);
        let second = match &price {
            Some(value) if value.is_set() => format::display_value(value),
            _ => "нет в таблице".to_string(),
        };
        let overlay_text = format!("{item} (ЛП {potential})\n{second}");
        log::info!("identified '{item}' (score={score:.2}, potential={potential})");

        ItemCheck::Identified(ItemReading {
            item,
            score,
            potential,
            potential_score,
            roi: roi_rect,
            price,
            overlay_text,
        })
    }

    /// Prefer an entry with data for the observed potential, then fall back
    /// to the best unrestricted match.
    fn lookup_price(&self, item: &str, potential: u8) -> Option<LpValue> {
        if potential > 0 {
            let strict = FindOptions {
                threshold: FIND_THRESHOLD,
                potential: Some(potential),
                strict_potential: true,
            };
            if let Some((_, entry, _)) = self.db.find_best(&[item], &strict) {
                return Some(entry.slots[potential as usize].clone());
            }
        }
        let (_, entry, _) = self.db.find_best(&[item], &FindOptions::default())?;
        Some(entry.slots[potential as usize].clone())
    }

    /// Resolve recognized text lines (from an external OCR fallback) to an
    /// entry, preferring matches with data for the observed potential.
    pub fn lookup_by_lines(
        &self,
        lines: &[&str],
        potential: Option<u8>,
    ) -> Option<(String, data::PriceEntry, u32)> {
        if let Some(p) = potential.filter(|p| *p > 0) {
            let strict = FindOptions {
                threshold: FIND_THRESHOLD,
                potential: Some(p),
                strict_potential: true,
            };
            if let Some(found) = self.db.find_best(lines, &strict) {
                return Some(found);
            }
        }
        self.db.find_best(lines, &FindOptions::default())
    }

    /// Find every known item icon in an inventory capture.
    pub fn scan_inventory(&mut self, capture: &RgbImage) -> Vec<InventoryHint> {
        let matches = self.engine.scan_inventory(
            capture,
            self.config.inventory_threshold,
            INVENTORY_MAX_PER_ITEM,
            INVENTORY_SUPPRESS_IOU,
        );

        let hints: Vec<InventoryHint> = matches
            .into_iter()
            .map(|m| InventoryHint {
                lines: price_lines(&self.db, &m.item),
                item: m.item,
                score: m.score,
                rect: m.rect,
            })
            .collect();

        limit_duplicates(hints, INVENTORY_HINT_CAP)
    }
}

/// Overlay lines for one item: title, then one line per potential slot.
fn price_lines(db: &PriceDb, item: &str) -> Vec<String> {
    let title = {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            "Неизвестный предмет".to_string()
        } else {
            trimmed.to_string()
        }
    };

    let slots = db
        .get_prices_by_potential(item, INVENTORY_FIND_THRESHOLD)
        .map(|(_, slots)| slots);

    let mut lines = Vec::with_capacity(1 + data::LP_SLOTS);
    lines.push(title);
    for potential in 0..data::LP_SLOTS {
        let value = match &slots {
            Some(slots) => format::display_value(&slots[potential]),
            None => format::ABSENT.to_string(),
        };
        lines.push(format!("{potential} ЛП: {value}"));
    }
    lines
}

/// Keep at most `cap` hints per item (best scores first), preserving the
/// first-seen order of the items themselves.
fn limit_duplicates(hints: Vec<InventoryHint>, cap: usize) -> Vec<InventoryHint> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: std::collections::HashMap<String, Vec<InventoryHint>> =
        std::collections::HashMap::new();

    for hint in hints {
        let key = hint.item.trim().to_lowercase();
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push(hint);
    }

    let mut limited = Vec::new();
    for key in order {
        let mut bucket = buckets.remove(&key).unwrap_or_default();
        bucket.sort_by(|a, b| b.score.total_cmp(&a.score));
        limited.extend(bucket.into_iter().take(cap));
    }
    limited
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

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

    fn hint(item: &str, score: f32) -> InventoryHint {
        InventoryHint {
            item: item.to_string(),
            score,
            rect: Rect { x: 0, y: 0, w: 10, h: 10 },
            lines: Vec::new(),
        }
    }

    fn test_pricer(dir: &std::path::Path) -> Pricer {
        let config = Config {
            template_root: Some(dir.join("templates")),
            price_store: Some(dir.join("prices.json")),
            template_scales: vision::ScaleSet::new([1.0]),
            ..Default::default()
        };
        std::fs::create_dir_all(dir.join("templates")).unwrap();
        Pricer::open(config).unwrap()
    }

    #[test]
    fn limit_duplicates_caps_per_item_and_keeps_order() {
        let mut hints = Vec::new();
        for i in 0..12 {
            hints.push(hint("Лук тени", 0.9 - i as f32 * 0.01));
        }
        hints.push(hint("Меч рассвета", 0.99));

        let limited = limit_duplicates(hints, 9);
        assert_eq!(limited.len(), 10);
        // First-seen item order is preserved despite the higher later score.
        assert_eq!(limited[0].item, "Лук тени");
        assert_eq!(limited[9].item, "Меч рассвета");
        // Scores inside a bucket come best-first.
        assert!(limited[0].score >= limited[8].score);
    }

    #[test]
    fn price_lines_cover_all_five_slots() {
        let dir = tempfile::tempdir().unwrap();
        let pricer = test_pricer(dir.path());
        pricer.db().set_price("Лук тени", 12345.0, 2).unwrap();

        let lines = price_lines(pricer.db(), "Лук тени");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Лук тени");
        assert_eq!(lines[1], "0 ЛП: —");
        assert_eq!(lines[3], "2 ЛП: 12.345");
        assert_eq!(lines[5], "4 ЛП: —");
    }

    #[test]
    fn price_lines_for_an_unknown_item_show_dashes() {
        let dir = tempfile::tempdir().unwrap();
        let pricer = test_pricer(dir.path());

        let lines = price_lines(pricer.db(), "Неведомое");
        assert_eq!(lines[0], "Неведомое");
        assert!(lines[1..].iter().all(|l| l.ends_with("—")));
    }

    #[test]
    fn check_item_resolves_a_known_item_without_corner_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut pricer = test_pricer(dir.path());

        // One known item template; no corner or potential templates, so the
        // pipeline falls back to the full capture and potential 0.
        let name_tpl = pattern(48, 14, 11);
        let item_dir = dir.path().join("templates").join("Лук тени");
        std::fs::create_dir_all(&item_dir).unwrap();
        name_tpl.save(item_dir.join("name_1.png")).unwrap();

        pricer.db().set_price("Лук тени", 12345.0, 0).unwrap();

        let mut frame = pattern(160, 80, 77);
        paste(&mut frame, &name_tpl, 30, 20);

        match pricer.check_item(&to_rgb(&frame)) {
            ItemCheck::Identified(reading) => {
                assert_eq!(reading.item, "Лук тени");
                assert_eq!(reading.potential, 0);
                assert_eq!(reading.price, Some(LpValue::Price(12345.0)));
                assert_eq!(reading.overlay_text, "Лук тени (ЛП 0)\n12.345");
                assert!(reading.roi.is_none());
            }
            other => panic!("expected identification, got {other:?}"),
        }
    }

    #[test]
    fn lookup_by_lines_falls_back_when_strict_matching_misses() {
        let dir = tempfile::tempdir().unwrap();
        let pricer = test_pricer(dir.path());
        pricer.db().set_price("Лук тени", 100.0, 2).unwrap();

        // No entry has data for potential 3, so the strict pass misses and
        // the unrestricted pass still resolves the name.
        let (key, _, _) = pricer.lookup_by_lines(&["лук тени"], Some(3)).unwrap();
        assert_eq!(key, "лук тени");
    }

    #[test]
    fn check_item_reports_missing_templates() {
        let dir = tempfile::tempdir().unwrap();
        let mut pricer = test_pricer(dir.path());

        let frame = pattern(160, 80, 88);
        match pricer.check_item(&to_rgb(&frame)) {
            ItemCheck::TemplateMissing { potential, overlay_text, .. } => {
                assert_eq!(potential, 0);
                assert!(overlay_text.starts_with("Шаблон не найден"));
            }
            other => panic!("expected a template miss, got {other:?}"),
        }
    }
}
