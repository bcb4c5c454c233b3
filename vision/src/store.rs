//! On-disk template cache.
//!
//! Layout under the template root:
//!
//! ```text
//! <root>/topleft*.png            tooltip corner markers
//! <root>/botright*.png
//! <root>/lp/{1..4}lp.*           global potential icons (root itself also works)
//! <root>/<item>/name_*.png       per-item name templates
//! <root>/<item>/item*.png        per-item inventory icons
//! ```
//!
//! The whole tree is cached in memory and rebuilt only when the newest
//! modification time under the root changes. Rescans are rate-limited so a
//! hot loop of match calls does not hammer the filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};

use crate::{ScaleSet, Template};

const RESCAN_INTERVAL: Duration = Duration::from_millis(500);

/// Templates attached to a single item directory.
#[derive(Debug, Default)]
pub struct ItemTemplates {
    /// `name_*` crops of the tooltip title band.
    pub names: Vec<Template>,
    /// `item*` inventory icon crops.
    pub icons: Vec<Template>,
}

#[derive(Debug, Default)]
struct CornerTemplates {
    top_left: Vec<Template>,
    bottom_right: Vec<Template>,
}

/// Owned cache of every template role, keyed by item name.
pub struct TemplateStore {
    root: PathBuf,
    scales: ScaleSet,

    items: BTreeMap<String, ItemTemplates>,
    /// Global potential icons for slots 1..=4 (slot 0 has no marker).
    potential: [Vec<Template>; 4],
    corners: CornerTemplates,

    newest_mtime: Option<SystemTime>,
    last_scan: Option<Instant>,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>, scales: ScaleSet) -> Self {
        Self {
            root: root.into(),
            scales,
            items: BTreeMap::new(),
            potential: Default::default(),
            corners: CornerTemplates::default(),
            newest_mtime: None,
            last_scan: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    /// Drop every cached template; the next [`TemplateStore::refresh`]
    /// rebuilds from disk. Call after saving a new sample.
    pub fn invalidate(&mut self) {
        self.items.clear();
        self.potential = Default::default();
        self.corners = CornerTemplates::default();
        self.newest_mtime = None;
        self.last_scan = None;
    }

    /// Rebuild the cache when the directory tree changed.
    ///
    /// At most one filesystem scan per [`RESCAN_INTERVAL`]; between scans the
    /// cached templates are served as-is.
    pub fn refresh(&mut self) {
        if !self.root.exists() {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_scan {
            if now.duration_since(last) < RESCAN_INTERVAL {
                return;
            }
        }

        let newest = newest_mtime(&self.root);
        if newest == self.newest_mtime && !self.items.is_empty() {
            self.last_scan = Some(now);
            return;
        }

        self.rebuild();
        self.newest_mtime = newest;
        self.last_scan = Some(now);
    }

    /// Item names with cached templates, in sorted order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &ItemTemplates)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Item names that have no inventory icon template yet.
    pub fn items_missing_inventory(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|(_, t)| t.icons.is_empty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Global potential icon templates for a slot in 1..=4.
    pub fn potential_templates(&self, slot: u8) -> &[Template] {
        debug_assert!((1..=4).contains(&slot));
        &self.potential[slot as usize - 1]
    }

    /// Corner marker templates: (top-left, bottom-right).
    pub fn corner_templates(&self) -> (&[Template], &[Template]) {
        (&self.corners.top_left, &self.corners.bottom_right)
    }

    /// Save a cropped name-band sample for an item and invalidate the cache.
    pub fn save_name_sample(&mut self, item: &str, crop: &image::RgbImage) -> Result<PathBuf> {
        self.save_sample(item, "name_", crop)
    }

    /// Save a cropped inventory-icon sample for an item and invalidate the cache.
    pub fn save_inventory_sample(&mut self, item: &str, crop: &image::RgbImage) -> Result<PathBuf> {
        self.save_sample(item, "item_", crop)
    }

    fn save_sample(&mut self, item: &str, prefix: &str, crop: &image::RgbImage) -> Result<PathBuf> {
        let dir = self.root.join(sanitize_name(item));
        std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{prefix}{stamp}.png"));
        crop.save(&path)
            .with_context(|| format!("save sample {}", path.display()))?;
        log::info!("saved template sample {}", path.display());

        self.invalidate();
        Ok(path)
    }

    fn rebuild(&mut self) {
        self.items.clear();
        self.potential = Default::default();
        self.corners = CornerTemplates::default();

        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return;
        };

        let mut root_files: Vec<PathBuf> = Vec::new();
        let mut item_dirs: Vec<PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                item_dirs.push(path);
            } else {
                root_files.push(path);
            }
        }
        root_files.sort();
        item_dirs.sort();

        for path in &root_files {
            if is_png_with_prefix(path, "topleft") {
                self.corners.top_left.extend(Template::load(path, &self.scales));
            } else if is_png_with_prefix(path, "botright") {
                self.corners.bottom_right.extend(Template::load(path, &self.scales));
            } else if let Some(slot) = potential_slot(path) {
                self.potential[slot as usize - 1].extend(Template::load(path, &self.scales));
            }
        }

        for dir in &item_dirs {
            let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            // A dedicated `lp` directory takes the global potential icons.
            if dir_name.eq_ignore_ascii_case("lp") {
                for path in sorted_files(dir) {
                    if let Some(slot) = potential_slot(&path) {
                        self.potential[slot as usize - 1].extend(Template::load(&path, &self.scales));
                    }
                }
                continue;
            }

            let mut templates = ItemTemplates::default();
            for path in sorted_files(dir) {
                if is_png_with_prefix(&path, "name_") {
                    templates.names.extend(Template::load(&path, &self.scales));
                } else if is_png_with_prefix(&path, "item") {
                    templates.icons.extend(Template::load(&path, &self.scales));
                }
            }
            if !templates.names.is_empty() || !templates.icons.is_empty() {
                self.items.insert(dir_name.to_string(), templates);
            }
        }
    }
}

/// Replace characters Windows refuses in file names and collapse whitespace,
/// so an item name maps to a stable directory name.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

fn is_png_with_prefix(path: &Path, prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with(prefix)
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// `1lp.*` .. `4lp.*`, case-insensitive stem.
fn potential_slot(path: &Path) -> Option<u8> {
    let stem = path.file_stem()?.to_str()?.as_bytes();
    let [digit, l, p] = stem else {
        return None;
    };
    if !l.eq_ignore_ascii_case(&b'l') || !p.eq_ignore_ascii_case(&b'p') {
        return None;
    }
    match digit {
        b @ b'1'..=b'4' => Some(b - b'0'),
        _ => None,
    }
}

fn newest_mtime(dir: &Path) -> Option<SystemTime> {
    let mut newest: Option<SystemTime> = None;
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        let candidate = if path.is_dir() {
            newest_mtime(&path)
        } else {
            entry.metadata().and_then(|m| m.modified()).ok()
        };
        newest = match (newest, candidate) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
    newest
}
