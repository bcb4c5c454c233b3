//! Persistent price store.
//!
//! One JSON document holds the known entries (keyed by canonical name), the
//! display order of their keys, and the pending queue of unpriced items.
//! Every mutating operation runs under a single store-wide lock that also
//! covers the atomic disk write, so concurrent callers never interleave
//! partial updates and a crash never leaves a half-written file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::entry::now_iso;
use crate::{LP_SLOTS, LpValue, PendingEntry, PriceEntry, fuzzy, normalize};

/// Integrity failures that require explicit user action, as opposed to the
/// ordinary "not found" outcomes which are plain `Option`s.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
	#[error("price store uses the legacy layout; run migrate_prices first")]
	LegacySchema,
	#[error("potential {0} is outside 0..=4")]
	InvalidPotential(u8),
	#[error("an entry named '{0}' already exists")]
	NameCollision(String),
	#[error("no entry under key '{0}'")]
	UnknownKey(String),
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct Document {
	known: BTreeMap<String, PriceEntry>,
	known_order: Vec<String>,
	pending: Vec<PendingEntry>,
}

/// Options for [`PriceDb::find_best`].
#[derive(Debug, Clone)]
pub struct FindOptions {
	/// Minimum acceptable score (0..=100 scale, plus the potential bias).
	pub threshold: u32,
	/// Observed potential; entries with data in that slot get a small bias.
	pub potential: Option<u8>,
	/// Drop entries without data for the hinted slot instead of biasing.
	pub strict_potential: bool,
}

impl Default for FindOptions {
	fn default() -> Self {
		Self {
			threshold: 80,
			potential: None,
			strict_potential: false,
		}
	}
}

/// Edits applied by [`PriceDb::edit_known`].
#[derive(Debug, Clone, Default)]
pub struct KnownPatch {
	pub name: Option<String>,
	pub notes: Option<String>,
	/// `(potential, text)` pairs; text is parsed as numeric-or-comment.
	pub lp_values: Vec<(u8, String)>,
}

#[derive(Debug)]
pub struct PriceDb {
	path: PathBuf,
	inner: Mutex<Document>,
}

impl PriceDb {
	/// Open (or create) the store at `path`.
	///
	/// A document using the legacy list layout is refused with
	/// [`StoreError::LegacySchema`]; it has to be migrated explicitly.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		if !path.exists() {
			let db = Self {
				path,
				inner: Mutex::new(Document::default()),
			};
			db.persist(&db.inner.lock().expect("price store lock poisoned"))?;
			return Ok(db);
		}

		let text = std::fs::read_to_string(&path)
			.with_context(|| format!("read price store {}", path.display()))?;
		let value: serde_json::Value = serde_json::from_str(&text)
			.with_context(|| format!("parse price store {}", path.display()))?;
		if value.get("known").is_some_and(|k| k.is_array()) {
			return Err(StoreError::LegacySchema.into());
		}

		let mut doc: Document = serde_json::from_value(value)
			.with_context(|| format!("decode price store {}", path.display()))?;
		reconcile_order(&mut doc);

		Ok(Self {
			path,
			inner: Mutex::new(doc),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Queue an item for pricing unless it is already known or pending.
	///
	/// Returns whether a new pending row was inserted. An existing pending
	/// row gains the potential hint if it had none.
	pub fn ensure_pending(&self, name: &str, potential: Option<u8>) -> Result<bool> {
		let key = normalize::canonical(name);
		let mut doc = self.lock();

		if doc.known.contains_key(&key) {
			return Ok(false);
		}
		if let Some(row) = doc
			.pending
			.iter_mut()
			.find(|p| normalize::canonical(&p.name) == key)
		{
			if potential.is_some() && row.potential.is_none() {
				row.potential = potential;
				self.persist(&doc)?;
			}
			return Ok(false);
		}

		doc.pending.push(PendingEntry {
			name: name.trim().to_string(),
			potential,
			added_at: now_iso(),
		});
		self.persist(&doc)?;
		Ok(true)
	}

	/// Set the numeric price of one slot, clearing any comment on it, and
	/// drop the item from the pending queue.
	pub fn set_price(&self, name: &str, price: f64, potential: u8) -> Result<String> {
		let slot = check_potential(potential)?;
		let key = normalize::canonical(name);
		let mut doc = self.lock();

		let entry = get_or_create(&mut doc, &key, name);
		entry.slots[slot] = LpValue::Price(price);
		entry.updated_at = now_iso();
		doc.pending.retain(|p| normalize::canonical(&p.name) != key);

		self.persist(&doc)?;
		Ok(key)
	}

	/// Create-or-update accepting free-form price text (numeric or comment).
	pub fn add_known(&self, name: &str, price: Option<&str>, potential: Option<u8>) -> Result<String> {
		let slot = potential.map(check_potential).transpose()?.unwrap_or(0);
		let key = normalize::canonical(name);
		let mut doc = self.lock();

		let entry = get_or_create(&mut doc, &key, name);
		let mut recorded = false;
		if let Some(text) = price {
			let value = LpValue::parse(text);
			recorded = value.is_set();
			entry.slots[slot] = value;
		}
		entry.updated_at = now_iso();
		if recorded {
			doc.pending.retain(|p| normalize::canonical(&p.name) != key);
		}

		self.persist(&doc)?;
		Ok(key)
	}

	/// Apply a patch to an existing entry; renaming re-keys the index.
	///
	/// Returns the (possibly changed) key. Fails with
	/// [`StoreError::NameCollision`] when the new canonical name belongs to a
	/// different entry, leaving both entries untouched.
	pub fn edit_known(&self, key: &str, patch: KnownPatch) -> Result<String> {
		for (potential, _) in &patch.lp_values {
			check_potential(*potential)?;
		}

		let mut doc = self.lock();
		if !doc.known.contains_key(key) {
			return Err(StoreError::UnknownKey(key.to_string()).into());
		}

		let mut current_key = key.to_string();
		if let Some(new_name) = &patch.name {
			let new_key = normalize::canonical(new_name);
			if new_key != current_key && doc.known.contains_key(&new_key) {
				return Err(StoreError::NameCollision(new_name.trim().to_string()).into());
			}
			let mut entry = doc.known.remove(&current_key).expect("checked above");
			entry.name = new_name.trim().to_string();
			doc.known.insert(new_key.clone(), entry);
			if let Some(slot) = doc.known_order.iter_mut().find(|k| **k == current_key) {
				*slot = new_key.clone();
			}
			current_key = new_key;
		}

		let entry = doc.known.get_mut(&current_key).expect("re-keyed above");
		if let Some(notes) = &patch.notes {
			let trimmed = notes.trim();
			entry.notes = if trimmed.is_empty() {
				None
			} else {
				Some(notes.clone())
			};
		}
		for (potential, text) in &patch.lp_values {
			entry.slots[*potential as usize] = LpValue::parse(text);
		}
		entry.updated_at = now_iso();

		self.persist(&doc)?;
		Ok(current_key)
	}

	/// Fuzzy-match the candidate lines against every known entry.
	///
	/// Each entry/line pair is scored under three normalizations (clean,
	/// shape-fold, transliteration); the entry's score is the maximum. Ties
	/// keep the entry that comes first in display order.
	pub fn find_best(&self, lines: &[&str], options: &FindOptions) -> Option<(String, PriceEntry, u32)> {
		let clean_lines: Vec<String> = lines
			.iter()
			.map(|l| normalize::clean_for_match(l))
			.filter(|l| !l.is_empty())
			.collect();
		if clean_lines.is_empty() {
			return None;
		}
		let shape_lines: Vec<String> = lines
			.iter()
			.map(|l| normalize::shape_fold(l))
			.filter(|l| !l.is_empty())
			.collect();
		let translit_lines: Vec<String> = lines
			.iter()
			.map(|l| normalize::clean_for_match(&normalize::translit(l)))
			.filter(|l| !l.is_empty())
			.collect();

		let doc = self.lock();
		let mut best: Option<(&String, &PriceEntry, u32)> = None;

		for key in &doc.known_order {
			let Some(entry) = doc.known.get(key) else {
				continue;
			};
			let name_clean = normalize::clean_for_match(&entry.name);
			if name_clean.is_empty() {
				continue;
			}
			if options.strict_potential {
				if let Some(p) = options.potential {
					if !entry.slots[p.min(4) as usize].is_set() {
						continue;
					}
				}
			}

			let mut score = 0u32;

			let name_tokens: Vec<&str> = name_clean
				.split_whitespace()
				.filter(|t| t.chars().count() >= 2)
				.collect();
			for line in &clean_lines {
				let mut s = fuzzy::token_set_ratio(&name_clean, line)
					.max(fuzzy::partial_ratio(&name_clean, line));
				if line.contains(&name_clean) || name_clean.contains(line.as_str()) {
					s = 100;
				}
				if !name_tokens.is_empty() {
					let line_tokens: std::collections::BTreeSet<&str> = line
						.split_whitespace()
						.filter(|t| t.chars().count() >= 2)
						.collect();
					let covered = name_tokens.iter().filter(|t| line_tokens.contains(**t)).count();
					let coverage = covered as f32 / name_tokens.len() as f32;
					if coverage >= 0.6 {
						s = s.max((95.0 + 5.0 * coverage) as u32);
					}
				}
				score = score.max(s);
			}

			let name_shape = normalize::shape_fold(&entry.name);
			if !name_shape.is_empty() {
				for line in &shape_lines {
					let mut s = fuzzy::token_set_ratio(&name_shape, line)
						.max(fuzzy::partial_ratio(&name_shape, line));
					if line.contains(&name_shape) || name_shape.contains(line.as_str()) {
						s = 100;
					}
					score = score.max(s);
				}
			}

			let name_translit = normalize::clean_for_match(&normalize::translit(&entry.name));
			if !name_translit.is_empty() {
				for line in &translit_lines {
					let mut s = fuzzy::token_set_ratio(&name_translit, line)
						.max(fuzzy::partial_ratio(&name_translit, line));
					if line.contains(&name_translit) || name_translit.contains(line.as_str()) {
						s = 100;
					}
					score = score.max(s);
				}
			}

			if let Some(p) = options.potential {
				if entry.slots[p.min(4) as usize].is_set() {
					score += 2;
				}
			}

			if best.is_none_or(|(_, _, b)| score > b) {
				best = Some((key, entry, score));
			}
		}

		let (key, entry, score) = best?;
		if score >= options.threshold {
			Some((key.clone(), entry.clone(), score))
		} else {
			None
		}
	}

	/// Display value of one slot of the best-matching entry.
	pub fn get_price(&self, name: &str, potential: u8) -> Result<Option<LpValue>> {
		let slot = check_potential(potential)?;
		let found = self.find_best(&[name], &FindOptions::default());
		Ok(found.map(|(_, entry, _)| entry.slots[slot].clone()))
	}

	/// All five slot values of the best-matching entry.
	pub fn get_prices_by_potential(&self, name: &str, threshold: u32) -> Option<(String, [LpValue; LP_SLOTS])> {
		let options = FindOptions {
			threshold,
			..Default::default()
		};
		self.find_best(&[name], &options)
			.map(|(key, entry, _)| (key, entry.slots))
	}

	/// Remove pending rows by name. Returns the number removed.
	pub fn delete_pending(&self, names: &[&str]) -> Result<usize> {
		let targets: Vec<String> = names.iter().map(|n| normalize::canonical(n)).collect();
		let mut doc = self.lock();
		let before = doc.pending.len();
		doc.pending
			.retain(|p| !targets.contains(&normalize::canonical(&p.name)));
		let removed = before - doc.pending.len();
		if removed > 0 {
			self.persist(&doc)?;
		}
		Ok(removed)
	}

	/// Remove known entries by key or name. Returns the number removed.
	pub fn delete_known(&self, identifiers: &[&str]) -> Result<usize> {
		let targets: Vec<String> = identifiers.iter().map(|n| normalize::canonical(n)).collect();
		let mut doc = self.lock();
		let before = doc.known.len();
		doc.known.retain(|key, _| !targets.contains(key));
		let removed = before - doc.known.len();
		if removed > 0 {
			let keys: Vec<String> = doc.known.keys().cloned().collect();
			doc.known_order.retain(|k| keys.contains(k));
			self.persist(&doc)?;
		}
		Ok(removed)
	}

	/// Known entries in display order.
	pub fn list_known(&self) -> Vec<(String, PriceEntry)> {
		let doc = self.lock();
		doc.known_order
			.iter()
			.filter_map(|key| doc.known.get(key).map(|e| (key.clone(), e.clone())))
			.collect()
	}

	pub fn list_pending(&self) -> Vec<PendingEntry> {
		self.lock().pending.clone()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Document> {
		self.inner.lock().expect("price store lock poisoned")
	}

	/// Write the document atomically: temp file first, then rename over the
	/// target (with the remove-then-rename fallback Windows needs).
	fn persist(&self, doc: &Document) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				std::fs::create_dir_all(parent)
					.with_context(|| format!("create {}", parent.display()))?;
			}
		}
		let json = serde_json::to_string_pretty(doc).context("serialize price store")?;
		let tmp = self.path.with_extension("json.tmp");
		std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
		if std::fs::rename(&tmp, &self.path).is_err() {
			let _ = std::fs::remove_file(&self.path);
			std::fs::rename(&tmp, &self.path)
				.with_context(|| format!("persist {}", self.path.display()))?;
		}
		Ok(())
	}
}

fn check_potential(potential: u8) -> Result<usize> {
	if (potential as usize) < LP_SLOTS {
		Ok(potential as usize)
	} else {
		Err(StoreError::InvalidPotential(potential).into())
	}
}

fn get_or_create<'a>(doc: &'a mut Document, key: &str, name: &str) -> &'a mut PriceEntry {
	if !doc.known.contains_key(key) {
		doc.known
			.insert(key.to_string(), PriceEntry::new(name.trim(), now_iso()));
		doc.known_order.push(key.to_string());
	}
	doc.known.get_mut(key).expect("inserted above")
}

/// Keep `known_order` an exact, duplicate-free cover of the key set.
fn reconcile_order(doc: &mut Document) {
	let mut seen = std::collections::BTreeSet::new();
	let before = doc.known_order.len();
	doc.known_order
		.retain(|k| doc.known.contains_key(k) && seen.insert(k.clone()));
	let mut appended = 0usize;
	for key in doc.known.keys() {
		if !seen.contains(key) {
			doc.known_order.push(key.clone());
			appended += 1;
		}
	}
	if before != doc.known_order.len() || appended > 0 {
		log::warn!(
			"price store display order reconciled ({} dropped, {} appended)",
			before + appended - doc.known_order.len(),
			appended
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn open_db(dir: &tempfile::TempDir) -> PriceDb {
		PriceDb::open(dir.path().join("prices.json")).unwrap()
	}

	#[test]
	fn set_then_get_price_round_trips() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 12345.0, 2).unwrap();
		let got = db.get_price("Лук тени", 2).unwrap();
		assert_eq!(got, Some(LpValue::Price(12345.0)));
		// Other slots stay untouched.
		assert_eq!(db.get_price("Лук тени", 0).unwrap(), Some(LpValue::Absent));
	}

	#[test]
	fn set_price_clears_the_slot_comment() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.add_known("Лук тени", Some("дорого"), Some(1)).unwrap();
		db.set_price("Лук тени", 500.0, 1).unwrap();
		assert_eq!(db.get_price("Лук тени", 1).unwrap(), Some(LpValue::Price(500.0)));
	}

	#[test]
	fn set_price_rejects_bad_potential() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		let err = db.set_price("x", 1.0, 5).unwrap_err();
		assert_eq!(
			err.downcast_ref::<StoreError>(),
			Some(&StoreError::InvalidPotential(5))
		);
	}

	#[test]
	fn pending_is_deduplicated_by_canonical_name() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		assert!(db.ensure_pending("Лук тени", None).unwrap());
		assert!(!db.ensure_pending("  лук тени ", Some(2)).unwrap());
		assert!(!db.ensure_pending("ЛУК ТЕНИ", Some(3)).unwrap());

		let pending = db.list_pending();
		assert_eq!(pending.len(), 1);
		// The second call back-filled the missing potential hint.
		assert_eq!(pending[0].potential, Some(2));
	}

	#[test]
	fn set_price_removes_the_pending_row() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.ensure_pending("Лук тени", Some(2)).unwrap();
		db.set_price("лук тени", 100.0, 2).unwrap();
		assert!(db.list_pending().is_empty());
	}

	#[test]
	fn add_known_with_a_price_clears_pending() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.ensure_pending("Лук тени", None).unwrap();
		db.add_known("лук тени", Some("150"), Some(1)).unwrap();
		assert!(db.list_pending().is_empty());
	}

	#[test]
	fn known_item_is_never_pending() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 100.0, 0).unwrap();
		assert!(!db.ensure_pending("лук тени", None).unwrap());
		assert!(db.list_pending().is_empty());
	}

	#[test]
	fn find_best_is_reflexive() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 12345.0, 2).unwrap();
		db.set_price("Меч рассвета", 777.0, 0).unwrap();

		let (key, _, score) = db.find_best(&["Лук тени"], &FindOptions::default()).unwrap();
		assert_eq!(key, "лук тени");
		assert!(score >= 90, "score = {score}");
	}

	#[test]
	fn find_best_matches_lowercased_and_transliterated_lines() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 12345.0, 2).unwrap();

		let (key, entry, score) = db.find_best(&["лук тени"], &FindOptions::default()).unwrap();
		assert_eq!(key, "лук тени");
		assert_eq!(entry.slots[2], LpValue::Price(12345.0));
		assert!(score >= 90, "score = {score}");

		// Latin transliteration resolves through the translit strategy.
		let (key, _, score) = db.find_best(&["luk teni"], &FindOptions::default()).unwrap();
		assert_eq!(key, "лук тени");
		assert!(score >= 90, "score = {score}");
	}

	#[test]
	fn find_best_tolerates_ocr_noise_lines() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 12345.0, 2).unwrap();

		// Shape-folding maps the Latin lookalikes back onto the Cyrillic name.
		let found = db.find_best(&["Лyк тeни"], &FindOptions::default());
		assert!(found.is_some_and(|(key, _, _)| key == "лук тени"));
	}

	#[test]
	fn find_best_prefers_entries_with_the_hinted_potential() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 100.0, 2).unwrap();

		let strict = FindOptions {
			potential: Some(3),
			strict_potential: true,
			..Default::default()
		};
		assert!(db.find_best(&["лук тени"], &strict).is_none());

		let biased = FindOptions {
			potential: Some(2),
			strict_potential: false,
			..Default::default()
		};
		let (_, _, score) = db.find_best(&["лук тени"], &biased).unwrap();
		assert!(score >= 102, "bias should apply, score = {score}");
	}

	#[test]
	fn find_best_below_threshold_is_none() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 100.0, 0).unwrap();
		assert!(db.find_best(&["нечто совсем другое"], &FindOptions::default()).is_none());
	}

	#[test]
	fn rename_collision_leaves_both_entries_unchanged() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 100.0, 0).unwrap();
		db.set_price("Меч рассвета", 200.0, 0).unwrap();

		let err = db
			.edit_known(
				"меч рассвета",
				KnownPatch {
					name: Some("Лук тени".to_string()),
					..Default::default()
				},
			)
			.unwrap_err();
		assert_eq!(
			err.downcast_ref::<StoreError>(),
			Some(&StoreError::NameCollision("Лук тени".to_string()))
		);

		let known = db.list_known();
		assert_eq!(known.len(), 2);
		assert_eq!(db.get_price("Лук тени", 0).unwrap(), Some(LpValue::Price(100.0)));
		assert_eq!(db.get_price("Меч рассвета", 0).unwrap(), Some(LpValue::Price(200.0)));
	}

	#[test]
	fn rename_re_keys_and_keeps_display_position() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Старый лук", 100.0, 0).unwrap();
		db.set_price("Меч рассвета", 200.0, 0).unwrap();

		let new_key = db
			.edit_known(
				"старый лук",
				KnownPatch {
					name: Some("Новый лук".to_string()),
					..Default::default()
				},
			)
			.unwrap();
		assert_eq!(new_key, "новый лук");

		let keys: Vec<String> = db.list_known().into_iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["новый лук".to_string(), "меч рассвета".to_string()]);
	}

	#[test]
	fn edit_known_parses_lp_values() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		let key = db.add_known("Лук тени", None, None).unwrap();
		db.edit_known(
			&key,
			KnownPatch {
				notes: Some("с аукциона".to_string()),
				lp_values: vec![(0, "12,5".to_string()), (3, "не продавать".to_string())],
				..Default::default()
			},
		)
		.unwrap();

		let (_, entry) = db.list_known().into_iter().next().unwrap();
		assert_eq!(entry.notes.as_deref(), Some("с аукциона"));
		assert_eq!(entry.slots[0], LpValue::Price(12.5));
		assert_eq!(entry.slots[3], LpValue::Comment("не продавать".to_string()));
	}

	#[test]
	fn get_prices_by_potential_projects_all_slots() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.set_price("Лук тени", 100.0, 0).unwrap();
		db.add_known("Лук тени", Some("дорого"), Some(2)).unwrap();

		let (key, slots) = db.get_prices_by_potential("лук тени", 70).unwrap();
		assert_eq!(key, "лук тени");
		assert_eq!(slots[0], LpValue::Price(100.0));
		assert_eq!(slots[2], LpValue::Comment("дорого".to_string()));
		assert_eq!(slots[4], LpValue::Absent);
	}

	#[test]
	fn deletes_report_the_removed_count() {
		let dir = tempfile::tempdir().unwrap();
		let db = open_db(&dir);

		db.ensure_pending("a", None).unwrap();
		db.ensure_pending("b", None).unwrap();
		db.set_price("c", 1.0, 0).unwrap();

		assert_eq!(db.delete_pending(&["A", "missing"]).unwrap(), 1);
		assert_eq!(db.delete_known(&["c"]).unwrap(), 1);
		assert_eq!(db.delete_known(&["c"]).unwrap(), 0);
		assert!(db.list_known().is_empty());
	}

	#[test]
	fn store_survives_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("prices.json");

		{
			let db = PriceDb::open(&path).unwrap();
			db.set_price("Лук тени", 12345.0, 2).unwrap();
			db.ensure_pending("Новый предмет", Some(1)).unwrap();
		}

		let db = PriceDb::open(&path).unwrap();
		assert_eq!(db.get_price("лук тени", 2).unwrap(), Some(LpValue::Price(12345.0)));
		assert_eq!(db.list_pending().len(), 1);
		// No temp file left behind by the atomic write.
		assert!(!path.with_extension("json.tmp").exists());
	}

	#[test]
	fn legacy_layout_is_refused() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("prices.json");
		std::fs::write(
			&path,
			r#"{"known": [{"name": "Лук тени", "potential": 2, "price": 123}], "pending": []}"#,
		)
		.unwrap();

		let err = PriceDb::open(&path).unwrap_err();
		assert_eq!(
			err.downcast_ref::<StoreError>(),
			Some(&StoreError::LegacySchema)
		);
	}
}
