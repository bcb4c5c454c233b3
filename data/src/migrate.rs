//! One-time migration from the legacy price store layout.
//!
//! The legacy document kept a flat list under `known`, one record per
//! (name, potential) pair, with a `price` field that could be a number or a
//! free-text comment. The current layout keeps one record per canonical name
//! with five `price_lpN`/`comment_lpN` column pairs. Migration groups legacy
//! records by canonical name and folds each record's single value into the
//! matching slot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::entry::now_iso;
use crate::{LpValue, PendingEntry, PriceEntry};

#[derive(Debug, PartialEq)]
pub enum MigrationOutcome {
	/// The document already uses the per-name layout; nothing was written.
	AlreadyMigrated,
	Migrated {
		entries: usize,
		backup: Option<PathBuf>,
	},
}

#[derive(Debug, Deserialize)]
struct LegacyDocument {
	#[serde(default)]
	known: Vec<LegacyRecord>,
	#[serde(default)]
	pending: Vec<PendingEntry>,
}

#[derive(Debug, Deserialize)]
struct LegacyRecord {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	potential: Option<serde_json::Value>,
	#[serde(default)]
	price: Option<LegacyPrice>,
	#[serde(default)]
	created_at: Option<String>,
	#[serde(default)]
	updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyPrice {
	Number(f64),
	Text(String),
}

#[derive(serde::Serialize)]
struct NewDocument {
	known: BTreeMap<String, PriceEntry>,
	known_order: Vec<String>,
	pending: Vec<PendingEntry>,
}

/// Migrate `input` to the per-name layout, writing to `output` atomically.
///
/// When rewriting in place with `backup` set, the original is first copied to
/// a timestamped `.bak` sibling.
pub fn migrate_file(input: &Path, output: &Path, backup: bool) -> Result<MigrationOutcome> {
	let text = std::fs::read_to_string(input)
		.with_context(|| format!("read {}", input.display()))?;
	let value: serde_json::Value = serde_json::from_str(&text)
		.with_context(|| format!("parse {}", input.display()))?;

	match value.get("known") {
		Some(known) if known.is_object() => return Ok(MigrationOutcome::AlreadyMigrated),
		Some(known) if known.is_array() => {}
		_ => bail!(
			"unsupported price store format in {}: expected a list under 'known'",
			input.display()
		),
	}

	let legacy: LegacyDocument = serde_json::from_value(value)
		.with_context(|| format!("decode legacy records from {}", input.display()))?;

	let mut known: BTreeMap<String, PriceEntry> = BTreeMap::new();
	let mut order: Vec<String> = Vec::new();

	for record in legacy.known {
		let raw_name = record.name.as_deref().unwrap_or("").trim().to_string();
		let canonical = {
			let c = crate::normalize::canonical(&raw_name);
			if c.is_empty() {
				format!("unnamed-{}", order.len())
			} else {
				c
			}
		};
		let timestamp = record
			.updated_at
			.clone()
			.or_else(|| record.created_at.clone())
			.unwrap_or_else(now_iso);

		if !known.contains_key(&canonical) {
			let display = if raw_name.is_empty() {
				canonical.clone()
			} else {
				raw_name.clone()
			};
			known.insert(canonical.clone(), PriceEntry::new(display, timestamp.clone()));
			order.push(canonical.clone());
		}
		let entry = known.get_mut(&canonical).expect("inserted above");
		if !raw_name.is_empty() {
			entry.name = raw_name;
		}
		// ISO-8601 timestamps compare correctly as strings.
		if timestamp < entry.created_at {
			entry.created_at = timestamp.clone();
		}
		if timestamp > entry.updated_at {
			entry.updated_at = timestamp;
		}

		let slot = legacy_potential(record.potential.as_ref());
		let value = match record.price {
			Some(LegacyPrice::Number(v)) => LpValue::Price(v),
			Some(LegacyPrice::Text(t)) => LpValue::parse(&t),
			None => LpValue::Absent,
		};
		if value.is_set() {
			if entry.slots[slot].is_set() {
				log::warn!(
					"overwriting LP{slot} for '{}' with a newer value",
					entry.name
				);
			}
			entry.slots[slot] = value;
		}
	}

	let entries = known.len();
	let new_doc = NewDocument {
		known,
		known_order: order,
		pending: legacy.pending,
	};

	let mut backup_path = None;
	if output == input && backup {
		let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
		let path = PathBuf::from(format!("{}.{stamp}.bak", input.display()));
		std::fs::copy(input, &path)
			.with_context(|| format!("back up {} to {}", input.display(), path.display()))?;
		backup_path = Some(path);
	}

	let json = serde_json::to_string_pretty(&new_doc).context("serialize migrated store")?;
	let tmp = output.with_extension("json.tmp");
	std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
	if std::fs::rename(&tmp, output).is_err() {
		let _ = std::fs::remove_file(output);
		std::fs::rename(&tmp, output)
			.with_context(|| format!("persist {}", output.display()))?;
	}

	Ok(MigrationOutcome::Migrated {
		entries,
		backup: backup_path,
	})
}

/// Legacy `potential` could be an integer, a numeric string, or null.
/// Anything unusable folds to slot 0; valid values clamp into 0..=4.
fn legacy_potential(value: Option<&serde_json::Value>) -> usize {
	let parsed = match value {
		Some(serde_json::Value::Number(n)) => n.as_f64().map(|v| v as i64),
		Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
		_ => None,
	};
	parsed.unwrap_or(0).clamp(0, 4) as usize
}
