use serde::{Deserialize, Serialize};

/// Potential levels run 0..=4; each gets its own price slot.
pub const LP_SLOTS: usize = 5;

pub(crate) fn now_iso() -> String {
	chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Value of one potential slot.
///
/// A slot holds either a numeric price or a free-text comment, never both.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LpValue {
	#[default]
	Absent,
	Price(f64),
	Comment(String),
}

impl LpValue {
	/// Parse user-entered text: empty means absent, numbers (comma decimal
	/// separators allowed) become prices, anything else is kept as a comment.
	pub fn parse(text: &str) -> Self {
		let text = text.trim();
		if text.is_empty() {
			return Self::Absent;
		}
		match text.replace(',', ".").parse::<f64>() {
			Ok(v) => Self::Price(v),
			Err(_) => Self::Comment(text.to_string()),
		}
	}

	/// Whether the slot carries displayable data.
	pub fn is_set(&self) -> bool {
		match self {
			Self::Absent => false,
			Self::Price(_) => true,
			Self::Comment(c) => !c.trim().is_empty(),
		}
	}

	pub fn price(&self) -> Option<f64> {
		match self {
			Self::Price(v) => Some(*v),
			_ => None,
		}
	}

	pub fn comment(&self) -> Option<&str> {
		match self {
			Self::Comment(c) => Some(c),
			_ => None,
		}
	}
}

/// One known item with its five potential slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct PriceEntry {
	pub name: String,
	pub notes: Option<String>,
	pub created_at: String,
	pub updated_at: String,
	pub slots: [LpValue; LP_SLOTS],
}

impl PriceEntry {
	pub fn new(name: impl Into<String>, timestamp: impl Into<String>) -> Self {
		let timestamp = timestamp.into();
		Self {
			name: name.into(),
			notes: None,
			created_at: timestamp.clone(),
			updated_at: timestamp,
			slots: Default::default(),
		}
	}
}

/// On-disk layout of a [`PriceEntry`]: nullable `price_lpN` / `comment_lpN`
/// column pairs, the layout the migration tool produces.
#[derive(Serialize, Deserialize)]
struct RawEntry {
	name: String,
	#[serde(default)]
	notes: Option<String>,
	#[serde(default)]
	created_at: String,
	#[serde(default)]
	updated_at: String,
	#[serde(default)]
	price_lp0: Option<f64>,
	#[serde(default)]
	comment_lp0: Option<String>,
	#[serde(default)]
	price_lp1: Option<f64>,
	#[serde(default)]
	comment_lp1: Option<String>,
	#[serde(default)]
	price_lp2: Option<f64>,
	#[serde(default)]
	comment_lp2: Option<String>,
	#[serde(default)]
	price_lp3: Option<f64>,
	#[serde(default)]
	comment_lp3: Option<String>,
	#[serde(default)]
	price_lp4: Option<f64>,
	#[serde(default)]
	comment_lp4: Option<String>,
}

fn to_slot(price: Option<f64>, comment: Option<String>) -> LpValue {
	match (price, comment) {
		(Some(v), _) => LpValue::Price(v),
		(None, Some(c)) if !c.trim().is_empty() => LpValue::Comment(c),
		_ => LpValue::Absent,
	}
}

fn from_slot(slot: &LpValue) -> (Option<f64>, Option<String>) {
	match slot {
		LpValue::Absent => (None, None),
		LpValue::Price(v) => (Some(*v), None),
		LpValue::Comment(c) => (None, Some(c.clone())),
	}
}

impl From<RawEntry> for PriceEntry {
	fn from(raw: RawEntry) -> Self {
		Self {
			name: raw.name,
			notes: raw.notes,
			created_at: raw.created_at,
			updated_at: raw.updated_at,
			slots: [
				to_slot(raw.price_lp0, raw.comment_lp0),
				to_slot(raw.price_lp1, raw.comment_lp1),
				to_slot(raw.price_lp2, raw.comment_lp2),
				to_slot(raw.price_lp3, raw.comment_lp3),
				to_slot(raw.price_lp4, raw.comment_lp4),
			],
		}
	}
}

impl From<PriceEntry> for RawEntry {
	fn from(entry: PriceEntry) -> Self {
		let [s0, s1, s2, s3, s4] = &entry.slots;
		let (price_lp0, comment_lp0) = from_slot(s0);
		let (price_lp1, comment_lp1) = from_slot(s1);
		let (price_lp2, comment_lp2) = from_slot(s2);
		let (price_lp3, comment_lp3) = from_slot(s3);
		let (price_lp4, comment_lp4) = from_slot(s4);
		Self {
			name: entry.name,
			notes: entry.notes,
			created_at: entry.created_at,
			updated_at: entry.updated_at,
			price_lp0,
			comment_lp0,
			price_lp1,
			comment_lp1,
			price_lp2,
			comment_lp2,
			price_lp3,
			comment_lp3,
			price_lp4,
			comment_lp4,
		}
	}
}

/// An item seen on screen but not priced yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
	pub name: String,
	#[serde(default)]
	pub potential: Option<u8>,
	#[serde(default)]
	pub added_at: String,
}
