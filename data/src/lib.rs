//! Price knowledge base.
//!
//! Each known item carries five independent price/comment slots, one per
//! potential level 0..=4, and is keyed by its canonical (trimmed, lowercased)
//! name. Lookup is fuzzy and tolerant of Cyrillic/Latin lookalikes,
//! transliteration, and common OCR noise.

mod entry;
pub use entry::*;

mod fuzzy;
pub mod normalize;

mod store;
pub use store::*;

pub mod migrate;
