//! Name normalization strategies for script-tolerant matching.
//!
//! Three independent foldings are compared during lookup:
//! - `clean_for_match` strips everything that is not a letter, digit, or
//!   space (Latin and Cyrillic alphabets only);
//! - `shape_fold` maps visually identical Cyrillic/Latin glyphs and the
//!   OCR-prone digits onto one Latin-ish alphabet;
//! - `translit` transliterates Russian phonetically.

use std::sync::LazyLock;

use regex::Regex;

/// Canonical store key: trimmed, lowercased display name.
pub fn canonical(name: &str) -> String {
	name.trim().to_lowercase()
}

static NON_MATCHABLE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[^0-9a-zа-я ]+").unwrap());
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn clean_for_match(s: &str) -> String {
	let s = s.to_lowercase().replace('ё', "е");
	let s = NON_MATCHABLE.replace_all(&s, " ");
	SPACES.replace_all(&s, " ").trim().to_string()
}

/// Fold Cyrillic/Latin lookalikes and OCR digit confusions to one alphabet.
pub fn shape_fold(s: &str) -> String {
	s.trim().chars().map(fold_char).collect::<String>().to_lowercase()
}

fn fold_char(c: char) -> char {
	match c {
		// Cyrillic capitals that render like Latin capitals.
		'А' => 'A',
		'В' => 'B',
		'С' => 'C',
		'Е' => 'E',
		'К' => 'K',
		'М' => 'M',
		'Н' => 'H',
		'О' => 'O',
		'Р' => 'P',
		'Т' => 'T',
		'Х' => 'X',
		'У' => 'Y',
		'Ш' => 'W',
		'Щ' => 'W',
		'Ь' => 'b',
		'Я' => 'R',
		'Л' => 'A',
		// Lowercase lookalikes.
		'а' => 'a',
		'в' => 'b',
		'с' => 'c',
		'е' => 'e',
		'к' => 'k',
		'м' => 'm',
		'н' => 'h',
		'о' => 'o',
		'р' => 'p',
		'т' => 't',
		'х' => 'x',
		'у' => 'y',
		'ш' => 'w',
		'щ' => 'w',
		'ь' => 'b',
		'я' => 'r',
		'л' => 'a',
		// Digits OCR tends to confuse with letters.
		'0' => 'o',
		'3' => 'e',
		'4' => 'a',
		'6' => 'b',
		'8' => 'b',
		other => other,
	}
}

/// Phonetic Russian-to-Latin transliteration; unknown characters pass through.
pub fn translit(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.to_lowercase().chars() {
		match c {
			'а' => out.push('a'),
			'б' => out.push('b'),
			'в' => out.push('v'),
			'г' => out.push('g'),
			'д' => out.push('d'),
			'е' | 'ё' | 'э' => out.push('e'),
			'ж' => out.push_str("zh"),
			'з' => out.push('z'),
			'и' | 'й' => out.push('i'),
			'к' => out.push('k'),
			'л' => out.push('l'),
			'м' => out.push('m'),
			'н' => out.push('n'),
			'о' => out.push('o'),
			'п' => out.push('p'),
			'р' => out.push('r'),
			'с' => out.push('s'),
			'т' => out.push('t'),
			'у' => out.push('u'),
			'ф' => out.push('f'),
			'х' => out.push('h'),
			'ц' => out.push_str("ts"),
			'ч' => out.push_str("ch"),
			'ш' => out.push_str("sh"),
			'щ' => out.push_str("shch"),
			'ы' => out.push('y'),
			'ю' => out.push_str("yu"),
			'я' => out.push_str("ya"),
			other => out.push(other),
		}
	}
	out
}
