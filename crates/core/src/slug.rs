//! URL slug derivation and validation.
//!
//! A valid slug is 3 to 50 characters of `[a-z0-9-]`, with no leading,
//! trailing or doubled hyphen. [`generate_slug`] turns arbitrary titles
//! (Hangul included) into one; [`normalize_slug`] is the lossy cleanup applied
//! to user-typed candidates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 50;
pub const RANDOM_TOKEN_LEN: usize = 8;

const TOKEN_ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug must be at least {min} characters (got {0})", min = SLUG_MIN_LEN)]
    TooShort(usize),
    #[error("slug must be at most {max} characters (got {0})", max = SLUG_MAX_LEN)]
    TooLong(usize),
    #[error("slug may only contain lowercase letters, digits and hyphens (found '{0}')")]
    InvalidChar(char),
    #[error("slug cannot start or end with a hyphen")]
    EdgeHyphen,
    #[error("slug cannot contain consecutive hyphens")]
    DoubleHyphen,
}

/// A slug that passed [`check_slug`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(candidate: &str) -> Result<Self, SlugError> {
        check_slug(candidate)?;
        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_slug(&value)?;
        Ok(Self(value))
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explain why `candidate` is not a valid slug.
pub fn check_slug(candidate: &str) -> Result<(), SlugError> {
    let len = candidate.chars().count();
    if len < SLUG_MIN_LEN {
        return Err(SlugError::TooShort(len));
    }
    if len > SLUG_MAX_LEN {
        return Err(SlugError::TooLong(len));
    }
    if let Some(c) = candidate
        .chars()
        .find(|&c| !matches!(c, 'a'..='z' | '0'..='9' | '-'))
    {
        return Err(SlugError::InvalidChar(c));
    }
    if candidate.starts_with('-') || candidate.ends_with('-') {
        return Err(SlugError::EdgeHyphen);
    }
    if candidate.contains("--") {
        return Err(SlugError::DoubleHyphen);
    }
    Ok(())
}

pub fn is_valid_slug(candidate: &str) -> bool {
    check_slug(candidate).is_ok()
}

/// Derive a slug from a human-entered title.
///
/// Deterministic for any title that yields at least three slug characters;
/// empty, blank or unconvertible titles get a random 8-character token.
pub fn generate_slug(title: &str) -> String {
    if title.trim().is_empty() {
        return random_token();
    }

    let romanized = romanize(title).to_lowercase();
    let mut slug = join_words(romanized.chars(), |c| c.is_whitespace() || c == '-');
    if slug.len() > SLUG_MAX_LEN {
        // Only ASCII survives join_words, so byte truncation is safe.
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if is_valid_slug(&slug) {
        slug
    } else {
        tracing::debug!(title, "title yields no usable slug, using random token");
        random_token()
    }
}

/// Lower-case `candidate` and drop everything outside `[a-z0-9-]`.
///
/// Unlike [`generate_slug`] this never transliterates: non-Latin characters
/// and whitespace simply disappear.
pub fn normalize_slug(candidate: &str) -> String {
    join_words(candidate.to_lowercase().chars(), |c| c == '-')
}

/// Random `[a-z0-9]{8}` token; always a valid slug.
pub fn random_token() -> String {
    // The low 62 bits of a v4 UUID are random; the variant bits sit above them.
    let mut bits = Uuid::new_v4().as_u128() & ((1u128 << 62) - 1);
    (0..RANDOM_TOKEN_LEN)
        .map(|_| {
            let c = TOKEN_ALPHABET[(bits % 36) as usize] as char;
            bits /= 36;
            c
        })
        .collect()
}

/// Alternative to a taken slug: `candidate` plus a random `-NNN` suffix,
/// shortened so the result stays valid.
pub fn suggest_slug(candidate: &str) -> String {
    let suffix = format!("-{}", Uuid::new_v4().as_u128() % 1000);
    let mut base = normalize_slug(candidate);
    base.truncate(SLUG_MAX_LEN - suffix.len());
    while base.ends_with('-') {
        base.pop();
    }
    let suggestion = format!("{base}{suffix}");
    if is_valid_slug(&suggestion) {
        suggestion
    } else {
        random_token()
    }
}

/// Keep `[a-z0-9]`, turn each run of separators into one `-` between words,
/// and drop everything else. Never emits a leading or trailing `-`.
fn join_words(chars: impl Iterator<Item = char>, is_separator: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    let mut pending_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(c);
        } else if is_separator(c) {
            pending_separator = true;
        }
    }
    out
}

const HANGUL_BASE: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const MEDIAL_COUNT: u32 = 21;
const FINAL_COUNT: u32 = 28;

const INITIALS: [&str; 19] = [
    "g", "kk", "n", "d", "tt", "r", "m", "b", "pp", "s", "ss", "", "j", "jj", "ch", "k", "t", "p",
    "h",
];
const MEDIALS: [&str; 21] = [
    "a", "ae", "ya", "yae", "eo", "e", "yeo", "ye", "o", "wa", "wae", "oe", "yo", "u", "wo", "we",
    "wi", "yu", "eu", "ui", "i",
];
// Consonant clusters (ㄳ, ㄺ, ...) and ㅇ romanize to nothing.
const FINALS: [&str; 28] = [
    "", "g", "kk", "", "n", "", "", "d", "r", "", "", "", "", "", "", "", "m", "b", "", "s", "ss",
    "", "j", "ch", "k", "t", "p", "h",
];
// Compatibility jamo U+3131..=U+314E, in code point order.
const JAMO_CONSONANTS: [&str; 30] = [
    "g", "kk", "", "n", "", "", "d", "tt", "r", "", "", "", "", "", "", "", "m", "b", "pp", "",
    "s", "ss", "", "j", "jj", "ch", "k", "t", "p", "h",
];
const JAMO_CONSONANT_FIRST: u32 = 0x3131;
const JAMO_VOWEL_FIRST: u32 = 0x314F;
const JAMO_VOWEL_LAST: u32 = 0x3163;

fn is_hangul_syllable(c: char) -> bool {
    matches!(c as u32, HANGUL_BASE..=HANGUL_LAST)
}

/// Replace Hangul syllables and jamo with their Latin sounds; any other
/// character passes through unchanged. Text without a composed syllable is
/// left alone, so bare jamo on their own are dropped later.
fn romanize(text: &str) -> std::borrow::Cow<'_, str> {
    if !text.chars().any(is_hangul_syllable) {
        return std::borrow::Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        let code = c as u32;
        match code {
            HANGUL_BASE..=HANGUL_LAST => {
                let index = code - HANGUL_BASE;
                let initial = index / (MEDIAL_COUNT * FINAL_COUNT);
                let medial = (index % (MEDIAL_COUNT * FINAL_COUNT)) / FINAL_COUNT;
                let fin = index % FINAL_COUNT;
                out.push_str(INITIALS[initial as usize]);
                out.push_str(MEDIALS[medial as usize]);
                out.push_str(FINALS[fin as usize]);
            }
            JAMO_CONSONANT_FIRST..=0x314E => {
                out.push_str(JAMO_CONSONANTS[(code - JAMO_CONSONANT_FIRST) as usize]);
            }
            JAMO_VOWEL_FIRST..=JAMO_VOWEL_LAST => {
                out.push_str(MEDIALS[(code - JAMO_VOWEL_FIRST) as usize]);
            }
            _ => out.push(c),
        }
    }
    std::borrow::Cow::Owned(out)
}
