//! Text folding for diacritic- and case-insensitive matching.
//!
//! Both sides of a match go through the same function: stores index the
//! folded title and content, and the query builder folds user input, so
//! `"Việt"`, `"viet"`, and `"VIỆT"` all meet at `"viet"`.
//!
//! # Algorithm
//!
//! 1. NFD normalize (decompose characters into base + combining marks).
//! 2. Drop combining marks.
//! 3. Replace letters that carry their mark in the glyph itself and so
//!    survive NFD (`đ`, `ø`, `ł`, `æ`, ...) with their plain Latin
//!    spelling.
//! 4. Lowercase.
//!
//! Words are maximal runs of alphanumeric characters; everything else
//! separates words. This matches the `unicode61` tokenizer used by the
//! SQLite index closely enough that terms produced here always tokenize
//! to themselves.

use unicode_normalization::UnicodeNormalization;

/// Fold `value` to its lowercase, diacritic-free form.
///
/// Whitespace and punctuation are preserved, so offsets into the folded
/// text line up word-for-word with the original.
pub fn fold_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.nfd().filter(|c| !is_combining_mark(*c)) {
        match plain_letter(c) {
            Some(s) => out.push_str(s),
            None => out.push(c),
        }
    }
    out.to_lowercase()
}

/// Plain spelling for letters with no canonical decomposition.
fn plain_letter(c: char) -> Option<&'static str> {
    let s = match c {
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'ø' | 'Ø' => "o",
        'ł' | 'Ł' => "l",
        'ħ' | 'Ħ' => "h",
        'ŧ' | 'Ŧ' => "t",
        'ı' => "i",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ß' => "ss",
        'þ' | 'Þ' => "th",
        _ => return None,
    };
    Some(s)
}

/// Split already-folded text into words.
pub fn words(folded: &str) -> impl Iterator<Item = &str> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}' |  // Combining Diacritical Marks
        '\u{1AB0}'..='\u{1AFF}' |  // Combining Diacritical Marks Extended
        '\u{1DC0}'..='\u{1DFF}' |  // Combining Diacritical Marks Supplement
        '\u{20D0}'..='\u{20FF}' |  // Combining Diacritical Marks for Symbols
        '\u{FE20}'..='\u{FE2F}'    // Combining Half Marks
    )
}
