//! Input normalization.
//!
//! Everything downstream of the orchestrator (recognition, learning, context)
//! sees text in this canonical form.

/// Punctuation kept by [`normalize_input`]. Letters (any script), ASCII
/// digits and spaces are kept too; everything else is dropped.
const SAFE_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', '\'', '-', ':', '+', '*', '/', '(', ')', '=', '%', '^',
];

/// Lowercase, trim, collapse whitespace and strip unsafe characters.
///
/// Curly apostrophes are folded to `'` first so "what’s" still matches
/// contraction patterns. Accented letters survive ("Zürich" stays
/// "zürich"); combining marks and symbols do not.
#[must_use]
pub fn normalize_input(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| {
            c.is_alphabetic() || c.is_ascii_digit() || *c == ' ' || SAFE_PUNCTUATION.contains(c)
        })
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
