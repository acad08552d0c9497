//! Query text normalization.
//!
//! Vietnamese queries arrive with arbitrary casing, tone marks and
//! punctuation. Keyword matching and the lexical half of the hybrid search
//! both work on a canonical, accent-free form.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize free text into its canonical matching form.
///
/// - lowercased
/// - canonically decomposed, with every combining mark dropped
///   ("lịch" -> "lich")
/// - `đ`/`Đ` folded to `d` (they do not decompose)
/// - `_`, `.` and `,` turned into spaces
/// - any other character that is neither alphanumeric nor whitespace removed
/// - whitespace runs collapsed to a single space, ends trimmed
///
/// The result is a fixed point: normalizing it again returns it unchanged.
///
/// # Example
/// ```
/// use ward_knowledge::normalize_text;
///
/// assert_eq!(normalize_text("Thủ tục ĐĂNG KÝ khai sinh?"), "thu tuc dang ky khai sinh");
/// ```
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut folded = String::with_capacity(lowered.len());

    for c in lowered.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'đ' | 'Đ' => folded.push('d'),
            '_' | '.' | ',' => folded.push(' '),
            c if c.is_whitespace() => folded.push(' '),
            c if c.is_alphanumeric() => folded.push(c),
            _ => {}
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
