//! Evaluator score parsing.
//!
//! The evaluator asks the model for a bare float but models routinely wrap it
//! in prose. Parsing keeps every digit character and `.` in the reply, in
//! order, and reads the result as a float. This is lossy on purpose: `"8/10"`
//! reads as `810.0`, and `"score 0.4 of 1"` reads as `0.41`. Anything that
//! does not survive as a float falls back to [`DEFAULT_SCORE`].
//!
//! "Digit" is wider than ASCII. Decimal digits from other forms and scripts
//! (fullwidth `０`, Devanagari `५`) are kept and read as their ASCII value.
//! Non-decimal digits (superscripts, subscripts, circled digits) are kept as
//! well, and since they are not decimal the parse then fails and the
//! fallback applies. Other numeric characters such as `½` or `Ⅻ` are not
//! digits and are dropped.

use tracing::warn;
use unicode_normalization::UnicodeNormalization;

/// Scores strictly below this trigger a critique round.
pub const SCORE_THRESHOLD: f64 = 0.7;

/// Substituted when the reply cannot be read as a number.
pub const DEFAULT_SCORE: f64 = 0.5;

/// Digits that are not decimal: superscripts, subscripts, circled and
/// parenthesized forms, Ethiopic and a few more.
const NON_DECIMAL_DIGITS: &[(u32, u32)] = &[
    (0x00B2, 0x00B3),
    (0x00B9, 0x00B9),
    (0x1369, 0x1371),
    (0x19DA, 0x19DA),
    (0x2070, 0x2070),
    (0x2074, 0x2079),
    (0x2080, 0x2089),
    (0x2460, 0x2468),
    (0x2474, 0x247C),
    (0x2488, 0x2490),
    (0x24EA, 0x24EA),
    (0x24F5, 0x24FD),
    (0x24FF, 0x24FF),
    (0x2776, 0x277E),
    (0x2780, 0x2788),
    (0x278A, 0x2792),
    (0x10A40, 0x10A43),
    (0x10E60, 0x10E68),
    (0x11052, 0x1105A),
    (0x1F100, 0x1F10A),
];

/// Zero code points of decimal digit runs that NFKC leaves unfolded. Each
/// run holds the digits 0 through 9 in order.
const DECIMAL_ZEROS: &[u32] = &[
    0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66, 0x0CE6,
    0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946, 0x19D0,
    0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0, 0xA9F0,
    0xAA50, 0xABF0, 0x104A0, 0x11066, 0x110F0, 0x11136, 0x111D0, 0x112F0, 0x11450, 0x114D0,
    0x11650, 0x116C0, 0x11730, 0x118E0, 0x11C50, 0x11D50, 0x11DA0, 0x16A60, 0x16B50, 0x1E140,
    0x1E2F0, 0x1E950,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DigitClass {
    /// A decimal digit with its value.
    Decimal(char),
    /// A digit that is not decimal.
    NonDecimal,
    /// Not a digit at all.
    Other,
}

fn classify(c: char) -> DigitClass {
    if c.is_ascii_digit() {
        return DigitClass::Decimal(c);
    }
    let code = c as u32;
    if NON_DECIMAL_DIGITS
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&code))
    {
        return DigitClass::NonDecimal;
    }
    if !c.is_numeric() {
        return DigitClass::Other;
    }

    // Fullwidth and mathematical digits fold to ASCII.
    let mut folded = std::iter::once(c).nfkc();
    if let (Some(d), None) = (folded.next(), folded.next()) {
        if d.is_ascii_digit() {
            return DigitClass::Decimal(d);
        }
    }

    DECIMAL_ZEROS
        .iter()
        .find(|zero| (**zero..*zero + 10).contains(&code))
        .and_then(|zero| char::from_digit(code - zero, 10))
        .map_or(DigitClass::Other, DigitClass::Decimal)
}

/// Extract a score from a model reply, falling back to [`DEFAULT_SCORE`].
pub fn parse_score(text: &str) -> f64 {
    let mut digits = String::new();
    for c in text.chars() {
        match classify(c) {
            DigitClass::Decimal(d) => digits.push(d),
            DigitClass::NonDecimal => digits.push(c),
            DigitClass::Other if c == '.' => digits.push(c),
            DigitClass::Other => {}
        }
    }

    match digits.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn!(reply = %text, default = DEFAULT_SCORE, "Unparseable evaluator score");
            DEFAULT_SCORE
        }
    }
}

/// Whether a score is low enough to need another critique round.
pub fn is_issue(score: f64) -> bool {
    score < SCORE_THRESHOLD
}
