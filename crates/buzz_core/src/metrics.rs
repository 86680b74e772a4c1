use std::sync::LazyLock;

use regex::Regex;

/// Magnitude suffixes in match priority order. Only the first one found applies.
const SUFFIXES: [(Suffix, u64); 3] = [
    (Suffix::Myriad, 10_000),
    (Suffix::Thousand, 1_000),
    (Suffix::Million, 1_000_000),
];

#[derive(Debug, Clone, Copy)]
enum Suffix {
    Myriad,
    Thousand,
    Million,
}

impl Suffix {
    fn matches(self, c: char) -> bool {
        match self {
            Suffix::Myriad => c == '万',
            Suffix::Thousand => c.eq_ignore_ascii_case(&'k'),
            Suffix::Million => c.eq_ignore_ascii_case(&'m'),
        }
    }
}

/// Plain digits, comma-grouped digits, or either followed by an optional
/// fraction and a magnitude suffix.
static COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+|\d{1,3}(?:,\d{3})+)(?:(?:\.\d+)?\s*[万KkMm])?$").expect("valid regex")
});

/// Converts a rendered engagement count such as `"1,234"`, `"1.5万"`, `"10K"`
/// or `"2M"` into an integer.
///
/// Total: empty or unparseable input yields 0. Fractional magnitudes are
/// truncated toward zero.
pub fn normalize_count(raw: &str) -> u64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    for (suffix, factor) in SUFFIXES {
        if cleaned.chars().any(|c| suffix.matches(c)) {
            let number: String = cleaned.chars().filter(|c| !suffix.matches(*c)).collect();
            return scale(&number, factor);
        }
    }

    let digits: String = cleaned.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Multiplies a decimal string by `factor` exactly, truncating the result.
fn scale(number: &str, factor: u64) -> u64 {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return 0;
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return 0;
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        match whole.parse() {
            Ok(value) => value,
            Err(_) => return 0,
        }
    };
    // Digits beyond 10^-18 cannot change the truncated result for supported factors.
    let fraction = &fraction[..fraction.len().min(18)];
    let fraction_part = if fraction.is_empty() {
        0
    } else {
        let numerator: u128 = fraction.parse().unwrap_or(0);
        numerator * u128::from(factor) / 10u128.pow(fraction.len() as u32)
    };

    let total = whole
        .saturating_mul(u128::from(factor))
        .saturating_add(fraction_part);
    u64::try_from(total).unwrap_or(u64::MAX)
}

/// True when `text` reads as a count the normalizer understands, as opposed
/// to a label ("Like", "Repost") rendered next to it.
pub fn looks_like_count(text: &str) -> bool {
    COUNT_PATTERN.is_match(text.trim())
}
