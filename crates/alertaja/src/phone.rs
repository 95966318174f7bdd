//! Phone number handling.
//!
//! Numbers are entered in the Brazilian display mask `(11) 91234-5678` and
//! normalized to bare international digits for chat-app links.

use std::sync::OnceLock;

use regex::Regex;

/// Longest local number (area code plus subscriber number).
pub const MAX_LOCAL_DIGITS: usize = 11;

/// Shortest accepted masked number, `(XX) XXXX-XXXX`.
pub const MIN_MASKED_LEN: usize = 14;

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9]").expect("static pattern"))
}

/// Strip everything but ASCII digits.
///
/// Other Unicode digits (Arabic-Indic, fullwidth) are stripped too, so the
/// result is always ASCII and safe to slice by byte.
#[must_use]
pub fn digits(input: &str) -> String {
    non_digits().replace_all(input, "").into_owned()
}

/// Format raw input with the display mask, keeping at most 11 digits.
///
/// Partial input is masked progressively: `1` → `(1`, `119` → `(11) 9`,
/// `1199999` → `(11) 9999-9`, `11999990000` → `(11) 99999-0000`.
#[must_use]
pub fn mask(input: &str) -> String {
    let mut d = digits(input);
    d.truncate(MAX_LOCAL_DIGITS);

    match d.len() {
        0 => String::new(),
        1..=2 => format!("({d}"),
        3..=5 => format!("({}) {}", &d[..2], &d[2..]),
        6..=10 => format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..]),
        _ => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
    }
}

/// Check that a masked number is long enough to be a real number.
#[must_use]
pub fn is_plausible(masked: &str) -> bool {
    masked.chars().count() >= MIN_MASKED_LEN
}

/// Normalize a number for outbound messaging.
///
/// Local numbers (at most 11 digits) get `country_code` prepended; longer
/// numbers are assumed to carry one already and pass through.
#[must_use]
pub fn normalize_international(input: &str, country_code: &str) -> String {
    let d = digits(input);
    if d.len() <= MAX_LOCAL_DIGITS {
        format!("{country_code}{d}")
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits() {
        assert_eq!(digits("(11) 99999-0000"), "11999990000");
        assert_eq!(digits("abc"), "");
    }

    #[test]
    fn test_digits_ignores_non_ascii_digits() {
        assert_eq!(digits("١١"), "");
        assert_eq!(digits("１１ 9"), "9");
    }

    #[test]
    fn test_mask_non_ascii_digits() {
        assert_eq!(mask("١١٩٩٩٩٩٠٠٠٠"), "");
        assert_eq!(mask("(１１) ٩٩٩٩٩-0000"), "(00) 00");
    }

    #[test]
    fn test_mask_progressive() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("1"), "(1");
        assert_eq!(mask("11"), "(11");
        assert_eq!(mask("119"), "(11) 9");
        assert_eq!(mask("11999"), "(11) 999");
        assert_eq!(mask("119999"), "(11) 9999-");
        assert_eq!(mask("1199990000"), "(11) 9999-0000");
        assert_eq!(mask("11999990000"), "(11) 99999-0000");
    }

    #[test]
    fn test_mask_truncates_extra_digits() {
        assert_eq!(mask("1199999000012"), "(11) 99999-0000");
    }

    #[test]
    fn test_mask_is_idempotent() {
        let once = mask("11999990000");
        assert_eq!(mask(&once), once);
    }

    #[test]
    fn test_is_plausible() {
        assert!(is_plausible("(11) 9999-0000"));
        assert!(is_plausible("(11) 99999-0000"));
        assert!(!is_plausible("(11) 9999-000"));
        assert!(!is_plausible(""));
    }

    #[test]
    fn test_normalize_local_number() {
        assert_eq!(
            normalize_international("11999990000", "55"),
            "5511999990000"
        );
        assert_eq!(
            normalize_international("(11) 99999-0000", "55"),
            "5511999990000"
        );
    }

    #[test]
    fn test_normalize_non_ascii_digits() {
        assert_eq!(normalize_international("١١٩٩٩", "55"), "55");
    }

    #[test]
    fn test_normalize_passes_through_long_number() {
        assert_eq!(
            normalize_international("5511999990000", "55"),
            "5511999990000"
        );
        assert_eq!(
            normalize_international("+1 (415) 555-01234", "55"),
            "141555501234"
        );
    }
}
