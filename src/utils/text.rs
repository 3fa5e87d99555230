//! Text normalization and number formatting helpers
//!
//! Used at the table boundary (order codes, tri-state flags) and by the
//! summary formatting of the analytics tables.

/// Title-case a string: the first letter of every alphabetic run is
/// upper-cased, the rest lower-cased ("CARNIVORA" → "Carnivora",
/// "de la cruz" → "De La Cruz").
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;

    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// Normalize a taxonomic order code for grouping.
///
/// Trims whitespace and title-cases; blank codes become `None`.
pub fn normalize_order_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(title_case(trimmed))
    }
}

/// Parse a tri-state habitat flag ("true"/"false" in any case).
///
/// Anything else (including blank text) is treated as missing.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Trim a text cell, mapping blank strings to `None`.
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Format an integer with `,` thousands separators (12345 → "12,345").
pub fn format_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("CARNIVORA"), "Carnivora");
        assert_eq!(title_case("carnivora"), "Carnivora");
        assert_eq!(title_case("sea-cows and MANATEES"), "Sea-Cows And Manatees");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalize_order_code_merges_variants() {
        assert_eq!(normalize_order_code(" carnivora"), Some("Carnivora".to_string()));
        assert_eq!(normalize_order_code("CARNIVORA "), Some("Carnivora".to_string()));
        assert_eq!(normalize_order_code("   "), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" False "), Some(false));
        assert_eq!(parse_flag("1"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(50.0, 2), 50.0);
    }
}
