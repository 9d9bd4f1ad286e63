//! Shade canonicalization.
//!
//! Catalog shades and raw shades are written inconsistently ("No. 12",
//! "#12", "12 Warm"). Both sides go through [`normalize`] before
//! comparison, and [`extract_leading_number`] lets "128" meet "128 Warm Nude".

use std::sync::OnceLock;

use regex::Regex;

fn leading_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)?").expect("static regex"))
}

/// Trim, strip every "No." / "no." / "#" marker, trim again.
pub fn normalize(shade: Option<&str>) -> String {
    let Some(shade) = shade else {
        return String::new();
    };
    shade
        .trim()
        .replace("No.", "")
        .replace("no.", "")
        .replace('#', "")
        .trim()
        .to_string()
}

/// Leading integer or decimal token of an already-normalized shade.
pub fn extract_leading_number(normalized: &str) -> Option<String> {
    leading_number_re().find(normalized).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_examples() {
        assert_eq!(normalize(Some("No. 12")), "12");
        assert_eq!(normalize(Some("#5.5")), "5.5");
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("   ")), "");
        assert_eq!(normalize(Some("  no.3 Ivory ")), "3 Ivory");
    }

    #[test]
    fn markers_removed_anywhere() {
        assert_eq!(normalize(Some("Ivory #2")), "Ivory 2");
        assert_eq!(normalize(Some("Shade No.7")), "Shade 7");
    }

    #[test]
    fn leading_number_examples() {
        assert_eq!(extract_leading_number("12 Warm").as_deref(), Some("12"));
        assert_eq!(extract_leading_number("Warm 12"), None);
        assert_eq!(extract_leading_number("5.5"), Some("5.5".to_string()));
        assert_eq!(extract_leading_number("128W"), Some("128".to_string()));
        assert_eq!(extract_leading_number(""), None);
    }

    #[test]
    fn trailing_dot_not_part_of_number() {
        assert_eq!(extract_leading_number("12. Sand").as_deref(), Some("12"));
    }
}
