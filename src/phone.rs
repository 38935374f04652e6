//! Phone number canonicalisation for sender matching.
//!
//! Israeli numbers show up as `+972-54-...`, `972 54 ...` or `054-...`
//! depending on the carrier and the contact book. All of them reduce to the
//! subscriber digits without country code or trunk prefix.

/// Strip formatting and the Israeli country code or trunk `0`.
pub fn normalize(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with("972") && digits.len() >= 12 {
        digits[3..].to_string()
    } else if digits.starts_with('0') && digits.len() == 10 {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// Two numbers are equal when their normalised forms match and are non-empty.
pub fn are_equal(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_israeli_formats() {
        assert_eq!(normalize("+972-54-219-9006"), "542199006");
        assert_eq!(normalize("0542199006"), "542199006");
        assert_eq!(normalize("972542199006"), "542199006");
        assert_eq!(normalize("054-219-9006"), "542199006");
    }

    #[test]
    fn test_normalize_leaves_other_numbers() {
        // Short codes and foreign numbers only lose their formatting.
        assert_eq!(normalize("5555"), "5555");
        assert_eq!(normalize("+1 (415) 555-1212"), "14155551212");
        // Too short to carry a country code.
        assert_eq!(normalize("97254219"), "97254219");
        // Leading zero but not a ten digit local number.
        assert_eq!(normalize("03-1234567"), "031234567");
    }

    #[test]
    fn test_normalize_non_digit_input() {
        assert_eq!(normalize("BuyMe"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_are_equal() {
        assert!(are_equal("+972-54-219-9006", "0542199006"));
        assert!(are_equal("0542199006", "972542199006"));
        assert!(are_equal("+972-54-219-9006", "972542199006"));
        assert!(!are_equal("0542199006", "0542199007"));
    }

    #[test]
    fn test_are_equal_rejects_empty() {
        assert!(!are_equal("", ""));
        assert!(!are_equal("Cibus", "Pluxee"));
    }
}
