//! Parsers for the free-text "City, ST ZIP" strings the form collects.
//!
//! All helpers are total: malformed input yields `None`, and callers decide
//! how to render the gap (the webhook payload uses a "Not provided"
//! sentinel).

/// Everything before the first comma, trimmed. A string without a comma is
/// treated as all city.
pub fn extract_city(location: &str) -> Option<&str> {
    let city = match location.find(',') {
        Some(comma) => &location[..comma],
        None => location,
    };
    let city = city.trim();
    (!city.is_empty()).then_some(city)
}

/// Two uppercase letters directly following a comma (and optional
/// whitespace), the position a state code occupies in "City, ST ZIP".
pub fn extract_state(location: &str) -> Option<&str> {
    let bytes = location.as_bytes();
    let mut search = 0;
    while let Some(found) = location[search..].find(',') {
        let mut index = search + found + 1;
        while index < bytes.len() && bytes[index].is_ascii_whitespace() {
            index += 1;
        }
        if index + 2 <= bytes.len()
            && bytes[index].is_ascii_uppercase()
            && bytes[index + 1].is_ascii_uppercase()
        {
            return Some(&location[index..index + 2]);
        }
        search = search + found + 1;
    }
    None
}

/// First standalone two-uppercase-letter token anywhere in the string.
///
/// Looser than [`extract_state`]: route detection accepts a state code even
/// when the comma was dropped ("Miami FL"), matching how the form's quote
/// path has always read these strings.
pub fn extract_state_code(location: &str) -> Option<&str> {
    location
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .find(|token| token.len() == 2 && token.bytes().all(|byte| byte.is_ascii_uppercase()))
}

/// Trailing five-digit ZIP, tolerating a `-NNNN` plus-four suffix and
/// trailing whitespace. Returns only the five-digit part.
pub fn extract_zip(location: &str) -> Option<&str> {
    let trimmed = location.trim_end();
    let bytes = trimmed.as_bytes();

    if let Some(zip) = five_digits_ending_at(trimmed, trimmed.len()) {
        return Some(zip);
    }

    if trimmed.len() >= 10 {
        let dash = trimmed.len() - 5;
        if bytes[dash] == b'-' && bytes[dash + 1..].iter().all(u8::is_ascii_digit) {
            return five_digits_ending_at(trimmed, dash);
        }
    }

    None
}

fn five_digits_ending_at(text: &str, end: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = end.checked_sub(5)?;
    if !bytes[start..end].iter().all(u8::is_ascii_digit) {
        return None;
    }
    // A sixth leading digit means this is not a ZIP-shaped token.
    if start > 0 && bytes[start - 1].is_ascii_digit() {
        return None;
    }
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::{extract_city, extract_state, extract_state_code, extract_zip};

    #[test]
    fn extracts_city_before_first_comma() {
        assert_eq!(extract_city("Miami, FL 33101"), Some("Miami"));
        assert_eq!(extract_city("Winston-Salem, NC 27101"), Some("Winston-Salem"));
        assert_eq!(extract_city("Just a city"), Some("Just a city"));
        assert_eq!(extract_city("  , FL"), None);
        assert_eq!(extract_city(""), None);
    }

    #[test]
    fn extracts_state_after_comma() {
        assert_eq!(extract_state("Miami, FL 33101"), Some("FL"));
        assert_eq!(extract_state("Portland,OR"), Some("OR"));
        assert_eq!(extract_state("St. Louis, MO 63101"), Some("MO"));
        assert_eq!(extract_state("Miami FL"), None);
        assert_eq!(extract_state("Miami, fl"), None);
    }

    #[test]
    fn state_code_scan_accepts_commaless_strings() {
        assert_eq!(extract_state_code("Miami FL 33101"), Some("FL"));
        assert_eq!(extract_state_code("Miami, FL 33101"), Some("FL"));
        assert_eq!(extract_state_code("miami beach"), None);
        // Three-letter runs are not state codes.
        assert_eq!(extract_state_code("ABC 123"), None);
    }

    #[test]
    fn extracts_trailing_zip() {
        assert_eq!(extract_zip("Miami, FL 33101"), Some("33101"));
        assert_eq!(extract_zip("Miami, FL 33101  "), Some("33101"));
        assert_eq!(extract_zip("Miami, FL 33101-4321"), Some("33101"));
        assert_eq!(extract_zip("Miami, FL"), None);
        assert_eq!(extract_zip("Miami, FL 331016"), None);
        assert_eq!(extract_zip("33101, somewhere"), None);
    }
}
