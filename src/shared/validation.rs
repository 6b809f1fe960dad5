use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating location names
    /// Letters, digits and spaces, single hyphens allowed between words
    /// - Valid: "Toilet Lobby", "Gate-3", "Pump Room 2"
    /// - Invalid: " Lobby", "Lobby ", "Gate--3", ""
    pub static ref LOCATION_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9]+(?:[ -][A-Za-z0-9]+)*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_regex_valid() {
        assert!(LOCATION_REGEX.is_match("Toilet Lobby"));
        assert!(LOCATION_REGEX.is_match("Gate-3"));
        assert!(LOCATION_REGEX.is_match("Pump Room 2"));
        assert!(LOCATION_REGEX.is_match("A"));
    }

    #[test]
    fn test_location_regex_invalid() {
        assert!(!LOCATION_REGEX.is_match(" Lobby")); // leading space
        assert!(!LOCATION_REGEX.is_match("Lobby ")); // trailing space
        assert!(!LOCATION_REGEX.is_match("Gate--3")); // double hyphen
        assert!(!LOCATION_REGEX.is_match("")); // empty
        assert!(!LOCATION_REGEX.is_match("Lobby/3")); // slash
    }
}
