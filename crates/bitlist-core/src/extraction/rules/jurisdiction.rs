//! Jurisdiction inference from address and document keywords.

/// Keyword to country table, scanned in order. The first keyword found as a
/// substring of the lowercased haystack decides the country, so broader
/// countries listed earlier win over later, more specific entries.
pub const COUNTRY_KEYWORDS: &[(&str, &str)] = &[
    ("indonesia", "Indonesia"),
    ("jakarta", "Indonesia"),
    ("singapore", "Singapore"),
    ("hong kong", "Hong Kong"),
    ("cayman", "Cayman Islands"),
    ("cayman islands", "Cayman Islands"),
    ("british virgin islands", "British Virgin Islands"),
    ("bvi", "British Virgin Islands"),
    ("tortola", "British Virgin Islands"),
    ("seychelles", "Seychelles"),
    ("mahe", "Seychelles"),
    ("united states", "United States"),
    ("usa", "United States"),
    ("delaware", "United States"),
    ("wyoming", "United States"),
    ("new york", "United States"),
    ("united kingdom", "United Kingdom"),
    ("uk", "United Kingdom"),
    ("london", "United Kingdom"),
    ("st. vincent and the grenadines", "St. Vincent and the Grenadines"),
    ("st vincent and the grenadines", "St. Vincent and the Grenadines"),
    ("saint vincent", "St. Vincent and the Grenadines"),
    ("st. vincent", "St. Vincent and the Grenadines"),
    ("romania", "Romania"),
    ("bucuresti", "Romania"),
    ("bucharest", "Romania"),
    ("judet", "Romania"),
    ("municipiul", "Romania"),
    ("estonia", "Estonia"),
    ("tallinn", "Estonia"),
    ("lithuania", "Lithuania"),
    ("vilnius", "Lithuania"),
    ("malta", "Malta"),
    ("switzerland", "Switzerland"),
    ("zurich", "Switzerland"),
    ("zug", "Switzerland"),
    ("cyprus", "Cyprus"),
    ("nicosia", "Cyprus"),
    ("limassol", "Cyprus"),
    ("gibraltar", "Gibraltar"),
    ("liechtenstein", "Liechtenstein"),
    ("ireland", "Ireland"),
    ("dublin", "Ireland"),
    ("netherlands", "Netherlands"),
    ("luxembourg", "Luxembourg"),
    ("japan", "Japan"),
    ("tokyo", "Japan"),
    ("korea", "South Korea"),
    ("seoul", "South Korea"),
    ("australia", "Australia"),
    ("sydney", "Australia"),
    ("india", "India"),
    ("mumbai", "India"),
    ("vietnam", "Vietnam"),
    ("hanoi", "Vietnam"),
    ("ho chi minh", "Vietnam"),
    ("thailand", "Thailand"),
    ("bangkok", "Thailand"),
    ("philippines", "Philippines"),
    ("manila", "Philippines"),
    ("malaysia", "Malaysia"),
    ("kuala lumpur", "Malaysia"),
    ("taiwan", "Taiwan"),
    ("taipei", "Taiwan"),
    ("china", "China"),
    ("beijing", "China"),
    ("shanghai", "China"),
    ("dubai", "UAE"),
    ("abu dhabi", "UAE"),
    ("united arab emirates", "UAE"),
    ("bahrain", "Bahrain"),
    ("qatar", "Qatar"),
    ("saudi arabia", "Saudi Arabia"),
    ("panama", "Panama"),
    ("canada", "Canada"),
    ("toronto", "Canada"),
    ("bermuda", "Bermuda"),
    ("brazil", "Brazil"),
    ("argentina", "Argentina"),
    ("mexico", "Mexico"),
    ("south africa", "South Africa"),
    ("nigeria", "Nigeria"),
    ("kenya", "Kenya"),
    ("marshall islands", "Marshall Islands"),
    ("samoa", "Samoa"),
    ("labuan", "Malaysia (Labuan)"),
    ("nevis", "St. Kitts and Nevis"),
    ("belize", "Belize"),
    ("mauritius", "Mauritius"),
    ("curacao", "Curaçao"),
];

/// Infer the jurisdiction from an address and the full source text.
///
/// The address is searched first because it is prepended to the haystack;
/// matching is plain lowercase substring search, not word-bounded.
pub fn infer_jurisdiction(address: &str, full_text: &str) -> Option<String> {
    let haystack = format!("{address} {full_text}").to_lowercase();
    COUNTRY_KEYWORDS
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, country)| (*country).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_city_keyword() {
        assert_eq!(
            infer_jurisdiction("Road Town, Tortola", ""),
            Some("British Virgin Islands".to_string())
        );
        assert_eq!(
            infer_jurisdiction("", "Office in Kuala Lumpur"),
            Some("Malaysia".to_string())
        );
    }

    #[test]
    fn test_table_order_wins() {
        // "indonesia" is declared before "singapore"
        assert_eq!(
            infer_jurisdiction("Singapore", "branch office in Indonesia"),
            Some("Indonesia".to_string())
        );
    }

    #[test]
    fn test_substring_match() {
        // "zug" inside "Zugspitze", "uk" inside "Ukraine"
        assert_eq!(infer_jurisdiction("Zugspitze 1", ""), Some("Switzerland".to_string()));
        assert_eq!(infer_jurisdiction("Kyiv, Ukraine", ""), Some("United Kingdom".to_string()));
    }

    #[test]
    fn test_labuan() {
        assert_eq!(
            infer_jurisdiction("Level 2, Labuan Financial Park", ""),
            Some("Malaysia (Labuan)".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(infer_jurisdiction("", "nothing here"), None);
        assert_eq!(infer_jurisdiction("", ""), None);
    }
}
