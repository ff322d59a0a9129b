/// Approximate centroids used when a trip has no explicit coordinates.
/// Order matters: the first key contained in the destination wins, and
/// city entries come before country entries so "Paris, France" resolves
/// to paris rather than france.
const FALLBACK_CENTROIDS: [(&str, (f64, f64)); 6] = [
    ("paris", (48.85, 2.35)),
    ("tokyo", (35.67, 139.65)),
    ("france", (46.2, 2.2)),
    ("india", (20.59, 78.96)),
    ("usa", (37.09, -95.71)),
    ("japan", (36.20, 138.25)),
];

/// Best-effort substring lookup, not a geocoder. Returns None when no
/// table key matches.
pub fn coords_for(destination: &str) -> Option<(f64, f64)> {
    let needle = destination.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    FALLBACK_CENTROIDS
        .iter()
        .find(|(key, _)| needle.contains(key))
        .map(|(_, coords)| *coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_entry_wins_over_country() {
        assert_eq!(coords_for("Paris, France"), Some((48.85, 2.35)));
    }

    #[test]
    fn match_is_case_insensitive_and_trimmed() {
        assert_eq!(coords_for("  TOKYO  "), Some((35.67, 139.65)));
    }

    #[test]
    fn country_substring_matches_anywhere() {
        assert_eq!(coords_for("somewhere in rural japan"), Some((36.20, 138.25)));
    }

    #[test]
    fn unknown_destination_has_no_coords() {
        assert_eq!(coords_for("Reykjavik"), None);
        assert_eq!(coords_for(""), None);
    }
}
