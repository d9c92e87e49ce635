//! URL slugs derived from names.

use std::sync::LazyLock;

use regex::Regex;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lower-cases `name` and joins its alphanumeric runs with `-`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("The Sea Explorer"), "the-sea-explorer");
/// ```
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
        assert_eq!(slugify("  The Snow   Adventurer! "), "the-snow-adventurer");
        assert_eq!(slugify("Tour #2: Coast"), "tour-2-coast");
    }
}
