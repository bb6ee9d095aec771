//! Locale-aware string ordering for the site index.
//!
//! Strings compare case-insensitively first. Strings equal ignoring case are
//! ordered lowercase-first at the first differing letter, then by code point.

use std::cmp::Ordering;

/// Compare two strings for display ordering.
pub fn compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded
        .then_with(|| case_tie_break(a, b))
        .then_with(|| a.cmp(b))
}

fn case_tie_break(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        if x.is_lowercase() && y.is_uppercase() {
            return Ordering::Less;
        }
        if x.is_uppercase() && y.is_lowercase() {
            return Ordering::Greater;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(items: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        v.sort_by(|a, b| compare(a, b));
        v
    }

    #[test]
    fn case_insensitive_first() {
        assert_eq!(
            sorted(&["org.Zeta", "org.alpha", "Org.beta"]),
            ["org.alpha", "Org.beta", "org.Zeta"]
        );
    }

    #[test]
    fn lowercase_before_uppercase_on_ties() {
        assert_eq!(sorted(&["B", "a", "b", "A"]), ["a", "A", "b", "B"]);
        assert_eq!(compare("org.acme", "org.Acme"), Ordering::Less);
    }

    #[test]
    fn prefixes_sort_first() {
        assert_eq!(compare("org.acme", "org.acme.vehicle"), Ordering::Less);
        assert_eq!(compare("same", "same"), Ordering::Equal);
    }
}
