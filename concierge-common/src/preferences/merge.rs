//! Preference merging
//!
//! Combines the stored preference set with a freshly extracted one. Both the
//! chat extraction and the profile analysis tend to repeat labels with small
//! wording differences, so each category is deduplicated on the normalized key.

use std::collections::{BTreeSet, HashSet};

use super::{normalize, PreferenceSet};

/// Merge `incoming` into `existing` without mutating either
///
/// For every category present in either input the result holds the existing
/// labels followed by the incoming ones, keeping only the first label for each
/// normalized key in its original wording. Categories missing from both inputs
/// stay missing; a category present in either input is always present in the
/// result, even when its list is empty.
///
/// ```
/// use concierge_common::preferences::{merge, PreferenceSet};
///
/// let existing: PreferenceSet = vec![("music", vec!["Bon Iver"])].into_iter().collect();
/// let incoming: PreferenceSet = vec![("music", vec!["bon iver", "Fleet Foxes"])].into_iter().collect();
///
/// let merged = merge(&existing, &incoming);
/// assert_eq!(merged.labels("music"), ["Bon Iver", "Fleet Foxes"]);
/// ```
pub fn merge(existing: &PreferenceSet, incoming: &PreferenceSet) -> PreferenceSet {
    let categories: BTreeSet<&str> = existing.categories().chain(incoming.categories()).collect();

    categories
        .into_iter()
        .map(|category| {
            let labels = existing
                .labels(category)
                .iter()
                .chain(incoming.labels(category));
            (category, dedupe(labels))
        })
        .collect()
}

/// Keep the first label for each normalized key, in input order
///
/// Labels that normalize to the empty string share one key, so only the first
/// blank (or punctuation-only) label survives.
pub fn dedupe<I>(labels: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for label in labels {
        let label = label.as_ref();
        if seen.insert(normalize(label)) {
            kept.push(label.to_string());
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(entries: &[(&str, &[&str])]) -> PreferenceSet {
        entries
            .iter()
            .map(|(category, labels)| (category.to_string(), labels.to_vec()))
            .collect()
    }

    #[test]
    fn test_first_wording_wins() {
        let merged = merge(
            &prefs(&[("music", &["Bon Iver"])]),
            &prefs(&[("music", &["bon iver", "Fleet Foxes"])]),
        );
        assert_eq!(merged, prefs(&[("music", &["Bon Iver", "Fleet Foxes"])]));
    }

    #[test]
    fn test_merge_into_empty() {
        let merged = merge(&PreferenceSet::new(), &prefs(&[("film", &["Wes Anderson"])]));
        assert_eq!(merged, prefs(&[("film", &["Wes Anderson"])]));
    }

    #[test]
    fn test_duplicates_inside_one_input_are_removed() {
        let merged = merge(
            &prefs(&[("cuisine", &["Nordic cuisine", "e.g. Nordic Cuisine"])]),
            &PreferenceSet::new(),
        );
        assert_eq!(merged.labels("cuisine"), ["Nordic cuisine"]);
    }

    #[test]
    fn test_existing_labels_precede_incoming() {
        let merged = merge(
            &prefs(&[("film", &["Kubrick"])]),
            &prefs(&[("film", &["Agnes Varda", "Kubrick (director)"])]),
        );
        assert_eq!(merged.labels("film"), ["Kubrick", "Agnes Varda"]);
    }

    #[test]
    fn test_categories_are_unioned() {
        let merged = merge(
            &prefs(&[("music", &["Radiohead"]), ("travel", &[])]),
            &prefs(&[("fashion", &["Acne Studios"])]),
        );
        let categories: Vec<&str> = merged.categories().collect();
        assert_eq!(categories, ["fashion", "music", "travel"]);
        assert!(merged.labels("travel").is_empty());
    }

    #[test]
    fn test_blank_labels_collapse_to_first() {
        // Blank lines all share the empty key; only the first one survives.
        let merged = merge(&prefs(&[("music", &["", "  "])]), &prefs(&[("music", &["?!", "Sade"])]));
        assert_eq!(merged.labels("music"), ["", "Sade"]);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let existing = prefs(&[("music", &["Bon Iver", "bon iver"])]);
        let incoming = prefs(&[("music", &["Fleet Foxes"])]);
        let existing_before = existing.clone();
        let incoming_before = incoming.clone();

        let _ = merge(&existing, &incoming);

        assert_eq!(existing, existing_before);
        assert_eq!(incoming, incoming_before);
    }

    #[test]
    fn test_repeated_merge_is_stable() {
        let a = prefs(&[("music", &["Bon Iver", "Sigur Ros"]), ("film", &["Wes Anderson"])]);
        let b = prefs(&[("music", &["bon iver", "Fleet Foxes"]), ("cuisine", &["Ramen"])]);

        let once = merge(&a, &b);
        let twice = merge(&once, &b);
        assert_eq!(twice, once);
    }
}
