//! Label normalization
//!
//! Projects a free-text preference onto the key used to decide whether two
//! labels name the same preference.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest `( ... )` run on one line; nesting is not tracked, the first `)` closes.
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").expect("valid regex"));

static EXAMPLE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)e\.g\.").expect("valid regex"));

/// Canonicalize a preference label into its comparison key
///
/// Steps, each applied to the previous output:
/// 1. lowercase
/// 2. drop parenthesized runs, parentheses included
/// 3. drop every "e.g."
/// 4. drop anything that is not `a-z`, `0-9`, whitespace or `-`
/// 5. collapse whitespace runs to one space and trim
///
/// Total and idempotent. Whitespace-only input yields an empty key.
///
/// ```
/// use concierge_common::preferences::normalize;
///
/// assert_eq!(normalize("Wes Anderson (director)"), "wes anderson");
/// assert_eq!(normalize("e.g. Nordic Cuisine"), "nordic cuisine");
/// ```
pub fn normalize(label: &str) -> String {
    let lowered = label.to_lowercase();
    let without_parens = PARENTHETICAL.replace_all(&lowered, "");
    let without_examples = EXAMPLE_MARKER.replace_all(&without_parens, "");

    let kept: String = without_examples
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
