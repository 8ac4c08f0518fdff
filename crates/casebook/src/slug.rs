//! URL slug derivation.
//!
//! Slugs are derived from post titles: lowercased, stripped of anything that
//! is not an ASCII letter, digit, hyphen or whitespace, with whitespace runs
//! turned into hyphens and repeated hyphens collapsed.

use std::sync::LazyLock;

use regex::Regex;

/// Slug used when a title contains nothing usable.
pub const FALLBACK_SLUG: &str = "post";

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("Invalid regex pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

static HYPHENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("Invalid regex pattern"));

/// Derive a slug from a title.
///
/// The result may be empty when the title has no ASCII letters or digits.
///
/// ```
/// use casebook::slug::slugify;
///
/// assert_eq!(slugify("Estate Planning: 5 Common Mistakes!"), "estate-planning-5-common-mistakes");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Derive a slug from a title, substituting [`FALLBACK_SLUG`] for an empty result.
#[must_use]
pub fn slugify_or_fallback(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Check that a slug is non-empty lowercase kebab-case.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Pick the first free slug among `base`, `base-2`, `base-3`, ...
///
/// `is_taken` reports whether a candidate is already in use.
pub fn unique_slug(base: &str, mut is_taken: impl FnMut(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    let mut n: u32 = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
