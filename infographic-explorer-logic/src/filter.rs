//! Builds the `search=` part of openFDA queries.
//!
//! The produced strings are inserted into query strings verbatim: `+` stands
//! for a space in openFDA syntax and must not be percent-encoded.

use crate::registry::DateConstraint;

/// Manifest dates come as `YYYY-MM-DD`, openFDA ranges expect `YYYYMMDD`.
pub fn normalize_date(date: &str) -> String {
    date.replace('-', "")
}

/// `field:[start+TO+end]` where `end` is the normalized `last_updated` date.
pub fn date_range(constraint: &DateConstraint, last_updated: &str) -> String {
    format!(
        "{}:[{}+TO+{}]",
        constraint.field,
        constraint.start_date,
        normalize_date(last_updated)
    )
}

/// Combines an optional date range with the user search text.
///
/// The result is either empty or ends with `&`, so the count parameter can be
/// appended right after it.
pub fn search_clause(range: Option<&str>, search_text: &str) -> String {
    match (range, search_text.is_empty()) {
        (Some(range), false) => format!("search=({range})+AND+{search_text}&"),
        (Some(range), true) => format!("search={range}&"),
        (None, false) => format!("search={search_text}&"),
        (None, true) => String::new(),
    }
}

/// Stage B of the fetch pipeline. `last_updated` is only consulted when the
/// explorer is date constrained.
pub fn derive_search(
    constraint: Option<&DateConstraint>,
    last_updated: &str,
    search_text: &str,
) -> String {
    let range = constraint.map(|constraint| date_range(constraint, last_updated));
    search_clause(range.as_deref(), search_text)
}
