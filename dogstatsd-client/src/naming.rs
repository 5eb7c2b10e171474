//! Helpers for building metric titles from code identifiers.

/// What a metric built by [`metric_title`] counts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Successful calls.
    Hit,

    /// Failed calls.
    Error,
}

impl Outcome {
    const fn suffix(self) -> &'static str {
        match self {
            Outcome::Hit => "number_of_hits",
            Outcome::Error => "number_of_errors",
        }
    }
}

/// Formats a CamelCase identifier as a snake_case title.
///
/// A word boundary is placed before every uppercase character other than the first, so acronyms are split into single
/// letters.
///
/// ```
/// # use dogstatsd_client::naming::format_title;
/// assert_eq!(format_title("GetUserById"), "get_user_by_id");
/// assert_eq!(format_title("checkout"), "checkout");
/// ```
pub fn format_title(identifier: &str) -> String {
    let mut title = String::with_capacity(identifier.len() + 4);
    for (i, c) in identifier.char_indices() {
        if i > 0 && c.is_uppercase() {
            title.push('_');
        }
        title.extend(c.to_lowercase());
    }
    title
}

/// Builds the title of a metric counting the hits or errors of `name`.
///
/// ```
/// # use dogstatsd_client::naming::{metric_title, Outcome};
/// assert_eq!(metric_title(Outcome::Hit, "GetUser"), "get_user.number_of_hits");
/// assert_eq!(metric_title(Outcome::Error, "GetUser"), "get_user.number_of_errors");
/// ```
pub fn metric_title(outcome: Outcome, name: &str) -> String {
    let mut title = format_title(name);
    title.push('.');
    title.push_str(outcome.suffix());
    title
}
