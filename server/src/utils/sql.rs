//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Pair with `ESCAPE '\\'` so `contains` / `starts_with` filters match the
/// caller's text literally.
///
/// # Example
///
/// ```
/// use storefront_server::utils::sql::escape_like_pattern;
///
/// let user_input = "50% off_today";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%50\\% off\\_today%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
