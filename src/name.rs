use regex::Regex;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid name pattern"));

/// Whether `name` may be used as a key or database name
///
/// Names end up as space-separated tokens on page lines, so only
/// `A-Z`, `a-z`, `0-9`, `-` and `_` are allowed.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}
