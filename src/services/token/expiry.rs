//! Expiry string parsing.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback lifetime applied when an expiry string cannot be parsed.
const FALLBACK_DAYS: i64 = 7;

/// Expiry strings are `<integer><unit>` with unit seconds/minutes/hours/days
static EXPIRY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)([smhd])$").unwrap());

/// Parses an expiry string such as `"15m"` or `"7d"` into a duration.
///
/// Returns `None` for anything that does not match `<integer><unit>`.
pub fn parse_expiry(input: &str) -> Option<Duration> {
    let captures = EXPIRY_REGEX.captures(input)?;

    let value: i64 = captures[1].parse().ok()?;
    let duration = match &captures[2] {
        "s" => Duration::seconds(value),
        "m" => Duration::minutes(value),
        "h" => Duration::hours(value),
        "d" => Duration::days(value),
        _ => unreachable!(),
    };

    Some(duration)
}

/// Resolves an expiry string, falling back to 7 days on unparseable input
/// instead of failing.
pub(crate) fn resolve_expiry(input: &str) -> Duration {
    parse_expiry(input).unwrap_or_else(|| {
        tracing::warn!(expiry = %input, "unparseable expiry string, falling back to 7 days");
        Duration::days(FALLBACK_DAYS)
    })
}
