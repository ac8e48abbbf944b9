use std::time::Duration;

use tally::Tally;

pub mod logger;

/// Parses a human-readable duration such as `180s` or `1h 30m`.
/// Returns `None` for anything unparsable or empty.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    humantime::parse_duration(raw.trim()).ok()
}

/// Renders a tally one option per line, as shown to voters.
pub fn render(result: &Tally) -> String {
    result.iter()
        .map(|(option, count)| format!("  {}: {} votes", option, count))
        .collect::<Vec<_>>()
        .join("\n")
}
