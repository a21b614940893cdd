use chrono::{DateTime, Utc};

/// Date layout used by the API (`yyyy-MM-dd'T'HH:mm:ss.SSSZ`)
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Date layout shown to users, e.g. `Apr 23, 2022 18:00`
pub const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y %H:%M";

/// Parse an API timestamp. A trailing `Z` is read as `+0000`.
pub fn parse_wire_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let normalized = match value.strip_suffix('Z') {
        Some(stripped) => format!("{}+0000", stripped),
        None => value.to_string(),
    };
    DateTime::parse_from_str(&normalized, WIRE_DATE_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp the way the API sends it
pub fn format_wire_date(date: &DateTime<Utc>) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// Format a match date for display
pub fn format_match_date(date: &DateTime<Utc>) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// "{label}: {count} matches" as used by the team summary lines
pub fn count_label(label: &str, count: usize) -> String {
    format!("{}: {} matches", label, count)
}
