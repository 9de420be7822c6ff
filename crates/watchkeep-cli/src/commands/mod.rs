pub mod config;
pub mod import;
pub mod import_ui;
pub mod prompts;
pub mod records;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("Invalid date: {}. Use YYYY-MM-DD or RFC 3339", input))
}
