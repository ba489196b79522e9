//! HTTP cache validation module
//!
//! `Last-Modified` generation and `If-Modified-Since` conditional requests.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Format a modification time as an IMF-fixdate, e.g. `Tue, 15 Nov 1994 08:12:31 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Check if the client's cached copy is still fresh
///
/// Comparison happens at second precision since HTTP dates carry no
/// sub-second part. An unparseable header never matches.
///
/// # Arguments
/// * `if_modified_since` - Client-sent If-Modified-Since header
/// * `modified` - File modification time
///
/// # Returns
/// Returns true if the file is unchanged since that date (should return 304)
pub fn is_not_modified(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(header) = if_modified_since else {
        return false;
    };
    let Ok(since) = DateTime::parse_from_rfc2822(header.trim()) else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    modified.timestamp() <= since.timestamp()
}
