//! The fixed date-time format shared by descriptor files and the query API.
//!
//! Timestamps are naive (`YYYY-MM-DDTHH:MM:SS`, no offset, no fraction).
//! The server interprets them as UTC.

use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// `YYYY-MM-DDTHH:MM:SS`
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

time::serde::format_description!(
    pub serde_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);

/// Parse a timestamp in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(input: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(input, TIMESTAMP_FORMAT)
}

/// Format a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: PrimitiveDateTime) -> Result<String, time::error::Format> {
    ts.format(TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_and_format() {
        let ts = parse_timestamp("2024-01-01T01:30:05").unwrap();
        assert_eq!(ts, datetime!(2024-01-01 01:30:05));
        assert_eq!(format_timestamp(ts).unwrap(), "2024-01-01T01:30:05");
    }

    #[test]
    fn test_rejects_other_layouts() {
        assert!(parse_timestamp("2024-01-01 01:30:05").is_err());
        assert!(parse_timestamp("2024-01-01T01:30").is_err());
        assert!(parse_timestamp("2024-01-01T01:30:05Z").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
