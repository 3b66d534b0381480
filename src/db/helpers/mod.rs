use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Fixed-width RFC 3339 so that TEXT ordering in SQLite matches time ordering.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision the database keeps.
pub fn storage_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_datetimes_sort_chronologically() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let later = whole + chrono::TimeDelta::milliseconds(250);
        assert!(format_datetime(&whole) < format_datetime(&later));
        assert_eq!(format_datetime(&whole), "2024-01-01T10:00:00.000000Z");
    }

    #[test]
    fn parse_reads_back_formatted_values() {
        let original = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let parsed = parse_datetime(&format_datetime(&original), "created_at").unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_names_the_field_on_failure() {
        let err = parse_datetime("not a date", "expiration").unwrap_err();
        assert!(err.to_string().contains("expiration"));
    }
}
