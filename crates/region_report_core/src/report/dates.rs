use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

const ZONED_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";
const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];

/// `YYYY-MM-DD HH:mm:ss <abbrev>` in `timezone`, with the abbreviation taken
/// from the tz database so daylight-saving transitions are tracked.
pub fn format_zoned_timestamp(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant
        .with_timezone(&timezone)
        .format(ZONED_FORMAT)
        .to_string()
}

/// RFC 3339, or a naive date-time taken as UTC.
pub fn parse_source_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Zoned rendering of a source timestamp; unparseable input passes through.
pub fn format_source_timestamp(raw: &str, timezone: Tz) -> String {
    parse_source_timestamp(raw)
        .map(|instant| format_zoned_timestamp(instant, timezone))
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchDate {
    Parsed(NaiveDate),
    /// Present but not recognized as a date.
    Unparsed(String),
    Missing,
}

impl LaunchDate {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::Missing;
        };

        if let Some(instant) = parse_source_timestamp(raw) {
            return Self::Parsed(instant.date_naive());
        }

        NAIVE_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .map_or_else(|| Self::Unparsed(raw.to_string()), Self::Parsed)
    }
}

pub fn format_launch_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn zoned_timestamp_tracks_daylight_saving() {
        let summer = Utc.with_ymd_and_hms(2026, 7, 1, 16, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2026, 1, 15, 16, 30, 5).unwrap();

        assert_eq!(
            format_zoned_timestamp(summer, DEFAULT_TIMEZONE),
            "2026-07-01 12:00:00 EDT"
        );
        assert_eq!(
            format_zoned_timestamp(winter, DEFAULT_TIMEZONE),
            "2026-01-15 11:30:05 EST"
        );
    }

    #[test]
    fn source_timestamp_accepts_offsets_and_naive_values() {
        assert_eq!(
            format_source_timestamp("2026-03-10T05:00:00+00:00", DEFAULT_TIMEZONE),
            "2026-03-10 01:00:00 EDT"
        );
        assert_eq!(
            format_source_timestamp("2026-02-01T12:00:00", chrono_tz::UTC),
            "2026-02-01 12:00:00 UTC"
        );
        assert_eq!(
            format_source_timestamp("last tuesday", DEFAULT_TIMEZONE),
            "last tuesday"
        );
    }

    #[test]
    fn launch_dates_parse_or_pass_through() {
        let expected = NaiveDate::from_ymd_opt(2006, 8, 25).unwrap();
        assert_eq!(
            LaunchDate::parse(Some("2006-08-25")),
            LaunchDate::Parsed(expected)
        );
        assert_eq!(
            LaunchDate::parse(Some("2006-08-25T00:00:00Z")),
            LaunchDate::Parsed(expected)
        );
        assert_eq!(
            LaunchDate::parse(Some("sometime in 2006")),
            LaunchDate::Unparsed("sometime in 2006".to_string())
        );
        assert_eq!(LaunchDate::parse(Some("  ")), LaunchDate::Missing);
        assert_eq!(LaunchDate::parse(None), LaunchDate::Missing);
        assert_eq!(format_launch_date(expected), "2006-08-25");
    }
}
