use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const GRAPH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const GRAPH_BIRTHDAY_FORMAT: &str = "%m/%d/%Y";

pub fn utc_to_fixed_offset(utc_dt: &DateTime<Utc>) -> DateTime<FixedOffset> {
    utc_dt.fixed_offset()
}

pub fn now_fixed() -> DateTime<FixedOffset> {
    utc_to_fixed_offset(&Utc::now())
}

/// Parses a Graph API timestamp such as `2012-03-04T05:06:07+0000`.
pub fn parse_graph_time(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, GRAPH_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

/// Parses a Graph API birthday (`MM/DD/YYYY`). Partial birthdays such as
/// `MM/DD` or `YYYY` are shared without a full date and yield `None`.
pub fn parse_graph_birthday(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), GRAPH_BIRTHDAY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn test_parse_graph_time() {
        let parsed = parse_graph_time("2012-03-04T05:06:07+0000").unwrap();
        assert_eq!(parsed.year(), 2012);
        assert_eq!(parsed.hour(), 5);
        assert_eq!(parsed.offset().local_minus_utc(), 0);

        assert!(parse_graph_time("2012-03-04T05:06:07+00:00").is_some());
        assert!(parse_graph_time("yesterday").is_none());
    }

    #[test]
    fn test_parse_graph_birthday() {
        assert_eq!(parse_graph_birthday("12/31/1990"), NaiveDate::from_ymd_opt(1990, 12, 31));
        assert_eq!(parse_graph_birthday(" 01/02/2000 "), NaiveDate::from_ymd_opt(2000, 1, 2));
        assert!(parse_graph_birthday("12/31").is_none());
        assert!(parse_graph_birthday("1990").is_none());
        assert!(parse_graph_birthday("31/12/1990").is_none());
    }

    #[test]
    fn test_utc_to_fixed_offset() {
        let now = Utc::now();
        let fixed = utc_to_fixed_offset(&now);

        assert_eq!(fixed.offset().local_minus_utc(), 0);
        assert_eq!(fixed.timestamp(), now.timestamp());
    }
}
