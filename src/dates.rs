use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Daily summary key (`YYYY-MM-DD`)
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Weekly summary key (`YYYY-Www`, ISO week numbering)
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Check if a date falls on a workday (Monday through Friday)
pub fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday and Sunday of the week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

/// Human-readable date range for a weekly report
pub fn week_range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} to {}", date_key(start), date_key(end))
}

/// Parse a configured day-of-week name, falling back to Thursday
pub fn parse_weekday(day: &str) -> Weekday {
    day.parse().unwrap_or(Weekday::Thu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_key() {
        assert_eq!(date_key(date(2024, 6, 4)), "2024-06-04");
    }

    #[test]
    fn test_iso_week_key() {
        assert_eq!(iso_week_key(date(2024, 6, 3)), "2024-W23");
        assert_eq!(iso_week_key(date(2024, 1, 1)), "2024-W01");
        // 2023-01-01 belongs to ISO week 52 of 2022
        assert_eq!(iso_week_key(date(2023, 1, 1)), "2022-W52");
    }

    #[test]
    fn test_is_workday() {
        assert!(is_workday(date(2024, 6, 3))); // Monday
        assert!(is_workday(date(2024, 6, 7))); // Friday
        assert!(!is_workday(date(2024, 6, 8))); // Saturday
        assert!(!is_workday(date(2024, 6, 9))); // Sunday
    }

    #[test]
    fn test_week_bounds() {
        let (monday, sunday) = week_bounds(date(2024, 6, 5));
        assert_eq!(monday, date(2024, 6, 3));
        assert_eq!(sunday, date(2024, 6, 9));

        // Already Monday
        let (monday, sunday) = week_bounds(date(2024, 6, 3));
        assert_eq!(monday, date(2024, 6, 3));
        assert_eq!(sunday, date(2024, 6, 9));
    }

    #[test]
    fn test_week_range_label() {
        assert_eq!(
            week_range_label(date(2024, 6, 3), date(2024, 6, 9)),
            "2024-06-03 to 2024-06-09"
        );
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("monday"), Weekday::Mon);
        assert_eq!(parse_weekday("FRI"), Weekday::Fri);
        assert_eq!(parse_weekday("not-a-day"), Weekday::Thu);
    }
}
