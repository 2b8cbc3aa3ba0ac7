use chrono::{Local, NaiveDateTime};

/// Timestamp recorded on new applications, e.g. `3/5/2024, 2:07:09 PM`
pub fn submitted_at_now() -> String {
    format_submitted_at(&Local::now().naive_local())
}

pub fn format_submitted_at(at: &NaiveDateTime) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_submitted_at_afternoon() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();
        assert_eq!(format_submitted_at(&at), "3/5/2024, 2:07:09 PM");
    }

    #[test]
    fn test_format_submitted_at_midnight() {
        let at = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 5)
            .unwrap();
        assert_eq!(format_submitted_at(&at), "12/31/2023, 12:00:05 AM");
    }

    #[test]
    fn test_submitted_at_now_is_not_empty() {
        let stamp = submitted_at_now();
        assert!(stamp.contains(", "));
        assert!(stamp.ends_with("AM") || stamp.ends_with("PM"));
    }

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        // After 2020-01-01, before 2100-01-01
        assert!(ts > 1577836800);
        assert!(ts < 4102444800);
    }
}
