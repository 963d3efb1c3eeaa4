pub mod ai_log;
pub mod note;
pub mod reminder;

use chrono::NaiveDate;

/// Wire format for date keys shared with the backend.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Render a date as the `YYYY-MM-DD` key the backend indexes notes by.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(date_key(date), "2025-06-01");
    }
}
