use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day's free-form note. The backend keeps exactly one per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Row id assigned by the backend on first save; `None` until then.
    pub id: Option<i64>,
    pub text: String,
    pub for_date: NaiveDate,
}

impl Note {
    pub fn new(for_date: NaiveDate) -> Self {
        Self {
            id: None,
            text: String::new(),
            for_date,
        }
    }

    /// First non-blank line, used as a one-line preview in the history list.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self
            .text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        if line.chars().count() > max_chars {
            let cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{}…", cut)
        } else {
            line.to_string()
        }
    }
}
