use serde::{Deserialize, Serialize};

/// An actionable item the backend extracted from a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub note_id: i64,
    pub text: String,
    pub resolved: bool,
    /// Comma-joined tags, e.g. `"errands,home"`.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl Reminder {
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Case-insensitive substring match over the reminder text.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.text.to_lowercase().contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(text: &str, tags: Option<&str>) -> Reminder {
        Reminder {
            id: 1,
            note_id: 1,
            text: text.into(),
            resolved: false,
            tags: tags.map(String::from),
            due_date: None,
        }
    }

    #[test]
    fn tag_list_splits_and_trims() {
        let r = reminder("x", Some("errands, home,,work "));
        assert_eq!(r.tag_list(), vec!["errands", "home", "work"]);
        assert!(reminder("x", None).tag_list().is_empty());
    }

    #[test]
    fn matches_ignores_case() {
        let r = reminder("Call the Dentist", None);
        assert!(r.matches("dentist"));
        assert!(r.matches("CALL"));
        assert!(r.matches(""));
        assert!(!r.matches("plumber"));
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let json = r#"{"id": 3, "note_id": 1, "text": "Pay rent", "resolved": false}"#;
        let r: Reminder = serde_json::from_str(json).unwrap();
        assert_eq!(r.tags, None);
        assert_eq!(r.due_date, None);
    }
}
