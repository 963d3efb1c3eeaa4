use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Audit record of one analysis attempt, written by the backend per save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLogEntry {
    pub id: i64,
    pub note_id: i64,
    pub prompt: String,
    pub response: String,
    pub success: bool,
    #[serde(default)]
    pub reasoning: String,
    pub reminders_created: u32,
    pub created_at: String,
}

impl AiLogEntry {
    /// Parse the backend timestamp (`YYYY-MM-DD HH:MM:SS`, optionally ISO `T`-separated).
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}
