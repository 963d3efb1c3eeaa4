//! Typed façade over the backend's request/response command interface.
//!
//! Every backend capability is one async method on [`Gateway`]. Implementations
//! perform no retries and no interpretation: a failure comes back as a
//! [`GatewayError`] exactly as the transport or backend reported it.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::core::ai_log::AiLogEntry;
use crate::core::date_key;
use crate::core::note::Note;
use crate::core::reminder::Reminder;

pub use http::HttpGateway;
pub use memory::{MemoryGateway, ReminderDraft};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request for `{command}` failed: {source}")]
    Transport {
        command: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend rejected `{command}` ({status}): {message}")]
    Command {
        command: &'static str,
        status: u16,
        message: String,
    },
    #[error("unexpected `{command}` payload: {source}")]
    Decode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("backend unavailable for `{command}`: {reason}")]
    Unavailable {
        command: &'static str,
        reason: String,
    },
}

/// One backend invocation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init,
    CurrentDate,
    Note(NaiveDate),
    AllNotes,
    AddNote { text: String, for_date: NaiveDate },
    UnresolvedReminders,
    ResolvedReminders,
    ResolveReminder(i64),
    UnresolveReminder(i64),
    DeleteReminder(i64),
    AiLogs,
    DeleteAiLog(i64),
    DeleteAllAiLogs,
    PrintAllTables,
    TestIntegration,
}

impl Call {
    /// Backend command name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CurrentDate => "get_current_date",
            Self::Note(_) => "get_note",
            Self::AllNotes => "get_all_notes",
            Self::AddNote { .. } => "add_note",
            Self::UnresolvedReminders => "get_unresolved_reminders",
            Self::ResolvedReminders => "get_resolved_reminders",
            Self::ResolveReminder(_) => "resolve_reminder",
            Self::UnresolveReminder(_) => "unresolve_reminder",
            Self::DeleteReminder(_) => "delete_reminder",
            Self::AiLogs => "get_all_ai_logs",
            Self::DeleteAiLog(_) => "delete_ai_log",
            Self::DeleteAllAiLogs => "delete_all_ai_logs",
            Self::PrintAllTables => "print_all_tables",
            Self::TestIntegration => "test_integration",
        }
    }

    /// Named arguments as sent over the wire.
    pub fn args(&self) -> serde_json::Value {
        match self {
            Self::Note(date) => json!({ "date": date_key(*date) }),
            Self::AddNote { text, for_date } => {
                json!({ "text": text, "forDate": date_key(*for_date) })
            }
            Self::ResolveReminder(id)
            | Self::UnresolveReminder(id)
            | Self::DeleteReminder(id)
            | Self::DeleteAiLog(id) => json!({ "id": id }),
            _ => json!({}),
        }
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn init(&self) -> Result<(), GatewayError>;

    async fn current_date(&self) -> Result<NaiveDate, GatewayError>;

    async fn note(&self, date: NaiveDate) -> Result<Note, GatewayError>;

    async fn all_notes(&self) -> Result<Vec<Note>, GatewayError>;

    /// Persist `text` as the note for `for_date` and run analysis on it.
    /// Returns the note's row id (new or existing).
    async fn add_note(&self, text: &str, for_date: NaiveDate) -> Result<i64, GatewayError>;

    async fn unresolved_reminders(&self) -> Result<Vec<Reminder>, GatewayError>;

    async fn resolved_reminders(&self) -> Result<Vec<Reminder>, GatewayError>;

    async fn resolve_reminder(&self, id: i64) -> Result<(), GatewayError>;

    async fn unresolve_reminder(&self, id: i64) -> Result<(), GatewayError>;

    async fn delete_reminder(&self, id: i64) -> Result<(), GatewayError>;

    async fn ai_logs(&self) -> Result<Vec<AiLogEntry>, GatewayError>;

    async fn delete_ai_log(&self, id: i64) -> Result<(), GatewayError>;

    async fn delete_all_ai_logs(&self) -> Result<(), GatewayError>;

    /// Diagnostic: ask the backend to dump its tables to its own log.
    async fn print_all_tables(&self) -> Result<(), GatewayError>;

    /// Diagnostic: round-trip check returning a human-readable report.
    async fn test_integration(&self) -> Result<String, GatewayError>;
}
