use chrono::NaiveDate;

use crate::core::ai_log::AiLogEntry;
use crate::core::note::Note;
use crate::core::reminder::Reminder;
use crate::gateway::GatewayError;
use crate::navigation::KeyPress;

#[derive(Debug)]
pub enum Message {
    // Keyboard
    Key(KeyPress),

    // Navigation
    SwitchView(View),

    // Lifecycle
    Reload,
    BackendReady {
        reload: bool,
        result: Result<(), GatewayError>,
    },

    // Save round trip (note store + reminder store)
    NoteSaved {
        baseline: usize,
        result: Result<SaveOutcome, GatewayError>,
    },

    Note(NoteMessage),
    Reminder(ReminderMessage),
    AiLog(AiLogMessage),
}

#[derive(Debug)]
pub enum NoteMessage {
    Edited(String),
    SaveNow,
    DebounceElapsed(u64),
    AnalyzingElapsed(u64),
    StatusClearElapsed(u64),
    DateLoaded(Result<NaiveDate, GatewayError>),
    /// `edits` is the edit generation when the request was issued.
    TodayLoaded {
        edits: u64,
        result: Result<Note, GatewayError>,
    },
    HistoryLoaded(Result<Vec<Note>, GatewayError>),
}

#[derive(Debug)]
pub enum ReminderMessage {
    UnresolvedLoaded(Result<Fetched, GatewayError>),
    ResolvedLoaded(Result<Fetched, GatewayError>),
    ToggleResolved,
    SearchChanged(String),
    Resolve(i64),
    Unresolve(i64),
    Delete { id: i64, resolved: bool },
    Refreshed(Result<Refresh, GatewayError>),
}

#[derive(Debug)]
pub enum AiLogMessage {
    Loaded(Result<Vec<AiLogEntry>, GatewayError>),
    Delete(i64),
    DeleteAll,
    AllDeleted(Result<(), GatewayError>),
}

/// What a completed save round trip reports back.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub note_id: i64,
    /// Unresolved reminders fetched right after the save, including any the
    /// analysis just created.
    pub unresolved: Fetched,
}

/// A reminder list snapshot tagged with the order its fetch started in.
/// A snapshot whose ticket is older than the one on screen is dropped.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub ticket: u64,
    pub reminders: Vec<Reminder>,
}

/// Canonical reminder snapshots fetched after a mutation.
#[derive(Debug, Clone)]
pub struct Refresh {
    pub unresolved: Fetched,
    /// `None` when the resolved list was hidden at the time of the fetch.
    pub resolved: Option<Fetched>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Today,
    History,
    Reminders,
    AiLogs,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::History => "History",
            Self::Reminders => "Reminders",
            Self::AiLogs => "AI Logs",
        }
    }

    pub const ALL: &'static [View] = &[View::Today, View::History, View::Reminders, View::AiLogs];
}
