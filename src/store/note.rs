//! Today's note: debounced autosave, immediate save, and the status lifecycle.
//!
//! Status moves `None → Saving → (Analyzing) → outcome → None`:
//!
//! | Entering  | debounce            | analyzing  | status clear |
//! |-----------|---------------------|------------|--------------|
//! | `Saving`  | canceled / consumed | re-armed   | canceled     |
//! | outcome   | untouched           | expires    | re-armed     |
//! | `None`    | untouched           | expires    | canceled     |
//!
//! An analyzing timer that expires after its save resolved finds the status
//! no longer `Saving` and does nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::core::note::Note;
use crate::gateway::{Gateway, GatewayError};
use crate::message::{Fetched, Message, NoteMessage, SaveOutcome};
use crate::store::reminder::FetchOrder;
use crate::task::Task;
use crate::timer::TimerSlot;

/// Quiet period after the last keystroke before the note is saved.
pub const DEBOUNCE: Duration = Duration::from_millis(30_000);
/// How long a save may run before the status switches to "analyzing".
pub const ANALYZING_DELAY: Duration = Duration::from_millis(300);
/// How long an outcome status stays visible.
pub const STATUS_CLEAR: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    None,
    Saving,
    Analyzing,
    AnalysisSucceeded(u32),
    AnalysisNoOp,
}

/// The single app-wide save/analysis status. Replaced wholesale on every
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub kind: StatusKind,
    pub message: Option<String>,
}

impl Status {
    fn saving() -> Self {
        Self {
            kind: StatusKind::Saving,
            message: Some("Saving…".to_string()),
        }
    }

    fn analyzing() -> Self {
        Self {
            kind: StatusKind::Analyzing,
            message: Some("Analyzing note…".to_string()),
        }
    }

    fn succeeded(count: u32) -> Self {
        let noun = if count == 1 { "reminder" } else { "reminders" };
        Self {
            kind: StatusKind::AnalysisSucceeded(count),
            message: Some(format!("Saved · {} new {}", count, noun)),
        }
    }

    fn no_op() -> Self {
        Self {
            kind: StatusKind::AnalysisNoOp,
            message: Some("Saved · no new reminders".to_string()),
        }
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.kind == StatusKind::None
    }

    /// Whether a save is still in flight from the user's point of view.
    pub fn is_busy(&self) -> bool {
        matches!(self.kind, StatusKind::Saving | StatusKind::Analyzing)
    }
}

pub struct NoteStore {
    gateway: Arc<dyn Gateway>,
    fetches: FetchOrder,
    /// Pinned on the first successful date load; edits always target it.
    date: Option<NaiveDate>,
    note_id: Option<i64>,
    text: String,
    /// Bumped on every edit. A fetched note from an older generation never
    /// replaces local text.
    edits: u64,
    history: Vec<Note>,
    status: Status,
    debounce: TimerSlot,
    analyzing: TimerSlot,
    status_clear: TimerSlot,
}

impl NoteStore {
    pub fn new(gateway: Arc<dyn Gateway>, fetches: FetchOrder) -> Self {
        Self {
            gateway,
            fetches,
            date: None,
            note_id: None,
            text: String::new(),
            edits: 0,
            history: Vec::new(),
            status: Status::default(),
            debounce: TimerSlot::new(),
            analyzing: TimerSlot::new(),
            status_clear: TimerSlot::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn note_id(&self) -> Option<i64> {
        self.note_id
    }

    pub fn history(&self) -> &[Note] {
        &self.history
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Whether keystrokes are waiting on the debounce timer.
    pub fn has_unsaved_edits(&self) -> bool {
        self.debounce.is_pending()
    }

    /// `unresolved_now` is the reminder store's current unresolved count, used
    /// as the baseline if this message starts a save.
    pub fn update(&mut self, message: NoteMessage, unresolved_now: usize) -> Task<Message> {
        match message {
            NoteMessage::Edited(text) => {
                self.text = text;
                self.edits += 1;
                return self
                    .debounce
                    .arm(DEBOUNCE, |t| Message::Note(NoteMessage::DebounceElapsed(t)));
            }

            NoteMessage::SaveNow => {
                return self.save_now(unresolved_now);
            }

            NoteMessage::DebounceElapsed(token) => {
                if self.debounce.fire(token) {
                    return self.begin_save(unresolved_now);
                }
            }

            NoteMessage::AnalyzingElapsed(token) => {
                if self.analyzing.fire(token) && self.status.kind == StatusKind::Saving {
                    self.status = Status::analyzing();
                }
            }

            NoteMessage::StatusClearElapsed(token) => {
                if self.status_clear.fire(token) {
                    self.status = Status::default();
                }
            }

            NoteMessage::DateLoaded(result) => match result {
                Ok(date) => {
                    match self.date {
                        None => self.date = Some(date),
                        Some(pinned) if pinned != date => {
                            log::debug!("Keeping pinned date {} (backend now reports {})", pinned, date);
                        }
                        Some(_) => {}
                    }
                    return self.load_today();
                }
                Err(e) => {
                    log::error!("Failed to load current date: {}", e);
                }
            },

            NoteMessage::TodayLoaded { edits, result } => match result {
                Ok(note) => {
                    if Some(note.for_date) != self.date {
                        log::debug!("Ignoring note for {}: not the pinned date", note.for_date);
                    } else if edits != self.edits || self.debounce.is_pending() {
                        // Keystrokes since the request went out win over the stored copy.
                        log::debug!("Keeping local edits over fetched note for {}", note.for_date);
                        self.note_id = note.id.or(self.note_id);
                    } else {
                        self.note_id = note.id;
                        self.text = note.text;
                    }
                }
                Err(e) => {
                    log::error!("Failed to load today's note: {}", e);
                }
            },

            NoteMessage::HistoryLoaded(result) => match result {
                Ok(notes) => {
                    self.history = notes;
                }
                Err(e) => {
                    log::error!("Failed to load note history: {}", e);
                }
            },
        }
        Task::none()
    }

    /// Cancel the pending debounce and save whatever text is held, even if empty.
    pub fn save_now(&mut self, baseline: usize) -> Task<Message> {
        self.debounce.cancel();
        self.begin_save(baseline)
    }

    fn begin_save(&mut self, baseline: usize) -> Task<Message> {
        let Some(date) = self.date else {
            log::debug!("Save skipped: today's date is not known yet");
            return Task::none();
        };

        self.status_clear.cancel();
        self.status = Status::saving();
        let analyzing = self
            .analyzing
            .arm(ANALYZING_DELAY, |t| Message::Note(NoteMessage::AnalyzingElapsed(t)));

        log::debug!("Saving note for {} ({} chars)", date, self.text.chars().count());
        let gateway = self.gateway.clone();
        let fetches = self.fetches.clone();
        let text = self.text.clone();
        let save = Task::perform(
            async move {
                let note_id = gateway.add_note(&text, date).await?;
                let unresolved = fetches.unresolved(gateway.as_ref()).await?;
                Ok(SaveOutcome {
                    note_id,
                    unresolved,
                })
            },
            move |result| Message::NoteSaved { baseline, result },
        );

        Task::batch([save, analyzing])
    }

    /// Apply a finished save. On success returns the refreshed unresolved list
    /// for the reminder store.
    pub fn saved(
        &mut self,
        baseline: usize,
        result: Result<SaveOutcome, GatewayError>,
    ) -> (Task<Message>, Option<Fetched>) {
        match result {
            Ok(outcome) => {
                self.note_id = Some(outcome.note_id);
                let after = outcome.unresolved.reminders.len();
                self.status = if after > baseline {
                    Status::succeeded((after - baseline) as u32)
                } else {
                    Status::no_op()
                };
                log::info!("Note saved: {:?}", self.status.kind);
                let clear = self
                    .status_clear
                    .arm(STATUS_CLEAR, |t| Message::Note(NoteMessage::StatusClearElapsed(t)));
                (clear, Some(outcome.unresolved))
            }
            Err(e) => {
                log::error!("Failed to save note: {}", e);
                self.status_clear.cancel();
                self.status = Status::default();
                (Task::none(), None)
            }
        }
    }

    /// Fetch the backend's current date, then today's note.
    pub fn load_date(&self) -> Task<Message> {
        let gateway = self.gateway.clone();
        Task::perform(async move { gateway.current_date().await }, |result| {
            Message::Note(NoteMessage::DateLoaded(result))
        })
    }

    /// Fetch the note for the pinned date, resolving the date first if needed.
    pub fn load_today(&self) -> Task<Message> {
        let Some(date) = self.date else {
            return self.load_date();
        };
        let gateway = self.gateway.clone();
        let edits = self.edits;
        Task::perform(async move { gateway.note(date).await }, move |result| {
            Message::Note(NoteMessage::TodayLoaded { edits, result })
        })
    }

    pub fn load_history(&self) -> Task<Message> {
        let gateway = self.gateway.clone();
        Task::perform(async move { gateway.all_notes().await }, |result| {
            Message::Note(NoteMessage::HistoryLoaded(result))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reminder::Reminder;
    use crate::gateway::MemoryGateway;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn store() -> NoteStore {
        NoteStore::new(Arc::new(MemoryGateway::new(day())), FetchOrder::default())
    }

    fn store_with_date() -> NoteStore {
        let mut store = store();
        let _ = store.update(NoteMessage::DateLoaded(Ok(day())), 0);
        store
    }

    fn outcome(unresolved: usize) -> SaveOutcome {
        let reminders = (0..unresolved)
            .map(|i| Reminder {
                id: i as i64 + 1,
                note_id: 1,
                text: format!("r{}", i),
                resolved: false,
                tags: None,
                due_date: None,
            })
            .collect();
        SaveOutcome {
            note_id: 1,
            unresolved: Fetched {
                ticket: 1,
                reminders,
            },
        }
    }

    #[test]
    fn stale_debounce_token_does_not_save() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::Edited("B".into()), 0);
        let stale = store.debounce.current().unwrap();
        let _ = store.update(NoteMessage::Edited("Bu".into()), 0);
        let live = store.debounce.current().unwrap();

        let task = store.update(NoteMessage::DebounceElapsed(stale), 0);
        assert!(task.is_none());
        assert!(store.status().is_idle());

        let task = store.update(NoteMessage::DebounceElapsed(live), 0);
        assert_eq!(task.len(), 2);
        assert_eq!(store.status().kind, StatusKind::Saving);
    }

    #[test]
    fn save_without_date_is_skipped() {
        let mut store = store();
        let task = store.update(NoteMessage::SaveNow, 0);
        assert!(task.is_none());
        assert!(store.status().is_idle());
    }

    #[test]
    fn save_now_cancels_debounce_and_saves_empty_text() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::Edited(String::new()), 0);
        assert!(store.has_unsaved_edits());
        let task = store.update(NoteMessage::SaveNow, 0);
        assert!(!store.has_unsaved_edits());
        assert!(!task.is_none());
        assert_eq!(store.status().kind, StatusKind::Saving);
    }

    #[test]
    fn analyzing_only_while_saving() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::SaveNow, 0);
        let token = store.analyzing.current().unwrap();
        let _ = store.update(NoteMessage::AnalyzingElapsed(token), 0);
        assert_eq!(store.status().kind, StatusKind::Analyzing);

        // A save that resolved first leaves the outcome in place.
        let _ = store.update(NoteMessage::SaveNow, 0);
        let token = store.analyzing.current().unwrap();
        let _ = store.saved(0, Ok(outcome(0)));
        let _ = store.update(NoteMessage::AnalyzingElapsed(token), 0);
        assert_eq!(store.status().kind, StatusKind::AnalysisNoOp);
    }

    #[test]
    fn outcome_reflects_reminder_delta() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::SaveNow, 2);
        let (_, refreshed) = store.saved(2, Ok(outcome(5)));
        assert_eq!(store.status().kind, StatusKind::AnalysisSucceeded(3));
        assert_eq!(refreshed.map(|r| r.reminders.len()), Some(5));
        assert_eq!(store.note_id(), Some(1));

        let _ = store.update(NoteMessage::SaveNow, 5);
        let _ = store.saved(5, Ok(outcome(4)));
        assert_eq!(store.status().kind, StatusKind::AnalysisNoOp);
    }

    #[test]
    fn failure_resets_status_immediately() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::SaveNow, 0);
        let (task, refreshed) = store.saved(
            0,
            Err(GatewayError::Unavailable {
                command: "add_note",
                reason: "down".into(),
            }),
        );
        assert!(task.is_none());
        assert!(refreshed.is_none());
        assert!(store.status().is_idle());
    }

    #[test]
    fn new_save_cancels_pending_status_clear() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::SaveNow, 0);
        let _ = store.saved(0, Ok(outcome(1)));
        let clear = store.status_clear.current().unwrap();

        let _ = store.update(NoteMessage::SaveNow, 1);
        let _ = store.update(NoteMessage::StatusClearElapsed(clear), 1);
        assert_eq!(store.status().kind, StatusKind::Saving);
    }

    #[test]
    fn date_is_pinned_once() {
        let mut store = store_with_date();
        let later = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let _ = store.update(NoteMessage::DateLoaded(Ok(later)), 0);
        assert_eq!(store.date(), Some(day()));
    }

    fn stored(text: &str) -> Note {
        Note {
            id: Some(9),
            text: text.into(),
            for_date: day(),
        }
    }

    #[test]
    fn fetched_note_does_not_clobber_unsaved_edits() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::Edited("typing".into()), 0);
        let edits = store.edits;
        let _ = store.update(
            NoteMessage::TodayLoaded {
                edits,
                result: Ok(stored("stored")),
            },
            0,
        );
        assert_eq!(store.text(), "typing");
        assert_eq!(store.note_id(), Some(9));
    }

    #[test]
    fn fetch_issued_before_edits_loses_after_immediate_save() {
        let mut store = store_with_date();
        let issued_at = store.edits;
        let _ = store.update(NoteMessage::Edited("typing".into()), 0);
        let _ = store.update(NoteMessage::SaveNow, 0);
        assert!(!store.has_unsaved_edits());

        let _ = store.update(
            NoteMessage::TodayLoaded {
                edits: issued_at,
                result: Ok(stored("stored")),
            },
            0,
        );
        assert_eq!(store.text(), "typing");
    }

    #[test]
    fn fetch_issued_after_edits_applies() {
        let mut store = store_with_date();
        let _ = store.update(NoteMessage::Edited("typing".into()), 0);
        let _ = store.update(NoteMessage::SaveNow, 0);
        let edits = store.edits;
        let _ = store.update(
            NoteMessage::TodayLoaded {
                edits,
                result: Ok(stored("typing, saved")),
            },
            0,
        );
        assert_eq!(store.text(), "typing, saved");
    }

    #[test]
    fn note_for_other_date_is_ignored() {
        let mut store = store_with_date();
        let other = Note {
            id: Some(3),
            text: "yesterday".into(),
            for_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
        };
        let _ = store.update(
            NoteMessage::TodayLoaded {
                edits: 0,
                result: Ok(other),
            },
            0,
        );
        assert_eq!(store.text(), "");
        assert_eq!(store.note_id(), None);
    }
}
