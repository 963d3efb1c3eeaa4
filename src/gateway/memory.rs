use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{Call, Gateway, GatewayError};
use crate::core::ai_log::AiLogEntry;
use crate::core::note::Note;
use crate::core::reminder::Reminder;

/// A reminder the scripted analysis step should produce on the next save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub text: String,
    pub tags: Option<String>,
    pub due_date: Option<String>,
}

impl ReminderDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: None,
            due_date: None,
        }
    }

    pub fn tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn due(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    initialized: bool,
    notes: Vec<Note>,
    reminders: Vec<Reminder>,
    logs: Vec<AiLogEntry>,
    next_id: i64,
    pending_analysis: VecDeque<Vec<ReminderDraft>>,
    latency: HashMap<&'static str, Duration>,
    failures: HashSet<&'static str>,
    calls: Vec<Call>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn upsert_note(&mut self, text: &str, for_date: NaiveDate) -> i64 {
        if let Some(pos) = self.notes.iter().position(|n| n.for_date == for_date) {
            self.notes[pos].text = text.to_string();
            if let Some(id) = self.notes[pos].id {
                return id;
            }
            let id = self.allocate_id();
            self.notes[pos].id = Some(id);
            return id;
        }
        let id = self.allocate_id();
        self.notes.push(Note {
            id: Some(id),
            text: text.to_string(),
            for_date,
        });
        id
    }

    fn add_reminders(&mut self, note_id: i64, drafts: &[ReminderDraft]) {
        for draft in drafts {
            let id = self.allocate_id();
            self.reminders.push(Reminder {
                id,
                note_id,
                text: draft.text.clone(),
                resolved: false,
                tags: draft.tags.clone(),
                due_date: draft.due_date.clone(),
            });
        }
    }

    fn set_resolved(&mut self, command: &'static str, id: i64, resolved: bool) -> Result<(), GatewayError> {
        match self.reminders.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.resolved = resolved;
                Ok(())
            }
            None => Err(not_found(command, "reminder", id)),
        }
    }

    fn reminders_where(&self, resolved: bool) -> Vec<Reminder> {
        self.reminders
            .iter()
            .filter(|r| r.resolved == resolved)
            .cloned()
            .collect()
    }
}

fn not_found(command: &'static str, what: &str, id: i64) -> GatewayError {
    GatewayError::Command {
        command,
        status: 404,
        message: format!("no {} with id {}", what, id),
    }
}

/// In-process backend implementing the full command contract.
///
/// Notes are keyed by date (saving twice for one date updates the same row).
/// Analysis is scripted with [`MemoryGateway::queue_analysis`]; every save
/// records an audit entry. Latency and one-shot failures can be injected per
/// command, and every call is recorded for inspection.
pub struct MemoryGateway {
    today: NaiveDate,
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// A backend whose "today" is the local calendar date.
    pub fn for_local_today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a persisted note and its reminders directly, bypassing analysis.
    pub fn seed_note(&self, for_date: NaiveDate, text: &str, reminders: &[ReminderDraft]) -> i64 {
        let mut state = self.lock();
        let id = state.upsert_note(text, for_date);
        state.add_reminders(id, reminders);
        id
    }

    /// Reminders the next `add_note` analysis will produce. Batches queue up
    /// and are consumed one per save; a save with nothing queued produces none.
    pub fn queue_analysis(&self, drafts: Vec<ReminderDraft>) {
        self.lock().pending_analysis.push_back(drafts);
    }

    pub fn set_latency(&self, command: &'static str, latency: Duration) {
        self.lock().latency.insert(command, latency);
    }

    /// Make the next call to `command` fail once.
    pub fn fail_next(&self, command: &'static str) {
        self.lock().failures.insert(command);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, command: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.command() == command)
            .count()
    }

    #[cfg(test)]
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        self.lock().reminders.clone()
    }

    /// Record the call, apply any injected failure, then wait out the
    /// configured latency.
    async fn enter(&self, call: Call) -> Result<(), GatewayError> {
        let command = call.command();
        let latency = {
            let mut state = self.lock();
            state.calls.push(call);
            if state.failures.remove(command) {
                return Err(GatewayError::Unavailable {
                    command,
                    reason: "injected failure".to_string(),
                });
            }
            state.latency.get(command).copied()
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn init(&self) -> Result<(), GatewayError> {
        self.enter(Call::Init).await?;
        self.lock().initialized = true;
        Ok(())
    }

    async fn current_date(&self) -> Result<NaiveDate, GatewayError> {
        self.enter(Call::CurrentDate).await?;
        Ok(self.today)
    }

    async fn note(&self, date: NaiveDate) -> Result<Note, GatewayError> {
        self.enter(Call::Note(date)).await?;
        let state = self.lock();
        Ok(state
            .notes
            .iter()
            .find(|n| n.for_date == date)
            .cloned()
            .unwrap_or_else(|| Note::new(date)))
    }

    async fn all_notes(&self) -> Result<Vec<Note>, GatewayError> {
        self.enter(Call::AllNotes).await?;
        let mut notes = self.lock().notes.clone();
        notes.sort_by(|a, b| b.for_date.cmp(&a.for_date));
        Ok(notes)
    }

    async fn add_note(&self, text: &str, for_date: NaiveDate) -> Result<i64, GatewayError> {
        self.enter(Call::AddNote {
            text: text.to_string(),
            for_date,
        })
        .await?;

        let mut state = self.lock();
        let note_id = state.upsert_note(text, for_date);
        let drafts = state.pending_analysis.pop_front().unwrap_or_default();
        state.add_reminders(note_id, &drafts);

        let response = drafts
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let log_id = state.allocate_id();
        state.logs.push(AiLogEntry {
            id: log_id,
            note_id,
            prompt: text.to_string(),
            response,
            success: true,
            reasoning: format!("{} reminder(s) extracted", drafts.len()),
            reminders_created: drafts.len() as u32,
            created_at: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        });
        Ok(note_id)
    }

    async fn unresolved_reminders(&self) -> Result<Vec<Reminder>, GatewayError> {
        self.enter(Call::UnresolvedReminders).await?;
        Ok(self.lock().reminders_where(false))
    }

    async fn resolved_reminders(&self) -> Result<Vec<Reminder>, GatewayError> {
        self.enter(Call::ResolvedReminders).await?;
        Ok(self.lock().reminders_where(true))
    }

    async fn resolve_reminder(&self, id: i64) -> Result<(), GatewayError> {
        self.enter(Call::ResolveReminder(id)).await?;
        self.lock().set_resolved("resolve_reminder", id, true)
    }

    async fn unresolve_reminder(&self, id: i64) -> Result<(), GatewayError> {
        self.enter(Call::UnresolveReminder(id)).await?;
        self.lock().set_resolved("unresolve_reminder", id, false)
    }

    async fn delete_reminder(&self, id: i64) -> Result<(), GatewayError> {
        self.enter(Call::DeleteReminder(id)).await?;
        let mut state = self.lock();
        let before = state.reminders.len();
        state.reminders.retain(|r| r.id != id);
        if state.reminders.len() == before {
            return Err(not_found("delete_reminder", "reminder", id));
        }
        Ok(())
    }

    async fn ai_logs(&self) -> Result<Vec<AiLogEntry>, GatewayError> {
        self.enter(Call::AiLogs).await?;
        let mut logs = self.lock().logs.clone();
        logs.reverse();
        Ok(logs)
    }

    async fn delete_ai_log(&self, id: i64) -> Result<(), GatewayError> {
        self.enter(Call::DeleteAiLog(id)).await?;
        let mut state = self.lock();
        let before = state.logs.len();
        state.logs.retain(|l| l.id != id);
        if state.logs.len() == before {
            return Err(not_found("delete_ai_log", "log entry", id));
        }
        Ok(())
    }

    async fn delete_all_ai_logs(&self) -> Result<(), GatewayError> {
        self.enter(Call::DeleteAllAiLogs).await?;
        self.lock().logs.clear();
        Ok(())
    }

    async fn print_all_tables(&self) -> Result<(), GatewayError> {
        self.enter(Call::PrintAllTables).await?;
        let state = self.lock();
        for note in &state.notes {
            log::info!("notes: {:?}", note);
        }
        for reminder in &state.reminders {
            log::info!("reminders: {:?}", reminder);
        }
        for entry in &state.logs {
            log::info!("ai_logs: {:?}", entry);
        }
        Ok(())
    }

    async fn test_integration(&self) -> Result<String, GatewayError> {
        self.enter(Call::TestIntegration).await?;
        let state = self.lock();
        Ok(format!(
            "memory backend (initialized: {}): {} notes, {} reminders, {} ai logs",
            state.initialized,
            state.notes.len(),
            state.reminders.len(),
            state.logs.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn saving_twice_for_one_date_keeps_one_row() {
        let gw = MemoryGateway::new(day(1));
        let first = gw.add_note("Buy milk", day(1)).await.unwrap();
        let second = gw.add_note("Buy milk and eggs", day(1)).await.unwrap();
        assert_eq!(first, second);

        let notes = gw.all_notes().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "Buy milk and eggs");
    }

    #[tokio::test]
    async fn queued_analysis_creates_reminders_and_a_log() {
        let gw = MemoryGateway::new(day(1));
        gw.queue_analysis(vec![ReminderDraft::new("Buy milk").tags("errands")]);
        let note_id = gw.add_note("Buy milk", day(1)).await.unwrap();

        let unresolved = gw.unresolved_reminders().await.unwrap();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].note_id, note_id);
        assert_eq!(unresolved[0].tags.as_deref(), Some("errands"));

        let logs = gw.ai_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].reminders_created, 1);
        assert_eq!(logs[0].prompt, "Buy milk");
    }

    #[tokio::test]
    async fn resolve_moves_between_partitions() {
        let gw = MemoryGateway::new(day(1));
        gw.seed_note(day(1), "x", &[ReminderDraft::new("a"), ReminderDraft::new("b")]);
        let id = gw.unresolved_reminders().await.unwrap()[0].id;

        gw.resolve_reminder(id).await.unwrap();
        assert_eq!(gw.unresolved_reminders().await.unwrap().len(), 1);
        assert_eq!(gw.resolved_reminders().await.unwrap()[0].id, id);

        gw.unresolve_reminder(id).await.unwrap();
        assert_eq!(gw.unresolved_reminders().await.unwrap().len(), 2);
        assert!(gw.resolved_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_note_date_yields_empty_note() {
        let gw = MemoryGateway::new(day(1));
        let note = gw.note(day(2)).await.unwrap();
        assert_eq!(note, Note::new(day(2)));
    }

    #[tokio::test]
    async fn injected_failure_fires_once_and_is_recorded() {
        let gw = MemoryGateway::new(day(1));
        gw.fail_next("get_all_ai_logs");
        assert!(gw.ai_logs().await.is_err());
        assert!(gw.ai_logs().await.is_ok());
        assert_eq!(gw.count_calls("get_all_ai_logs"), 2);
    }

    #[tokio::test]
    async fn deleting_missing_rows_is_rejected() {
        let gw = MemoryGateway::new(day(1));
        let err = gw.delete_reminder(99).await.unwrap_err();
        assert!(matches!(err, GatewayError::Command { status: 404, .. }));
        assert!(gw.delete_ai_log(99).await.is_err());
    }
}
