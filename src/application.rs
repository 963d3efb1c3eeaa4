use std::sync::Arc;

use crate::core::reminder::Reminder;
use crate::gateway::Gateway;
use crate::message::{Message, ReminderMessage, View};
use crate::navigation::{Action, Focus, KeyPress, Navigation};
use crate::store::{AiLogStore, NoteStore, ReminderStore, Status};
use crate::task::Task;

/// Composition root: owns every store plus navigation, and routes messages.
pub struct App {
    gateway: Arc<dyn Gateway>,
    note: NoteStore,
    reminders: ReminderStore,
    ai_logs: AiLogStore,
    nav: Navigation,
}

impl App {
    /// Build the app and the task that initializes the backend and performs
    /// the first load.
    pub fn new(gateway: Arc<dyn Gateway>) -> (Self, Task<Message>) {
        let reminders = ReminderStore::new(gateway.clone());
        let app = Self {
            note: NoteStore::new(gateway.clone(), reminders.fetch_order()),
            reminders,
            ai_logs: AiLogStore::new(gateway.clone()),
            nav: Navigation::new(),
            gateway,
        };
        let init = app.init_backend(false);
        (app, init)
    }

    pub fn view(&self) -> View {
        self.nav.view()
    }

    pub fn selection(&self) -> Option<usize> {
        self.nav.selection()
    }

    pub fn selected_reminder(&self) -> Option<&Reminder> {
        self.nav
            .selection()
            .and_then(|i| self.reminders.unresolved().get(i))
    }

    pub fn status(&self) -> &Status {
        self.note.status()
    }

    pub fn focus(&self) -> Focus {
        self.nav.focus(self.note.text())
    }

    pub fn note(&self) -> &NoteStore {
        &self.note
    }

    pub fn reminders(&self) -> &ReminderStore {
        &self.reminders
    }

    pub fn ai_logs(&self) -> &AiLogStore {
        &self.ai_logs
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Key(press) => {
                return self.handle_key(press);
            }

            Message::SwitchView(view) => {
                return self.switch_view(view);
            }

            Message::Reload => {
                log::info!("Reloading all data");
                return self.init_backend(true);
            }

            Message::BackendReady { reload, result } => {
                if let Err(e) = result {
                    log::error!("Backend init failed: {}", e);
                }
                return self.load_all(reload);
            }

            Message::NoteSaved { baseline, result } => {
                let (task, unresolved) = self.note.saved(baseline, result);
                if let Some(unresolved) = unresolved {
                    if self.reminders.replace_unresolved(unresolved) {
                        self.reclamp_selection();
                    }
                }
                return task;
            }

            Message::Note(message) => {
                let unresolved_now = self.reminders.unresolved().len();
                return self.note.update(message, unresolved_now);
            }

            Message::Reminder(message) => {
                let task = self.reminders.update(message);
                self.reclamp_selection();
                return task;
            }

            Message::AiLog(message) => {
                return self.ai_logs.update(message);
            }
        }
        Task::none()
    }

    fn handle_key(&mut self, press: KeyPress) -> Task<Message> {
        let unresolved_len = self.reminders.unresolved().len();
        let Some(action) = self.nav.action_for(&press, unresolved_len) else {
            return Task::none();
        };
        log::debug!("{:?} -> {:?}", press, action);

        match action {
            Action::Reload => return self.update(Message::Reload),
            Action::SwitchView(view) => return self.switch_view(view),
            Action::SelectFirst => self.nav.select(Some(0), unresolved_len),
            Action::SelectNext => self.nav.select_next(unresolved_len),
            Action::SelectPrevious => self.nav.select_previous(unresolved_len),
            Action::ResolveSelected => return self.resolve_selected(),
            Action::ClearSelection => self.nav.clear_selection(),
            Action::SaveNow => return self.note.save_now(unresolved_len),
        }
        Task::none()
    }

    /// Leaving today saves immediately (without waiting), then selection is
    /// cleared, the view changes, and the new view's data is fetched.
    fn switch_view(&mut self, view: View) -> Task<Message> {
        let save = if self.nav.view() == View::Today && view != View::Today {
            self.note.save_now(self.reminders.unresolved().len())
        } else {
            Task::none()
        };
        self.nav.set_view(view);
        Task::batch([save, self.prefetch(view)])
    }

    fn prefetch(&self, view: View) -> Task<Message> {
        match view {
            View::Today => self.reminders.load_unresolved(),
            View::History => self.note.load_history(),
            View::Reminders => self.reminders.load_visible(),
            View::AiLogs => self.ai_logs.load(),
        }
    }

    fn resolve_selected(&mut self) -> Task<Message> {
        let Some(reminder) = self.selected_reminder() else {
            log::debug!("Resolve ignored: no reminder selected");
            return Task::none();
        };
        let id = reminder.id;
        self.reminders.update(ReminderMessage::Resolve(id))
    }

    /// After the unresolved list changes, pull the selection back inside it.
    /// An emptied list drops the selection, which returns focus to the editor.
    fn reclamp_selection(&mut self) {
        self.nav.reclamp(self.reminders.unresolved().len());
    }

    fn init_backend(&self, reload: bool) -> Task<Message> {
        let gateway = self.gateway.clone();
        Task::perform(async move { gateway.init().await }, move |result| {
            Message::BackendReady { reload, result }
        })
    }

    /// Today's note and unresolved reminders always; on reload, also whatever
    /// the active view shows.
    fn load_all(&self, reload: bool) -> Task<Message> {
        let mut tasks = vec![self.note.load_today(), self.reminders.load_unresolved()];
        if reload {
            match self.nav.view() {
                View::History => tasks.push(self.note.load_history()),
                View::AiLogs => tasks.push(self.ai_logs.load()),
                View::Today | View::Reminders => {}
            }
            if self.reminders.show_resolved() {
                tasks.push(self.reminders.load_resolved());
            }
        }
        Task::batch(tasks)
    }
}
