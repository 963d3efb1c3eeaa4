use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::reminder::Reminder;
use crate::gateway::{Gateway, GatewayError};
use crate::message::{Fetched, Message, Refresh, ReminderMessage};
use crate::task::Task;

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Resolve(i64),
    Unresolve(i64),
    Delete(i64),
}

impl Mutation {
    async fn apply(self, gateway: &dyn Gateway) -> Result<(), GatewayError> {
        match self {
            Self::Resolve(id) => gateway.resolve_reminder(id).await,
            Self::Unresolve(id) => gateway.unresolve_reminder(id).await,
            Self::Delete(id) => gateway.delete_reminder(id).await,
        }
    }
}

/// Hands out increasing tickets to reminder list fetches as they start.
/// Shared with the note store, whose saves also fetch the unresolved list.
#[derive(Debug, Clone, Default)]
pub struct FetchOrder(Arc<AtomicU64>);

impl FetchOrder {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn unresolved(&self, gateway: &dyn Gateway) -> Result<Fetched, GatewayError> {
        let ticket = self.next();
        let reminders = gateway.unresolved_reminders().await?;
        Ok(Fetched { ticket, reminders })
    }

    pub async fn resolved(&self, gateway: &dyn Gateway) -> Result<Fetched, GatewayError> {
        let ticket = self.next();
        let reminders = gateway.resolved_reminders().await?;
        Ok(Fetched { ticket, reminders })
    }
}

/// Unresolved and resolved reminder snapshots, each fetched from the backend
/// independently. Neither list is ever patched locally.
pub struct ReminderStore {
    gateway: Arc<dyn Gateway>,
    order: FetchOrder,
    unresolved: Vec<Reminder>,
    unresolved_ticket: u64,
    resolved: Vec<Reminder>,
    resolved_ticket: u64,
    show_resolved: bool,
    resolved_loaded: bool,
    /// A mutation ran while the resolved list was hidden.
    resolved_stale: bool,
    search: String,
}

impl ReminderStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            order: FetchOrder::default(),
            unresolved: Vec::new(),
            unresolved_ticket: 0,
            resolved: Vec::new(),
            resolved_ticket: 0,
            show_resolved: false,
            resolved_loaded: false,
            resolved_stale: false,
            search: String::new(),
        }
    }

    pub fn fetch_order(&self) -> FetchOrder {
        self.order.clone()
    }

    pub fn unresolved(&self) -> &[Reminder] {
        &self.unresolved
    }

    pub fn show_resolved(&self) -> bool {
        self.show_resolved
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filtered_unresolved(&self) -> Vec<&Reminder> {
        self.unresolved
            .iter()
            .filter(|r| r.matches(&self.search))
            .collect()
    }

    /// Resolved reminders matching the search. Empty while the list is
    /// hidden; never repeats an id that is in the unresolved snapshot.
    pub fn filtered_resolved(&self) -> Vec<&Reminder> {
        if !self.show_resolved {
            return Vec::new();
        }
        let unresolved_ids: HashSet<i64> = self.unresolved.iter().map(|r| r.id).collect();
        self.resolved
            .iter()
            .filter(|r| !unresolved_ids.contains(&r.id))
            .filter(|r| r.matches(&self.search))
            .collect()
    }

    /// Take an unresolved snapshot fetched elsewhere (after a save). Returns
    /// false if a newer snapshot is already shown.
    pub fn replace_unresolved(&mut self, fetched: Fetched) -> bool {
        self.accept_unresolved(fetched)
    }

    fn accept_unresolved(&mut self, fetched: Fetched) -> bool {
        if fetched.ticket < self.unresolved_ticket {
            log::debug!(
                "Dropping unresolved snapshot #{} (showing #{})",
                fetched.ticket,
                self.unresolved_ticket
            );
            return false;
        }
        self.unresolved_ticket = fetched.ticket;
        self.unresolved = fetched.reminders;
        true
    }

    fn accept_resolved(&mut self, fetched: Fetched) {
        if fetched.ticket < self.resolved_ticket {
            log::debug!(
                "Dropping resolved snapshot #{} (showing #{})",
                fetched.ticket,
                self.resolved_ticket
            );
            return;
        }
        self.resolved_ticket = fetched.ticket;
        self.resolved = fetched.reminders;
        self.resolved_loaded = true;
        self.resolved_stale = false;
    }

    pub fn update(&mut self, message: ReminderMessage) -> Task<Message> {
        match message {
            ReminderMessage::UnresolvedLoaded(result) => match result {
                Ok(fetched) => {
                    self.accept_unresolved(fetched);
                }
                Err(e) => log::error!("Failed to load unresolved reminders: {}", e),
            },

            ReminderMessage::ResolvedLoaded(result) => match result {
                Ok(fetched) => self.accept_resolved(fetched),
                Err(e) => log::error!("Failed to load resolved reminders: {}", e),
            },

            ReminderMessage::ToggleResolved => {
                self.show_resolved = !self.show_resolved;
                if self.show_resolved && (!self.resolved_loaded || self.resolved_stale) {
                    return self.load_resolved();
                }
            }

            ReminderMessage::SearchChanged(query) => {
                self.search = query;
            }

            ReminderMessage::Resolve(id) => return self.mutate(Mutation::Resolve(id)),
            ReminderMessage::Unresolve(id) => return self.mutate(Mutation::Unresolve(id)),
            ReminderMessage::Delete { id, resolved } => {
                log::debug!("Deleting reminder {} (resolved: {})", id, resolved);
                return self.mutate(Mutation::Delete(id));
            }

            ReminderMessage::Refreshed(result) => match result {
                Ok(refresh) => {
                    self.accept_unresolved(refresh.unresolved);
                    match refresh.resolved {
                        Some(resolved) => self.accept_resolved(resolved),
                        None => {
                            self.resolved_stale = true;
                            // Revealed while the mutation was in flight.
                            if self.show_resolved {
                                return self.load_resolved();
                            }
                        }
                    }
                }
                Err(e) => log::error!("Reminder update failed: {}", e),
            },
        }
        Task::none()
    }

    pub fn load_unresolved(&self) -> Task<Message> {
        let gateway = self.gateway.clone();
        let order = self.order.clone();
        Task::perform(async move { order.unresolved(gateway.as_ref()).await }, |result| {
            Message::Reminder(ReminderMessage::UnresolvedLoaded(result))
        })
    }

    pub fn load_resolved(&self) -> Task<Message> {
        let gateway = self.gateway.clone();
        let order = self.order.clone();
        Task::perform(async move { order.resolved(gateway.as_ref()).await }, |result| {
            Message::Reminder(ReminderMessage::ResolvedLoaded(result))
        })
    }

    /// Unresolved always, resolved too when it is visible.
    pub fn load_visible(&self) -> Task<Message> {
        if self.show_resolved {
            Task::batch([self.load_unresolved(), self.load_resolved()])
        } else {
            self.load_unresolved()
        }
    }

    /// Run `mutation`, then fetch both snapshots so they land in one message.
    fn mutate(&self, mutation: Mutation) -> Task<Message> {
        let gateway = self.gateway.clone();
        let order = self.order.clone();
        let include_resolved = self.show_resolved;
        Task::perform(
            async move {
                mutation.apply(gateway.as_ref()).await?;
                let unresolved = order.unresolved(gateway.as_ref()).await?;
                let resolved = if include_resolved {
                    Some(order.resolved(gateway.as_ref()).await?)
                } else {
                    None
                };
                Ok(Refresh {
                    unresolved,
                    resolved,
                })
            },
            |result| Message::Reminder(ReminderMessage::Refreshed(result)),
        )
    }
}
