use std::sync::Arc;

use crate::core::ai_log::AiLogEntry;
use crate::gateway::Gateway;
use crate::message::{AiLogMessage, Message};
use crate::task::Task;

pub struct AiLogStore {
    gateway: Arc<dyn Gateway>,
    entries: Vec<AiLogEntry>,
}

impl AiLogStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[AiLogEntry] {
        &self.entries
    }

    pub fn update(&mut self, message: AiLogMessage) -> Task<Message> {
        match message {
            AiLogMessage::Loaded(result) => match result {
                Ok(entries) => self.entries = entries,
                Err(e) => log::error!("Failed to load AI logs: {}", e),
            },

            AiLogMessage::Delete(id) => {
                let gateway = self.gateway.clone();
                return Task::perform(
                    async move {
                        gateway.delete_ai_log(id).await?;
                        gateway.ai_logs().await
                    },
                    |result| Message::AiLog(AiLogMessage::Loaded(result)),
                );
            }

            AiLogMessage::DeleteAll => {
                let gateway = self.gateway.clone();
                return Task::perform(async move { gateway.delete_all_ai_logs().await }, |result| {
                    Message::AiLog(AiLogMessage::AllDeleted(result))
                });
            }

            // The backend guarantees the table is empty, so no reload.
            AiLogMessage::AllDeleted(result) => match result {
                Ok(()) => self.entries.clear(),
                Err(e) => log::error!("Failed to delete AI logs: {}", e),
            },
        }
        Task::none()
    }

    pub fn load(&self) -> Task<Message> {
        let gateway = self.gateway.clone();
        Task::perform(async move { gateway.ai_logs().await }, |result| {
            Message::AiLog(AiLogMessage::Loaded(result))
        })
    }
}
