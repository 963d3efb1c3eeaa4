//! Drives an [`App`]: spawns task futures on tokio and applies the messages
//! they produce one at a time, so `update` is the only writer of app state.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

use crate::application::App;
use crate::message::Message;
use crate::task::Task;

pub struct Runtime {
    app: App,
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
}

impl Runtime {
    /// Must be called from within a tokio runtime.
    pub fn new(app: App, initial: Task<Message>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let runtime = Self {
            app,
            sender,
            receiver,
        };
        runtime.spawn(initial);
        runtime
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Apply `message` now and spawn whatever work it starts.
    pub fn dispatch(&mut self, message: Message) {
        let task = self.app.update(message);
        self.spawn(task);
    }

    fn spawn(&self, task: Task<Message>) {
        for future in task.into_futures() {
            let sender = self.sender.clone();
            tokio::spawn(async move {
                if let Some(message) = future.await {
                    // Receiver is gone only when the runtime was dropped.
                    let _ = sender.send(message);
                }
            });
        }
    }

    /// Wait for the next message produced by spawned work and apply it.
    pub async fn step(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(message) => {
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Apply messages as they arrive until `duration` has elapsed.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while let Ok(Some(message)) = tokio::time::timeout_at(deadline, self.receiver.recv()).await {
            self.dispatch(message);
        }
    }
}
