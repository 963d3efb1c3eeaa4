//! Single-slot timers with cancel-and-replace semantics.

use std::time::Duration;

use crate::task::{Handle, Task};

/// At most one pending timer per slot. Arming aborts the previous timer, and
/// every firing carries a token so a message already queued by a superseded
/// timer is rejected by [`TimerSlot::fire`].
#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    pending: Option<Handle>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timer and start a new one that yields
    /// `on_fire(token)` after `after`.
    pub fn arm<M: Send + 'static>(
        &mut self,
        after: Duration,
        on_fire: impl FnOnce(u64) -> M + Send + 'static,
    ) -> Task<M> {
        self.cancel();
        self.generation += 1;
        let token = self.generation;
        let (task, handle) = Task::perform(
            async move { tokio::time::sleep(after).await },
            move |_| on_fire(token),
        )
        .abortable();
        self.pending = Some(handle);
        task
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Consume a firing. Returns `true` only for the live timer's token.
    pub fn fire(&mut self, token: u64) -> bool {
        if self.is_current(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    fn is_current(&self, token: u64) -> bool {
        self.pending.is_some() && token == self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<u64> {
        self.pending.as_ref().map(|_| self.generation)
    }
}
