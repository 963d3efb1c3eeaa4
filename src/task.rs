//! Deferred asynchronous work that resolves into messages.
//!
//! `update` never awaits. It returns a [`Task`] describing the futures to run;
//! the runtime spawns them and feeds each produced message back into `update`.

use std::future::Future;

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};

pub struct Task<M> {
    futures: Vec<BoxFuture<'static, Option<M>>>,
}

impl<M: Send + 'static> Task<M> {
    pub fn none() -> Self {
        Self {
            futures: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn done(message: M) -> Self {
        Self {
            futures: vec![futures::future::ready(Some(message)).boxed()],
        }
    }

    /// Run `future` and map its output into a message.
    pub fn perform<T, F>(future: F, to_message: impl FnOnce(T) -> M + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            futures: vec![future.map(|output| Some(to_message(output))).boxed()],
        }
    }

    /// Combine tasks. Futures are spawned in the order given.
    pub fn batch(tasks: impl IntoIterator<Item = Task<M>>) -> Self {
        Self {
            futures: tasks.into_iter().flat_map(|t| t.futures).collect(),
        }
    }

    /// Make every future in this task cancelable through the returned handle.
    /// An aborted future produces no message.
    pub fn abortable(self) -> (Self, Handle) {
        let mut handles = Vec::with_capacity(self.futures.len());
        let futures = self
            .futures
            .into_iter()
            .map(|fut| {
                let (handle, registration) = AbortHandle::new_pair();
                handles.push(handle);
                Abortable::new(fut, registration)
                    .map(|result| result.ok().flatten())
                    .boxed()
            })
            .collect();
        (Self { futures }, Handle { handles })
    }

    #[cfg(test)]
    pub fn is_none(&self) -> bool {
        self.futures.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn into_futures(self) -> Vec<BoxFuture<'static, Option<M>>> {
        self.futures
    }
}

impl<M: Send + 'static> Default for Task<M> {
    fn default() -> Self {
        Self::none()
    }
}

/// Cancels the futures of an [`abortable`](Task::abortable) task.
#[derive(Debug, Clone)]
pub struct Handle {
    handles: Vec<AbortHandle>,
}

impl Handle {
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_aborted(&self) -> bool {
        self.handles.iter().all(AbortHandle::is_aborted)
    }
}
