use crate::buffer::LogBuffer;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

type Hook = Box<dyn FnOnce() + Send>;

/// Exit-hook registry that guarantees the logger's final flush runs
/// after every other shutdown hook.
///
/// Hooks run in registration order, and a running hook may register
/// further hooks; the queue is drained to exhaustion. [`install`]
/// exploits this with a two-phase registration: phase one (registered
/// at logger initialization, so it runs before hooks registered later)
/// flushes what has accumulated so far and only then enqueues phase
/// two, a `flush(final=true)` that lands behind every hook registered
/// in between. Entries logged by other shutdown-time code are thereby
/// picked up instead of lost. A single registration could not give
/// this guarantee, since hooks registered after it would log into a
/// buffer nobody flushes again.
///
/// [`install`]: ShutdownCoordinator::install
#[derive(Default)]
pub struct ShutdownCoordinator {
    hooks: Mutex<VecDeque<Hook>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to the end of the queue.
    pub fn register<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.lock_hooks().push_back(Box::new(hook));
    }

    /// Register the two-phase final flush for `buffer`. Call once at
    /// logger initialization, before other components register their
    /// own shutdown hooks.
    pub fn install(self: &Arc<Self>, buffer: Arc<LogBuffer>) {
        let coordinator = Arc::clone(self);
        self.register(move || {
            buffer.flush(false);
            let buffer = Arc::clone(&buffer);
            coordinator.register(move || buffer.flush(true));
        });
    }

    /// Number of hooks currently queued.
    pub fn pending(&self) -> usize {
        self.lock_hooks().len()
    }

    /// Run all hooks in registration order, including hooks registered
    /// while running. Consumes the queue; each hook runs exactly once.
    pub fn run(&self) {
        loop {
            // The lock is released before the hook runs so hooks can
            // register successors.
            let hook = self.lock_hooks().pop_front();
            match hook {
                Some(hook) => hook(),
                None => break,
            }
        }
    }

    fn lock_hooks(&self) -> MutexGuard<'_, VecDeque<Hook>> {
        self.hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
