use crate::dispatch::Dispatcher;
use crate::record::LogRecord;
use std::error::Error;
use std::sync::Mutex;

/// A dispatcher that simply drops every batch.
///
/// Useful for measuring the overhead of the buffer itself without any
/// I/O, and for unit tests that don't care about persistence.
#[derive(Clone, Default)]
pub struct NoopDispatcher;

impl Dispatcher for NoopDispatcher {
    fn dispatch(
        &self,
        _records: &[LogRecord],
        _final_flush: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// A dispatcher that keeps every received batch in memory, preserving
/// batch boundaries and the `final` flag. Intended for tests and for
/// short-lived tools that post-process their own logs.
#[derive(Default)]
pub struct MemoryDispatcher {
    batches: Mutex<Vec<(Vec<LogRecord>, bool)>>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches received so far, in dispatch order.
    pub fn batches(&self) -> Vec<(Vec<LogRecord>, bool)> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Total number of records across all batches.
    pub fn record_count(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(batch, _)| batch.len())
            .sum()
    }
}

impl Dispatcher for MemoryDispatcher {
    fn dispatch(
        &self,
        records: &[LogRecord],
        final_flush: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((records.to_vec(), final_flush));
        Ok(())
    }
}
