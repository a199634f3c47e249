use crate::config::BufferConfig;
use crate::dispatch::Dispatcher;
use crate::profile::{reconstruct_spans, TimingRecord};
use crate::record::{Level, LogRecord, Payload};
use crate::trace::capture_trace;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Process-local ordered buffer of [`LogRecord`]s.
///
/// Records accumulate in the current *generation* until the configured
/// flush threshold is reached (or a flush is requested explicitly), at
/// which point the generation is swapped out atomically and handed to
/// the configured [`Dispatcher`] as one batch. Without a dispatcher,
/// flushed batches are silently discarded: logging with no targets is
/// a no-op by design, not an error.
///
/// The buffer is safe to share behind an `Arc`; the generation sits
/// behind a mutex and the swap-and-dispatch sequence guarantees that a
/// `log` racing with a `flush` lands in exactly one generation.
/// Dispatch happens outside the lock, so a dispatcher that itself logs
/// feeds the *next* generation instead of deadlocking.
pub struct LogBuffer {
    config: BufferConfig,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    generation: Mutex<Vec<LogRecord>>,
    started: Instant,
}

impl LogBuffer {
    /// Create a buffer with no dispatcher; flushed batches are
    /// discarded until one is attached via [`LogBuffer::with_dispatcher`].
    pub fn new(config: BufferConfig) -> Self {
        Self {
            config,
            dispatcher: None,
            generation: Mutex::new(Vec::new()),
            started: Instant::now(),
        }
    }

    /// Create a buffer that hands flushed batches to `dispatcher`.
    pub fn with_dispatcher(config: BufferConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            ..Self::new(config)
        }
    }

    /// Append one record to the current generation.
    ///
    /// Captures the timestamp and (if `trace_level > 0`) a bounded
    /// call-stack snippet, then appends. If the generation reaches the
    /// flush threshold the batch is dispatched synchronously before
    /// this call returns. Never fails and never panics on a poisoned
    /// lock; logging must not abort the host operation.
    pub fn log(&self, payload: impl Into<Payload>, level: Level, category: impl Into<String>) {
        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            category: category.into(),
            payload: payload.into(),
            trace: capture_trace(self.config.trace_level),
        };

        let taken = {
            let mut generation = self.lock_generation();
            generation.push(record);
            if self.config.flush_threshold > 0 && generation.len() >= self.config.flush_threshold {
                Some(std::mem::take(&mut *generation))
            } else {
                None
            }
        };

        if let Some(batch) = taken {
            self.dispatch_batch(&batch, false);
        }
    }

    /// Open a profiling span. Must be closed by [`LogBuffer::end_profile`]
    /// with an equal payload, LIFO with respect to other open spans.
    pub fn begin_profile(&self, payload: impl Into<Payload>, category: impl Into<String>) {
        self.log(payload, Level::ProfileBegin, category);
    }

    /// Close the innermost open profiling span carrying this payload.
    pub fn end_profile(&self, payload: impl Into<Payload>, category: impl Into<String>) {
        self.log(payload, Level::ProfileEnd, category);
    }

    /// Take the current generation and hand it to the dispatcher.
    ///
    /// The swap is atomic: records logged while the dispatcher runs
    /// belong to the next generation and are neither lost nor
    /// duplicated. The dispatcher is invoked exactly once per flush,
    /// even with an empty batch, so a `final_flush` marker always
    /// reaches the targets.
    pub fn flush(&self, final_flush: bool) {
        let batch = std::mem::take(&mut *self.lock_generation());
        self.dispatch_batch(&batch, final_flush);
    }

    /// Clone of the unflushed generation, for profiling queries.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.lock_generation().clone()
    }

    /// Reconstruct the profiling spans currently sitting in the
    /// unflushed generation. See [`crate::profile::reconstruct_spans`].
    pub fn timings(&self) -> Vec<TimingRecord> {
        reconstruct_spans(&self.snapshot())
    }

    /// Number of records awaiting flush.
    pub fn len(&self) -> usize {
        self.lock_generation().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_generation().is_empty()
    }

    /// Wall-clock seconds since this buffer was created, i.e. since
    /// process or request start when the buffer is created at
    /// initialization time.
    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn dispatch_batch(&self, batch: &[LogRecord], final_flush: bool) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };
        if let Err(e) = dispatcher.dispatch(batch, final_flush) {
            eprintln!("log dispatch failed: {}", e);
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        // A panic while holding the lock must not silence every later
        // log call; recover the guard instead.
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop_dispatch::MemoryDispatcher;
    use crate::record::Payload;
    use std::error::Error;

    fn buffer_with_memory(threshold: usize) -> (LogBuffer, Arc<MemoryDispatcher>) {
        let dispatcher = Arc::new(MemoryDispatcher::new());
        let config = BufferConfig::default()
            .with_flush_threshold(threshold)
            .with_trace_level(0);
        let buffer = LogBuffer::with_dispatcher(config, dispatcher.clone());
        (buffer, dispatcher)
    }

    #[test]
    fn no_dispatch_below_threshold() {
        let (buffer, dispatcher) = buffer_with_memory(5);
        for i in 0..4 {
            buffer.log(format!("msg {i}"), Level::Info, "core");
        }
        assert!(dispatcher.batches().is_empty());
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn threshold_crossing_dispatches_exactly_one_ordered_batch() {
        let (buffer, dispatcher) = buffer_with_memory(3);
        buffer.log("first", Level::Info, "core");
        buffer.log("second", Level::Warning, "core");
        buffer.log("third", Level::Error, "core");

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        let (batch, final_flush) = &batches[0];
        assert!(!final_flush);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].payload, Payload::from("first"));
        assert_eq!(batch[1].payload, Payload::from("second"));
        assert_eq!(batch[2].payload, Payload::from("third"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn zero_threshold_disables_automatic_flush() {
        let (buffer, dispatcher) = buffer_with_memory(0);
        for i in 0..200 {
            buffer.log(format!("msg {i}"), Level::Trace, "core");
        }
        assert!(dispatcher.batches().is_empty());
        assert_eq!(buffer.len(), 200);

        buffer.flush(false);
        assert_eq!(dispatcher.record_count(), 200);
        assert!(buffer.is_empty());
    }

    #[test]
    fn explicit_flush_carries_final_flag() {
        let (buffer, dispatcher) = buffer_with_memory(0);
        buffer.log("last words", Level::Info, "core");
        buffer.flush(true);

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].1);
    }

    #[test]
    fn flush_without_dispatcher_discards_silently() {
        let buffer = LogBuffer::new(BufferConfig::manual().with_trace_level(0));
        buffer.log("nobody listens", Level::Warning, "core");
        buffer.flush(false);
        assert!(buffer.is_empty());
    }

    #[test]
    fn dispatcher_error_does_not_lose_later_records() {
        struct FailingDispatcher;
        impl Dispatcher for FailingDispatcher {
            fn dispatch(
                &self,
                _records: &[LogRecord],
                _final_flush: bool,
            ) -> Result<(), Box<dyn Error + Send + Sync>> {
                Err("target unavailable".into())
            }
        }

        let buffer = LogBuffer::with_dispatcher(
            BufferConfig::manual().with_trace_level(0),
            Arc::new(FailingDispatcher),
        );
        buffer.log("doomed", Level::Error, "core");
        buffer.flush(false);

        buffer.log("still alive", Level::Info, "core");
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn elapsed_seconds_is_monotonic() {
        let buffer = LogBuffer::new(BufferConfig::default());
        let a = buffer.elapsed_seconds();
        let b = buffer.elapsed_seconds();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn trace_level_zero_yields_empty_traces() {
        let (buffer, _) = buffer_with_memory(0);
        buffer.log("no trace", Level::Info, "core");
        assert!(buffer.snapshot()[0].trace.is_empty());
    }
}
