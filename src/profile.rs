use crate::buffer::LogBuffer;
use crate::record::{Level, LogRecord, Payload, TraceFrame};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Duration measurement derived from one matched
/// `ProfileBegin`/`ProfileEnd` pair. Not stored anywhere; produced on
/// demand by [`reconstruct_spans`] from an unflushed buffer snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TimingRecord {
    /// Payload shared by the begin and end markers.
    pub info: Payload,
    /// Category of the begin record.
    pub category: String,
    /// Timestamp of the begin record.
    pub timestamp: DateTime<Utc>,
    /// Trace captured with the begin record.
    pub trace: Vec<TraceFrame>,
    /// Nesting depth of the span: how many spans were still open when
    /// this one closed. A plain counter, unrelated to severity.
    pub depth: usize,
    /// Seconds between the begin and end markers.
    pub duration: f64,
}

/// Rebuild nested profiling spans from a record sequence.
///
/// Single pass, O(n). `ProfileBegin` records are pushed on an explicit
/// stack together with their position; a `ProfileEnd` closes the top
/// of the stack only when the payloads are equal. An end with no open
/// span, or whose payload does not match the innermost open span, is
/// dropped silently; profiling tolerates instrumentation bugs instead
/// of surfacing them. Spans still open at the end of the pass are
/// never emitted.
///
/// Results come back ordered by the begin record's position, so spans
/// appear in the order they were opened.
pub fn reconstruct_spans(records: &[LogRecord]) -> Vec<TimingRecord> {
    let mut open: Vec<(usize, &LogRecord)> = Vec::new();
    let mut closed: Vec<(usize, TimingRecord)> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match record.level {
            Level::ProfileBegin => open.push((index, record)),
            Level::ProfileEnd => {
                let matches = open
                    .last()
                    .map_or(false, |(_, begin)| begin.payload == record.payload);
                if !matches {
                    continue;
                }
                if let Some((begin_index, begin)) = open.pop() {
                    closed.push((
                        begin_index,
                        TimingRecord {
                            info: begin.payload.clone(),
                            category: begin.category.clone(),
                            timestamp: begin.timestamp,
                            trace: begin.trace.clone(),
                            depth: open.len(),
                            duration: seconds_between(begin.timestamp, record.timestamp),
                        },
                    ));
                }
            }
            // Severity records are invisible to the reconstructor.
            _ => {}
        }
    }

    closed.sort_by_key(|(begin_index, _)| *begin_index);
    closed.into_iter().map(|(_, timing)| timing).collect()
}

fn seconds_between(begin: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    // Microsecond precision; overflow would need a span of ~292k years.
    (end - begin).num_microseconds().unwrap_or(0) as f64 / 1e6
}

/// RAII handle that opens a profiling span on creation and closes it
/// when dropped, keeping begin/end pairs balanced even on early
/// returns.
pub struct ProfileGuard {
    buffer: Arc<LogBuffer>,
    payload: Payload,
    category: String,
}

impl ProfileGuard {
    pub fn enter(
        buffer: Arc<LogBuffer>,
        payload: impl Into<Payload>,
        category: impl Into<String>,
    ) -> Self {
        let payload = payload.into();
        let category = category.into();
        buffer.begin_profile(payload.clone(), category.clone());
        Self {
            buffer,
            payload,
            category,
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        self.buffer
            .end_profile(self.payload.clone(), self.category.clone());
    }
}
