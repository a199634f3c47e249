/// Configuration for a [`crate::buffer::LogBuffer`].
///
/// **Fields**
/// - `flush_threshold`: number of buffered records that triggers an
///   automatic flush. `0` disables automatic flushing entirely; the
///   buffer then flushes only on an explicit `flush` call or at
///   shutdown.
/// - `trace_level`: maximum number of call-stack frames captured per
///   record. `0` disables trace capture regardless of call depth.
#[derive(Clone, Debug)]
pub struct BufferConfig {
    pub flush_threshold: usize,
    pub trace_level: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 100,
            trace_level: 10,
        }
    }
}

impl BufferConfig {
    /// Manual-flush configuration: nothing is dispatched until an
    /// explicit `flush` or the shutdown coordinator runs.
    pub fn manual() -> Self {
        Self {
            flush_threshold: 0,
            ..Self::default()
        }
    }

    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    pub fn with_trace_level(mut self, depth: usize) -> Self {
        self.trace_level = depth;
        self
    }
}
