use chrono::{DateTime, Utc};
use serde::Serialize;

/// Severity of a buffered record.
///
/// Each variant carries a distinct bit so levels can be combined into a
/// [`LevelMask`] when a filtering context wants "any of these".
/// `ProfileBegin`/`ProfileEnd` are not severities in the usual sense:
/// they mark the two ends of a timed span and are consumed by the
/// reconstructor in [`crate::profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Error,
    Warning,
    Info,
    Trace,
    ProfileBegin,
    ProfileEnd,
}

impl Level {
    /// The bit identity of this level inside a [`LevelMask`].
    pub const fn bit(self) -> u8 {
        match self {
            Level::Error => 1 << 0,
            Level::Warning => 1 << 1,
            Level::Info => 1 << 2,
            Level::Trace => 1 << 3,
            Level::ProfileBegin => 1 << 4,
            Level::ProfileEnd => 1 << 5,
        }
    }
}

/// A combination of [`Level`]s, used wherever a set of levels is
/// matched against (e.g. a dispatcher that only persists errors and
/// warnings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelMask(u8);

impl LevelMask {
    /// The empty mask, matching no level.
    pub const NONE: LevelMask = LevelMask(0);
    /// Mask matching every level including the profiling markers.
    pub const ALL: LevelMask = LevelMask(0b11_1111);

    pub fn contains(self, level: Level) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn with(self, level: Level) -> LevelMask {
        LevelMask(self.0 | level.bit())
    }
}

impl From<Level> for LevelMask {
    fn from(level: Level) -> Self {
        LevelMask(level.bit())
    }
}

impl std::ops::BitOr<Level> for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: Level) -> LevelMask {
        self.with(rhs)
    }
}

impl std::ops::BitOr for Level {
    type Output = LevelMask;

    fn bitor(self, rhs: Level) -> LevelMask {
        LevelMask(self.bit() | rhs.bit())
    }
}

/// Message content of a record.
///
/// Callers log either plain text, a structured error, or arbitrary
/// JSON data. Span pairing in the reconstructor compares payloads by
/// value, so a `ProfileEnd` must carry the same payload as its
/// matching `ProfileBegin`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Error { message: String, code: Option<u32> },
    Data(serde_json::Value),
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Data(v)
    }
}

/// One frame of a captured call stack. Only the source location is
/// retained; live references and call arguments are deliberately
/// stripped so a record never keeps heavy or unserializable state
/// alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceFrame {
    pub file: String,
    pub line: u32,
}

/// A single buffered occurrence. Immutable once constructed; the
/// buffer appends records and never mutates them afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// Free-form dotted category, owned by the caller. Used for
    /// grouping and for prefix filtering of profiling results.
    pub category: String,
    pub payload: Payload,
    /// Call-stack snippet captured at emission time; empty when trace
    /// capture is disabled.
    pub trace: Vec<TraceFrame>,
}
