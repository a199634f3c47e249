use crate::record::TraceFrame;
use backtrace::Backtrace;

/// Symbol prefixes whose frames are noise to the end user: this
/// crate's own plumbing, the capture machinery, and runtime glue.
const INTERNAL_SYMBOL_PREFIXES: &[&str] = &[
    "profile_log_buffer::",
    "backtrace::",
    "std::",
    "core::",
    "alloc::",
    "test::",
    "rust_begin_unwind",
    "__rust",
    "_start",
    "main",
];

/// Capture a bounded call-stack snippet for a record.
///
/// Walks the stack outward from the emission point, dropping the
/// outermost frame (the process entry point) and every frame that
/// resolves into this crate or the language runtime, until `max_depth`
/// application frames are collected. Each retained frame carries only
/// a file path and line number.
///
/// A `max_depth` of `0` disables capture and returns an empty vector
/// without touching the stack. Frames that cannot be resolved to a
/// source location are skipped; in the worst case the result is empty,
/// never an error.
pub fn capture_trace(max_depth: usize) -> Vec<TraceFrame> {
    if max_depth == 0 {
        return Vec::new();
    }

    let bt = Backtrace::new();
    let raw = bt.frames();
    // The outermost frame is the entry point, not useful to anyone.
    let walkable = &raw[..raw.len().saturating_sub(1)];

    let mut frames = Vec::with_capacity(max_depth);
    for frame in walkable {
        for symbol in frame.symbols() {
            let (file, line) = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => (file.to_string_lossy().into_owned(), line),
                _ => continue,
            };
            let name = symbol.name().map(|n| n.to_string());
            if is_internal(&file, name.as_deref()) {
                continue;
            }
            frames.push(TraceFrame { file, line });
            if frames.len() == max_depth {
                return frames;
            }
        }
    }
    frames
}

fn is_internal(file: &str, symbol: Option<&str>) -> bool {
    // Standard library sources are reported under the rustc sysroot.
    if file.starts_with("/rustc/") || file.contains("backtrace") {
        return true;
    }
    match symbol {
        Some(name) => INTERNAL_SYMBOL_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix)),
        // Unresolvable symbols are not worth showing either.
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_zero_captures_nothing() {
        assert!(capture_trace(0).is_empty());
    }

    #[test]
    fn capture_respects_depth_bound() {
        let frames = capture_trace(3);
        assert!(frames.len() <= 3);
        for frame in &frames {
            assert!(!frame.file.is_empty());
        }
    }

    #[test]
    fn crate_internal_frames_are_filtered() {
        assert!(is_internal("src/buffer.rs", Some("profile_log_buffer::buffer::LogBuffer::log")));
        assert!(is_internal("/rustc/abc123/library/std/src/rt.rs", Some("std::rt::lang_start")));
        assert!(!is_internal("src/main.rs", Some("my_app::handler::run")));
    }
}
