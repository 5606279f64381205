//! Shared append-only buffer of timing event lines
//!
//! Every wrapped function appends one JSON line per successful call. The
//! report reads the buffer from the start without truncating it, so reading
//! twice gives the same result until something new is appended.
//!
//! ```text
//! Timed::call() ──append──▶ ┌──────────────────────────────┐
//! Timed::call() ──append──▶ │ {"function":..,"time_ns":..} │ ──read_all──▶ Report
//! time_future() ──append──▶ │ {"function":..,"time_ns":..} │
//!                           └──────────────────────────────┘
//! ```
//!
//! A `Recorder` is a handle; clones share one buffer. `Recorder::global()` is
//! the process-wide instance used by `timed!` when no recorder is given.
//! Tests build their own with `Recorder::new()`.

use crate::error::{Result, TimedError};
use crate::event::TimingEvent;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

static GLOBAL: OnceLock<Recorder> = OnceLock::new();

#[derive(Debug, Default)]
struct Buffer {
    text: String,
    lines: usize,
}

/// Handle to an in-memory, append-only log of serialized timing events
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    buffer: Arc<Mutex<Buffer>>,
}

impl Recorder {
    /// Create a new, empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide recorder, created empty on first use
    pub fn global() -> &'static Recorder {
        GLOBAL.get_or_init(Recorder::new)
    }

    // Appends are whole-line writes, so a panic elsewhere while holding the
    // lock cannot leave a partial line behind. Recover instead of poisoning.
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append one line to the end of the buffer
    ///
    /// The line and its terminating newline are written under a single lock,
    /// so concurrent appends never interleave. A line containing `\n` or `\r`
    /// is rejected with [`TimedError::MultiLineRecord`] and nothing is written.
    pub fn append(&self, line: &str) -> Result<()> {
        if line.contains(|c: char| c == '\n' || c == '\r') {
            return Err(TimedError::MultiLineRecord(line.to_string()));
        }
        self.push_line(line);
        Ok(())
    }

    // Caller guarantees `line` has no line break.
    fn push_line(&self, line: &str) {
        let mut buffer = self.lock();
        buffer.text.push_str(line);
        buffer.text.push('\n');
        buffer.lines += 1;
    }

    /// Serialize an event and append it
    pub fn record(&self, event: &TimingEvent) {
        tracing::trace!(
            function = %event.function,
            time_ns = event.time_ns,
            "recorded timing event"
        );
        // serde_json escapes control characters, so an event line is always one line.
        self.push_line(&event.to_line());
    }

    /// Every line currently in the buffer, from the start
    pub fn read_all(&self) -> Vec<String> {
        self.lock().text.lines().map(str::to_string).collect()
    }

    /// Number of lines currently held
    pub fn len(&self) -> usize {
        self.lock().lines
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw buffer text, one event per line
    pub fn contents(&self) -> String {
        self.lock().text.clone()
    }

    /// Write the raw buffer text to `writer`
    pub fn dump<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let text = self.contents();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }

    /// Discard everything recorded so far
    ///
    /// Never called by the library; for callers that report in cycles.
    pub fn reset(&self) {
        let mut buffer = self.lock();
        tracing::debug!(discarded = buffer.lines, "recorder reset");
        buffer.text.clear();
        buffer.lines = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_recorder_is_empty() {
        let recorder = Recorder::new();
        assert!(recorder.is_empty());
        assert!(recorder.read_all().is_empty());
        assert_eq!(recorder.contents(), "");
    }

    #[test]
    fn test_append_and_read_all_in_order() {
        let recorder = Recorder::new();
        recorder.append("first").unwrap();
        recorder.append("second").unwrap();

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.read_all(), vec!["first", "second"]);
        assert_eq!(recorder.contents(), "first\nsecond\n");
    }

    #[test]
    fn test_read_all_is_not_destructive() {
        let recorder = Recorder::new();
        recorder.record(&TimingEvent::new("m.f", 5));

        let first = recorder.read_all();
        let second = recorder.read_all();
        assert_eq!(first, second);
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_record_writes_json_line() {
        let recorder = Recorder::new();
        recorder.record(&TimingEvent::new("m.f", 42));
        assert_eq!(recorder.read_all(), vec![r#"{"function":"m.f","time_ns":42}"#]);
    }

    #[test]
    fn test_clones_share_buffer() {
        let recorder = Recorder::new();
        let clone = recorder.clone();
        clone.append("x").unwrap();
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_reset_clears_buffer() {
        let recorder = Recorder::new();
        recorder.append("x").unwrap();
        recorder.append("y").unwrap();
        recorder.reset();

        assert!(recorder.is_empty());
        recorder.append("z").unwrap();
        assert_eq!(recorder.read_all(), vec!["z"]);
    }

    #[test]
    fn test_dump_writes_raw_text() {
        let recorder = Recorder::new();
        recorder.append("a").unwrap();
        recorder.append("b").unwrap();

        let mut out = Vec::new();
        recorder.dump(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let recorder = Recorder::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = recorder.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        recorder.record(&TimingEvent::new(format!("t{}.f", t), i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = recorder.read_all();
        assert_eq!(lines.len(), 800);
        assert_eq!(recorder.len(), 800);
        for line in lines {
            assert!(TimingEvent::from_line(&line).is_ok(), "corrupt line: {}", line);
        }
    }

    #[test]
    fn test_append_rejects_line_breaks() {
        let recorder = Recorder::new();
        recorder.append("first").unwrap();

        for bad in ["a\nb", "a\rb", "trailing\n", "\r\n"] {
            let err = recorder.append(bad).unwrap_err();
            assert!(matches!(err, TimedError::MultiLineRecord(ref l) if l == bad));
        }

        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.read_all(), vec!["first"]);
        assert_eq!(recorder.contents(), "first\n");
    }

    #[test]
    fn test_len_matches_read_all_for_event_with_line_breaks() {
        let recorder = Recorder::new();
        recorder.record(&TimingEvent::new("m.f\nsecond\r", 3));
        recorder.record(&TimingEvent::new("m.g", 4));

        let lines = recorder.read_all();
        assert_eq!(recorder.len(), lines.len());
        assert_eq!(lines.len(), 2);
        assert_eq!(TimingEvent::from_line(&lines[0]).unwrap().function, "m.f\nsecond\r");
    }

    #[test]
    fn test_global_is_a_single_instance() {
        assert!(std::ptr::eq(Recorder::global(), Recorder::global()));
    }
}
