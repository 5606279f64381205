//! Timing events and their line-delimited JSON form
//!
//! Each completed call produces one `TimingEvent`. Events are serialized to a
//! single JSON line (`{"function":"<module>.<name>","time_ns":<int>}`) before
//! they reach the recorder, so the buffer can be inspected as plain text and
//! the report only ever deals with lines.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single measured call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingEvent {
    /// Function identity, `"<module>.<qualified name>"`
    pub function: String,
    /// Elapsed wall-clock time in nanoseconds (monotonic clock)
    pub time_ns: u64,
}

impl TimingEvent {
    /// Create an event from an identity and a raw nanosecond count
    pub fn new(function: impl Into<String>, time_ns: u64) -> Self {
        Self {
            function: function.into(),
            time_ns,
        }
    }

    /// Create an event from a measured `Duration`
    ///
    /// Durations beyond `u64::MAX` nanoseconds (~584 years) clamp.
    pub fn from_duration(function: impl Into<String>, elapsed: Duration) -> Self {
        let time_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        Self::new(function, time_ns)
    }

    /// Serialize to one line of JSON (no trailing newline)
    pub fn to_line(&self) -> String {
        // A struct of a String and a u64 always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse one buffer line
    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim_end_matches(|c: char| c == '\r' || c == '\n'))
    }
}

/// Identity of the function `func` refers to
///
/// Taken from the defining path of the function item, not from where it is
/// wrapped, so wrapping the same function from two places gives one
/// identity while same-named functions in different scopes stay apart.
pub fn function_identity<F>(_func: &F) -> String {
    identity_from_type_name(std::any::type_name::<F>())
}

/// Turn a Rust type path into `"<module>.<qualified name>"`
///
/// The qualified name starts at the first type segment (capitalized, e.g.
/// `UserRepo::load`) or is the last segment for free functions. Functions
/// nested inside other functions keep the enclosing function in the module
/// part: `app::run::helper` becomes `app::run.helper`.
pub fn identity_from_type_name(type_name: &str) -> String {
    // Generic arguments may contain `::` of their own; split only the base path.
    let base_end = type_name.find('<').unwrap_or(type_name.len());
    let (base, generics) = type_name.split_at(base_end);

    let segments: Vec<&str> = base.split("::").collect();
    let qualified_start = segments
        .iter()
        .position(|s| s.starts_with(|c: char| c.is_ascii_uppercase()))
        .filter(|&i| i > 0)
        .unwrap_or(segments.len() - 1);

    if qualified_start == 0 {
        return format!("{}{}", base, generics);
    }
    format!(
        "{}.{}{}",
        segments[..qualified_start].join("::"),
        segments[qualified_start..].join("::"),
        generics
    )
}
