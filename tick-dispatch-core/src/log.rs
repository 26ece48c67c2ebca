//! Lifecycle logging with pattern-based filtering and in-memory storage
//!
//! [`LogSink`] keeps the most recent completion and removal reports in a ring
//! buffer ([`ActionLog`]) and can mirror them to `tracing`. Which action names
//! are kept is controlled by glob patterns in a [`LifecycleFilter`].
//!
//! # Example
//!
//! ```
//! use tick_dispatch_core::log::{ActionLogConfig, LifecycleFilter, LogSink};
//! use tick_dispatch_core::ActionSink;
//!
//! let config = ActionLogConfig::new(16, LifecycleFilter::new(None, Some("Fade*")));
//! let mut sink = LogSink::new(config);
//!
//! sink.completed("FadeIn", "intro");
//! sink.completed("ShowTitle", "intro");
//!
//! let names: Vec<_> = sink.log().recent(10).map(|e| e.action.as_str()).collect();
//! assert_eq!(names, vec!["ShowTitle"]);
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::sink::ActionSink;

/// Glob filter over action names.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `Fade*` matches FadeIn, FadeOut, etc.
/// - `*Delay` matches StartDelay, Delay, etc.
/// - `Delegate` matches only Delegate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleFilter {
    /// If non-empty, only log actions matching these patterns
    pub include: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude: Vec<String>,
}

impl Default for LifecycleFilter {
    fn default() -> Self {
        Self::log_all()
    }
}

impl LifecycleFilter {
    /// Create a filter from comma-separated pattern strings.
    ///
    /// ```
    /// use tick_dispatch_core::log::LifecycleFilter;
    ///
    /// let filter = LifecycleFilter::new(Some("Fade*,Title"), Some("FadeOut"));
    /// assert!(filter.should_log("FadeIn"));
    /// assert!(filter.should_log("Title"));
    /// assert!(!filter.should_log("FadeOut"));
    /// assert!(!filter.should_log("Delay"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: include.map(split_patterns).unwrap_or_default(),
            exclude: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    /// Filter with no patterns; every name passes.
    pub fn log_all() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Check whether an action name passes the include and exclude patterns.
    pub fn should_log(&self, action: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| glob_match(p, action)) {
            return false;
        }

        !self.exclude.iter().any(|p| glob_match(p, action))
    }
}

fn split_patterns(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// What happened to a top-level tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    /// Finished naturally during a tick
    Completed,
    /// Force-completed through `remove_action`
    Removed,
}

/// An entry in the lifecycle log
#[derive(Debug, Clone)]
pub struct LifecycleEntry {
    pub action: String,
    /// Name of the runner that retired the tree
    pub owner: String,
    /// Caller-assigned id; only known for removals
    pub id: Option<i32>,
    pub kind: LifecycleKind,
    /// Monotonic sequence number, survives ring-buffer eviction
    pub sequence: u64,
    pub timestamp: Instant,
}

impl LifecycleEntry {
    /// Time since this entry was logged
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Configuration for the lifecycle ring buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    pub filter: LifecycleFilter,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: LifecycleFilter::default(),
        }
    }
}

impl ActionLogConfig {
    /// Create with custom capacity and no filtering
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn new(capacity: usize, filter: LifecycleFilter) -> Self {
        Self { capacity, filter }
    }
}

/// In-memory ring buffer of recent lifecycle reports.
///
/// Older entries are discarded once capacity is reached.
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<LifecycleEntry>,
    config: ActionLogConfig,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(ActionLogConfig::default())
    }
}

impl ActionLog {
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record a report if it passes the filter.
    ///
    /// Returns the entry if it was stored, `None` if filtered out.
    pub fn record(
        &mut self,
        action: &str,
        owner: &str,
        id: Option<i32>,
        kind: LifecycleKind,
    ) -> Option<&LifecycleEntry> {
        if self.config.capacity == 0 || !self.config.filter.should_log(action) {
            return None;
        }

        let entry = LifecycleEntry {
            action: action.to_string(),
            owner: owner.to_string(),
            id,
            kind,
            sequence: self.next_sequence,
            timestamp: Instant::now(),
        };
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }

        self.entries.push_back(entry);
        self.entries.back()
    }

    /// All entries (oldest first)
    pub fn entries(&self) -> impl Iterator<Item = &LifecycleEntry> {
        self.entries.iter()
    }

    /// Entries in reverse order (newest first)
    pub fn entries_rev(&self) -> impl Iterator<Item = &LifecycleEntry> {
        self.entries.iter().rev()
    }

    /// The most recent N entries (newest first)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &LifecycleEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn config(&self) -> &ActionLogConfig {
        &self.config
    }
}

/// Sink that stores reports in an [`ActionLog`], optionally mirroring them
/// to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    log: ActionLog,
    tracing: bool,
}

impl LogSink {
    /// Storage only.
    pub fn new(config: ActionLogConfig) -> Self {
        Self {
            log: ActionLog::new(config),
            tracing: false,
        }
    }

    /// Also emit a `tracing` event for every stored entry.
    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ActionLog {
        &mut self.log
    }
}

impl ActionSink for LogSink {
    fn completed(&mut self, action: &str, owner: &str) {
        let stored = self
            .log
            .record(action, owner, None, LifecycleKind::Completed)
            .is_some();
        if stored && self.tracing {
            tracing::debug!(action = %action, owner = %owner, "Action completed");
        }
    }

    fn removed(&mut self, action: &str, id: i32, owner: &str) {
        let stored = self
            .log
            .record(action, owner, Some(id), LifecycleKind::Removed)
            .is_some();
        if stored && self.tracing {
            tracing::info!(action = %action, id = id, owner = %owner, "Action removed");
        }
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some(&'*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                // backtrack: let the last star swallow one more character
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
