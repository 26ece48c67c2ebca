//! Completion and removal reporting for top-level action trees
//!
//! A [`Runner`](crate::Runner) reports every retired tree to its sink. Sinks
//! are side-effect only; nothing they do feeds back into scheduling.

/// Receives lifecycle reports from a runner.
pub trait ActionSink {
    /// A top-level tree finished naturally.
    fn completed(&mut self, action: &str, owner: &str);

    /// A tree was force-completed through `remove_action`.
    fn removed(&mut self, action: &str, id: i32, owner: &str);
}

/// A sink that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ActionSink for NoopSink {
    fn completed(&mut self, _action: &str, _owner: &str) {}
    fn removed(&mut self, _action: &str, _id: i32, _owner: &str) {}
}

/// Sink that reports through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    /// Whether to log natural completions
    pub log_completed: bool,
    /// Whether to log forced removals
    pub log_removed: bool,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingSink {
    /// Log both completions and removals.
    pub fn new() -> Self {
        Self {
            log_completed: true,
            log_removed: true,
        }
    }

    /// Log removals only.
    pub fn removals_only() -> Self {
        Self {
            log_completed: false,
            log_removed: true,
        }
    }
}

impl ActionSink for TracingSink {
    fn completed(&mut self, action: &str, owner: &str) {
        if self.log_completed {
            tracing::debug!(action = %action, owner = %owner, "Action completed");
        }
    }

    fn removed(&mut self, action: &str, id: i32, owner: &str) {
        if self.log_removed {
            tracing::info!(action = %action, id = id, owner = %owner, "Action removed");
        }
    }
}

/// Fan reports out to several sinks, in insertion order.
pub struct ComposedSink {
    sinks: Vec<Box<dyn ActionSink>>,
}

impl std::fmt::Debug for ComposedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedSink")
            .field("sinks_count", &self.sinks.len())
            .finish()
    }
}

impl Default for ComposedSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposedSink {
    /// Create an empty composition.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink to the composition.
    pub fn add<K: ActionSink + 'static>(&mut self, sink: K) {
        self.sinks.push(Box::new(sink));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with<K: ActionSink + 'static>(mut self, sink: K) -> Self {
        self.add(sink);
        self
    }

    /// Number of composed sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are composed.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ActionSink for ComposedSink {
    fn completed(&mut self, action: &str, owner: &str) {
        for sink in &mut self.sinks {
            sink.completed(action, owner);
        }
    }

    fn removed(&mut self, action: &str, id: i32, owner: &str) {
        for sink in &mut self.sinks {
            sink.removed(action, id, owner);
        }
    }
}
