//! Test utilities for tick-dispatch action trees
//!
//! - [`Journal`]: shared, ordered record of hook events
//! - [`ProbeAction`]: timed action that writes its hooks to a journal
//! - [`RecordingSink`]: [`ActionSink`] that keeps every report for assertions
//! - [`tick`]: advance a handle `n` times with the same delta
//! - Assertion macros over recorded sink events
//!
//! # Example
//!
//! ```
//! use tick_dispatch_core::testing::{tick, Journal, ProbeAction};
//! use tick_dispatch_core::{share, Action, ParallelAction};
//!
//! let journal = Journal::new();
//! let mut parallel = ParallelAction::new();
//! parallel.add(share(ProbeAction::new("Fade", 1.0, &journal)));
//! parallel.add(share(ProbeAction::new("Slide", 0.5, &journal)));
//! let parallel = share(parallel);
//!
//! parallel.borrow_mut().run_start();
//! tick(&parallel, 0.5, 2);
//!
//! assert!(parallel.borrow().is_all_done());
//! assert!(journal.happened_before("Slide:done", "Fade:done"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{Action, ActionCore, ActionState};
use crate::sink::ActionSink;

/// Advance `action` `n` times with `dt`.
pub fn tick<A: Action + ?Sized>(action: &RefCell<A>, dt: f32, n: usize) {
    for _ in 0..n {
        action.borrow_mut().run_update(dt);
    }
}

/// Ordered log of events, shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    /// Every event recorded so far, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// How many times `event` was recorded.
    pub fn count(&self, event: &str) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }

    /// Whether the first `earlier` precedes the first `later`.
    ///
    /// False when either event is missing.
    pub fn happened_before(&self, earlier: &str, later: &str) -> bool {
        let events = self.events.borrow();
        let first = events.iter().position(|e| e == earlier);
        let second = events.iter().position(|e| e == later);
        matches!((first, second), (Some(a), Some(b)) if a < b)
    }

    /// Forget every event.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// A timed action that records `Name:start`, `Name:update` and `Name:done`.
pub struct ProbeAction {
    core: ActionCore,
    seconds: f32,
    journal: Journal,
    on_tick: Option<Box<dyn FnMut()>>,
}

impl ProbeAction {
    /// Create a probe that completes after `seconds` of tick time.
    pub fn new(name: &str, seconds: f32, journal: &Journal) -> Self {
        Self {
            core: ActionCore::new(name),
            seconds,
            journal: journal.clone(),
            on_tick: None,
        }
    }

    /// Run `f` on every update hook, after the event is recorded.
    pub fn on_tick(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_tick = Some(Box::new(f));
        self
    }

    fn record(&self, hook: &str) {
        self.journal.record(format!("{}:{}", self.core.name(), hook));
    }
}

impl ActionState for ProbeAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }
}

impl Action for ProbeAction {
    fn on_start(&mut self) {
        self.set_duration(self.seconds);
        self.record("start");
    }

    fn on_update(&mut self, _dt: f32) {
        self.record("update");
        if let Some(f) = self.on_tick.as_mut() {
            f();
        }
    }

    fn on_done(&mut self) {
        self.record("done");
    }
}

/// A report received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Completed { action: String, owner: String },
    Removed { action: String, id: i32, owner: String },
}

/// Sink that stores every report. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far, oldest first.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    /// Take all reports, leaving the sink empty.
    pub fn drain(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Names of naturally completed trees, in report order.
    pub fn completed_names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Completed { action, .. } => Some(action.clone()),
                SinkEvent::Removed { .. } => None,
            })
            .collect()
    }
}

impl ActionSink for RecordingSink {
    fn completed(&mut self, action: &str, owner: &str) {
        self.events.borrow_mut().push(SinkEvent::Completed {
            action: action.to_string(),
            owner: owner.to_string(),
        });
    }

    fn removed(&mut self, action: &str, id: i32, owner: &str) {
        self.events.borrow_mut().push(SinkEvent::Removed {
            action: action.to_string(),
            id,
            owner: owner.to_string(),
        });
    }
}

/// Pause the tokio clock. Requires a current-thread runtime.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume the tokio clock.
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Advance the paused tokio clock by `duration`.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: std::time::Duration) {
    tokio::time::advance(duration).await;
}

/// Assert that a report matching a pattern was recorded.
///
/// # Example
///
/// ```
/// use tick_dispatch_core::assert_reported;
/// use tick_dispatch_core::testing::{RecordingSink, SinkEvent};
/// use tick_dispatch_core::ActionSink;
///
/// let mut sink = RecordingSink::new();
/// sink.removed("Intro", 7, "main");
///
/// let events = sink.events();
/// assert_reported!(events, SinkEvent::Removed { id: 7, .. });
/// ```
#[macro_export]
macro_rules! assert_reported {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $events.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected report matching `{}`, but got: {:?}",
            stringify!($pattern),
            $events
        );
    };
}

/// Assert that no report matching a pattern was recorded.
#[macro_export]
macro_rules! assert_not_reported {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$events.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected NO report matching `{}`, but it was: {:?}",
            stringify!($pattern),
            $events
        );
    };
}

/// Count reports matching a pattern.
#[macro_export]
macro_rules! count_reported {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        $events.iter().filter(|e| matches!(e, $pattern $(if $guard)?)).count()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::share;

    #[test]
    fn test_journal_ordering() {
        let journal = Journal::new();
        let clone = journal.clone();
        journal.record("a");
        clone.record("b");
        journal.record("a");

        assert_eq!(journal.entries(), vec!["a", "b", "a"]);
        assert_eq!(journal.count("a"), 2);
        assert!(journal.happened_before("a", "b"));
        assert!(!journal.happened_before("b", "a"));
        assert!(!journal.happened_before("a", "missing"));

        clone.clear();
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_probe_records_hooks() {
        let journal = Journal::new();
        let ticks = Rc::new(RefCell::new(0));
        let counter = ticks.clone();
        let probe = share(
            ProbeAction::new("P", 0.5, &journal).on_tick(move || *counter.borrow_mut() += 1),
        );

        probe.borrow_mut().run_start();
        tick(&probe, 0.25, 3);

        assert_eq!(journal.entries(), vec!["P:start", "P:update", "P:done"]);
        assert_eq!(*ticks.borrow(), 1);
    }

    #[test]
    fn test_recording_sink_macros() {
        let mut sink = RecordingSink::new();
        sink.completed("A", "main");
        sink.completed("B", "main");
        sink.removed("C", 3, "main");

        let events = sink.events();
        assert_reported!(events, SinkEvent::Completed { action, .. } if action == "B");
        assert_not_reported!(events, SinkEvent::Removed { id: 4, .. });
        assert_eq!(count_reported!(events, SinkEvent::Completed { .. }), 2);
        assert_eq!(sink.completed_names(), vec!["A", "B"]);

        assert_eq!(sink.drain().len(), 3);
        assert!(sink.events().is_empty());
    }
}
