//! Top-level orchestrator over independent action trees
//!
//! A [`Runner`] owns a running set and a pending-start queue. Each call to
//! [`Runner::on_update`] advances every started tree, retires the finished
//! ones (reporting them to the sink) and finally promotes queued trees, which
//! are started but not advanced until the next tick.
//!
//! # Example
//!
//! ```
//! use tick_dispatch_core::testing::RecordingSink;
//! use tick_dispatch_core::{share, Action, DelayAction, Runner};
//!
//! let sink = RecordingSink::new();
//! let mut runner = Runner::with_sink("intro", sink.clone());
//!
//! let delay = share(DelayAction::new(0.5));
//! runner.run_action(delay.clone());
//!
//! runner.on_update(0.25);
//! runner.on_update(0.25);
//! assert!(delay.borrow().is_all_done());
//! assert!(runner.is_idle());
//! assert_eq!(sink.completed_names(), vec!["Delay"]);
//! ```

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::action::ActionRef;
use crate::config::RunnerConfig;
use crate::log::LogSink;
use crate::set::{ActionQueue, ActionSet};
use crate::sink::{ActionSink, TracingSink};

/// Runs independent action trees, one tick at a time.
///
/// Every promoted tree is started inside a child of the runner's root
/// [`CancellationToken`]. [`release`](Runner::release),
/// [`run_action`](Runner::run_action) and dropping the runner cancel the
/// root, which stops any suspended work (such as a stagger) in the discarded
/// trees.
#[derive(Debug)]
pub struct Runner<K: ActionSink = TracingSink> {
    name: String,
    running: ActionSet,
    queued: ActionQueue,
    sink: K,
    root: CancellationToken,
    ticks: u64,
}

impl Runner<TracingSink> {
    /// Create a runner that reports through `tracing`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sink(name, TracingSink::new())
    }
}

impl Runner<LogSink> {
    /// Create a runner whose reports go to an in-memory lifecycle log.
    pub fn from_config(config: &RunnerConfig) -> Self {
        let sink = LogSink::new(config.log.clone()).with_tracing(config.tracing);
        Self::with_sink(config.name.clone(), sink)
    }
}

impl<K: ActionSink> Runner<K> {
    /// Create a runner with a custom sink.
    pub fn with_sink(name: impl Into<String>, sink: K) -> Self {
        Self {
            name: name.into(),
            running: ActionSet::new(),
            queued: ActionQueue::new(),
            sink,
            root: CancellationToken::new(),
            ticks: 0,
        }
    }

    /// Discard every running and queued tree, then start `action` as the
    /// only running tree.
    pub fn run_action(&mut self, action: ActionRef) {
        self.hard_reset();
        debug!(runner = %self.name, action = %action.borrow().name(), "run action");
        self.launch(&action);
        self.running.insert(action);
    }

    /// Queue a tree to start at the end of the next tick.
    ///
    /// Returns `false` if it is already queued or running.
    pub fn queue_action(&mut self, action: ActionRef) -> bool {
        if self.running.contains(&action) {
            return false;
        }
        let queued = self.queued.push(action);
        if queued {
            trace!(runner = %self.name, queued = self.queued.len(), "action queued");
        }
        queued
    }

    /// Handle to the pending-start queue, for use inside action callbacks.
    pub fn queue(&self) -> ActionQueue {
        self.queued.clone()
    }

    /// Force-complete and drop the first tree with `id`.
    ///
    /// Running trees are searched before queued ones; at most one tree is
    /// removed per call, along with any queued copy of the same handle.
    /// Returns `false` when nothing matched.
    pub fn remove_action(&mut self, id: i32) -> bool {
        let matches = |action: &ActionRef| action.borrow().id() == id;
        let Some(action) = self
            .running
            .remove_first(matches)
            .or_else(|| self.queued.remove_first(matches))
        else {
            return false;
        };
        self.queued.remove(&action);

        action.borrow_mut().mark_as_all_done();
        action.borrow().core().cancellation().cancel();

        let name = action.borrow().name().to_string();
        self.sink.removed(&name, id, &self.name);
        true
    }

    /// Advance every started tree by `dt`, retire finished trees, then
    /// promote the queue.
    pub fn on_update(&mut self, dt: f32) {
        self.ticks += 1;

        let mut finished = Vec::new();
        for action in self.running.snapshot() {
            if action.borrow().is_started() {
                action.borrow_mut().run_update(dt);
            }
            if action.borrow().is_all_done() {
                finished.push(action);
            }
        }

        for action in finished {
            self.running.remove(&action);
            let name = action.borrow().name().to_string();
            self.sink.completed(&name, &self.name);
        }

        for action in self.queued.drain() {
            if self.running.contains(&action) {
                continue;
            }
            self.launch(&action);
            self.running.insert(action);
        }
    }

    /// Discard every tree without running completion hooks.
    pub fn release(&mut self) {
        debug!(
            runner = %self.name,
            running = self.running.len(),
            queued = self.queued.len(),
            "release"
        );
        self.hard_reset();
    }

    fn hard_reset(&mut self) {
        self.root.cancel();
        self.root = CancellationToken::new();
        self.running.clear();
        self.queued.clear();
    }

    fn launch(&self, action: &ActionRef) {
        let mut action = action.borrow_mut();
        action
            .core_mut()
            .bind_cancellation(self.root.child_token());
        action.run_start();
    }

    /// Owner name passed to the sink.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this exact tree is in the running set.
    pub fn is_running(&self, action: &ActionRef) -> bool {
        self.running.contains(action)
    }

    /// Whether this exact tree is waiting to start.
    pub fn is_queued(&self, action: &ActionRef) -> bool {
        self.queued.contains(action)
    }

    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Nothing running and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && self.queued.is_empty()
    }

    /// Number of `on_update` calls so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }
}

impl<K: ActionSink> Drop for Runner<K> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
