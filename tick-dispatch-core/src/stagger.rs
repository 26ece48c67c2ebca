//! Parallel composite whose children start one interval apart
//!
//! The wait between starts is a suspended `StaggerTask` resumed by the
//! owning tick, never a blocking sleep. The task carries the action's
//! cancellation token and checks it before every resumption, so a tree torn
//! down by its runner never starts further children.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::action::{start_child, Action, ActionCore, ActionRef, ActionState};
use crate::set::ActionSet;

/// Suspended continuation that starts the remaining children.
#[derive(Debug)]
struct StaggerTask {
    token: CancellationToken,
    /// Tick time left before the next child starts.
    wait: f32,
}

/// Like [`ParallelAction`](crate::ParallelAction), but child `n + 1` starts
/// `interval` seconds after child `n`.
///
/// Started children are advanced every tick; a child started during a tick is
/// first advanced on the next one. Children that finish before later
/// siblings start do not hold up the stagger.
pub struct StaggeredParallelAction {
    core: ActionCore,
    actions: ActionSet,
    interval: f32,
    launched: usize,
    task: Option<StaggerTask>,
}

impl StaggeredParallelAction {
    /// Create an empty group that staggers starts by `interval` seconds.
    pub fn new(interval: f32) -> Self {
        Self {
            core: ActionCore::new("StaggeredParallel"),
            actions: ActionSet::new(),
            interval,
            launched: 0,
            task: None,
        }
    }

    /// Add a child. Duplicates within this group are ignored.
    pub fn add(&mut self, action: ActionRef) -> bool {
        self.actions.insert(action)
    }

    /// Seconds between consecutive child starts.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Number of children started so far.
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Whether children are still waiting to start.
    pub fn is_staggering(&self) -> bool {
        self.task.is_some()
    }

    /// Resume the suspended task with `dt` of tick time.
    fn resume(&mut self, dt: f32) {
        let Some(task) = self.task.as_mut() else {
            return;
        };
        if task.token.is_cancelled() {
            debug!(action = %self.core.name(), launched = self.launched, "stagger cancelled");
            self.task = None;
            return;
        }

        let children = self.actions.snapshot();
        task.wait -= dt;
        while task.wait <= 0.0 {
            let Some(child) = children.get(self.launched) else {
                break;
            };
            start_child(&self.core, child);
            self.launched += 1;
            task.wait += self.interval.max(0.0);
        }

        if self.launched >= children.len() {
            self.task = None;
        }
    }

    fn finish_if_settled(&mut self) {
        if self.task.is_some() || self.launched < self.actions.len() {
            return;
        }
        if self.actions.iter().all(|a| a.borrow().is_all_done()) {
            self.mark_as_done();
        }
    }
}

impl ActionState for StaggeredParallelAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }
}

impl Action for StaggeredParallelAction {
    fn on_start(&mut self) {
        self.set_manual();
        self.launched = 0;
        self.task = None;

        if self.actions.is_empty() {
            self.mark_as_done();
            return;
        }

        self.task = Some(StaggerTask {
            token: self.core.cancellation().clone(),
            wait: 0.0,
        });
        self.resume(0.0);
        self.finish_if_settled();
    }

    fn on_update(&mut self, dt: f32) {
        for action in self.owned_actions() {
            if !action.borrow().is_all_done() {
                action.borrow_mut().run_update(dt);
            }
        }
        self.resume(dt);
        self.finish_if_settled();
    }

    fn on_done(&mut self) {
        self.actions.clear();
        self.launched = 0;
        self.task = None;
    }

    fn owned_actions(&self) -> Vec<ActionRef> {
        self.actions.iter().take(self.launched).cloned().collect()
    }
}
