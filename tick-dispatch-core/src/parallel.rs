//! Parallel composite: every child is advanced within the same tick

use crate::action::{start_child, Action, ActionCore, ActionRef, ActionState};
use crate::set::ActionSet;

/// Starts all children together and completes when the last one finishes.
///
/// "Parallel" is interleaving within one tick; children are advanced in
/// insertion order on the caller's thread.
pub struct ParallelAction {
    core: ActionCore,
    actions: ActionSet,
}

impl Default for ParallelAction {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelAction {
    /// Create an empty parallel group.
    pub fn new() -> Self {
        Self {
            core: ActionCore::new("Parallel"),
            actions: ActionSet::new(),
        }
    }

    /// Add a child. Duplicates within this group are ignored.
    pub fn add(&mut self, action: ActionRef) -> bool {
        self.actions.insert(action)
    }

    /// Children still owned by the group.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the group owns no children.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn finish_if_settled(&mut self) {
        if self.actions.iter().all(|a| a.borrow().is_all_done()) {
            self.mark_as_done();
        }
    }
}

impl ActionState for ParallelAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }
}

impl Action for ParallelAction {
    fn on_start(&mut self) {
        self.set_manual();
        for action in self.actions.snapshot() {
            start_child(&self.core, &action);
        }
        self.finish_if_settled();
    }

    fn on_update(&mut self, dt: f32) {
        for action in self.actions.snapshot() {
            if !action.borrow().is_all_done() {
                action.borrow_mut().run_update(dt);
            }
        }
        self.finish_if_settled();
    }

    fn on_done(&mut self) {
        self.actions.clear();
    }

    fn owned_actions(&self) -> Vec<ActionRef> {
        self.actions
            .iter()
            .filter(|a| a.borrow().is_started())
            .cloned()
            .collect()
    }
}
