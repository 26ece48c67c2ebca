//! Action contract: lifecycle state, hooks and the shared handle type
//!
//! Every schedulable unit embeds an [`ActionCore`] and implements [`Action`].
//! The lifecycle operations (`run_start`, `run_update`, `mark_as_done`,
//! `mark_as_all_done`) are provided by the trait; implementors only override
//! the hooks they need.
//!
//! # Example
//!
//! ```
//! use tick_dispatch_core::{share, Action, ActionCore, ActionState};
//!
//! struct Blink {
//!     core: ActionCore,
//!     blinks: u32,
//! }
//!
//! impl ActionState for Blink {
//!     fn core(&self) -> &ActionCore {
//!         &self.core
//!     }
//!     fn core_mut(&mut self) -> &mut ActionCore {
//!         &mut self.core
//!     }
//! }
//!
//! impl Action for Blink {
//!     fn on_start(&mut self) {
//!         self.set_duration(0.5);
//!     }
//!     fn on_update(&mut self, _dt: f32) {
//!         self.blinks += 1;
//!     }
//! }
//!
//! let blink = share(Blink { core: ActionCore::new("Blink"), blinks: 0 });
//! blink.borrow_mut().run_start();
//! blink.borrow_mut().run_update(0.25);
//! assert!(!blink.borrow().is_all_done());
//! blink.borrow_mut().run_update(0.25);
//! assert!(blink.borrow().is_all_done());
//! assert_eq!(blink.borrow().blinks, 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;
use tokio_util::sync::CancellationToken;

use crate::set::ActionSet;

/// Duration sentinel for actions that never complete by elapsed time.
///
/// Any duration at or below it is treated the same way; the owner must call
/// [`Action::mark_as_done`] explicitly. Durations between `-1` and `0` are
/// already due and complete on the first update.
pub const MANUAL_DURATION: f32 = -1.0;

/// Shared handle to a type-erased action.
///
/// Identity (for duplicate detection in [`ActionSet`]) is the address of the
/// shared allocation, so two clones of one handle are the same action.
pub type ActionRef = Rc<RefCell<dyn Action>>;

/// Wrap an action into a typed shared handle.
///
/// The returned `Rc<RefCell<A>>` coerces to [`ActionRef`] wherever one is
/// expected, while the caller keeps typed access for inspection.
pub fn share<A: Action + 'static>(action: A) -> Rc<RefCell<A>> {
    Rc::new(RefCell::new(action))
}

bitflags! {
    /// Lifecycle progress of an action.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lifecycle: u8 {
        /// `run_start` has been called since the last reset.
        const STARTED = 1;
        /// The action's own timer or work has finished.
        const SELF_DONE = 1 << 1;
        /// The action and every child have finished.
        const ALL_DONE = 1 << 2;
    }
}

/// State shared by every action kind.
#[derive(Debug)]
pub struct ActionCore {
    id: i32,
    name: String,
    duration: f32,
    elapsed: f32,
    flags: Lifecycle,
    children: ActionSet,
    cancel: CancellationToken,
}

impl ActionCore {
    /// Create a fresh core with id `0` and a zero duration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            duration: 0.0,
            elapsed: 0.0,
            flags: Lifecycle::empty(),
            children: ActionSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Caller-assigned identifier. Not required to be unique.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Set the identifier.
    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    /// Display name used in logs and sink reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Configured duration in seconds (`MANUAL_DURATION` or below means manual).
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Accumulated tick time since the last reset.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Current lifecycle flags.
    pub fn lifecycle(&self) -> Lifecycle {
        self.flags
    }

    /// Whether the action completes only through `mark_as_done`.
    pub fn is_manual(&self) -> bool {
        self.duration <= MANUAL_DURATION
    }

    /// Sub-actions added through [`Action::add_sub_action`].
    pub fn children(&self) -> &ActionSet {
        &self.children
    }

    /// Token cancelled when the owning runner tears this tree down.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Attach this action to an owner's cancellation scope.
    pub fn bind_cancellation(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    fn is_due(&self) -> bool {
        !self.is_manual() && self.elapsed >= self.duration
    }

    fn children_done(&self) -> bool {
        self.children.iter().all(|c| c.borrow().is_all_done())
    }

    fn reset(&mut self) {
        self.flags = Lifecycle::empty();
        self.elapsed = 0.0;
        self.children.clear();
    }
}

/// Access to the embedded [`ActionCore`].
///
/// Use `#[derive(ActionState)]` from `tick-dispatch-macros` to implement this
/// for structs with a `core` field.
pub trait ActionState {
    /// Shared lifecycle state.
    fn core(&self) -> &ActionCore;

    /// Mutable shared lifecycle state.
    fn core_mut(&mut self) -> &mut ActionCore;

    /// Builder: set the caller-assigned id.
    fn with_id(mut self, id: i32) -> Self
    where
        Self: Sized,
    {
        self.core_mut().set_id(id);
        self
    }

    /// Builder: set the display name.
    fn named(mut self, name: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().set_name(name);
        self
    }
}

/// A unit of schedulable work.
///
/// Hooks:
/// - [`on_start`](Action::on_start) runs at the end of `run_start`
/// - [`on_update`](Action::on_update) runs every tick until the action is self-done
/// - [`on_done`](Action::on_done) runs once, at the all-done transition
///
/// Forced and natural completion settle children before the parent's
/// `on_done`, so hooks always fire bottom-up.
pub trait Action: ActionState {
    /// Called after the lifecycle has been reset and marked started.
    fn on_start(&mut self) {}

    /// Called once per tick while the action is not yet self-done.
    fn on_update(&mut self, _dt: f32) {}

    /// Called exactly once when the action becomes all-done.
    fn on_done(&mut self) {}

    /// Started children held outside the shared sub-action set.
    ///
    /// Composites return their active children here so forced completion can
    /// reach them.
    fn owned_actions(&self) -> Vec<ActionRef> {
        Vec::new()
    }

    /// Caller-assigned identifier.
    fn id(&self) -> i32 {
        self.core().id
    }

    /// Display name.
    fn name(&self) -> &str {
        &self.core().name
    }

    /// Whether `run_start` was called since the last reset.
    fn is_started(&self) -> bool {
        self.core().flags.contains(Lifecycle::STARTED)
    }

    /// Whether the action's own work has finished.
    fn is_self_done(&self) -> bool {
        self.core().flags.contains(Lifecycle::SELF_DONE)
    }

    /// Whether the action and all of its children have finished.
    fn is_all_done(&self) -> bool {
        self.core().flags.contains(Lifecycle::ALL_DONE)
    }

    /// Configure the timer. Negative values mean manual completion.
    fn set_duration(&mut self, seconds: f32) {
        self.core_mut().duration = seconds;
    }

    /// Shorthand for `set_duration(MANUAL_DURATION)`.
    fn set_manual(&mut self) {
        self.set_duration(MANUAL_DURATION);
    }

    /// Clear flags, elapsed time and sub-actions without starting.
    fn reset(&mut self) {
        self.core_mut().reset();
    }

    /// Re-arm and start the action.
    ///
    /// Safe to call on a finished action; it runs again from scratch.
    fn run_start(&mut self) {
        self.core_mut().reset();
        self.core_mut().flags.insert(Lifecycle::STARTED);
        self.on_start();
    }

    /// Advance the action and its sub-actions by `dt`.
    fn run_update(&mut self, dt: f32) {
        if self.is_all_done() {
            return;
        }

        self.core_mut().elapsed += dt;

        if !self.is_self_done() {
            if self.core().is_due() {
                self.mark_as_done();
            } else {
                self.on_update(dt);
            }
        }

        // mark_as_done may already have cascaded
        if self.is_all_done() || self.core().children.is_empty() {
            return;
        }

        for child in self.core().children.snapshot() {
            child.borrow_mut().run_update(dt);
        }

        if self.is_self_done() && self.core().children_done() {
            self.mark_as_all_done();
        }
    }

    /// Mark the action's own work as finished. Idempotent.
    ///
    /// Cascades to all-done when every sub-action is already all-done.
    fn mark_as_done(&mut self) {
        if self.is_self_done() {
            return;
        }
        self.core_mut().flags.insert(Lifecycle::SELF_DONE);
        if self.core().children_done() {
            self.mark_as_all_done();
        }
    }

    /// Force the whole subtree to completion. Idempotent.
    ///
    /// Started children are completed first, then `on_done` runs.
    fn mark_as_all_done(&mut self) {
        if self.is_all_done() {
            return;
        }
        self.core_mut()
            .flags
            .insert(Lifecycle::SELF_DONE | Lifecycle::ALL_DONE);

        let mut children = self.core().children.snapshot();
        children.extend(self.owned_actions());
        for child in children {
            child.borrow_mut().mark_as_all_done();
        }

        self.on_done();
    }

    /// Add and immediately start a sub-action.
    ///
    /// Ignored (returns `false`) when the child is already present or this
    /// action is all-done. `run_start` clears sub-actions, so children are
    /// normally added from `on_start` or while running.
    fn add_sub_action(&mut self, child: ActionRef) -> bool {
        if self.is_all_done() || self.core().children.contains(&child) {
            return false;
        }
        start_child(self.core(), &child);
        self.core_mut().children.insert(child)
    }
}

/// Start `child` inside `parent`'s cancellation scope.
///
/// Composite kinds call this when promoting a child to active.
pub fn start_child(parent: &ActionCore, child: &ActionRef) {
    let mut child = child.borrow_mut();
    child
        .core_mut()
        .bind_cancellation(parent.cancellation().child_token());
    child.run_start();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Journal, ProbeAction};

    struct Bare {
        core: ActionCore,
    }

    impl ActionState for Bare {
        fn core(&self) -> &ActionCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ActionCore {
            &mut self.core
        }
    }

    impl Action for Bare {}

    #[test]
    fn test_fresh_core() {
        let core = ActionCore::new("Fresh");
        assert_eq!(core.id(), 0);
        assert_eq!(core.name(), "Fresh");
        assert_eq!(core.duration(), 0.0);
        assert_eq!(core.lifecycle(), Lifecycle::empty());
        assert!(!core.is_manual());
    }

    #[test]
    fn test_builders() {
        let bare = Bare {
            core: ActionCore::new("Bare"),
        }
        .with_id(7)
        .named("Renamed");
        assert_eq!(bare.id(), 7);
        assert_eq!(bare.name(), "Renamed");
    }

    #[test]
    fn test_zero_duration_completes_on_first_update() {
        let mut bare = Bare {
            core: ActionCore::new("Bare"),
        };
        bare.run_start();
        assert!(bare.is_started());
        assert!(!bare.is_self_done());

        bare.run_update(0.0);
        assert!(bare.is_self_done());
        assert!(bare.is_all_done());
    }

    #[test]
    fn test_manual_duration_never_auto_completes() {
        let mut bare = Bare {
            core: ActionCore::new("Bare"),
        };
        bare.run_start();
        bare.set_manual();
        for _ in 0..100 {
            bare.run_update(1.0);
        }
        assert!(!bare.is_self_done());
        assert_eq!(bare.core().elapsed(), 100.0);

        bare.mark_as_done();
        assert!(bare.is_all_done());
    }

    #[test]
    fn test_small_negative_duration_is_due_immediately() {
        let mut bare = Bare {
            core: ActionCore::new("Bare"),
        };
        bare.run_start();
        bare.set_duration(-0.5);
        assert!(!bare.core().is_manual());

        bare.run_update(0.0);
        assert!(bare.is_all_done());

        bare.run_start();
        bare.set_duration(-2.0);
        assert!(bare.core().is_manual());
        bare.run_update(1.0);
        assert!(!bare.is_self_done());
    }

    #[test]
    fn test_timer_completes_when_elapsed_reaches_duration() {
        let journal = Journal::new();
        let probe = share(ProbeAction::new("P", 1.0, &journal));
        probe.borrow_mut().run_start();

        probe.borrow_mut().run_update(0.25);
        probe.borrow_mut().run_update(0.5);
        assert!(!probe.borrow().is_self_done());

        probe.borrow_mut().run_update(0.25);
        assert!(probe.borrow().is_all_done());
        assert_eq!(
            journal.entries(),
            vec!["P:start", "P:update", "P:update", "P:done"]
        );
    }

    #[test]
    fn test_done_hook_runs_once() {
        let journal = Journal::new();
        let probe = share(ProbeAction::new("P", 0.0, &journal));
        probe.borrow_mut().run_start();
        probe.borrow_mut().run_update(1.0);
        probe.borrow_mut().mark_as_all_done();
        probe.borrow_mut().mark_as_done();
        probe.borrow_mut().run_update(1.0);

        assert_eq!(journal.count("P:done"), 1);
    }

    #[test]
    fn test_parent_waits_for_sub_actions() {
        let journal = Journal::new();
        let parent = share(ProbeAction::new("Parent", 0.5, &journal));
        let child = share(ProbeAction::new("Child", 1.0, &journal));

        parent.borrow_mut().run_start();
        assert!(parent.borrow_mut().add_sub_action(child.clone()));
        assert!(child.borrow().is_started());

        parent.borrow_mut().run_update(0.5);
        assert!(parent.borrow().is_self_done());
        assert!(!parent.borrow().is_all_done());

        parent.borrow_mut().run_update(0.5);
        assert!(child.borrow().is_all_done());
        assert!(parent.borrow().is_all_done());
        assert!(journal.happened_before("Child:done", "Parent:done"));
    }

    #[test]
    fn test_duplicate_sub_action_ignored() {
        let journal = Journal::new();
        let parent = share(ProbeAction::new("Parent", 1.0, &journal));
        let child = share(ProbeAction::new("Child", 1.0, &journal));

        parent.borrow_mut().run_start();
        assert!(parent.borrow_mut().add_sub_action(child.clone()));
        assert!(!parent.borrow_mut().add_sub_action(child.clone()));
        assert_eq!(parent.borrow().core().children().len(), 1);
        assert_eq!(journal.count("Child:start"), 1);
    }

    #[test]
    fn test_sub_action_rejected_after_completion() {
        let journal = Journal::new();
        let parent = share(ProbeAction::new("Parent", 0.0, &journal));
        parent.borrow_mut().run_start();
        parent.borrow_mut().run_update(0.0);

        let child = share(ProbeAction::new("Child", 1.0, &journal));
        assert!(!parent.borrow_mut().add_sub_action(child.clone()));
        assert!(!child.borrow().is_started());
    }

    #[test]
    fn test_forced_completion_is_bottom_up() {
        let journal = Journal::new();
        let parent = share(ProbeAction::new("Parent", 5.0, &journal));
        let child = share(ProbeAction::new("Child", 5.0, &journal));

        parent.borrow_mut().run_start();
        parent.borrow_mut().add_sub_action(child.clone());
        parent.borrow_mut().mark_as_all_done();

        assert!(parent.borrow().is_all_done());
        assert!(child.borrow().is_all_done());
        assert_eq!(
            journal.entries(),
            vec!["Parent:start", "Child:start", "Child:done", "Parent:done"]
        );
    }

    #[test]
    fn test_run_start_rearms_finished_action() {
        let journal = Journal::new();
        let probe = share(ProbeAction::new("P", 1.0, &journal));

        probe.borrow_mut().run_start();
        probe.borrow_mut().run_update(1.0);
        assert!(probe.borrow().is_all_done());

        probe.borrow_mut().run_start();
        let lifecycle = probe.borrow().core().lifecycle();
        assert_eq!(lifecycle, Lifecycle::STARTED);
        assert_eq!(probe.borrow().core().elapsed(), 0.0);

        probe.borrow_mut().run_update(0.5);
        assert!(!probe.borrow().is_all_done());
        probe.borrow_mut().run_update(0.5);
        assert!(probe.borrow().is_all_done());
        assert_eq!(journal.count("P:done"), 2);
    }

    #[test]
    fn test_start_child_binds_cancellation_scope() {
        let journal = Journal::new();
        let parent = ActionCore::new("Parent");
        let child: ActionRef = share(ProbeAction::new("Child", 1.0, &journal));

        start_child(&parent, &child);
        assert!(!child.borrow().core().cancellation().is_cancelled());

        parent.cancellation().cancel();
        assert!(child.borrow().core().cancellation().is_cancelled());
    }
}
