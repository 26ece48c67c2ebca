//! Sequential composite: one active child at a time, in entry order
//!
//! Children come from two places:
//! - [`SequenceAction::add`] collects author-time children ("preparing").
//!   They are moved into the pending line when the sequence starts.
//! - [`SequenceAction::queue_action`] (or a cloned [`SequenceAction::queue`]
//!   handle) feeds a side channel drained into the back of the pending line at
//!   the top of every tick, so work queued while a child is mid-update joins
//!   on the next tick without disturbing the current child.

use tracing::{debug, trace};

use crate::action::{start_child, Action, ActionCore, ActionRef, ActionState};
use crate::set::{ActionQueue, ActionSet};

/// Runs children one after another.
///
/// # Example
///
/// ```
/// use tick_dispatch_core::{share, tick, Action, DelayAction, SequenceAction};
///
/// let first = share(DelayAction::new(1.0));
/// let second = share(DelayAction::new(1.0));
///
/// let mut sequence = SequenceAction::new();
/// sequence.add(first.clone());
/// sequence.add(second.clone());
/// let sequence = share(sequence);
///
/// sequence.borrow_mut().run_start();
/// assert!(first.borrow().is_started());
/// assert!(!second.borrow().is_started());
///
/// tick(&sequence, 1.0, 1);
/// assert!(first.borrow().is_all_done());
/// assert!(second.borrow().is_started());
///
/// tick(&sequence, 1.0, 2);
/// assert!(sequence.borrow().is_all_done());
/// ```
pub struct SequenceAction {
    core: ActionCore,
    preparing: ActionSet,
    pending: ActionSet,
    queuing: ActionQueue,
    current: Option<ActionRef>,
}

impl Default for SequenceAction {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceAction {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self {
            core: ActionCore::new("Sequence"),
            preparing: ActionSet::new(),
            pending: ActionSet::new(),
            queuing: ActionQueue::new(),
            current: None,
        }
    }

    /// Add an author-time child. Duplicates are ignored.
    ///
    /// Only picked up by the next `run_start`.
    pub fn add(&mut self, action: ActionRef) -> bool {
        self.preparing.insert(action)
    }

    /// Queue a child to join the line at the start of the next tick.
    pub fn queue_action(&self, action: ActionRef) -> bool {
        self.queuing.push(action)
    }

    /// Handle to the queuing side channel, for use inside callbacks.
    pub fn queue(&self) -> ActionQueue {
        self.queuing.clone()
    }

    /// The child currently being advanced.
    pub fn current(&self) -> Option<&ActionRef> {
        self.current.as_ref()
    }

    /// Children waiting for their turn.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Author-time children not yet consumed by a start.
    pub fn preparing_len(&self) -> usize {
        self.preparing.len()
    }

    fn shift_next(&mut self) {
        let Some(next) = self.pending.pop_front() else {
            return;
        };
        debug!(
            sequence = %self.core.name(),
            action = %next.borrow().name(),
            remaining = self.pending.len(),
            "sequence step"
        );
        start_child(&self.core, &next);
        self.current = Some(next);
    }
}

impl ActionState for SequenceAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }
}

impl Action for SequenceAction {
    fn on_start(&mut self) {
        self.set_manual();
        self.current = None;

        if self.preparing.is_empty() {
            self.mark_as_done();
            return;
        }

        self.pending = self.preparing.take();
        self.shift_next();
    }

    fn on_update(&mut self, dt: f32) {
        let queued = self.queuing.drain();
        if !queued.is_empty() {
            trace!(sequence = %self.core.name(), count = queued.len(), "queued steps joined");
            self.pending.extend(queued);
        }

        if let Some(current) = self.current.clone() {
            current.borrow_mut().run_update(dt);
            if !current.borrow().is_all_done() {
                return;
            }
            self.current = None;
        }

        if self.pending.is_empty() {
            self.mark_as_done();
        } else {
            self.shift_next();
        }
    }

    fn on_done(&mut self) {
        self.current = None;
        self.pending.clear();
    }

    fn owned_actions(&self) -> Vec<ActionRef> {
        self.current.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::share;
    use crate::delegate::DelegateAction;
    use crate::testing::{tick, Journal, ProbeAction};

    fn sequence_of(children: &[ActionRef]) -> ActionRef {
        let mut sequence = SequenceAction::new();
        for child in children {
            sequence.add(child.clone());
        }
        share(sequence)
    }

    #[test]
    fn test_empty_sequence_completes_on_start() {
        let sequence = share(SequenceAction::new());
        sequence.borrow_mut().run_start();
        assert!(sequence.borrow().is_all_done());
    }

    #[test]
    fn test_children_run_in_order() {
        let journal = Journal::new();
        let x: ActionRef = share(ProbeAction::new("X", 1.0, &journal));
        let y: ActionRef = share(ProbeAction::new("Y", 1.0, &journal));
        let z: ActionRef = share(ProbeAction::new("Z", 1.0, &journal));
        let sequence = sequence_of(&[x.clone(), y.clone(), z.clone()]);

        sequence.borrow_mut().run_start();
        assert!(x.borrow().is_started());
        assert!(!y.borrow().is_started());

        tick(&sequence, 0.5, 1);
        assert!(!y.borrow().is_started());

        tick(&sequence, 0.5, 1);
        assert!(x.borrow().is_all_done());
        assert!(y.borrow().is_started());
        assert!(!z.borrow().is_started());

        tick(&sequence, 1.0, 1);
        assert!(y.borrow().is_all_done());
        assert!(z.borrow().is_started());
        assert!(!sequence.borrow().is_all_done());

        tick(&sequence, 1.0, 1);
        assert!(z.borrow().is_all_done());
        assert!(sequence.borrow().is_all_done());

        assert!(journal.happened_before("X:done", "Y:start"));
        assert!(journal.happened_before("Y:done", "Z:start"));
    }

    #[test]
    fn test_duplicate_add_ignored() {
        let journal = Journal::new();
        let x: ActionRef = share(ProbeAction::new("X", 1.0, &journal));
        let mut sequence = SequenceAction::new();
        assert!(sequence.add(x.clone()));
        assert!(!sequence.add(x));
        assert_eq!(sequence.preparing_len(), 1);
    }

    #[test]
    fn test_queued_child_joins_after_pending() {
        let journal = Journal::new();
        let x: ActionRef = share(ProbeAction::new("X", 1.0, &journal));
        let y: ActionRef = share(ProbeAction::new("Y", 1.0, &journal));
        let q: ActionRef = share(ProbeAction::new("Q", 1.0, &journal));

        let mut sequence = SequenceAction::new();
        sequence.add(x.clone());
        sequence.add(y.clone());
        let queue = sequence.queue();
        let sequence = share(sequence);

        sequence.borrow_mut().run_start();
        queue.push(q.clone());
        tick(&sequence, 1.0, 2);

        assert!(y.borrow().is_all_done());
        assert!(q.borrow().is_started());
        assert!(!sequence.borrow().is_all_done());
        tick(&sequence, 1.0, 1);
        assert!(sequence.borrow().is_all_done());
        assert!(journal.happened_before("Y:done", "Q:start"));
    }

    #[test]
    fn test_queue_during_child_update_lands_next_tick() {
        let journal = Journal::new();
        let mut sequence = SequenceAction::new();
        let queue = sequence.queue();
        let late: ActionRef = share(ProbeAction::new("Late", 1.0, &journal));

        let late_handle = late.clone();
        let enqueue = share(ProbeAction::new("Enqueue", 1.0, &journal).on_tick(move || {
            queue.push(late_handle.clone());
        }));
        let tail: ActionRef = share(ProbeAction::new("Tail", 1.0, &journal));
        sequence.add(enqueue.clone());
        sequence.add(tail.clone());

        let handle = share(sequence);
        handle.borrow_mut().run_start();

        tick(&handle, 0.5, 1);
        assert_eq!(handle.borrow().pending_len(), 1);

        tick(&handle, 0.0, 1);
        assert_eq!(handle.borrow().pending_len(), 2);
        assert!(!late.borrow().is_started());
    }

    #[test]
    fn test_delegates_advance_one_per_tick() {
        let journal = Journal::new();
        let j1 = journal.clone();
        let j2 = journal.clone();
        let a: ActionRef = share(DelegateAction::new(move || j1.record("a")));
        let b: ActionRef = share(DelegateAction::new(move || j2.record("b")));
        let sequence = sequence_of(&[a, b]);

        sequence.borrow_mut().run_start();
        assert_eq!(journal.entries(), vec!["a"]);

        tick(&sequence, 0.0, 1);
        assert_eq!(journal.entries(), vec!["a", "b"]);
        assert!(!sequence.borrow().is_all_done());

        tick(&sequence, 0.0, 1);
        assert!(sequence.borrow().is_all_done());
    }

    #[test]
    fn test_preparing_is_consumed_by_start() {
        let journal = Journal::new();
        let x: ActionRef = share(ProbeAction::new("X", 0.0, &journal));
        let sequence = sequence_of(&[x]);

        sequence.borrow_mut().run_start();
        tick(&sequence, 0.0, 2);
        assert!(sequence.borrow().is_all_done());

        // a re-run has no author-time children left
        sequence.borrow_mut().run_start();
        assert!(sequence.borrow().is_all_done());
        assert_eq!(journal.count("X:start"), 1);
    }

    #[test]
    fn test_forced_completion_reaches_current_only() {
        let journal = Journal::new();
        let x: ActionRef = share(ProbeAction::new("X", 5.0, &journal));
        let y: ActionRef = share(ProbeAction::new("Y", 5.0, &journal));
        let sequence = sequence_of(&[x.clone(), y.clone()]);

        sequence.borrow_mut().run_start();
        sequence.borrow_mut().mark_as_all_done();

        assert!(x.borrow().is_all_done());
        assert!(!y.borrow().is_started());
        assert!(!y.borrow().is_all_done());
        assert_eq!(journal.count("Y:done"), 0);
    }
}
