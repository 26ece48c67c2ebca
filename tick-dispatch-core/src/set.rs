//! Insertion-ordered, duplicate-free action collections
//!
//! [`ActionSet`] is the child container used by every composite and by the
//! runner. Iteration order is insertion order and is load-bearing: sequences
//! run children in exactly this order.
//!
//! [`ActionQueue`] is a cloneable handle over a shared set. Callbacks that
//! run inside a tick capture one to enqueue work without borrowing the
//! action or runner currently being advanced.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::action::ActionRef;

fn identity(action: &ActionRef) -> usize {
    Rc::as_ptr(action) as *const () as usize
}

/// Ordered set of action handles keyed by handle identity.
#[derive(Clone, Default)]
pub struct ActionSet {
    order: VecDeque<ActionRef>,
    members: HashSet<usize>,
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.order.iter().map(|a| match a.try_borrow() {
                Ok(action) => action.name().to_string(),
                Err(_) => "<active>".to_string(),
            }))
            .finish()
    }
}

impl ActionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action. Returns `false` if it was already present.
    pub fn insert(&mut self, action: ActionRef) -> bool {
        if !self.members.insert(identity(&action)) {
            return false;
        }
        self.order.push_back(action);
        true
    }

    /// Whether this exact handle is present.
    pub fn contains(&self, action: &ActionRef) -> bool {
        self.members.contains(&identity(action))
    }

    /// Remove an action. Returns `false` if it was not present.
    pub fn remove(&mut self, action: &ActionRef) -> bool {
        let key = identity(action);
        if !self.members.remove(&key) {
            return false;
        }
        self.order.retain(|a| identity(a) != key);
        true
    }

    /// Remove and return the first action matching `pred`.
    pub fn remove_first<F>(&mut self, mut pred: F) -> Option<ActionRef>
    where
        F: FnMut(&ActionRef) -> bool,
    {
        let index = self.order.iter().position(&mut pred)?;
        let action = self.order.remove(index)?;
        self.members.remove(&identity(&action));
        Some(action)
    }

    /// Remove and return the oldest action.
    pub fn pop_front(&mut self) -> Option<ActionRef> {
        let action = self.order.pop_front()?;
        self.members.remove(&identity(&action));
        Some(action)
    }

    /// Stable copy of the current order, safe to iterate while the set is
    /// mutated.
    pub fn snapshot(&self) -> Vec<ActionRef> {
        self.order.iter().cloned().collect()
    }

    /// Move all actions out, leaving the set empty.
    pub fn take(&mut self) -> ActionSet {
        std::mem::take(self)
    }

    /// Append every action from `other` that is not already present.
    pub fn extend<I>(&mut self, other: I)
    where
        I: IntoIterator<Item = ActionRef>,
    {
        for action in other {
            self.insert(action);
        }
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionRef> {
        self.order.iter()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove every action.
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

impl IntoIterator for ActionSet {
    type Item = ActionRef;
    type IntoIter = std::collections::vec_deque::IntoIter<ActionRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

/// Shared pending-start queue.
///
/// Clones refer to the same underlying set.
#[derive(Clone, Default)]
pub struct ActionQueue {
    inner: Rc<RefCell<ActionSet>>,
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("len", &self.len())
            .finish()
    }
}

impl ActionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an action. Returns `false` if it is already queued.
    pub fn push(&self, action: ActionRef) -> bool {
        self.inner.borrow_mut().insert(action)
    }

    /// Take every queued action in order.
    pub fn drain(&self) -> ActionSet {
        self.inner.borrow_mut().take()
    }

    /// Remove this exact handle. Returns `false` if it was not queued.
    pub fn remove(&self, action: &ActionRef) -> bool {
        self.inner.borrow_mut().remove(action)
    }

    /// Remove and return the first queued action matching `pred`.
    pub fn remove_first<F>(&self, pred: F) -> Option<ActionRef>
    where
        F: FnMut(&ActionRef) -> bool,
    {
        self.inner.borrow_mut().remove_first(pred)
    }

    /// Whether this exact handle is queued.
    pub fn contains(&self, action: &ActionRef) -> bool {
        self.inner.borrow().contains(action)
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Drop every queued action.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }
}
