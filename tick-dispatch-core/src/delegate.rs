//! One-shot callback action

use crate::action::{share, Action, ActionCore, ActionRef, ActionState};
use crate::delay::DelayAction;
use crate::sequence::SequenceAction;

type Callback = Box<dyn FnMut()>;

/// Invokes a callback when started and completes in the same call.
///
/// Useful as a no-wait side-effecting step inside a sequence.
pub struct DelegateAction {
    core: ActionCore,
    callback: Callback,
}

impl DelegateAction {
    /// Create a delegate that runs `callback` every time it starts.
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        Self {
            core: ActionCore::new("Delegate"),
            callback: Box::new(callback),
        }
    }

    /// Build a delegate that waits `delay` seconds first.
    ///
    /// A positive delay yields a sequence of a [`DelayAction`] followed by the
    /// delegate; otherwise the bare delegate is returned.
    pub fn after(delay: f32, callback: impl FnMut() + 'static) -> ActionRef {
        let delegate = share(Self::new(callback));
        if delay <= 0.0 {
            return delegate;
        }

        let mut sequence = SequenceAction::new().named("DelayedDelegate");
        sequence.add(share(DelayAction::new(delay)));
        sequence.add(delegate);
        share(sequence)
    }
}

impl ActionState for DelegateAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }
}

impl Action for DelegateAction {
    fn on_start(&mut self) {
        self.set_manual();
        (self.callback)();
        self.mark_as_done();
    }
}
