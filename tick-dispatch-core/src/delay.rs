//! Pure timer action with an optional completion callback

use crate::action::{Action, ActionCore, ActionState};

type Callback = Box<dyn FnOnce()>;

/// Completes after a fixed number of seconds.
///
/// The completion callback fires once at the all-done transition and is then
/// dropped; set a new one with [`DelayAction::set_callback`] before re-running
/// if it should fire again.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use tick_dispatch_core::{share, Action, DelayAction};
///
/// let fired = Rc::new(Cell::new(false));
/// let flag = fired.clone();
/// let delay = share(DelayAction::new(1.0).on_complete(move || flag.set(true)));
///
/// delay.borrow_mut().run_start();
/// delay.borrow_mut().run_update(0.5);
/// assert!(!fired.get());
/// delay.borrow_mut().run_update(0.5);
/// assert!(fired.get());
/// ```
pub struct DelayAction {
    core: ActionCore,
    seconds: f32,
    callback: Option<Callback>,
}

impl DelayAction {
    /// Create a delay of `seconds`.
    pub fn new(seconds: f32) -> Self {
        Self {
            core: ActionCore::new("Delay"),
            seconds,
            callback: None,
        }
    }

    /// Builder: run `callback` once when the delay completes.
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Replace the completion callback.
    pub fn set_callback(&mut self, callback: impl FnOnce() + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Whether a callback is still armed.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Configured delay in seconds.
    pub fn seconds(&self) -> f32 {
        self.seconds
    }
}

impl ActionState for DelayAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }
}

impl Action for DelayAction {
    fn on_start(&mut self) {
        let seconds = self.seconds;
        self.set_duration(seconds);
    }

    fn on_done(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}
