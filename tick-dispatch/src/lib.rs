//! tick-dispatch: composable, tick-driven action scheduling
//!
//! Describe timed work as actions, compose them into sequences and parallel
//! groups, and advance everything with one delta time per frame. No threads,
//! no executor-driven control flow: a [`Runner`] owns independent action
//! trees and a single `on_update(dt)` call moves them all forward.
//!
//! # Example
//! ```
//! use tick_dispatch::prelude::*;
//!
//! #[derive(ActionState)]
//! struct Pulse {
//!     core: ActionCore,
//!     beats: u32,
//! }
//!
//! impl Action for Pulse {
//!     fn on_start(&mut self) {
//!         self.set_duration(1.0);
//!     }
//!     fn on_update(&mut self, _dt: f32) {
//!         self.beats += 1;
//!     }
//! }
//!
//! let pulse = share(Pulse { core: ActionCore::new(Pulse::ACTION_NAME), beats: 0 });
//! let mut stage = StaggeredParallelAction::new(0.5);
//! stage.add(pulse.clone());
//! stage.add(share(DelayAction::new(0.25)));
//!
//! let mut runner = Runner::new("stage");
//! runner.run_action(share(stage));
//! for _ in 0..4 {
//!     runner.on_update(0.25);
//! }
//!
//! assert!(pulse.borrow().is_all_done());
//! assert_eq!(pulse.borrow().beats, 3);
//! assert!(runner.is_idle());
//! ```

// Re-export everything from core
pub use tick_dispatch_core::*;

// Re-export derive macros
pub use tick_dispatch_macros::ActionState;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use tick_dispatch_core::{Action, ActionSink, ActionState};

    // Handles and state
    pub use tick_dispatch_core::{share, ActionCore, ActionQueue, ActionRef, MANUAL_DURATION};

    // Action kinds
    pub use tick_dispatch_core::{
        DelayAction, DelegateAction, ParallelAction, SequenceAction, StaggeredParallelAction,
    };

    // Runner
    pub use tick_dispatch_core::{drive, FrameConfig, Runner, RunnerConfig, TracingSink};

    // Derive macros
    pub use tick_dispatch_macros::ActionState;
}
