//! Core types for tick-dispatch
//!
//! A tick-driven action scheduler: describe timed or event-driven work as
//! actions, compose them into sequences and parallel groups, and advance the
//! whole tree with one delta time per frame. Everything runs on the caller's
//! thread; "parallel" means interleaved within a tick.
//!
//! # Core Concepts
//!
//! - **Action**: a unit of work with start/update/done hooks and a timer
//! - **Composites**: [`SequenceAction`], [`ParallelAction`],
//!   [`StaggeredParallelAction`]
//! - **Leaves**: [`DelayAction`], [`DelegateAction`]
//! - **Runner**: owns independent trees, retires finished ones, supports
//!   removal by id
//! - **Sink**: receives completion and removal reports
//!
//! # Basic Example
//!
//! ```
//! use tick_dispatch_core::prelude::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let shown = Rc::new(Cell::new(false));
//! let flag = shown.clone();
//!
//! let mut intro = SequenceAction::new().named("Intro");
//! intro.add(share(DelayAction::new(0.5)));
//! intro.add(share(DelegateAction::new(move || flag.set(true))));
//!
//! let mut runner = Runner::new("main");
//! runner.run_action(share(intro));
//!
//! for _ in 0..4 {
//!     runner.on_update(0.25);
//! }
//! assert!(shown.get());
//! assert!(runner.is_idle());
//! ```
//!
//! # Re-entrancy
//!
//! Action handles are `Rc<RefCell<_>>`, and the tree being advanced is
//! mutably borrowed for the whole tick. Callbacks that need to add work
//! capture an [`ActionQueue`] (from [`Runner::queue`] or
//! [`SequenceAction::queue`]) instead of borrowing their owner.

pub mod action;
pub mod config;
pub mod delay;
pub mod delegate;
pub mod log;
pub mod parallel;
pub mod runner;
pub mod runtime;
pub mod sequence;
pub mod set;
pub mod sink;
pub mod stagger;
pub mod testing;

// Action contract
pub use action::{share, start_child, Action, ActionCore, ActionRef, ActionState, Lifecycle};
pub use action::MANUAL_DURATION;

// Collections
pub use set::{ActionQueue, ActionSet};

// Action kinds
pub use delay::DelayAction;
pub use delegate::DelegateAction;
pub use parallel::ParallelAction;
pub use sequence::SequenceAction;
pub use stagger::StaggeredParallelAction;

// Runner, reporting and configuration
pub use config::{ConfigError, FrameConfig, RunnerConfig};
pub use log::{ActionLog, ActionLogConfig, LifecycleEntry, LifecycleFilter, LifecycleKind, LogSink};
pub use runner::Runner;
pub use runtime::{drive, FrameStats, StopReason};
pub use sink::{ActionSink, ComposedSink, NoopSink, TracingSink};

// Testing exports
pub use testing::{tick, Journal, ProbeAction, RecordingSink, SinkEvent};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{share, Action, ActionCore, ActionRef, ActionState, MANUAL_DURATION};
    pub use crate::config::{FrameConfig, RunnerConfig};
    pub use crate::delay::DelayAction;
    pub use crate::delegate::DelegateAction;
    pub use crate::parallel::ParallelAction;
    pub use crate::runner::Runner;
    pub use crate::runtime::drive;
    pub use crate::sequence::SequenceAction;
    pub use crate::set::ActionQueue;
    pub use crate::sink::{ActionSink, TracingSink};
    pub use crate::stagger::StaggeredParallelAction;
}
