//! Frame loop that feeds a [`Runner`] from the tokio clock.
//!
//! [`drive`] is awaited on the caller's task; nothing is spawned, so action
//! trees holding `Rc` handles work unchanged.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::FrameConfig;
use crate::runner::Runner;
use crate::sink::ActionSink;

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The runner had nothing running or queued
    Idle,
    /// The cancellation token fired
    Cancelled,
}

/// Summary of a [`drive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Ticks delivered to the runner
    pub frames: u64,
    /// Sum of the deltas handed to the runner
    pub simulated: Duration,
    /// Frames whose measured delta exceeded `max_delta`
    pub clamped: u64,
    pub stop: StopReason,
}

/// Limit a measured frame delta. Returns the delta to use and whether it was
/// clamped.
pub fn clamp_delta(measured: Duration, max_delta: Duration) -> (Duration, bool) {
    if measured > max_delta {
        (max_delta, true)
    } else {
        (measured, false)
    }
}

/// Tick `runner` once per frame interval until cancelled or idle.
///
/// Each frame measures the time since the previous one, clamps it to
/// `frame.max_delta()` and passes it to [`Runner::on_update`] in seconds.
/// Cancellation is checked before every frame.
pub async fn drive<K: ActionSink>(
    runner: &mut Runner<K>,
    frame: FrameConfig,
    cancel: CancellationToken,
) -> FrameStats {
    let mut interval = tokio::time::interval(frame.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    interval.tick().await;

    let max_delta = frame.max_delta();
    let mut last = Instant::now();
    let mut frames = 0;
    let mut simulated = Duration::ZERO;
    let mut clamped = 0;

    let stop = loop {
        if frame.stop_when_idle && runner.is_idle() {
            break StopReason::Idle;
        }

        tokio::select! {
            biased;

            _ = cancel.cancelled() => break StopReason::Cancelled,

            _ = interval.tick() => {
                let now = Instant::now();
                let (delta, was_clamped) = clamp_delta(now - last, max_delta);
                last = now;
                if was_clamped {
                    clamped += 1;
                }

                trace!(runner = %runner.name(), dt_ms = delta.as_millis() as u64, "frame");
                runner.on_update(delta.as_secs_f32());
                frames += 1;
                simulated += delta;
            }
        }
    };

    debug!(
        runner = %runner.name(),
        frames,
        clamped,
        stop = ?stop,
        "frame loop stopped"
    );

    FrameStats {
        frames,
        simulated,
        clamped,
        stop,
    }
}
