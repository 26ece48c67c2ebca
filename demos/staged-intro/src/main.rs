//! Staged intro: a sequence of delays, staggered cards and callbacks driven by
//! a tokio frame clock.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use tick_dispatch::prelude::*;
use tick_dispatch::{ConfigError, LogSink, StopReason};
use tokio_util::sync::CancellationToken;
use tracing::info;

const INTRO_ID: i32 = 1;
const SPINNER_ID: i32 = 2;

/// Staged intro - tick-dispatch demo
#[derive(Parser, Debug)]
#[command(name = "staged-intro")]
#[command(about = "Runs a staged intro sequence on a fixed frame clock")]
struct Args {
    /// JSON runner config (defaults are used when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Number of cards to reveal
    #[arg(long, default_value = "4")]
    cards: usize,

    /// Seconds between card reveals
    #[arg(long, default_value = "0.15")]
    stagger: f32,

    /// Seconds each card takes to reveal
    #[arg(long, default_value = "0.4")]
    reveal: f32,

    /// Abort the intro after this many seconds
    #[arg(long)]
    abort_after: Option<f64>,

    /// Enable debug logging
    #[arg(long, short)]
    debug: bool,
}

/// A card reveal: completes after `seconds`, logging its progress.
#[derive(ActionState)]
struct Reveal {
    core: ActionCore,
    seconds: f32,
}

impl Reveal {
    fn new(index: usize, seconds: f32) -> Self {
        Self {
            core: ActionCore::new(format!("{}{}", Self::ACTION_NAME, index)),
            seconds,
        }
    }
}

impl Action for Reveal {
    fn on_start(&mut self) {
        self.set_duration(self.seconds);
        info!(card = %self.name(), "reveal");
    }

    fn on_done(&mut self) {
        info!(card = %self.name(), "revealed");
    }
}

/// Runs until `stop` is set. Manual duration.
#[derive(ActionState)]
struct Spinner {
    core: ActionCore,
    stop: Rc<Cell<bool>>,
    frames: u32,
}

impl Action for Spinner {
    fn on_start(&mut self) {
        self.set_manual();
        self.frames = 0;
    }

    fn on_update(&mut self, _dt: f32) {
        self.frames += 1;
        if self.stop.get() {
            self.mark_as_done();
        }
    }

    fn on_done(&mut self) {
        info!(frames = self.frames, "spinner stopped");
    }
}

fn build_intro(args: &Args, stop_spinner: Rc<Cell<bool>>) -> ActionRef {
    let mut cards = StaggeredParallelAction::new(args.stagger).named("Cards");
    for index in 1..=args.cards {
        cards.add(share(Reveal::new(index, args.reveal)));
    }

    let mut intro = SequenceAction::new().named("Intro").with_id(INTRO_ID);
    intro.add(share(DelegateAction::new(|| info!("intro started"))));
    intro.add(share(DelayAction::new(0.3).on_complete(|| info!("backdrop ready"))));
    intro.add(share(cards));
    intro.add(DelegateAction::after(0.2, move || {
        info!("intro finished");
        stop_spinner.set(true);
    }));
    share(intro)
}

fn load_config(path: Option<&PathBuf>) -> Result<RunnerConfig, ConfigError> {
    match path {
        Some(path) => RunnerConfig::load(path),
        None => Ok(RunnerConfig {
            name: "staged-intro".to_string(),
            ..Default::default()
        }),
    }
}

fn abort_delay(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("--abort-after must be a finite, non-negative number of seconds (got {})", secs))
}

fn print_log(runner: &Runner<LogSink>) {
    println!("Lifecycle log (newest first):");
    for entry in runner.sink().log().recent(10) {
        match entry.id {
            Some(id) => println!("  #{} {:?} {} (id {})", entry.sequence, entry.kind, entry.action, id),
            None => println!("  #{} {:?} {}", entry.sequence, entry.kind, entry.action),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let default_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut runner = Runner::from_config(&config);
    let stop_spinner = Rc::new(Cell::new(false));

    runner.run_action(build_intro(&args, stop_spinner.clone()));
    runner.queue_action(share(
        Spinner {
            core: ActionCore::new(Spinner::ACTION_NAME),
            stop: stop_spinner,
            frames: 0,
        }
        .with_id(SPINNER_ID),
    ));

    let abort_after = match args.abort_after.map(abort_delay).transpose() {
        Ok(delay) => delay,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    if let Some(delay) = abort_after {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel();
        });
    }

    let stats = drive(&mut runner, config.frame, cancel).await;
    info!(
        frames = stats.frames,
        simulated_ms = stats.simulated.as_millis() as u64,
        clamped = stats.clamped,
        "frame loop finished"
    );

    if stats.stop == StopReason::Cancelled {
        for id in [INTRO_ID, SPINNER_ID] {
            if runner.remove_action(id) {
                info!(id, "aborted");
            }
        }
    }

    print_log(&runner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_delay_rejects_invalid_seconds() {
        assert_eq!(abort_delay(1.5), Ok(Duration::from_millis(1500)));
        assert_eq!(abort_delay(0.0), Ok(Duration::ZERO));
        assert!(abort_delay(-1.0).is_err());
        assert!(abort_delay(f64::NAN).is_err());
        assert!(abort_delay(f64::INFINITY).is_err());
    }
}
