//! Shutdown signal handling.
//!
//! A background thread waits on SIGINT, SIGTERM and SIGHUP and clears the
//! shared `running` flag. The clock loop checks the flag every tick.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

/// Signal handling state shared with the clock loop.
pub struct SignalState {
    /// Cleared once a shutdown signal arrives
    pub running: Arc<AtomicBool>,
}

impl SignalState {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn signal_name(sig: i32) -> &'static str {
    match sig {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "signal",
    }
}

/// Register the shutdown signals and spawn the watcher thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            log_pipe!();
            log_info!("Received {}, shutting down", signal_name(sig));
            running_clone.store(false, Ordering::SeqCst);
        }
    });

    Ok(SignalState { running })
}
