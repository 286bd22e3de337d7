//! The once-per-second clock loop.
//!
//! Each tick awaits the engine (including any fetch it triggers) before the
//! face is drawn, so a tick never renders partial state. Missed ticks are
//! skipped rather than bunched up.

use anyhow::Result;
use std::io::Write;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::calendar::CalendarFeed;
use crate::common::constants::TICK_INTERVAL_MS;
use crate::common::logger::Log;
use crate::display::ClockFace;
use crate::engine::Engine;
use crate::signals::SignalState;

/// Tracks the last face drawn and reports content changes.
#[derive(Debug, Default)]
pub struct FaceTracker {
    last: Option<ClockFace>,
}

/// What changed between two consecutive faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceChange {
    /// Only the seconds moved.
    None,
    /// First face of the run.
    Initial,
    Changed { from: ClockFace },
}

impl FaceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, face: &ClockFace) -> FaceChange {
        let change = match &self.last {
            None => FaceChange::Initial,
            Some(last) if last.same_content(face) => FaceChange::None,
            Some(last) => FaceChange::Changed { from: last.clone() },
        };
        self.last = Some(face.clone());
        change
    }
}

fn log_face(face: &ClockFace) {
    log_indented!("{}", face.date_line);
    if let Some(info) = &face.info_line {
        log_indented!("{}", info);
    }
    if face.highlighted {
        log_indented!("Rest period");
    }
    if face.degraded {
        log_indented!("Calendar data degraded");
    }
}

/// Log a face change once.
pub fn log_face_change(change: &FaceChange, face: &ClockFace) {
    match change {
        FaceChange::None => {}
        FaceChange::Initial => {
            log_block_start!("Clock face");
            log_face(face);
        }
        FaceChange::Changed { from } => {
            log_block_start!("Clock face changed");
            if from.date_line != face.date_line {
                log_decorated!("{} → {}", from.date_line, face.date_line);
            }
            log_face(face);
        }
    }
}

/// Draw the face on the terminal line, in place.
fn draw(face: &ClockFace) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "\r\x1b[2K{face}");
    let _ = stdout.flush();
}

/// Render one tick: compose, log changes, draw.
pub async fn render_tick<F: CalendarFeed>(engine: &Engine<F>, tracker: &mut FaceTracker) -> ClockFace {
    let status = engine.tick().await;
    let face = ClockFace::compose(&status);
    let change = tracker.update(&face);

    if change != FaceChange::None {
        // Finish the in-place line before the log block
        println!();
        log_face_change(&change, &face);
    }
    if Log::is_debug() {
        log_debug!("{} (offset {} ms)", face, engine.offset());
    } else {
        draw(&face);
    }
    face
}

/// Tick until a shutdown signal arrives, or once with `once`.
pub async fn run_clock<F: CalendarFeed>(
    engine: &Engine<F>,
    signal_state: &SignalState,
    once: bool,
) -> Result<()> {
    let mut tracker = FaceTracker::new();

    if once {
        let face = render_tick(engine, &mut tracker).await;
        println!();
        log_debug!("Single render: {}", face);
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while signal_state.is_running() {
        interval.tick().await;
        if !signal_state.is_running() {
            break;
        }
        render_tick(engine, &mut tracker).await;
    }

    println!();
    Ok(())
}
