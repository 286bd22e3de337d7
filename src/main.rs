//! Main application entry point and high-level flow coordination.
//!
//! Parses arguments, then for a normal run:
//! 1. Loads and validates the configuration
//! 2. Sets up logging (debug switch, optional log file, timestamps)
//! 3. Registers shutdown signals
//! 4. Builds the engine with the Hebcal feed and the system clock
//! 5. Runs the clock loop until a signal arrives (or once with `--once`)

use anyhow::{Context, Result};
use std::sync::Arc;

use shabbat_clock::args::{self, CliAction, ParsedArgs};
use shabbat_clock::calendar::HebcalFeed;
use shabbat_clock::common::constants::{EXIT_FAILURE, MILLIS_PER_MINUTE};
use shabbat_clock::common::logger::Log;
use shabbat_clock::config::{self, Config};
use shabbat_clock::driver::run_clock;
use shabbat_clock::engine::Engine;
use shabbat_clock::signals::setup_signal_handler;
use shabbat_clock::time_source::RealTimeSource;
use shabbat_clock::{log_block_start, log_debug, log_end, log_error_exit, log_pipe, log_version};

/// Settings for a normal run, taken from the command line.
pub struct ClockRunner {
    debug_enabled: bool,
    config_dir: Option<String>,
    offset_minutes: Option<i64>,
    once: bool,
    log_file: Option<String>,
}

impl ClockRunner {
    pub async fn run(self) -> Result<()> {
        log_version!();

        Log::set_debug(self.debug_enabled);
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - logging every tick");
        }

        config::set_config_dir(self.config_dir)?;
        let config = Config::load().context("failed to load configuration")?;
        Log::set_clock_timezone(config.timezone());

        // Kept alive for the whole run; dropping it flushes the file
        let _log_guard = match self.log_file {
            Some(path) => Some(
                Log::start_file_logging(path.clone())
                    .with_context(|| format!("failed to open log file {path}"))?,
            ),
            None => None,
        };

        let config_path = Config::get_config_path()?;
        config.log_config(config_path.exists().then_some(config_path.as_path()));

        let signal_state = setup_signal_handler()?;

        let feed = HebcalFeed::new(&config).context("failed to build calendar client")?;
        let engine = Engine::new(&config, feed, Arc::new(RealTimeSource));
        if let Some(minutes) = self.offset_minutes {
            let millis = minutes
                .checked_mul(MILLIS_PER_MINUTE)
                .with_context(|| format!("clock offset of {minutes} minutes is out of range"))?;
            engine.set_offset(millis);
        }

        log_block_start!("Starting clock in {}", engine.timezone());
        run_clock(&engine, &signal_state, self.once).await?;

        drop(engine);
        log_end!();
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            offset_minutes,
            once,
            log_file,
        } => {
            let runner = ClockRunner {
                debug_enabled,
                config_dir,
                offset_minutes,
                once,
                log_file,
            };
            if let Err(e) = runner.run().await {
                log_error_exit!("{:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
            Ok(())
        }
    }
}
