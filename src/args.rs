//! Command-line argument parsing and processing.
//!
//! Hand-rolled parser for the handful of flags the clock takes. Unknown or
//! malformed arguments fall through to the help screen.

use crate::common::constants::MAXIMUM_CLOCK_OFFSET_MINUTES;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the clock with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        /// Initial clock offset in minutes
        offset_minutes: Option<i64>,
        /// Render a single tick and exit
        once: bool,
        log_file: Option<String>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or incomplete arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Help and version
    /// take precedence over everything else, including errors.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut once = false;
        let mut config_dir: Option<String> = None;
        let mut offset_minutes: Option<i64> = None;
        let mut log_file: Option<String> = None;
        let mut unknown_arg_found = false;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut iter = args_vec.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--once" => once = true,
                "--config" | "-c" => match iter.next() {
                    Some(dir) if !dir.starts_with('-') => config_dir = Some(dir.clone()),
                    _ => unknown_arg_found = true,
                },
                "--log" => match iter.next() {
                    Some(path) if !path.starts_with('-') => log_file = Some(path.clone()),
                    _ => unknown_arg_found = true,
                },
                // Negative values are allowed here, so no leading-dash check
                "--offset" | "-o" => match iter.next().map(|value| value.parse::<i64>()) {
                    Some(Ok(minutes))
                        if (-MAXIMUM_CLOCK_OFFSET_MINUTES..=MAXIMUM_CLOCK_OFFSET_MINUTES)
                            .contains(&minutes) =>
                    {
                        offset_minutes = Some(minutes)
                    }
                    _ => unknown_arg_found = true,
                },
                _ => unknown_arg_found = true,
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            CliAction::Run {
                debug_enabled,
                config_dir,
                offset_minutes,
                once,
                log_file,
            }
        };

        ParsedArgs { action }
    }

    /// Parse the process arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("shabbat-clock [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-o, --offset <minutes> Start with the clock shifted (may be negative)");
    log_indented!("    --once             Render the clock face once and exit");
    log_indented!("    --log <file>       Also write log output to a file");
    log_indented!("-V, --version          Print version information");
    log_end!();
}
