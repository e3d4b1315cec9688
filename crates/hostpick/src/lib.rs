//! Library interface for the `hostpick` CLI.
//!
//! Exposes the argument parser, the terminal console, and the command
//! implementations so they can be tested without spawning the binary. The
//! entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//! - [`console`] - Interactive terminal console

pub mod commands;

pub mod console;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Exit code used when the user cancels `init`.
pub const EXIT_CANCELLED: u8 = 130;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, hostpick_core=trace)
    HOSTPICK_LOG_PATH       Explicit log file path
    HOSTPICK_LOG_DIR        Log directory
";

/// Command-line interface definition for hostpick.
#[derive(Parser)]
#[command(name = "hostpick")]
#[command(about = "Pick and confirm a cloud hosting target for a detected app", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Select and confirm the hosting target for a project
    Init(commands::init::InitArgs),

    /// List known hosting targets
    Targets(commands::targets::TargetsArgs),

    /// Send an authenticated Azure management API request
    Arm(commands::arm::ArmArgs),

    /// Show package information
    Info(commands::info::InfoArgs),

    /// Diagnose configuration and environment
    Doctor(commands::doctor::DoctorArgs),
}

/// Returns the clap command, for help rendering and tests.
pub fn command() -> clap::Command {
    Cli::command()
}
