//! Command-line interface for alertaja.
//!
//! This module provides the CLI structure for the `alertaja` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AlertTypeArg, AlertsCommand, ConfigCommand, CourierCommand, LoginCommand, OutputFormat,
    ReportCommand, StatusCommand,
};

/// alertaja - Traffic alerts and couriers for your town
///
/// Report and vote on incidents around town, announce your availability as a
/// courier, and find one to hire.
#[derive(Debug, Parser)]
#[command(name = "alertaja")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Your name (used by login, or for this run only)
    #[arg(long, global = true, requires = "phone")]
    pub name: Option<String>,

    /// Your cell phone number (used by login, or for this run only)
    #[arg(long, global = true, requires = "name")]
    pub phone: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with --name and --phone
    Login(LoginCommand),

    /// Log out and forget the remembered login
    Logout,

    /// Show who is logged in
    Whoami,

    /// Traffic and incident alerts
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Courier availability
    #[command(subcommand)]
    Courier(CourierCommand),

    /// List the town's neighborhoods
    Regions,

    /// Show board and storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }

    /// Configuration file in effect: `--config`, else the default location.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_config_path)
    }

    /// File checked by `config validate`: its `--file`, else [`Self::config_path`].
    ///
    /// `None` for every other command.
    #[must_use]
    pub fn validation_target(&self) -> Option<PathBuf> {
        match &self.command {
            Command::Config(ConfigCommand::Validate { file }) => {
                Some(file.clone().unwrap_or_else(|| self.config_path()))
            }
            _ => None,
        }
    }

    /// The identity given on the command line, if any.
    #[must_use]
    pub fn identity(&self) -> Option<(&str, &str)> {
        match (&self.name, &self.phone) {
            (Some(name), Some(phone)) => Some((name, phone)),
            _ => None,
        }
    }
}
