//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::alerts::AlertType;

/// Login command arguments.
///
/// The identity itself comes from the global `--name` and `--phone`.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Don't remember the login on this device
    #[arg(long)]
    pub no_remember: bool,
}

/// Alert board commands.
#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List live alerts, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Report a new alert
    Report(ReportCommand),

    /// Confirm an alert is still there
    Confirm {
        /// Alert id
        id: String,
    },

    /// Vote that an alert is gone
    Dispute {
        /// Alert id
        id: String,
    },

    /// Remove expired alerts
    Sweep,

    /// Print live alerts as a GeoJSON map layer
    Map {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Keep sweeping expired alerts until interrupted
    Watch {
        /// Seconds between sweeps (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Kind of incident
    #[arg(value_enum)]
    pub alert_type: AlertTypeArg,

    /// Latitude of the incident (defaults to the device position)
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the incident
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Street label to use instead of looking one up
    #[arg(short, long)]
    pub street: Option<String>,

    /// Optional details
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Courier commands.
#[derive(Debug, Subcommand)]
pub enum CourierCommand {
    /// Show your own availability
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Switch your availability on or off
    Toggle {
        /// Neighborhood you serve (needed to go online)
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Find available couriers
    Find {
        /// Match against region or name, ignoring case
        #[arg(default_value = "")]
        filter: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Print a chat link to contact a courier
    Contact {
        /// The courier's phone number
        phone: String,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Alert type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlertTypeArg {
    /// Traffic accident
    Accident,
    /// Police check point
    Blitz,
    /// Heavy traffic
    Traffic,
    /// Closed road
    ClosedRoad,
    /// Any other hazard
    Danger,
}

impl From<AlertTypeArg> for AlertType {
    fn from(arg: AlertTypeArg) -> Self {
        match arg {
            AlertTypeArg::Accident => Self::Accident,
            AlertTypeArg::Blitz => Self::Blitz,
            AlertTypeArg::Traffic => Self::Traffic,
            AlertTypeArg::ClosedRoad => Self::ClosedRoad,
            AlertTypeArg::Danger => Self::Danger,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
