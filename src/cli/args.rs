//! Command-line argument parsing for pageloader
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// pageloader - splash-screen loading sequence in the terminal
#[derive(Parser, Debug)]
#[command(name = "pageloader")]
#[command(version)]
#[command(about = "Simulate a page-load splash sequence and the page widgets around it", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress everything but errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Subcommand (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run a simulated page load
    Run(RunArgs),

    /// Autoplay the hero slider for a while
    Slider {
        /// Number of slides
        #[arg(long, default_value_t = 3)]
        slides: usize,

        /// How long to run, in seconds
        #[arg(long, default_value_t = 20)]
        seconds: u64,
    },

    /// Simulate a contact form submission
    Form,

    /// Scroll through a page and reveal its sections
    Scroll {
        /// Number of page sections
        #[arg(long, default_value_t = 6)]
        sections: usize,

        /// Scroll distance per step
        #[arg(long, default_value_t = 120.0)]
        step_px: f64,
    },

    /// Display current configuration
    Config,
}

/// Options for a simulated page load
#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Number of simulated resources (images, stylesheets, scripts)
    #[arg(long, default_value_t = 6)]
    pub resources: usize,

    /// Probability that a resource fails to load
    #[arg(long, default_value_t = 0.0)]
    pub failure_rate: f64,

    /// Shortest simulated resource latency
    #[arg(long, default_value_t = 100)]
    pub min_latency_ms: u64,

    /// Longest simulated resource latency
    #[arg(long, default_value_t = 2500)]
    pub max_latency_ms: u64,

    /// Add one resource that never settles
    #[arg(long)]
    pub hang: bool,

    /// Override the configured minimum duration
    #[arg(long)]
    pub min_duration_ms: Option<u64>,

    /// Override the configured exit delay
    #[arg(long)]
    pub exit_delay_ms: Option<u64>,

    /// Write recorded telemetry as JSON to this file
    #[arg(long)]
    pub export_telemetry: Option<PathBuf>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            resources: 6,
            failure_rate: 0.0,
            min_latency_ms: 100,
            max_latency_ms: 2500,
            hang: false,
            min_duration_ms: None,
            exit_delay_ms: None,
            export_telemetry: None,
        }
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose > 0 {
            return Err("Cannot combine --quiet with --verbose.".to_string());
        }

        if let Some(Commands::Run(run)) = &self.command {
            run.validate()?;
        }

        if let Some(Commands::Slider { slides, seconds }) = &self.command {
            if *slides == 0 {
                return Err("Slider needs at least one slide.".to_string());
            }
            if *seconds == 0 {
                return Err("Slider duration must be at least one second.".to_string());
            }
        }

        if let Some(Commands::Scroll { sections, step_px }) = &self.command {
            if *sections == 0 {
                return Err("Scroll needs at least one section.".to_string());
            }
            if !(*step_px > 0.0) {
                return Err("--step-px must be greater than 0.".to_string());
            }
        }

        Ok(())
    }
}

impl RunArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err("--failure-rate must be between 0 and 1.".to_string());
        }
        if self.min_latency_ms > self.max_latency_ms {
            return Err("--min-latency-ms must not exceed --max-latency-ms.".to_string());
        }
        Ok(())
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Parse the config file's `default_verbosity`
    pub fn from_config(value: &str) -> Self {
        match value {
            "quiet" => Verbosity::Quiet,
            "verbose" => Verbosity::Verbose,
            "very_verbose" => Verbosity::VeryVerbose,
            _ => Verbosity::Normal,
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show lifecycle events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Default tracing filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }
}
