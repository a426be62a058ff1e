//! CLI module for pageloader
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Commands, RunArgs, Verbosity};
