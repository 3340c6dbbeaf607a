//! Command-line interface for chronoscope
//!
//! This module contains CLI argument parsing and configuration

pub mod args;

pub use args::Args;
