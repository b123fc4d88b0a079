//! CLI module - command-line interface
//!
//! Contains the subcommand definitions and their handlers.

pub mod commands;

pub use commands::{execute, Command, ScriptsCommand};
