//! CLI command definitions and handlers
//!
//! This module organizes the CLI into logical submodules:
//! - [`commands`] - Command and subcommand enum definitions
//! - [`handlers`] - Command execution handlers
//! - [`introspect`] - JSON description of the command tree

mod commands;
mod handlers;
mod introspect;

pub use commands::*;
pub use handlers::*;
pub use introspect::*;
