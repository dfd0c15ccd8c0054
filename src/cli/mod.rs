//! CLI module
//!
//! Command-line interface for the storefront API.
//!
//! # Commands
//!
//! - `login` / `register` - Create a session and store it
//! - `logout` - End the session
//! - `refresh` - Renew the access token
//! - `whoami` - Show the stored user
//! - `request` - Send an authenticated request

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
