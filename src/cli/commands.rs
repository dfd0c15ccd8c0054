//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storefront API command-line client
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides settings and environment)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Session file (overrides settings and environment)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Username or email
        username_or_email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Register a customer account and store the session
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Phone number, digits only
        #[arg(long)]
        phone: String,
    },

    /// Log out and clear the stored session
    Logout,

    /// Renew the access token now
    Refresh,

    /// Show the stored session user
    Whoami,

    /// Send an authenticated request and print the JSON response
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path relative to the base URL, e.g. /api/orders/me
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,

        /// Query parameters as key=value
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
    },
}
