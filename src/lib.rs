//! # Storefront Client
//!
//! Authenticated HTTP client for the Samah storefront REST API.
//!
//! ## Features
//!
//! - **Bearer Auth**: The stored access token is attached to every request
//! - **Single-Flight Refresh**: Concurrent 401s trigger exactly one refresh call,
//!   then every failed request is replayed once with the new token
//! - **Session Events**: Subscribe to session start, refresh and end
//! - **Durable Sessions**: In-memory or file-backed session storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_client::http::{AuthenticatedHttpClient, HttpClientConfig};
//! use storefront_client::session::MemorySessionStore;
//!
//! #[tokio::main]
//! async fn main() -> storefront_client::Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("http://localhost:8080")
//!         .build();
//!     let client = AuthenticatedHttpClient::new(config, Arc::new(MemorySessionStore::new()))?;
//!
//!     client.auth().login("mona@example.com", "s3cret-pass").await?;
//!     let orders: serde_json::Value = client.get_json("/api/orders/me").await?;
//!     println!("{orders}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   401    ┌────────────────────┐  POST /api/auth/refresh
//! │ Authenticated│ ───────► │ RefreshCoordinator │ ───────────────────────►
//! │ HttpClient   │ ◄─────── │ (single flight)    │
//! └──────┬───────┘  token   └─────────┬──────────┘
//!        │                            │
//!        ▼                            ▼
//! ┌──────────────┐           ┌────────────────┐
//! │ SessionStore │           │ SessionEvents  │
//! └──────────────┘           └────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Client settings
pub mod config;

/// Session types and storage
pub mod session;

/// Session refresh, events and auth endpoints
pub mod auth;

/// Authenticated HTTP client
pub mod http;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use auth::{AuthApi, EndReason, SessionEvent, SessionEvents};
pub use config::ClientSettings;
pub use http::{AuthenticatedHttpClient, HttpClientConfig, RequestConfig};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
