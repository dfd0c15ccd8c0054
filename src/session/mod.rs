//! Session module
//!
//! Holds the current access token and user info between requests and,
//! with `FileSessionStore`, between process runs.
//!
//! # Overview
//!
//! - `Session` - Access token plus user info
//! - `Role` - Normalized user role
//! - `SessionStore` - Storage trait used by the HTTP client and refresh coordinator
//! - `MemorySessionStore` / `FileSessionStore` - Store implementations

mod store;
mod types;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{Role, Session, UserInfo};
