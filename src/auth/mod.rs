//! Authentication module
//!
//! Session renewal and the auth endpoints.
//!
//! The `RefreshCoordinator` makes sure at most one refresh call is in flight
//! and settles every caller that waited on it. `SessionEvents` tells the rest
//! of the application when a session starts, is refreshed or ends.

mod api;
mod events;
mod refresh;
mod types;

pub use api::{AuthApi, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH};
pub use events::{EndReason, SessionEvent, SessionEvents};
pub use refresh::RefreshCoordinator;
pub use types::{AuthResponse, LoginRequest, RegisterRequest};
