//! Session types
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Role carried by an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Back-office administrator
    Admin,
    /// Back-office employee
    Employee,
    /// Storefront customer
    Customer,
}

impl Role {
    /// Parse a raw role string, ignoring surrounding whitespace and case.
    ///
    /// Returns `None` for blank or unknown roles.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "EMPLOYEE" => Some(Role::Employee),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    /// Canonical wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User information returned by the auth endpoints
///
/// Only `role` is interpreted by the client. Everything else is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Raw role string as sent by the server (normalized after login)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Fields the client does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    /// Parsed role, if the raw role is valid
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::normalize)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_employee(&self) -> bool {
        self.role() == Some(Role::Employee)
    }

    pub fn is_customer(&self) -> bool {
        self.role() == Some(Role::Customer)
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Short-lived bearer credential
    pub access_token: String,

    /// User the token belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,

    /// When this session (or its last refresh) was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session stamped with the current time
    pub fn new(access_token: impl Into<String>, user: Option<UserInfo>) -> Self {
        Self {
            access_token: access_token.into(),
            user,
            updated_at: Some(Utc::now()),
        }
    }

    /// Replace the token after a refresh.
    ///
    /// The user is only replaced when the refresh response carried one.
    pub fn refreshed(&self, access_token: impl Into<String>, user: Option<UserInfo>) -> Self {
        Self {
            access_token: access_token.into(),
            user: user.or_else(|| self.user.clone()),
            updated_at: Some(Utc::now()),
        }
    }

    /// Role of the session user, if known and valid
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(UserInfo::role)
    }
}
