//! Auth endpoint payloads
//!
//! Request bodies validate themselves before they are sent so obviously bad
//! input never reaches the server.

use crate::error::{Error, Result};
use crate::session::{Role, Session, UserInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6,15}$").expect("valid phone regex"));

/// Body returned by login, register and refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl AuthResponse {
    /// Turn a login/register response into a session.
    ///
    /// The user's role is normalized; a missing or unknown role is rejected.
    pub fn into_session(self) -> Result<Session> {
        let mut user = self.user.unwrap_or_default();
        let role = user
            .role
            .as_deref()
            .and_then(Role::normalize)
            .ok_or_else(|| Error::InvalidRole {
                role: user.role.clone(),
            })?;
        user.role = Some(role.as_str().to_string());

        Ok(Session::new(self.access_token, Some(user)))
    }
}

/// Body for `POST /api/auth/login`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("usernameOrEmail", &self.username_or_email)?;
        require_non_blank("password", &self.password)
    }
}

/// Body for `POST /api/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            phone: phone.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("username", &self.username)?;
        require_len("username", &self.username, 3, 50)?;

        require_non_blank("email", &self.email)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(Error::validation("email", "not a valid email address"));
        }

        require_non_blank("password", &self.password)?;
        require_len("password", &self.password, 8, 100)?;

        if !PHONE_RE.is_match(&self.phone) {
            return Err(Error::validation("phone", "must be 6 to 15 digits"));
        }

        Ok(())
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be blank"));
    }
    Ok(())
}

fn require_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(Error::validation(
            field,
            format!("length must be between {min} and {max}"),
        ));
    }
    Ok(())
}
