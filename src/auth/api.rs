//! Auth endpoints
//!
//! Login and registration seed the session store, logout clears it, and an
//! explicit refresh goes through the same single-flight coordinator the
//! HTTP client uses on 401.

use super::events::{EndReason, SessionEvent};
use super::types::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::Result;
use crate::http::{AuthenticatedHttpClient, RequestConfig};
use crate::session::Session;
use reqwest::Method;
use tracing::{info, warn};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Auth operations on top of an [`AuthenticatedHttpClient`]
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: AuthenticatedHttpClient,
}

impl AuthApi {
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        Self { client }
    }

    /// Log in and store the resulting session
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<Session> {
        let body = LoginRequest::new(username_or_email, password);
        body.validate()?;

        let response: AuthResponse = self
            .client
            .request_json(
                Method::POST,
                LOGIN_PATH,
                RequestConfig::new()
                    .json(serde_json::to_value(&body)?)
                    .skip_refresh(),
            )
            .await?;

        let session = self.start_session(response).await?;
        info!(user = ?session.user.as_ref().and_then(|u| u.username.as_deref()), "Logged in");
        Ok(session)
    }

    /// Register a customer account and store the resulting session
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session> {
        request.validate()?;

        let response: AuthResponse = self
            .client
            .request_json(
                Method::POST,
                REGISTER_PATH,
                RequestConfig::new()
                    .json(serde_json::to_value(request)?)
                    .skip_refresh(),
            )
            .await?;

        let session = self.start_session(response).await?;
        info!(username = %request.username, "Registered");
        Ok(session)
    }

    /// Log out.
    ///
    /// The server is notified on a best-effort basis; the local session is
    /// cleared whether or not that succeeds.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self
            .client
            .request(Method::POST, LOGOUT_PATH, RequestConfig::new().skip_refresh())
            .await
        {
            warn!("Logout request failed: {e}");
        }

        self.client.store().clear().await?;
        self.client.events().emit(SessionEvent::Ended {
            reason: EndReason::LoggedOut,
        });
        info!("Logged out");
        Ok(())
    }

    /// Renew the access token now.
    ///
    /// Joins an in-flight refresh if there is one.
    pub async fn refresh(&self) -> Result<Session> {
        self.client.coordinator().acquire_token(None).await?;
        self.client
            .store()
            .load()
            .await?
            .ok_or(crate::Error::SessionEnded)
    }

    /// Session currently in storage
    pub async fn current_session(&self) -> Result<Option<Session>> {
        self.client.store().load().await
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.current_session().await?.is_some())
    }

    async fn start_session(&self, response: AuthResponse) -> Result<Session> {
        let session = response.into_session()?;
        self.client.store().save(&session).await?;
        self.client.events().emit(SessionEvent::Started);
        Ok(session)
    }
}
