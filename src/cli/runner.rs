//! CLI runner - executes commands

use crate::auth::{EndReason, RegisterRequest, SessionEvent};
use crate::cli::commands::{Cli, Commands};
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::http::{AuthenticatedHttpClient, RequestConfig};
use crate::session::{FileSessionStore, SessionStore};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Resolve settings from file, environment and flags
    pub fn settings(&self) -> Result<ClientSettings> {
        let mut settings = ClientSettings::load(self.cli.config.as_deref())?;
        if let Some(url) = &self.cli.base_url {
            settings.base_url.clone_from(url);
        }
        if let Some(file) = &self.cli.session_file {
            settings.session_file.clone_from(file);
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let settings = self.settings()?;
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&settings.session_file));
        let client = AuthenticatedHttpClient::new(settings.http_config(), store)?;
        let mut events = client.subscribe();

        let result = self.dispatch(&client).await;
        report_session_end(&mut events);
        result
    }

    async fn dispatch(&self, client: &AuthenticatedHttpClient) -> Result<()> {
        let auth = client.auth();

        match &self.cli.command {
            Commands::Login {
                username_or_email,
                password,
            } => {
                let session = auth.login(username_or_email, password).await?;
                print_json(&json!({ "user": session.user }))
            }

            Commands::Register {
                username,
                email,
                password,
                phone,
            } => {
                let request = RegisterRequest::new(username, email, password, phone);
                let session = auth.register(&request).await?;
                print_json(&json!({ "user": session.user }))
            }

            Commands::Logout => auth.logout().await,

            Commands::Refresh => {
                let session = auth.refresh().await?;
                print_json(&json!({ "refreshed": true, "user": session.user }))
            }

            Commands::Whoami => match auth.current_session().await? {
                Some(session) => print_json(&json!({
                    "user": session.user,
                    "role": session.role(),
                    "updatedAt": session.updated_at,
                })),
                None => Err(Error::SessionEnded),
            },

            Commands::Request {
                method,
                path,
                data,
                query,
            } => {
                let method = parse_method(method)?;
                let config = build_request_config(data.as_deref(), query)?;
                let response = client.request(method, path, config).await?;

                let text = response.text().await.map_err(Error::Http)?;
                if text.trim().is_empty() {
                    return Ok(());
                }
                match serde_json::from_str::<Value>(&text) {
                    Ok(value) => print_json(&value),
                    Err(_) => {
                        println!("{text}");
                        Ok(())
                    }
                }
            }
        }
    }
}

fn parse_method(raw: &str) -> Result<Method> {
    match raw.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(Error::validation(
            "method",
            format!("unsupported HTTP method '{other}'"),
        )),
    }
}

fn build_request_config(data: Option<&str>, query: &[String]) -> Result<RequestConfig> {
    let mut config = RequestConfig::new();

    if let Some(data) = data {
        config = config.json(serde_json::from_str(data)?);
    }

    for pair in query {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::validation("query", format!("expected KEY=VALUE, got '{pair}'")))?;
        config = config.query(key, value);
    }

    Ok(config)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Tell the user to log in again if a refresh ended the session
fn report_session_end(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if matches!(
            event,
            SessionEvent::Ended {
                reason: EndReason::RefreshFailed
            }
        ) {
            warn!("Session expired; run `storefront login` to sign in again");
        }
    }
}
