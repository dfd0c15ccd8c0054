//! HTTP client with bearer auth and transparent session refresh
//!
//! Every request carries the stored access token. When a request comes back
//! with 401 the client asks the [`RefreshCoordinator`] for a new token and
//! replays the request once. A second 401 is final.

use crate::auth::{AuthApi, RefreshCoordinator, SessionEvent, SessionEvents, REFRESH_PATH};
use crate::error::{Error, Result};
use crate::session::SessionStore;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Path (or absolute URL) of the refresh endpoint
    pub refresh_path: String,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            base_url: None,
            refresh_path: REFRESH_PATH.to_string(),
            timeout: Duration::from_secs(30),
            default_headers,
            user_agent: format!("storefront-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// This request is already a replay after a refresh; a 401 is final
    pub retried: bool,
    /// Never refresh on 401 (auth endpoints)
    pub skip_refresh: bool,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mark as already retried
    #[must_use]
    pub fn as_retry(mut self) -> Self {
        self.retried = true;
        self
    }

    /// Opt out of refresh handling
    #[must_use]
    pub fn skip_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }
}

/// HTTP client that attaches the session token and renews it on 401
///
/// Cloning is cheap and shares the connection pool, cookie jar, session
/// store and refresh state.
#[derive(Clone)]
pub struct AuthenticatedHttpClient {
    client: Client,
    config: Arc<HttpClientConfig>,
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
    coordinator: RefreshCoordinator,
}

impl AuthenticatedHttpClient {
    /// Create a client with its own event channel
    pub fn new(config: HttpClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_events(config, store, SessionEvents::new())
    }

    /// Create a client that reports session changes on `events`
    pub fn with_events(
        config: HttpClientConfig,
        store: Arc<dyn SessionStore>,
        events: SessionEvents,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .map_err(Error::Http)?;

        let refresh_url = build_url(config.base_url.as_deref(), &config.refresh_path);
        let coordinator = RefreshCoordinator::new(
            client.clone(),
            refresh_url,
            Arc::clone(&store),
            events.clone(),
        );

        Ok(Self {
            client,
            config: Arc::new(config),
            store,
            events,
            coordinator,
        })
    }

    /// Auth endpoints bound to this client
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Value) -> Result<Response> {
        self.request(Method::POST, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Value) -> Result<Response> {
        self.request(Method::PUT, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(Method::DELETE, url, RequestConfig::default())
            .await
    }

    /// Make a generic request
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url);

        let token = self.store.access_token().await?;
        if token.is_none() {
            debug!("No access token stored, sending {} {} unauthenticated", method, full_url);
        }

        let response = self
            .send(&method, &full_url, &config, token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(&method, &full_url, response).await;
        }

        if config.retried || config.skip_refresh {
            debug!("401 on {} {} is final", method, full_url);
            return Err(unauthorized(response).await);
        }

        debug!("401 on {} {}, acquiring a fresh token", method, full_url);
        let fresh = self.coordinator.acquire_token(token.as_deref()).await?;

        let replay = config.as_retry();
        let response = self
            .send(&method, &full_url, &replay, Some(&fresh))
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Replayed {} {} rejected again", method, full_url);
            return Err(unauthorized(response).await);
        }

        check_status(&method, &full_url, response).await
    }

    /// Make a request and parse JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, url, config).await?;
        let json: T = response.json().await.map_err(Error::Http)?;
        Ok(json)
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.request_json(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a POST request and parse JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<T> {
        self.request_json(Method::POST, url, RequestConfig::default().json(body))
            .await
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        build_url(self.config.base_url.as_deref(), path)
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        config: &RequestConfig,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut req = self.client.request(method.clone(), url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !config.query.is_empty() {
            req = req.query(&config.query);
        }

        if let Some(ref body) = config.body {
            req = req.json(body);
        }

        if let Some(timeout) = config.timeout {
            req = req.timeout(timeout);
        }

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        req.send().await.map_err(Error::Http)
    }
}

impl std::fmt::Debug for AuthenticatedHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedHttpClient")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

fn build_url(base_url: Option<&str>, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    match base_url {
        Some(base) => {
            let base = base.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
        None => path.to_string(),
    }
}

async fn check_status(method: &Method, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        debug!("Request succeeded: {} {}", method, url);
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

async fn unauthorized(response: Response) -> Error {
    Error::Unauthorized {
        body: response.text().await.unwrap_or_default(),
    }
}
