//! HTTP client module
//!
//! Provides the authenticated HTTP client used for every storefront call.
//!
//! # Features
//!
//! - **Bearer Auth**: Stored access token attached to each request
//! - **Session Refresh**: Single-flight renewal on 401, then one replay
//! - **Cookie Jar**: Carries the refresh cookie set by the auth endpoints

mod client;

pub use client::{AuthenticatedHttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};

#[cfg(test)]
mod tests;
