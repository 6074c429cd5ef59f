//! Client configuration.
//!
//! The API origin and bearer token come from the environment so the same
//! build can target production, a staging deployment, or a local mock server.

use std::env;

/// Environment variable selecting the API origin.
pub const API_URL_ENV: &str = "KRISHI_API_URL";

/// Environment variable carrying the bearer token.
pub const API_TOKEN_ENV: &str = "KRISHI_API_TOKEN";

pub const DEFAULT_API_URL: &str = "https://krishilink-server-side.vercel.app";

/// Token the development server accepts.
pub const DEFAULT_API_TOKEN: &str = "dev-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub bearer_token: String,
}

impl ClientConfig {
    pub fn new(base_url: &str, bearer_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        }
    }

    /// Reads [`API_URL_ENV`] and [`API_TOKEN_ENV`], falling back to defaults
    /// for unset or empty values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = lookup(API_TOKEN_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_TOKEN.to_string());
        Self::new(base_url.trim(), token.trim())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_API_TOKEN)
    }
}
