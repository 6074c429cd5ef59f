//! Stateless HTTP request builder and response parser for the marketplace API.
//!
//! # Design
//! `MarketClient` holds only the base URL and bearer token and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The host executes the round-trip in between, keeping
//! the core deterministic and free of I/O.
//!
//! Successful bodies are `{"success": true, "data": ...}`; the `parse_*`
//! methods unwrap `data`. Error bodies carry a `message` that is surfaced
//! verbatim through `ApiError`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Envelope, ErrorBody, Interest, InterestStatusUpdate, Listing, ListingInput, NewInterest,
    ProfileUpdate, UserProfile,
};

/// Characters left unescaped in path segments and query values.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Header naming the acting user for ownership-scoped crop mutations.
pub const USER_EMAIL_HEADER: &str = "user-email";

/// Synchronous, stateless client for the marketplace API.
#[derive(Debug, Clone)]
pub struct MarketClient {
    base_url: String,
    token: String,
}

impl MarketClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.bearer_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A copy of this client that authenticates with `token` instead of the
    /// configured one.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: token.to_string(),
        }
    }

    // --- crops ------------------------------------------------------------

    /// `GET /api/crops`, optionally narrowed server-side by `search`. The term
    /// is sent as typed; only an empty term drops the query.
    pub fn build_list_listings(&self, search: Option<&str>) -> HttpRequest {
        let path = match search.filter(|s| !s.is_empty()) {
            Some(term) => format!("{}/api/crops?search={}", self.base_url, encode(term)),
            None => format!("{}/api/crops", self.base_url),
        };
        self.request(HttpMethod::Get, path, None, None)
    }

    pub fn build_latest_listings(&self) -> HttpRequest {
        let path = format!("{}/api/crops/latest", self.base_url);
        self.request(HttpMethod::Get, path, None, None)
    }

    pub fn build_get_listing(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.crop_url(id), None, None)
    }

    pub fn build_create_listing(
        &self,
        input: &ListingInput,
        actor_email: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        let path = format!("{}/api/crops", self.base_url);
        Ok(self.request(HttpMethod::Post, path, Some(body), Some(actor_email)))
    }

    pub fn build_update_listing(
        &self,
        id: &str,
        input: &ListingInput,
        actor_email: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Put, self.crop_url(id), Some(body), Some(actor_email)))
    }

    pub fn build_delete_listing(&self, id: &str, actor_email: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.crop_url(id), None, Some(actor_email))
    }

    pub fn parse_list_listings(&self, response: HttpResponse) -> Result<Vec<Listing>, ApiError> {
        parse_data(response)
    }

    pub fn parse_latest_listings(&self, response: HttpResponse) -> Result<Vec<Listing>, ApiError> {
        parse_data(response)
    }

    pub fn parse_get_listing(&self, response: HttpResponse) -> Result<Listing, ApiError> {
        parse_data(response)
    }

    pub fn parse_create_listing(&self, response: HttpResponse) -> Result<Listing, ApiError> {
        parse_data(response)
    }

    pub fn parse_update_listing(&self, response: HttpResponse) -> Result<Listing, ApiError> {
        parse_data(response)
    }

    pub fn parse_delete_listing(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // --- interests --------------------------------------------------------

    pub fn build_add_interest(&self, input: &NewInterest) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        let path = format!("{}/api/interests", self.base_url);
        Ok(self.request(HttpMethod::Post, path, Some(body), None))
    }

    pub fn build_sent_interests(&self, email: &str) -> HttpRequest {
        let path = format!("{}/api/interests/sent?email={}", self.base_url, encode(email));
        self.request(HttpMethod::Get, path, None, None)
    }

    pub fn build_received_interests(&self, email: &str) -> HttpRequest {
        let path = format!(
            "{}/api/interests/received?email={}",
            self.base_url,
            encode(email)
        );
        self.request(HttpMethod::Get, path, None, None)
    }

    pub fn build_update_interest_status(
        &self,
        update: &InterestStatusUpdate,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(update)?;
        let path = format!("{}/api/interests/status", self.base_url);
        Ok(self.request(HttpMethod::Put, path, Some(body), None))
    }

    pub fn parse_add_interest(&self, response: HttpResponse) -> Result<Interest, ApiError> {
        parse_data(response)
    }

    pub fn parse_sent_interests(&self, response: HttpResponse) -> Result<Vec<Interest>, ApiError> {
        parse_data(response)
    }

    pub fn parse_received_interests(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Interest>, ApiError> {
        parse_data(response)
    }

    pub fn parse_update_interest_status(&self, response: HttpResponse) -> Result<Interest, ApiError> {
        parse_data(response)
    }

    // --- users ------------------------------------------------------------

    pub fn build_create_user(&self, profile: &UserProfile) -> Result<HttpRequest, ApiError> {
        let body = to_json(profile)?;
        let path = format!("{}/api/users", self.base_url);
        Ok(self.request(HttpMethod::Post, path, Some(body), None))
    }

    pub fn build_list_users(&self) -> HttpRequest {
        let path = format!("{}/api/users", self.base_url);
        self.request(HttpMethod::Get, path, None, None)
    }

    pub fn build_get_user(&self, email: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.user_url(email), None, None)
    }

    pub fn build_update_user(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(update)?;
        Ok(self.request(HttpMethod::Put, self.user_url(email), Some(body), None))
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        parse_data(response)
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<UserProfile>, ApiError> {
        parse_data(response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        parse_data(response)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        parse_data(response)
    }

    // --- helpers ----------------------------------------------------------

    fn crop_url(&self, id: &str) -> String {
        format!("{}/api/crops/{}", self.base_url, encode(id))
    }

    fn user_url(&self, email: &str) -> String {
        format!("{}/api/users/{}", self.base_url, encode(email))
    }

    /// Headers are always emitted in the order: authorization, content-type,
    /// user-email.
    fn request(
        &self,
        method: HttpMethod,
        path: String,
        body: Option<String>,
        actor_email: Option<&str>,
    ) -> HttpRequest {
        let mut headers = vec![("authorization".to_string(), format!("Bearer {}", self.token))];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(email) = actor_email {
            headers.push((USER_EMAIL_HEADER.to_string(), email.to_string()));
        }
        tracing::debug!(%method, %path, "built request");
        HttpRequest {
            method,
            path,
            headers,
            body,
        }
    }
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn parse_data<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    let envelope: Envelope<T> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Deserialization(e.to_string()))?;
    Ok(envelope.data)
}

/// Map non-2xx status codes to the appropriate `ApiError` variant, pulling the
/// human-readable `message` out of the body when there is one.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
    tracing::warn!(status = response.status, %message, "request failed");
    if response.status == 404 {
        return Err(ApiError::NotFound { message });
    }
    Err(ApiError::Http {
        status: response.status,
        message,
    })
}
