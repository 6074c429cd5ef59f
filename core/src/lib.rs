//! Client core for the KrishiLink crop marketplace.
//!
//! # Overview
//! Everything a marketplace front end needs that is not markup:
//! - `client` builds `HttpRequest`s and parses `HttpResponse`s for the REST
//!   API without touching the network (host-does-IO pattern);
//! - `api` composes the client with a host `Transport` and local validation;
//! - `pipeline` derives the searched/filtered/sorted listing view;
//! - `toast` and `ticker` run the notification queue;
//! - `session` holds the signed-in identity explicitly.
//!
//! # Design
//! - `MarketClient` is stateless and holds only the base URL and token.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the core stays deterministic.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod session;
pub mod ticker;
pub mod toast;
pub mod types;
pub mod validate;

pub use api::MarketApi;
pub use client::MarketClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use pipeline::{transform, Query, SortKey, TypeFilter};
pub use session::{Session, SessionContext};
pub use ticker::Ticker;
pub use toast::{Toast, ToastId, ToastKind, ToastManager};
pub use types::{
    CropType, Interest, InterestStatus, InterestStatusUpdate, Listing, ListingInput, NewInterest,
    Owner, ProfileUpdate, Role, Unit, UserProfile,
};
