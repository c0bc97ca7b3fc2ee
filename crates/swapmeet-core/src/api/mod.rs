//! REST API client module for the swapmeet backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! marketplace API: listings, swap and bid offers, matching, reviews,
//! and messaging.
//!
//! The API uses JWT bearer tokens. An expired access token is refreshed
//! once per failed request via `POST /auth/refresh/` and the request is
//! replayed; see [`client`] for the lifecycle.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod request;

pub use client::{ApiClient, ApiClientBuilder, RefreshMode, UnauthenticatedHook, REFRESH_PATH};
pub use error::ApiError;
pub use request::{
    classify, Disposition, FormPart, PartValue, PendingRequest, RequestBody, RequestOptions,
};
