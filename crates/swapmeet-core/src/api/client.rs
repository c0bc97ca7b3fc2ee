//! Session-aware HTTP client for the swapmeet REST API.
//!
//! Every call goes through [`ApiClient::request`], which attaches the stored
//! access token, and on a 401 refreshes it once and replays the request.
//! When the refresh itself fails the stored credentials are cleared and the
//! host's unauthenticated hook is invoked.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{SessionStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

use super::request::{classify, Disposition, PendingRequest, RequestBody, RequestOptions};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the token refresh endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// HTTP request timeout in seconds.
/// Listing uploads with several images need more headroom than plain JSON calls.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Callback run when the session cannot be recovered and the user must log in again
pub type UnauthenticatedHook = Arc<dyn Fn() + Send + Sync>;

/// How concurrent 401 responses share refresh work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Every rejected request issues its own refresh call
    #[default]
    Independent,
    /// Rejected requests queue behind one refresh; later ones reuse its token
    SingleFlight,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the server rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

/// API client for the swapmeet backend.
/// Clone is cheap - the connection pool, store, and refresh lock are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    on_unauthenticated: UnauthenticatedHook,
    refresh_mode: RefreshMode,
    refresh_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("refresh_mode", &self.refresh_mode)
            .finish_non_exhaustive()
    }
}

pub struct ApiClientBuilder {
    base_url: String,
    store: Arc<dyn SessionStore>,
    on_unauthenticated: Option<UnauthenticatedHook>,
    refresh_mode: RefreshMode,
    timeout: Duration,
}

impl ApiClientBuilder {
    /// Hook invoked once each time a refresh fails and credentials are cleared
    pub fn on_unauthenticated<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_unauthenticated = Some(Arc::new(hook));
        self
    }

    pub fn refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let client = Client::builder().timeout(self.timeout).build()?;
        let on_unauthenticated = self
            .on_unauthenticated
            .unwrap_or_else(|| Arc::new(default_unauthenticated_hook));

        Ok(ApiClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            store: self.store,
            on_unauthenticated,
            refresh_mode: self.refresh_mode,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }
}

fn default_unauthenticated_hook() {
    info!("Session ended - login required");
}

impl ApiClient {
    /// Create a client with default settings
    pub fn new(base_url: &str, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Self::builder(base_url, store).build()
    }

    pub fn builder(base_url: &str, store: Arc<dyn SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.to_string(),
            store,
            on_unauthenticated: None,
            refresh_mode: RefreshMode::default(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Send a request to `base_url + path`.
    ///
    /// Any response other than a first 401 is returned as-is, whatever its
    /// status. A first 401 triggers one refresh and one replay, and the
    /// replay's response is returned even if it is another 401. If the
    /// refresh fails the error is `ApiError::RefreshFailed`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let access = self.store.get(ACCESS_TOKEN_KEY);
        let pending = PendingRequest::build(
            method,
            &self.base_url,
            path,
            body,
            &options,
            access.as_deref(),
        )?;
        self.execute(pending).await
    }

    async fn execute(&self, mut pending: PendingRequest) -> Result<Response, ApiError> {
        loop {
            let response = self.send(&pending).await?;
            match classify(response.status(), &pending) {
                Disposition::Resolve => return Ok(response),
                Disposition::Refresh => {
                    debug!(
                        method = %pending.method(),
                        url = %pending.url(),
                        "Access token rejected, refreshing"
                    );
                    let token = self.refresh_for(&pending).await?;
                    pending = pending.into_retry(&token)?;
                }
            }
        }
    }

    async fn send(&self, pending: &PendingRequest) -> Result<Response, ApiError> {
        debug!(
            method = %pending.method(),
            url = %pending.url(),
            retry = pending.is_retried(),
            authenticated = pending.bearer().is_some(),
            "Sending request"
        );
        let response = pending.to_reqwest(&self.client)?.send().await?;
        debug!(status = response.status().as_u16(), url = %pending.url(), "Response received");
        Ok(response)
    }

    /// Obtain the token to replay `pending` with
    async fn refresh_for(&self, pending: &PendingRequest) -> Result<String, ApiError> {
        match self.refresh_mode {
            RefreshMode::Independent => self.refresh_or_end_session().await,
            RefreshMode::SingleFlight => {
                let _guard = self.refresh_lock.lock().await;
                if let Some(current) = self.store.get(ACCESS_TOKEN_KEY) {
                    if pending.bearer() != Some(current.as_str()) {
                        debug!("Access token already replaced by a concurrent refresh");
                        return Ok(current);
                    }
                }
                self.refresh_or_end_session().await
            }
        }
    }

    async fn refresh_or_end_session(&self) -> Result<String, ApiError> {
        match self.refresh_access_token().await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing stored credentials");
                if let Err(store_err) = self.store.clear_tokens() {
                    warn!(error = %store_err, "Failed to clear stored credentials");
                }
                (self.on_unauthenticated)();
                Err(ApiError::refresh_failed(e))
            }
        }
    }

    /// Exchange the stored refresh token for a new access token and persist it.
    ///
    /// This call is sent without an `Authorization` header and never goes
    /// through the refresh lifecycle itself.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let refresh = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .ok_or(ApiError::MissingRefreshToken)?;

        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let tokens: RefreshResponse = Self::parse_json(response, &url).await?;

        self.store
            .set(ACCESS_TOKEN_KEY, &tokens.access)
            .map_err(ApiError::Store)?;
        if let Some(rotated) = tokens.refresh {
            self.store
                .set(REFRESH_TOKEN_KEY, &rotated)
                .map_err(ApiError::Store)?;
        }
        info!("Access token refreshed");
        Ok(tokens.access)
    }

    // ===== Typed helpers for the resource wrappers =====

    /// Check if response is successful, returning an error with body if not.
    pub async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path, body, options).await?;
        let url = response.url().to_string();
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_json_with(path, RequestOptions::default()).await
    }

    pub(crate) async fn get_json_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send_json(Method::GET, path, RequestBody::Empty, options).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::POST, path, RequestBody::json(body)?, RequestOptions::default())
            .await
    }

    /// POST with no payload, as used by the swap/bid action endpoints
    pub(crate) async fn post_action<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(Method::POST, path, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub(crate) async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::PATCH, path, RequestBody::json(body)?, RequestOptions::default())
            .await
    }

    /// DELETE a resource; success responses carry no body
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, path, RequestBody::Empty, RequestOptions::default())
            .await?;
        let response = Self::check_response(response).await?;
        if response.status() != StatusCode::NO_CONTENT {
            debug!(status = response.status().as_u16(), "Delete returned a body");
        }
        Ok(())
    }
}
