use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::store::ACCESS_TOKEN_KEY;

/// Login lifecycle on top of an [`ApiClient`] and its credential store.
#[derive(Debug, Clone)]
pub struct SessionManager {
    client: ApiClient,
}

impl SessionManager {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// True when an access token is stored. Says nothing about its validity.
    pub fn is_authenticated(&self) -> bool {
        self.client.store().get(ACCESS_TOKEN_KEY).is_some()
    }

    /// Log in, persist the issued token pair, and return the current user
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let tokens = match self.client.login(email, password).await {
            Ok(tokens) => tokens,
            // bad credentials come back as 401 and fail the refresh attempt
            Err(ApiError::RefreshFailed(_)) => return Err(ApiError::Unauthorized),
            Err(e) => return Err(e),
        };
        self.client
            .store()
            .store_tokens(&tokens.access, &tokens.refresh)
            .map_err(ApiError::Store)?;
        debug!("Login succeeded, tokens stored");
        self.client.me().await
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.store().clear_tokens().map_err(ApiError::Store)
    }

    /// Resume a stored session.
    ///
    /// Returns `Ok(None)` when there is no session or the server rejected it
    /// (see [`ApiError::requires_login`]); only then are the stored
    /// credentials cleared. Any other failure is returned as an error and
    /// leaves credentials intact.
    pub async fn restore(&self) -> Result<Option<User>, ApiError> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        match self.client.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.requires_login() => {
                warn!(error = %e, "Stored session rejected, clearing credentials");
                self.logout()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
