//! Token requests and SOAP endpoint discovery.

use busbar_mc_client::McHttpClient;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::credential::{Credential, PresetToken};
use crate::error::{Error, ErrorKind, Result};
use crate::{DEFAULT_AUTH_URL, DEFAULT_ENDPOINTS_URL};

/// Connected-app configuration for the authorization service.
///
/// The client secret is redacted in Debug output.
#[derive(Clone)]
pub struct AuthConfig {
    /// Installed package client id.
    pub client_id: String,
    client_secret: String,
    /// Token request URL.
    pub auth_url: String,
    /// SOAP endpoint discovery URL.
    pub endpoints_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_url", &self.auth_url)
            .field("endpoints_url", &self.endpoints_url)
            .finish()
    }
}

impl AuthConfig {
    /// Create a config pointing at the production services.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            endpoints_url: DEFAULT_ENDPOINTS_URL.to_string(),
        }
    }

    /// Override the token request URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Override the endpoint discovery URL.
    pub fn with_endpoints_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints_url = url.into();
        self
    }
}

/// Body of the token request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub access_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
}

/// Reply of the token request.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub legacy_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("legacy_token", &self.legacy_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Reply of the endpoint discovery call.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointResponse {
    pub url: Option<String>,
}

/// Owns the credential for one client and keeps it fresh.
///
/// Not synchronized: callers sharing one authenticator across tasks must wrap
/// it in their own lock.
#[derive(Debug)]
pub struct Authenticator {
    config: AuthConfig,
    http: McHttpClient,
    credential: Credential,
}

impl Authenticator {
    /// Create an authenticator with an empty credential.
    pub fn new(config: AuthConfig, http: McHttpClient) -> Self {
        Self {
            config,
            http,
            credential: Credential::default(),
        }
    }

    /// Use a known SOAP endpoint instead of discovering it.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.credential.set_endpoint(Some(endpoint.into()));
        self
    }

    /// Seed the credential with tokens obtained elsewhere.
    ///
    /// The refresh interval starts counting now.
    pub fn with_preset_token(mut self, token: PresetToken) -> Self {
        self.credential.store_tokens(
            token.access_token,
            token.legacy_token,
            token.refresh_token,
            token.expires_at,
            Utc::now(),
        );
        self
    }

    /// Current credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Authorization service configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Whether the credential needs a new token.
    pub fn is_expired(&self) -> bool {
        !self.credential.is_valid_at(Utc::now())
    }

    /// Request a new token if the current one is expired or `force` is set,
    /// then discover the endpoint if none is known or `force` is set.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self, force: bool) -> Result<()> {
        if force || self.is_expired() {
            self.refresh_token().await?;
        }

        if force || self.credential.endpoint().is_none() {
            self.detect_endpoint().await?;
        }

        Ok(())
    }

    /// Request a new access token and legacy token.
    ///
    /// Any non-200 reply fails with [`ErrorKind::Authentication`].
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub async fn refresh_token(&mut self) -> Result<()> {
        let payload = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            access_type: "offline",
            refresh_token: self.credential.refresh_token(),
        };

        let request = self
            .http
            .post(&self.config.auth_url)
            .json(&payload)?;
        let response = self.http.execute(request).await?;

        let status = response.status();
        if status != 200 {
            return Err(Error::new(ErrorKind::Authentication(format!(
                "token request rejected with status {}",
                status
            ))));
        }

        let token: TokenResponse = response.json().await?;
        self.store(token, Utc::now())?;

        info!(expires_at = ?self.credential.expires_at(), "Access token refreshed");
        Ok(())
    }

    /// Look up the SOAP endpoint for the current access token.
    ///
    /// Network failures and malformed replies fail with
    /// [`ErrorKind::ApiRequest`]. A reply without a URL leaves the endpoint unset.
    #[instrument(skip(self))]
    pub async fn detect_endpoint(&mut self) -> Result<()> {
        let token = self.credential.access_token().unwrap_or_default();
        let request = self
            .http
            .get(&self.config.endpoints_url)
            .query("access_token", token);

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !response.is_success() {
            return Err(Error::new(ErrorKind::ApiRequest(format!(
                "endpoint discovery failed with status {}",
                status
            ))));
        }

        let body: EndpointResponse = response.json().await?;
        match body.url {
            Some(url) => {
                info!(endpoint = %url, "SOAP endpoint discovered");
                self.credential.set_endpoint(Some(url));
            }
            None => debug!("Endpoint discovery returned no url"),
        }

        Ok(())
    }

    fn store(&mut self, token: TokenResponse, now: DateTime<Utc>) -> Result<()> {
        let access_token = token.access_token.ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse("missing accessToken".to_string()))
        })?;
        let legacy_token = token.legacy_token.ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse("missing legacyToken".to_string()))
        })?;
        let expires_in = token.expires_in.ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse("missing expiresIn".to_string()))
        })?;
        let expires_at = Some(expires_in)
            .filter(|secs| *secs >= 0)
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse("invalid expiresIn".to_string()))
            })?;

        self.credential.store_tokens(
            access_token,
            legacy_token,
            token.refresh_token,
            expires_at,
            now,
        );
        Ok(())
    }
}
