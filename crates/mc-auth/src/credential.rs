//! Token state held by an [`Authenticator`](crate::Authenticator).

use chrono::{DateTime, Duration, Utc};

use crate::{EXPIRY_MARGIN_SECS, REFRESH_INTERVAL_SECS};

/// Tokens and endpoint for one Marketing Cloud account.
///
/// Created empty and mutated only by the authenticator. Token values are
/// redacted in Debug output.
#[derive(Clone, Default)]
pub struct Credential {
    access_token: Option<String>,
    legacy_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    endpoint: Option<String>,
    last_refresh: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("legacy_token", &self.legacy_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("endpoint", &self.endpoint)
            .field("last_refresh", &self.last_refresh)
            .finish()
    }
}

impl Credential {
    /// Current access token, if one was obtained.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Legacy token carried in SOAP headers.
    pub fn legacy_token(&self) -> Option<&str> {
        self.legacy_token.as_deref()
    }

    /// Refresh token, if the service issued one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Absolute expiry of the access token.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// SOAP service endpoint for the account.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// When tokens were last stored.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Whether the credential can be used at `now`.
    ///
    /// Both guards must hold: the token expires at least
    /// [`EXPIRY_MARGIN_SECS`] after `now`, and no more than
    /// [`REFRESH_INTERVAL_SECS`] have passed since the last refresh.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_none() {
            return false;
        }
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        if expires_at < now + Duration::seconds(EXPIRY_MARGIN_SECS) {
            return false;
        }
        match self.last_refresh {
            Some(last) => last + Duration::seconds(REFRESH_INTERVAL_SECS) >= now,
            None => false,
        }
    }

    pub(crate) fn store_tokens(
        &mut self,
        access_token: String,
        legacy_token: String,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        self.access_token = Some(access_token);
        self.legacy_token = Some(legacy_token);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = Some(expires_at);
        self.last_refresh = Some(now);
    }

    pub(crate) fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.endpoint = endpoint;
    }
}

/// Tokens obtained out of band and handed to the authenticator at startup.
///
/// The access token, expiry and legacy token travel together; the refresh
/// token is optional.
#[derive(Clone)]
pub struct PresetToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub legacy_token: String,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for PresetToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("legacy_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
