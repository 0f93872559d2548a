//! Client settings.

use std::path::PathBuf;

use busbar_mc_auth::PresetToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, ErrorKind, Result};

/// Base URL for REST calls when none is configured.
pub const DEFAULT_REST_URL: &str = "https://www.exacttargetapis.com";

/// Settings consumed by [`ClientFactory`](crate::ClientFactory).
///
/// `client_id`, `client_secret` and `wsdl_local_path` are required. The
/// preset token group (`auth_token`, `auth_token_expiration`,
/// `auth_legacy_token`) is all-or-nothing; `auth_refresh_token` is optional
/// within it.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub wsdl_local_path: Option<PathBuf>,
    /// SOAP endpoint. Suppresses discovery until a forced refresh.
    pub endpoint: Option<String>,
    pub wsdl_url: Option<String>,
    pub auth_url: Option<String>,
    pub endpoint_discovery_url: Option<String>,
    pub rest_url: Option<String>,
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub debug: bool,
    pub wsdl_expire_secs: Option<u64>,
    pub auth_token: Option<String>,
    /// Expiry of `auth_token` in seconds since the Unix epoch.
    pub auth_token_expiration: Option<i64>,
    pub auth_legacy_token: Option<String>,
    pub auth_refresh_token: Option<String>,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ClientSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("wsdl_local_path", &self.wsdl_local_path)
            .field("endpoint", &self.endpoint)
            .field("wsdl_url", &self.wsdl_url)
            .field("auth_url", &self.auth_url)
            .field("endpoint_discovery_url", &self.endpoint_discovery_url)
            .field("rest_url", &self.rest_url)
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .field("wsdl_expire_secs", &self.wsdl_expire_secs)
            .field("auth_token", &redacted(&self.auth_token))
            .field("auth_token_expiration", &self.auth_token_expiration)
            .field("auth_legacy_token", &redacted(&self.auth_legacy_token))
            .field("auth_refresh_token", &redacted(&self.auth_refresh_token))
            .finish()
    }
}

impl ClientSettings {
    /// Settings with the three required values.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        wsdl_local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            wsdl_local_path: Some(wsdl_local_path.into()),
            ..Self::default()
        }
    }

    /// Load settings from environment variables and validate them.
    ///
    /// Required:
    /// - `MC_CLIENT_ID`
    /// - `MC_CLIENT_SECRET`
    /// - `MC_WSDL_LOCAL_PATH`
    ///
    /// Optional: `MC_ENDPOINT`, `MC_WSDL_URL`, `MC_AUTH_URL`, `MC_REST_URL`,
    /// `MC_USER_AGENT`, `MC_DEBUG` (`1`, `true` or `True`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let settings = Self {
            client_id: lookup("MC_CLIENT_ID"),
            client_secret: lookup("MC_CLIENT_SECRET"),
            wsdl_local_path: lookup("MC_WSDL_LOCAL_PATH").map(PathBuf::from),
            endpoint: lookup("MC_ENDPOINT"),
            wsdl_url: lookup("MC_WSDL_URL"),
            auth_url: lookup("MC_AUTH_URL"),
            rest_url: lookup("MC_REST_URL"),
            user_agent: lookup("MC_USER_AGENT"),
            debug: lookup("MC_DEBUG").is_some_and(|v| is_truthy(&v)),
            ..Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_wsdl_url(mut self, url: impl Into<String>) -> Self {
        self.wsdl_url = Some(url.into());
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    pub fn with_endpoint_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_discovery_url = Some(url.into());
        self
    }

    pub fn with_rest_url(mut self, url: impl Into<String>) -> Self {
        self.rest_url = Some(url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_wsdl_expire_secs(mut self, secs: u64) -> Self {
        self.wsdl_expire_secs = Some(secs);
        self
    }

    /// Seed the credential with tokens obtained elsewhere.
    pub fn with_auth_token(
        mut self,
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
        legacy_token: impl Into<String>,
    ) -> Self {
        self.auth_token = Some(access_token.into());
        self.auth_token_expiration = Some(expires_at.timestamp());
        self.auth_legacy_token = Some(legacy_token.into());
        self
    }

    pub fn with_auth_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.auth_refresh_token = Some(refresh_token.into());
        self
    }

    /// Check required values and the preset token group.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if is_blank(&self.client_id) {
            missing.push("client_id");
        }
        if is_blank(&self.client_secret) {
            missing.push("client_secret");
        }
        if self
            .wsdl_local_path
            .as_ref()
            .is_none_or(|p| p.as_os_str().is_empty())
        {
            missing.push("wsdl_local_path");
        }
        if !missing.is_empty() {
            return Err(Error::new(ErrorKind::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            ))));
        }

        let preset = [
            !is_blank(&self.auth_token),
            self.auth_token_expiration.is_some(),
            !is_blank(&self.auth_legacy_token),
        ];
        if preset.iter().any(|set| *set) && !preset.iter().all(|set| *set) {
            return Err(Error::new(ErrorKind::Configuration(
                "auth_token, auth_token_expiration and auth_legacy_token must be set together"
                    .to_string(),
            )));
        }

        Ok(())
    }

    /// The preset token group, if supplied.
    pub fn preset_token(&self) -> Result<Option<PresetToken>> {
        let (Some(access_token), Some(expiration), Some(legacy_token)) = (
            self.auth_token.as_ref(),
            self.auth_token_expiration,
            self.auth_legacy_token.as_ref(),
        ) else {
            return Ok(None);
        };

        let expires_at = DateTime::from_timestamp(expiration, 0).ok_or_else(|| {
            Error::new(ErrorKind::Configuration(format!(
                "auth_token_expiration {} is out of range",
                expiration
            )))
        })?;

        Ok(Some(PresetToken {
            access_token: access_token.clone(),
            expires_at,
            legacy_token: legacy_token.clone(),
            refresh_token: self.auth_refresh_token.clone(),
        }))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i == 1,
        Flag::Text(s) => is_truthy(&s),
    })
}
