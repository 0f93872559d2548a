//! Client construction.

use std::sync::Arc;
use std::time::Duration;

use busbar_mc_auth::{AuthConfig, Authenticator};
use busbar_mc_client::{ClientConfig, McHttpClient};
use busbar_mc_soap::SoapClientFactory;
use tracing::{info, instrument};

use crate::client::Client;
use crate::config::{ClientSettings, DEFAULT_REST_URL};
use crate::error::{Error, ErrorKind, Result};
use crate::registry::{ResourceBinding, ResourceRegistry};
use crate::session::Session;

/// Builds [`Client`]s from one set of settings.
///
/// The WSDL is fetched or read from cache on the first
/// [`make`](Self::make) and reused for every later client.
#[derive(Debug)]
pub struct ClientFactory {
    settings: ClientSettings,
    registry: Arc<ResourceRegistry>,
    http: McHttpClient,
    soap: Option<SoapClientFactory>,
}

impl ClientFactory {
    /// Validate `settings` and prepare a factory with the standard registry.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        settings.validate()?;

        let mut config = ClientConfig::builder();
        if let Some(user_agent) = &settings.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        let http = McHttpClient::new(config.build())?;

        Ok(Self {
            settings,
            registry: Arc::new(ResourceRegistry::standard()),
            http,
            soap: None,
        })
    }

    /// Replace the registry used by clients made from now on.
    pub fn with_registry(mut self, registry: ResourceRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Add or replace a binding for clients made from now on.
    pub fn bind(&mut self, binding: ResourceBinding) -> &mut Self {
        Arc::make_mut(&mut self.registry).bind(binding);
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Build a client and refresh its credential, so rejected credentials
    /// fail here.
    #[instrument(skip(self))]
    pub async fn make(&mut self) -> Result<Client> {
        let soap = self.soap_factory().await?.clone();
        let auth = self.authenticator()?;
        let rest_url = self
            .settings
            .rest_url
            .clone()
            .unwrap_or_else(|| DEFAULT_REST_URL.to_string());

        let session = Session::new(auth, soap, self.http.clone(), rest_url);
        let mut client = Client::new(session, Arc::clone(&self.registry));
        client.refresh(false).await?;

        info!("Client ready");
        Ok(client)
    }

    async fn soap_factory(&mut self) -> Result<&SoapClientFactory> {
        if self.soap.is_none() {
            let local_path = self.settings.wsdl_local_path.clone().ok_or_else(|| {
                Error::new(ErrorKind::Configuration("missing wsdl_local_path".to_string()))
            })?;

            let mut factory = SoapClientFactory::new(local_path, self.http.clone())
                .with_debug(self.settings.debug);
            if let Some(url) = &self.settings.wsdl_url {
                factory = factory.with_wsdl_url(url.clone());
            }
            if let Some(secs) = self.settings.wsdl_expire_secs {
                factory = factory.with_expire(Duration::from_secs(secs));
            }
            factory.init().await?;
            self.soap = Some(factory);
        }

        self.soap.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Configuration("WSDL not initialized".to_string()))
        })
    }

    fn authenticator(&self) -> Result<Authenticator> {
        let settings = &self.settings;
        let (Some(client_id), Some(client_secret)) = (&settings.client_id, &settings.client_secret)
        else {
            return Err(Error::new(ErrorKind::Configuration(
                "missing client_id or client_secret".to_string(),
            )));
        };

        let mut config = AuthConfig::new(client_id.clone(), client_secret.clone());
        if let Some(url) = &settings.auth_url {
            config = config.with_auth_url(url.clone());
        }
        if let Some(url) = &settings.endpoint_discovery_url {
            config = config.with_endpoints_url(url.clone());
        }

        let mut auth = Authenticator::new(config, self.http.clone());
        if let Some(token) = settings.preset_token()? {
            auth = auth.with_preset_token(token);
        }
        if let Some(endpoint) = &settings.endpoint {
            auth = auth.with_endpoint(endpoint.clone());
        }
        Ok(auth)
    }
}
