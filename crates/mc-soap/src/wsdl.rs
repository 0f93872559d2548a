//! WSDL cache and the factory that hands out configured [`SoapClient`]s.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use busbar_mc_auth::Credential;
use busbar_mc_client::McHttpClient;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::{debug, info, instrument};

use crate::client::SoapClient;
use crate::error::{Error, ErrorKind, Result};
use crate::{DEFAULT_TARGET_NAMESPACE, DEFAULT_WSDL_EXPIRE_SECS, DEFAULT_WSDL_URL};

/// The parts of the WSDL the transport relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescription {
    /// Namespace of request payloads.
    pub target_namespace: String,
    /// `soap:address` location, used when no endpoint was discovered.
    pub location: Option<String>,
}

impl ServiceDescription {
    /// Read the target namespace and service address from a WSDL document.
    pub fn parse(document: &str) -> Result<Self> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut target_namespace = None;
        let mut location = None;
        let mut seen_root = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    let local = e.local_name();
                    let is_root = !seen_root;
                    seen_root = true;
                    if is_root && local.as_ref() == b"definitions" {
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"targetNamespace" {
                                target_namespace = Some(attr.unescape_value()?.into_owned());
                            }
                        }
                    } else if local.as_ref() == b"address" && location.is_none() {
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"location" {
                                location = Some(attr.unescape_value()?.into_owned());
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(Error::new(ErrorKind::InvalidResponse(
                "WSDL document is empty".to_string(),
            )));
        }

        Ok(Self {
            target_namespace: target_namespace
                .unwrap_or_else(|| DEFAULT_TARGET_NAMESPACE.to_string()),
            location,
        })
    }
}

/// Produces [`SoapClient`]s bound to a fresh credential.
///
/// The client is built on the first [`make`](Self::make) and then only has
/// its endpoint and token replaced on later calls. Cloning an initialized
/// factory shares the parsed description but not the client.
#[derive(Debug)]
pub struct SoapClientFactory {
    wsdl_url: String,
    local_path: PathBuf,
    expire: Duration,
    debug: bool,
    http: McHttpClient,
    description: Option<ServiceDescription>,
    client: Option<SoapClient>,
}

impl Clone for SoapClientFactory {
    fn clone(&self) -> Self {
        Self {
            wsdl_url: self.wsdl_url.clone(),
            local_path: self.local_path.clone(),
            expire: self.expire,
            debug: self.debug,
            http: self.http.clone(),
            description: self.description.clone(),
            client: None,
        }
    }
}

impl SoapClientFactory {
    /// Create a factory caching the WSDL at `local_path`.
    pub fn new(local_path: impl Into<PathBuf>, http: McHttpClient) -> Self {
        Self {
            wsdl_url: DEFAULT_WSDL_URL.to_string(),
            local_path: local_path.into(),
            expire: Duration::from_secs(DEFAULT_WSDL_EXPIRE_SECS),
            debug: false,
            http,
            description: None,
            client: None,
        }
    }

    /// Download the WSDL from `url` instead of the default location.
    pub fn with_wsdl_url(mut self, url: impl Into<String>) -> Self {
        self.wsdl_url = url.into();
        self
    }

    /// Re-download the cached file once it is older than `expire`.
    pub fn with_expire(mut self, expire: Duration) -> Self {
        self.expire = expire;
        self
    }

    /// Log full request and response envelopes.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn wsdl_url(&self) -> &str {
        &self.wsdl_url
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Parsed service description, available after [`init`](Self::init).
    pub fn description(&self) -> Option<&ServiceDescription> {
        self.description.as_ref()
    }

    /// Make sure a fresh WSDL copy is cached and parse it.
    ///
    /// Downloads when the file is missing, empty, or older than the expiry.
    #[instrument(skip(self), fields(path = %self.local_path.display()))]
    pub async fn init(&mut self) -> Result<()> {
        if self.is_stale().await {
            self.download().await?;
        } else {
            debug!("Using cached WSDL");
        }

        let document = tokio::fs::read_to_string(&self.local_path).await?;
        self.description = Some(ServiceDescription::parse(&document)?);
        Ok(())
    }

    /// Return the client configured for `credential`.
    ///
    /// Uses the credential's endpoint, falling back to the WSDL service
    /// address.
    pub fn make(&mut self, credential: &Credential) -> Result<&SoapClient> {
        let description = self.description.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::NotConfigured(
                "WSDL not loaded, call init() first".to_string(),
            ))
        })?;

        let location = credential
            .endpoint()
            .map(str::to_string)
            .or_else(|| description.location.clone())
            .ok_or_else(|| {
                Error::new(ErrorKind::NotConfigured("no SOAP endpoint available".to_string()))
            })?;
        let legacy_token = credential.legacy_token().ok_or_else(|| {
            Error::new(ErrorKind::NotConfigured("no legacy token available".to_string()))
        })?;

        let namespace = description.target_namespace.clone();
        let debug = self.debug;
        let http = &self.http;
        let client = self.client.get_or_insert_with(|| {
            if debug {
                debug!(target: crate::WIRE_LOG_TARGET, "SOAP wire logging enabled");
            }
            SoapClient::new(http.clone(), namespace, debug)
        });
        client.set_options(location, legacy_token.to_string());

        Ok(client)
    }

    async fn is_stale(&self) -> bool {
        let Ok(metadata) = tokio::fs::metadata(&self.local_path).await else {
            return true;
        };
        if metadata.len() == 0 {
            return true;
        }
        let Ok(modified) = metadata.modified() else {
            return true;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age > self.expire,
            Err(_) => false,
        }
    }

    async fn download(&self) -> Result<()> {
        info!(url = %self.wsdl_url, "Downloading WSDL");

        let response = self.http.execute(self.http.get(&self.wsdl_url)).await?;
        if !response.is_success() {
            return Err(Error::new(ErrorKind::Transport(format!(
                "WSDL download failed with status {}",
                response.status()
            ))));
        }
        let document = response.text().await?;

        if let Some(parent) = self.local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.local_path, document).await?;
        Ok(())
    }
}
