//! State shared by every handler of one client.

use busbar_mc_auth::{Authenticator, Credential};
use busbar_mc_client::{McHttpClient, RequestBuilder, RequestMethod};
use busbar_mc_soap::{RetrieveRequest, SoapClient, SoapClientFactory};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::envelope::Envelope;
use crate::error::{Error, ErrorKind, Result};

/// Credential manager, SOAP transport and REST base URL of one client.
///
/// Every call refreshes the credential if needed and reconfigures the
/// transport before going out, so handlers never see a stale token.
#[derive(Debug)]
pub struct Session {
    auth: Authenticator,
    soap: SoapClientFactory,
    http: McHttpClient,
    rest_url: String,
}

impl Session {
    pub(crate) fn new(
        auth: Authenticator,
        soap: SoapClientFactory,
        http: McHttpClient,
        rest_url: String,
    ) -> Self {
        Self {
            auth,
            soap,
            http,
            rest_url: rest_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn credential(&self) -> &Credential {
        self.auth.credential()
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Refresh the credential and reconfigure the transport.
    pub async fn refresh(&mut self, force: bool) -> Result<()> {
        self.auth.refresh(force).await?;
        self.soap.make(self.auth.credential())?;
        Ok(())
    }

    async fn transport(&mut self) -> Result<&SoapClient> {
        self.auth.refresh(false).await?;
        Ok(self.soap.make(self.auth.credential())?)
    }

    #[instrument(skip(self))]
    pub async fn soap_describe(&mut self, object_type: &str) -> Result<Envelope> {
        let reply = self.transport().await?.describe(object_type).await?;
        Ok(summarize(Envelope::from_soap(reply)))
    }

    #[instrument(skip(self, request), fields(object_type = %request.object_type))]
    pub async fn soap_get(&mut self, request: &RetrieveRequest) -> Result<Envelope> {
        let reply = self.transport().await?.retrieve(request).await?;
        Ok(summarize(Envelope::from_soap(reply)))
    }

    /// Fetch the next page of an earlier retrieve.
    #[instrument(skip(self))]
    pub async fn soap_more_results(&mut self, request_id: &str) -> Result<Envelope> {
        let reply = self.transport().await?.continue_retrieve(request_id).await?;
        Ok(summarize(Envelope::from_soap(reply)))
    }

    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn soap_post(
        &mut self,
        object_type: &str,
        objects: &[Map<String, Value>],
    ) -> Result<Envelope> {
        let reply = self.transport().await?.create(object_type, objects).await?;
        Ok(summarize(Envelope::from_soap(reply)))
    }

    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn soap_patch(
        &mut self,
        object_type: &str,
        objects: &[Map<String, Value>],
    ) -> Result<Envelope> {
        let reply = self.transport().await?.update(object_type, objects).await?;
        Ok(summarize(Envelope::from_soap(reply)))
    }

    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn soap_delete(
        &mut self,
        object_type: &str,
        objects: &[Map<String, Value>],
    ) -> Result<Envelope> {
        let reply = self.transport().await?.delete(object_type, objects).await?;
        Ok(summarize(Envelope::from_soap(reply)))
    }

    /// Call a REST path relative to the REST base URL with the bearer token.
    ///
    /// Any status is normalized into the envelope; only transport failures
    /// and non-JSON bodies are errors.
    #[instrument(skip(self, body))]
    pub async fn rest(
        &mut self,
        method: RequestMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope> {
        self.auth.refresh(false).await?;
        let token = self.auth.credential().access_token().ok_or_else(|| {
            Error::new(ErrorKind::Authentication("no access token available".to_string()))
        })?;

        let url = format!("{}/{}", self.rest_url, path.trim_start_matches('/'));
        let mut request = RequestBuilder::new(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json_value(body);
        }

        let response = self.http.execute(request).await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(summarize(Envelope::from_rest(status, body)))
    }
}

fn summarize(envelope: Envelope) -> Envelope {
    if envelope.is_valid() {
        debug!(%envelope, "Call succeeded");
    } else {
        warn!(%envelope, "Call failed");
    }
    envelope
}
