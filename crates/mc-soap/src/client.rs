//! SOAP calls against the partner API endpoint.

use busbar_mc_client::security::xml;
use busbar_mc_client::McHttpClient;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::filter::FilterExpression;
use crate::xml::{decode_envelope, write_fields, write_value, SoapFault};
use crate::WIRE_LOG_TARGET;

/// Raw reply of one SOAP call: HTTP status code and decoded response element.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapReply {
    pub code: u16,
    pub body: Value,
}

impl SoapReply {
    pub fn new(code: u16, body: Value) -> Self {
        Self { code, body }
    }

    /// The fault carried by the reply, if any.
    pub fn fault(&self) -> Option<SoapFault> {
        SoapFault::from_body(&self.body)
    }
}

/// Retrieve options, written as children of `<Options>`.
///
/// A nested map sets sub-fields, e.g. `{"Client": {"ID": 123}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrieveOptions(Map<String, Value>);

impl RetrieveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one option.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RetrieveOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RetrieveOptions {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::new(ErrorKind::InvalidPayload(format!(
                "options must be a map, got {}",
                other
            )))),
        }
    }
}

/// A read request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveRequest {
    pub object_type: String,
    pub properties: Vec<String>,
    pub filter: Option<FilterExpression>,
    pub options: Option<RetrieveOptions>,
}

impl RetrieveRequest {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            properties: Vec::new(),
            filter: None,
            options: None,
        }
    }

    pub fn with_properties(mut self, properties: Vec<String>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_options(mut self, options: RetrieveOptions) -> Self {
        self.options = Some(options);
        self
    }

    fn write_xml(&self, out: &mut String) -> Result<()> {
        out.push_str(&format!(
            "<ObjectType>{}</ObjectType>",
            xml::escape(&self.object_type)
        ));
        for property in &self.properties {
            out.push_str(&format!("<Properties>{}</Properties>", xml::escape(property)));
        }
        if let Some(ref filter) = self.filter {
            filter.write_xml("Filter", out);
        }
        if let Some(ref options) = self.options {
            out.push_str("<Options>");
            write_fields(options.as_map(), out)?;
            out.push_str("</Options>");
        }
        Ok(())
    }
}

/// Per-call options: where to send requests and which legacy token to present.
#[derive(Clone, Default)]
struct CallOptions {
    location: String,
    legacy_token: String,
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("location", &self.location)
            .field("legacy_token", &"[REDACTED]")
            .finish()
    }
}

/// Client for the partner API SOAP endpoint.
///
/// Built once by [`SoapClientFactory`](crate::SoapClientFactory), which
/// updates its endpoint and token before handing it out.
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: McHttpClient,
    namespace: String,
    debug: bool,
    options: CallOptions,
}

impl SoapClient {
    pub(crate) fn new(http: McHttpClient, namespace: String, debug: bool) -> Self {
        Self {
            http,
            namespace,
            debug,
            options: CallOptions::default(),
        }
    }

    pub(crate) fn set_options(&mut self, location: String, legacy_token: String) {
        self.options = CallOptions {
            location,
            legacy_token,
        };
    }

    /// Endpoint requests are sent to.
    pub fn location(&self) -> &str {
        &self.options.location
    }

    /// Namespace of request payloads.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Describe an object type.
    ///
    /// A reply with no response element fails with
    /// [`ErrorKind::EmptyResponse`].
    #[instrument(skip(self))]
    pub async fn describe(&self, object_type: &str) -> Result<SoapReply> {
        let body = format!(
            r#"<DefinitionRequestMsg xmlns="{ns}"><DescribeRequests><ObjectDefinitionRequest><ObjectType>{object_type}</ObjectType></ObjectDefinitionRequest></DescribeRequests></DefinitionRequestMsg>"#,
            ns = xml::escape(&self.namespace),
            object_type = xml::escape(object_type),
        );

        let reply = self.call("Describe", &body).await?;
        if reply.body.is_null() {
            return Err(Error::new(ErrorKind::EmptyResponse(format!(
                "Empty response for describe request for {} object type",
                object_type
            ))));
        }
        Ok(reply)
    }

    /// Read objects.
    #[instrument(skip(self, request), fields(object_type = %request.object_type))]
    pub async fn retrieve(&self, request: &RetrieveRequest) -> Result<SoapReply> {
        let mut inner = String::new();
        request.write_xml(&mut inner)?;
        let body = format!(
            r#"<RetrieveRequestMsg xmlns="{ns}"><RetrieveRequest>{inner}</RetrieveRequest></RetrieveRequestMsg>"#,
            ns = xml::escape(&self.namespace),
        );
        self.call("Retrieve", &body).await
    }

    /// Fetch the next page of an earlier read.
    #[instrument(skip(self))]
    pub async fn continue_retrieve(&self, request_id: &str) -> Result<SoapReply> {
        let body = format!(
            r#"<RetrieveRequestMsg xmlns="{ns}"><RetrieveRequest><ContinueRequest>{request_id}</ContinueRequest></RetrieveRequest></RetrieveRequestMsg>"#,
            ns = xml::escape(&self.namespace),
            request_id = xml::escape(request_id),
        );
        self.call("Retrieve", &body).await
    }

    /// Create objects.
    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn create(&self, object_type: &str, objects: &[Map<String, Value>]) -> Result<SoapReply> {
        self.write_call("Create", "CreateRequest", object_type, objects)
            .await
    }

    /// Update objects.
    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn update(&self, object_type: &str, objects: &[Map<String, Value>]) -> Result<SoapReply> {
        self.write_call("Update", "UpdateRequest", object_type, objects)
            .await
    }

    /// Delete objects.
    #[instrument(skip(self, objects), fields(count = objects.len()))]
    pub async fn delete(&self, object_type: &str, objects: &[Map<String, Value>]) -> Result<SoapReply> {
        self.write_call("Delete", "DeleteRequest", object_type, objects)
            .await
    }

    async fn write_call(
        &self,
        action: &str,
        element: &str,
        object_type: &str,
        objects: &[Map<String, Value>],
    ) -> Result<SoapReply> {
        let mut inner = String::new();
        for object in objects {
            inner.push_str(&format!(
                r#"<Objects xsi:type="{}">"#,
                xml::escape(object_type)
            ));
            write_fields(object, &mut inner)?;
            inner.push_str("</Objects>");
        }
        let body = format!(
            r#"<{element} xmlns="{ns}"><Options/>{inner}</{element}>"#,
            ns = xml::escape(&self.namespace),
        );
        self.call(action, &body).await
    }

    fn envelope(&self, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
  <soap:Header>
    <wsse:Security>
      <wsse:UsernameToken>
        <wsse:Username>*</wsse:Username>
        <wsse:Password>*</wsse:Password>
      </wsse:UsernameToken>
    </wsse:Security>
    <oAuth xmlns="http://exacttarget.com">
      <oAuthToken>{token}</oAuthToken>
    </oAuth>
  </soap:Header>
  <soap:Body>
    {body}
  </soap:Body>
</soap:Envelope>"#,
            token = xml::escape(&self.options.legacy_token),
        )
    }

    async fn call(&self, action: &str, body: &str) -> Result<SoapReply> {
        if self.options.location.is_empty() {
            return Err(Error::new(ErrorKind::NotConfigured(
                "no SOAP endpoint set".to_string(),
            )));
        }

        if self.debug {
            debug!(target: WIRE_LOG_TARGET, action, request = %body, "SOAP request");
        }

        let request = self
            .http
            .post(&self.options.location)
            .xml(self.envelope(body))
            .soap_action(action);
        let response = self.http.execute(request).await?;
        let code = response.status();
        let text = response.text().await?;

        if self.debug {
            debug!(target: WIRE_LOG_TARGET, action, code, response = %text, "SOAP response");
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            decode_envelope(&text)?
        };

        let reply = SoapReply::new(code, body);
        if let Some(fault) = reply.fault() {
            warn!(action, code, fault = %fault, "SOAP fault");
        }
        Ok(reply)
    }
}
