use busbar_mc_api::resources::{Client, ClientFactory, ClientSettings};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "access-1";
pub const LEGACY_TOKEN: &str = "legacy-1";

const WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/" targetNamespace="http://exacttarget.com/wsdl/partnerAPI">
  <service name="PartnerAPI">
    <port name="Soap" binding="tns:Soap">
      <soap:address location="https://webservice.exacttarget.com/Service.asmx"/>
    </port>
  </service>
</definitions>"#;

/// A mock Marketing Cloud: token service, endpoint discovery, WSDL host,
/// SOAP endpoint and REST API on one server.
pub struct FakeMarketingCloud {
    pub server: MockServer,
    dir: TempDir,
}

impl FakeMarketingCloud {
    /// Start the server with token, discovery and WSDL mocks that accept
    /// any number of calls.
    pub async fn start() -> Self {
        let cloud = Self::bare().await;
        cloud.mount_token(None).await;
        cloud.mount_discovery(None).await;
        cloud.mount_wsdl(None).await;
        cloud
    }

    /// Start the server with no mocks mounted.
    pub async fn bare() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn settings(&self) -> ClientSettings {
        let uri = self.uri();
        ClientSettings::new("client-id", "client-secret", self.dir.path().join("etframework.wsdl"))
            .with_auth_url(format!("{uri}/v1/requestToken"))
            .with_endpoint_discovery_url(format!("{uri}/platform/v1/endpoints/soap"))
            .with_wsdl_url(format!("{uri}/etframework.wsdl"))
            .with_rest_url(uri)
    }

    pub async fn client(&self) -> Client {
        let mut factory = ClientFactory::new(self.settings()).unwrap();
        factory.make().await.unwrap()
    }

    pub async fn mount_token(&self, expected_calls: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path("/v1/requestToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": ACCESS_TOKEN,
                "expiresIn": 3600,
                "legacyToken": LEGACY_TOKEN,
                "refreshToken": "refresh-1"
            })));
        with_expectation(mock, expected_calls).mount(&self.server).await;
    }

    pub async fn mount_discovery(&self, expected_calls: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/platform/v1/endpoints/soap"))
            .and(query_param("access_token", ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": format!("{}/Service.asmx", self.uri())
            })));
        with_expectation(mock, expected_calls).mount(&self.server).await;
    }

    pub async fn mount_wsdl(&self, expected_calls: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/etframework.wsdl"))
            .respond_with(ResponseTemplate::new(200).set_body_string(WSDL));
        with_expectation(mock, expected_calls).mount(&self.server).await;
    }

    /// Answer SOAP calls with `action` whose body contains `needle`.
    pub async fn mount_soap(&self, action: &str, needle: &str, reply: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/Service.asmx"))
            .and(header("SOAPAction", action))
            .and(body_string_contains(needle))
            .respond_with(reply)
            .mount(&self.server)
            .await;
    }

    /// Like [`mount_soap`](Self::mount_soap), verified to be hit exactly
    /// `expected_calls` times when the server drops.
    pub async fn mount_soap_expect(
        &self,
        action: &str,
        needle: &str,
        reply: ResponseTemplate,
        expected_calls: u64,
    ) {
        Mock::given(method("POST"))
            .and(path("/Service.asmx"))
            .and(header("SOAPAction", action))
            .and(body_string_contains(needle))
            .respond_with(reply)
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Bodies of the SOAP calls received with `action`, in order.
    pub async fn soap_bodies(&self, action: &str) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| is_soap_action(request, action))
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }
}

fn with_expectation(mock: Mock, expected_calls: Option<u64>) -> Mock {
    match expected_calls {
        Some(calls) => mock.expect(calls),
        None => mock,
    }
}

fn is_soap_action(request: &Request, action: &str) -> bool {
    request.url.path() == "/Service.asmx"
        && request
            .headers
            .get("SOAPAction")
            .and_then(|value| value.to_str().ok())
            == Some(action)
}

/// A 200 reply wrapping `body` in a SOAP envelope.
pub fn soap_ok(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/xml; charset=utf-8")
        .set_body_string(envelope(body))
}

/// A 500 reply carrying a SOAP fault.
pub fn soap_fault(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(500)
        .insert_header("Content-Type", "text/xml; charset=utf-8")
        .set_body_string(envelope(&format!(
            "<soap:Fault><faultcode>soap:Client</faultcode><faultstring>{message}</faultstring></soap:Fault>"
        )))
}

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{body}</soap:Body></soap:Envelope>"#
    )
}

/// `DefinitionResponseMsg` for `object_type` with `(name, retrievable)`
/// properties.
pub fn describe_reply(object_type: &str, properties: &[(&str, bool)]) -> ResponseTemplate {
    let properties: String = properties
        .iter()
        .map(|(name, retrievable)| {
            format!("<Properties><Name>{name}</Name><IsRetrievable>{retrievable}</IsRetrievable></Properties>")
        })
        .collect();
    soap_ok(&format!(
        "<DefinitionResponseMsg><ObjectDefinition><ObjectType>{object_type}</ObjectType>{properties}</ObjectDefinition><RequestID>describe-1</RequestID></DefinitionResponseMsg>"
    ))
}

/// `RetrieveResponseMsg` with the given status, request id and raw
/// `<Results>` elements.
pub fn retrieve_reply(status: &str, request_id: &str, results: &[&str]) -> ResponseTemplate {
    let results: String = results
        .iter()
        .map(|result| format!("<Results>{result}</Results>"))
        .collect();
    soap_ok(&format!(
        "<RetrieveResponseMsg><OverallStatus>{status}</OverallStatus><RequestID>{request_id}</RequestID>{results}</RetrieveResponseMsg>"
    ))
}

/// A write reply (`CreateResponse`, `UpdateResponse`, `DeleteResponse`).
pub fn write_reply(element: &str) -> ResponseTemplate {
    soap_ok(&format!(
        "<{element}><Results><StatusCode>OK</StatusCode><StatusMessage>Done</StatusMessage></Results><RequestID>write-1</RequestID><OverallStatus>OK</OverallStatus></{element}>"
    ))
}
