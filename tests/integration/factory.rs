//! Client construction: credentials, endpoint discovery and the WSDL cache.

use super::common::{retrieve_reply, FakeMarketingCloud, ACCESS_TOKEN, LEGACY_TOKEN};
use busbar_mc_api::resources::{ClientFactory, ErrorKind, GetRequest, ResourceBinding};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_make_refreshes_credential_once() {
    let cloud = FakeMarketingCloud::bare().await;
    cloud.mount_token(Some(1)).await;
    cloud.mount_discovery(Some(1)).await;
    cloud.mount_wsdl(Some(1)).await;
    cloud
        .mount_soap(
            "Retrieve",
            "<ObjectType>Subscriber</ObjectType>",
            retrieve_reply("OK", "r1", &[]),
        )
        .await;

    let mut client = cloud.client().await;
    let credential = client.session().credential();
    assert_eq!(credential.access_token(), Some(ACCESS_TOKEN));
    assert_eq!(credential.legacy_token(), Some(LEGACY_TOKEN));
    let endpoint = format!("{}/Service.asmx", cloud.uri());
    assert_eq!(credential.endpoint(), Some(endpoint.as_str()));
    assert!(credential.last_refresh().is_some());

    // The token is still valid, so the read does not hit the token service.
    let mut subscribers = client.resource("Subscriber").unwrap();
    let result = subscribers
        .get(GetRequest::new().with_properties(["EmailAddress"]))
        .await
        .unwrap();
    assert!(result.is_valid());
    assert!(result.is_empty());
    assert_eq!(result.request_id(), Some("r1"));
}

#[tokio::test]
async fn test_wsdl_is_cached_across_clients_and_factories() {
    let cloud = FakeMarketingCloud::bare().await;
    cloud.mount_token(None).await;
    cloud.mount_discovery(None).await;
    cloud.mount_wsdl(Some(1)).await;

    let mut factory = ClientFactory::new(cloud.settings()).unwrap();
    factory.make().await.unwrap();
    factory.make().await.unwrap();

    // A second factory finds the fresh file on disk.
    let mut other = ClientFactory::new(cloud.settings()).unwrap();
    other.make().await.unwrap();
}

#[tokio::test]
async fn test_rejected_credentials_fail_make() {
    let cloud = FakeMarketingCloud::bare().await;
    cloud.mount_wsdl(None).await;
    Mock::given(method("POST"))
        .and(path("/v1/requestToken"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&cloud.server)
        .await;

    let mut factory = ClientFactory::new(cloud.settings()).unwrap();
    let err = factory.make().await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Authentication(_)), "{err}");
}

#[tokio::test]
async fn test_failed_discovery_is_api_request_error() {
    let cloud = FakeMarketingCloud::bare().await;
    cloud.mount_wsdl(None).await;
    cloud.mount_token(None).await;
    Mock::given(method("GET"))
        .and(path("/platform/v1/endpoints/soap"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&cloud.server)
        .await;

    let mut factory = ClientFactory::new(cloud.settings()).unwrap();
    let err = factory.make().await.unwrap_err();
    assert!(err.is_api_request_error(), "{err}");
}

#[tokio::test]
async fn test_preset_endpoint_skips_discovery() {
    let cloud = FakeMarketingCloud::bare().await;
    cloud.mount_wsdl(None).await;
    cloud.mount_token(Some(1)).await;
    cloud.mount_discovery(Some(0)).await;

    let settings = cloud
        .settings()
        .with_endpoint(format!("{}/Service.asmx", cloud.uri()));
    let mut factory = ClientFactory::new(settings).unwrap();
    let client = factory.make().await.unwrap();

    assert!(client
        .session()
        .credential()
        .endpoint()
        .is_some_and(|endpoint| endpoint.ends_with("/Service.asmx")));
}

#[tokio::test]
async fn test_forced_refresh_repeats_token_and_discovery() {
    let cloud = FakeMarketingCloud::bare().await;
    cloud.mount_wsdl(None).await;
    cloud.mount_token(Some(2)).await;
    cloud.mount_discovery(Some(2)).await;

    let mut client = cloud.client().await;
    client.refresh(false).await.unwrap();
    client.refresh(true).await.unwrap();
}

#[tokio::test]
async fn test_unknown_resource() {
    let cloud = FakeMarketingCloud::start().await;
    let mut client = cloud.client().await;

    let err = client.resource("Campaign").err().unwrap();
    assert!(matches!(err.kind, ErrorKind::UnknownResource(ref name) if name == "Campaign"));
    assert_eq!(err.to_string(), "Missing handler for resource Campaign");
}

#[tokio::test]
async fn test_bound_resource_is_available() {
    let cloud = FakeMarketingCloud::start().await;
    let mut factory = ClientFactory::new(cloud.settings()).unwrap();
    factory.bind(ResourceBinding::object("Campaign"));

    let mut client = factory.make().await.unwrap();
    assert!(client.resource_names().contains(&"Campaign"));
    let campaigns = client.resource("Campaign").unwrap();
    assert_eq!(campaigns.object_type(), "Campaign");
}
