//! Raw REST calls through the client session.

use super::common::{FakeMarketingCloud, ACCESS_TOKEN};
use busbar_mc_api::resources::RequestMethod;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_rest_get_with_bearer_token() {
    let cloud = FakeMarketingCloud::start().await;
    Mock::given(method("GET"))
        .and(path("/platform/v1/tokenContext"))
        .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "enterprise": {"id": 1234},
            "organization": {"id": 5678}
        })))
        .expect(1)
        .mount(&cloud.server)
        .await;

    let mut client = cloud.client().await;
    let envelope = client
        .rest(RequestMethod::Get, "platform/v1/tokenContext", None)
        .await
        .unwrap();

    assert!(envelope.is_valid());
    assert_eq!(envelope.code(), Some(200));
    assert_eq!(envelope.rows().len(), 1);
    assert_eq!(envelope.rows()[0]["enterprise"]["id"], 1234);
}

#[tokio::test]
async fn test_rest_post_sends_json_body() {
    let cloud = FakeMarketingCloud::start().await;
    Mock::given(method("POST"))
        .and(path("/messaging/v1/messageDefinitionSends/key:welcome/send"))
        .and(body_json(json!({"To": {"Address": "a@example.com"}})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"requestId": "q1"})))
        .mount(&cloud.server)
        .await;

    let mut client = cloud.client().await;
    let envelope = client
        .rest(
            RequestMethod::Post,
            "/messaging/v1/messageDefinitionSends/key:welcome/send",
            Some(json!({"To": {"Address": "a@example.com"}})),
        )
        .await
        .unwrap();

    // Only a 200 counts as success.
    assert!(!envelope.is_valid());
    assert_eq!(envelope.code(), Some(202));
}

#[tokio::test]
async fn test_rest_error_status_is_an_invalid_envelope() {
    let cloud = FakeMarketingCloud::start().await;
    Mock::given(method("DELETE"))
        .and(path("/hub/v1/dataevents/key:gone/rows"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&cloud.server)
        .await;

    let mut client = cloud.client().await;
    let envelope = client
        .rest(RequestMethod::Delete, "/hub/v1/dataevents/key:gone/rows", None)
        .await
        .unwrap();

    assert!(!envelope.is_valid());
    assert!(envelope.is_empty());
    assert_eq!(envelope.code(), Some(404));
}
