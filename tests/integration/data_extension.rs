//! Data extension lookups, field listings and row reads/writes.

use super::common::{retrieve_reply, write_reply, FakeMarketingCloud, ACCESS_TOKEN};
use busbar_mc_api::resources::{
    DataExtensionFieldHandler, DataExtensionHandler, DataExtensionRowHandler, FilterExpression,
    GetRequest, RowProtocol,
};
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn record(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

const FIELDS: [&str; 2] = ["<Name>Email</Name>", "<Name>Score</Name>"];

#[tokio::test]
async fn test_name_and_customer_key_lookups() {
    let cloud = FakeMarketingCloud::start().await;
    let row = "<Name>Subscribers</Name><CustomerKey>de-key</CustomerKey>";
    cloud
        .mount_soap(
            "Retrieve",
            "<Value>de-key</Value>",
            retrieve_reply("OK", "k1", &[row]),
        )
        .await;
    cloud
        .mount_soap(
            "Retrieve",
            "<Value>Subscribers</Value>",
            retrieve_reply("OK", "n1", &[row]),
        )
        .await;

    let mut client = cloud.client().await;
    let mut data_extensions = client.resource("DataExtension").unwrap();
    let (handler, session) = data_extensions
        .handler_with_session::<DataExtensionHandler>()
        .unwrap();

    let name = handler.name_for_customer_key(session, "de-key").await.unwrap();
    assert_eq!(name, "Subscribers");
    let key = handler.customer_key_for_name(session, "Subscribers").await.unwrap();
    assert_eq!(key, "de-key");

    let bodies = cloud.soap_bodies("Retrieve").await;
    assert!(bodies[0].contains("<ObjectType>DataExtension</ObjectType>"));
    assert!(bodies[0].contains("<Property>CustomerKey</Property>"));
    assert!(bodies[1].contains("<Property>Name</Property>"));
}

#[tokio::test]
async fn test_lookup_without_match_is_handler_error() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap(
            "Retrieve",
            "<ObjectType>DataExtension</ObjectType>",
            retrieve_reply("OK", "k1", &[]),
        )
        .await;

    let mut client = cloud.client().await;
    let mut data_extensions = client.resource("DataExtension").unwrap();
    let (handler, session) = data_extensions
        .handler_with_session::<DataExtensionHandler>()
        .unwrap();

    let err = handler
        .name_for_customer_key(session, "missing")
        .await
        .unwrap_err();
    assert!(err.is_handler_error());
    assert_eq!(
        err.to_string(),
        "Resource handler error: Unable to retrieve DataExtension name for customer key: missing"
    );
}

#[tokio::test]
async fn test_fields_are_filtered_by_customer_key() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap(
            "Retrieve",
            "<ObjectType>DataExtensionField</ObjectType>",
            retrieve_reply("OK", "f1", &FIELDS),
        )
        .await;

    let mut client = cloud.client().await;
    let mut fields = client.resource("DataExtensionField").unwrap();

    let err = fields
        .get(GetRequest::new().with_properties(["Name"]))
        .await
        .unwrap_err();
    assert!(err.is_handler_error());

    fields
        .handler_mut::<DataExtensionFieldHandler>()
        .unwrap()
        .set_customer_key("de-key");
    let request = GetRequest::from(FilterExpression::equals("IsRequired", "true"))
        .with_properties(["Name"]);
    let result = fields.get(request).await.unwrap();
    assert_eq!(
        DataExtensionFieldHandler::field_names(&result),
        vec!["Email", "Score"]
    );

    let body = &cloud.soap_bodies("Retrieve").await[0];
    assert!(body.contains(r#"<Filter xsi:type="ComplexFilterPart">"#));
    assert!(body.contains("<Property>DataExtension.CustomerKey</Property>"));
    assert!(body.contains("<LogicalOperator>AND</LogicalOperator>"));
    assert!(body.contains("<Property>IsRequired</Property>"));
}

#[tokio::test]
async fn test_row_read_uses_field_names() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Retrieve",
            "<ObjectType>DataExtensionField</ObjectType>",
            retrieve_reply("OK", "f1", &FIELDS),
            1,
        )
        .await;
    cloud
        .mount_soap_expect(
            "Retrieve",
            "<ObjectType>DataExtensionObject[Subscribers]</ObjectType>",
            retrieve_reply(
                "OK",
                "r1",
                &["<Properties><Property><Name>Email</Name><Value>a@example.com</Value></Property><Property><Name>Score</Name><Value>3</Value></Property></Properties>"],
            ),
            1,
        )
        .await;

    let mut client = cloud.client().await;
    let mut rows = client.resource("DataExtensionRow").unwrap();
    assert_eq!(rows.object_type(), "DataExtensionObject");
    rows.handler_mut::<DataExtensionRowHandler>()
        .unwrap()
        .set_customer_key("de-key")
        .set_name("Subscribers");

    let result = rows.get(GetRequest::new()).await.unwrap();
    assert_eq!(result.resource_name(), "DataExtensionRow");
    let entities = result.entities();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].get_property_value("Email").unwrap(), "a@example.com");
    assert_eq!(
        entities[0].payload(),
        record(json!({"Email": "a@example.com", "Score": "3"}))
    );
    assert!(entities[0].get_property("Phone").is_err());

    let bodies = cloud.soap_bodies("Retrieve").await;
    assert!(bodies[1].contains("<Properties>Email</Properties><Properties>Score</Properties>"));
}

#[tokio::test]
async fn test_row_read_needs_name() {
    let cloud = FakeMarketingCloud::start().await;
    let mut client = cloud.client().await;
    let mut rows = client.resource("DataExtensionRow").unwrap();

    let err = rows.get(GetRequest::new()).await.unwrap_err();
    assert!(err.is_handler_error());
    assert!(cloud.soap_bodies("Retrieve").await.is_empty());
}

#[tokio::test]
async fn test_soap_row_writes() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Create",
            r#"<Objects xsi:type="DataExtensionObject"><CustomerKey>de-key</CustomerKey><Properties><Property><Name>Email</Name><Value>a@example.com</Value></Property>"#,
            write_reply("CreateResponse"),
            1,
        )
        .await;
    cloud
        .mount_soap_expect(
            "Delete",
            "<Keys><Key><Name>Email</Name><Value>a@example.com</Value></Key></Keys>",
            write_reply("DeleteResponse"),
            1,
        )
        .await;

    let mut client = cloud.client().await;
    let mut rows = client.resource("DataExtensionRow").unwrap();
    rows.handler_mut::<DataExtensionRowHandler>()
        .unwrap()
        .set_customer_key("de-key");

    let added = rows
        .add(record(json!({"Email": "a@example.com", "Score": 3})))
        .await
        .unwrap();
    assert!(added.is_valid());

    let deleted = rows
        .delete(record(json!({"Email": "a@example.com"})))
        .await
        .unwrap();
    assert!(deleted.is_valid());
}

#[tokio::test]
async fn test_row_write_with_record_customer_key() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Update",
            r#"<Objects xsi:type="DataExtensionObject"><CustomerKey>other-key</CustomerKey><Properties><Property><Name>Email</Name>"#,
            write_reply("UpdateResponse"),
            1,
        )
        .await;

    let mut client = cloud.client().await;
    let mut rows = client.resource("DataExtensionRow").unwrap();
    rows.handler_mut::<DataExtensionRowHandler>()
        .unwrap()
        .set_customer_key("de-key");

    let updated = rows
        .update(record(json!({"CustomerKey": "other-key", "Email": "a@example.com"})))
        .await
        .unwrap();
    assert!(updated.is_valid());

    let body = &cloud.soap_bodies("Update").await[0];
    assert!(!body.contains("<Name>CustomerKey</Name>"));
    assert!(!body.contains("de-key"));
}

#[tokio::test]
async fn test_rest_row_upsert() {
    let cloud = FakeMarketingCloud::start().await;
    Mock::given(method("POST"))
        .and(path("/hub/v1/dataevents/key:de-key/rowset"))
        .and(header("Authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(body_json(json!([
            {"keys": {"Id": 7}, "values": {"Email": "a@example.com"}}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"keys": {"Id": 7}, "values": {"Email": "a@example.com"}}
        ])))
        .expect(1)
        .mount(&cloud.server)
        .await;

    let mut client = cloud.client().await;
    let mut rows = client.resource("DataExtensionRow").unwrap();
    let handler = rows.handler_mut::<DataExtensionRowHandler>().unwrap();
    handler
        .set_customer_key("de-key")
        .set_protocol(RowProtocol::Rest)
        .set_primary_keys(["Id"]);
    assert_eq!(handler.protocol(), RowProtocol::Rest);

    let result = rows
        .add(record(json!({"Id": 7, "Email": "a@example.com"})))
        .await
        .unwrap();
    assert!(result.is_valid());
    assert_eq!(result.entities_count(), 1);

    let err = rows
        .delete(record(json!({"Id": 7})))
        .await
        .unwrap_err();
    assert!(err.is_handler_error());
}

#[tokio::test]
async fn test_handler_type_mismatch() {
    let cloud = FakeMarketingCloud::start().await;
    let mut client = cloud.client().await;
    let mut subscribers = client.resource("Subscriber").unwrap();

    let err = subscribers
        .handler_mut::<DataExtensionRowHandler>()
        .unwrap_err();
    assert!(err.is_handler_error());
    assert!(err.to_string().contains("Subscriber"));
}
