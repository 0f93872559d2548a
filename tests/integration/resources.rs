//! Generic object resources: describe, read with paging, writes.

use super::common::{
    describe_reply, retrieve_reply, soap_fault, write_reply, FakeMarketingCloud,
};
use busbar_mc_api::resources::{ErrorKind, FilterExpression, GetRequest, Records};
use futures::TryStreamExt;
use serde_json::{json, Map, Value};

fn record(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_describe_lists_retrievable_properties() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap(
            "Describe",
            "<ObjectType>Subscriber</ObjectType>",
            describe_reply(
                "Subscriber",
                &[("EmailAddress", true), ("Password", false), ("Status", true)],
            ),
        )
        .await;

    let mut client = cloud.client().await;
    let mut subscribers = client.resource("Subscriber").unwrap();
    let definition = subscribers.describe().await.unwrap();

    assert_eq!(definition.object_type(), "Subscriber");
    assert_eq!(definition.properties().len(), 3);
    assert_eq!(
        definition.retrievable_property_names(),
        vec!["EmailAddress", "Status"]
    );
    assert!(definition.get_property("Password").is_ok());
    assert!(matches!(
        definition.get_property("Nope").unwrap_err().kind,
        ErrorKind::MissingProperty(_)
    ));
}

#[tokio::test]
async fn test_describe_twice_is_stable() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Describe",
            "<ObjectType>Email</ObjectType>",
            describe_reply("Email", &[("ID", true), ("Name", true), ("HTMLBody", false)]),
            2,
        )
        .await;

    let mut client = cloud.client().await;
    let mut emails = client.resource("Email").unwrap();
    let first = emails.describe().await.unwrap();
    let second = emails.describe().await.unwrap();

    assert_eq!(
        first.retrievable_property_names(),
        second.retrievable_property_names()
    );
    assert_eq!(first.retrievable_property_names(), vec!["ID", "Name"]);
}

#[tokio::test]
async fn test_get_without_properties_reads_retrievable_ones() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Describe",
            "<ObjectType>List</ObjectType>",
            describe_reply("List", &[("A", true), ("B", false), ("IsPlatformObject", true)]),
            1,
        )
        .await;
    cloud
        .mount_soap_expect(
            "Retrieve",
            "<Properties>A</Properties>",
            retrieve_reply("OK", "r1", &["<A>1</A>"]),
            1,
        )
        .await;

    let mut client = cloud.client().await;
    let mut lists = client.resource("List").unwrap();
    let result = lists.get(GetRequest::new()).await.unwrap();

    assert!(result.is_valid());
    assert_eq!(result.entities_count(), 1);
    assert_eq!(result.entities()[0].get_str("A").unwrap(), "1");

    let bodies = cloud.soap_bodies("Retrieve").await;
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("<ObjectType>List</ObjectType>"));
    assert!(!bodies[0].contains("<Properties>B</Properties>"));
    assert!(!bodies[0].contains("IsPlatformObject"));
}

#[tokio::test]
async fn test_get_sends_filter_and_options() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap(
            "Retrieve",
            "<ObjectType>Subscriber</ObjectType>",
            retrieve_reply("OK", "r1", &["<EmailAddress>a@example.com</EmailAddress>"]),
        )
        .await;

    let mut client = cloud.client().await;
    let mut subscribers = client.resource("Subscriber").unwrap();
    let request = GetRequest::from(FilterExpression::equals("Status", "Active"))
        .with_properties(["EmailAddress"])
        .with_options(json!({"BatchSize": 50}));
    subscribers.get(request).await.unwrap();

    let body = &cloud.soap_bodies("Retrieve").await[0];
    assert!(body.contains(r#"<Filter xsi:type="SimpleFilterPart">"#));
    assert!(body.contains("<Property>Status</Property>"));
    assert!(body.contains("<SimpleOperator>equals</SimpleOperator>"));
    assert!(body.contains("<Options><BatchSize>50</BatchSize></Options>"));
}

#[tokio::test]
async fn test_options_must_be_a_map() {
    let cloud = FakeMarketingCloud::start().await;
    let mut client = cloud.client().await;
    let mut subscribers = client.resource("Subscriber").unwrap();

    let err = subscribers
        .get(
            GetRequest::new()
                .with_properties(["EmailAddress"])
                .with_options(json!(["BatchSize"])),
        )
        .await
        .unwrap_err();
    assert!(err.is_handler_error(), "{err}");
    assert!(cloud.soap_bodies("Retrieve").await.is_empty());
}

#[tokio::test]
async fn test_describe_failure_surfaces_in_get() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap("Describe", "<ObjectType>Email</ObjectType>", soap_fault("Unknown type"))
        .await;

    let mut client = cloud.client().await;
    let mut emails = client.resource("Email").unwrap();
    let err = emails.get(GetRequest::new()).await.unwrap_err();

    assert!(err.is_handler_error());
    assert!(err.to_string().contains("Can not describe object"), "{err}");
    assert!(cloud.soap_bodies("Retrieve").await.is_empty());
}

#[tokio::test]
async fn test_fault_on_read_is_an_invalid_result() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap("Retrieve", "<ObjectType>Send</ObjectType>", soap_fault("Bad filter"))
        .await;

    let mut client = cloud.client().await;
    let mut sends = client.resource("Send").unwrap();
    let result = sends
        .get(GetRequest::new().with_properties(["ID"]))
        .await
        .unwrap();

    assert!(!result.is_valid());
    assert!(result.is_empty());
    assert_eq!(result.envelope().code(), Some(500));
}

#[tokio::test]
async fn test_iteration_follows_every_page() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Retrieve",
            "<ObjectType>Subscriber</ObjectType>",
            retrieve_reply(
                "MoreDataAvailable",
                "r1",
                &[
                    "<EmailAddress>a@example.com</EmailAddress>",
                    "<EmailAddress>b@example.com</EmailAddress>",
                ],
            ),
            1,
        )
        .await;
    cloud
        .mount_soap_expect(
            "Retrieve",
            "<ContinueRequest>r1</ContinueRequest>",
            retrieve_reply("OK", "r2", &["<EmailAddress>c@example.com</EmailAddress>"]),
            1,
        )
        .await;

    let mut client = cloud.client().await;
    let mut subscribers = client.resource("Subscriber").unwrap();
    let first = subscribers
        .get(GetRequest::new().with_properties(["EmailAddress"]))
        .await
        .unwrap();
    assert!(first.has_more_results());
    assert_eq!(first.entities_count(), 2);

    let mut cursor = subscribers.iter(first);
    let mut emails = Vec::new();
    while let Some(entity) = cursor.next().await.unwrap() {
        emails.push(entity.get_str("EmailAddress").unwrap().to_string());
    }
    assert_eq!(emails, ["a@example.com", "b@example.com", "c@example.com"]);

    let last = cursor.current().clone();
    assert!(!last.has_more_results());
    let err = last.get_more_results(&mut subscribers).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoMoreData(_)));
    assert_eq!(
        err.to_string(),
        "No more data available for Subscriber request[r2]"
    );
}

#[tokio::test]
async fn test_stream_collects_across_pages() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap(
            "Retrieve",
            "<ObjectType>BounceEvent</ObjectType>",
            retrieve_reply("MoreDataAvailable", "b1", &["<ID>1</ID>"]),
        )
        .await;
    cloud
        .mount_soap(
            "Retrieve",
            "<ContinueRequest>b1</ContinueRequest>",
            retrieve_reply("OK", "b2", &["<ID>2</ID>", "<ID>3</ID>"]),
        )
        .await;

    let mut client = cloud.client().await;
    let mut bounces = client.resource("BounceEvent").unwrap();
    let first = bounces
        .get(GetRequest::new().with_properties(["ID"]))
        .await
        .unwrap();

    let ids: Vec<String> = bounces
        .iter(first)
        .into_stream()
        .map_ok(|entity| entity.get_str("ID").unwrap().to_string())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(ids, ["1", "2", "3"]);
}

#[tokio::test]
async fn test_add_update_delete() {
    let cloud = FakeMarketingCloud::start().await;
    cloud
        .mount_soap_expect(
            "Create",
            r#"<Objects xsi:type="Subscriber"><EmailAddress>a@example.com</EmailAddress>"#,
            write_reply("CreateResponse"),
            1,
        )
        .await;
    cloud
        .mount_soap_expect(
            "Update",
            r#"<Objects xsi:type="Subscriber"><EmailAddress>a@example.com</EmailAddress><Status>Unsubscribed</Status>"#,
            write_reply("UpdateResponse"),
            1,
        )
        .await;
    cloud
        .mount_soap_expect(
            "Delete",
            r#"<Objects xsi:type="Subscriber"><EmailAddress>"#,
            write_reply("DeleteResponse"),
            1,
        )
        .await;

    let mut client = cloud.client().await;
    let mut subscribers = client.resource("Subscriber").unwrap();

    let created = subscribers
        .add(record(json!({"EmailAddress": "a@example.com", "SubscriberKey": "a"})))
        .await
        .unwrap();
    assert!(created.is_valid());
    assert_eq!(created.entities()[0].get_str("StatusCode").unwrap(), "OK");

    let updated = subscribers
        .update(record(
            json!({"EmailAddress": "a@example.com", "Status": "Unsubscribed"}),
        ))
        .await
        .unwrap();
    assert!(updated.is_valid());

    let records = Records::try_from(json!([
        {"EmailAddress": "a@example.com"},
        {"EmailAddress": "b@example.com"}
    ]))
    .unwrap();
    assert_eq!(records.len(), 2);
    let deleted = subscribers.delete(records).await.unwrap();
    assert!(deleted.is_valid());

    let body = &cloud.soap_bodies("Delete").await[0];
    assert!(body.contains("<EmailAddress>b@example.com</EmailAddress>"));
}
