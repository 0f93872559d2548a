//! Data extensions, their fields, and their rows.
//!
//! A data extension is a user-defined table. Its rows have no fixed schema,
//! so they are read and written as `Properties` collections of name/value
//! pairs under the table's customer key.

use async_trait::async_trait;
use busbar_mc_client::security::url::encode_param;
use busbar_mc_client::RequestMethod;
use busbar_mc_soap::FilterExpression;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::handler::{
    retrievable_properties, retrieve_request, GetRequest, Records, ResourceHandler,
};
use crate::result_set::ResultSet;
use crate::session::Session;

const DATA_EXTENSION: &str = "DataExtension";
const DATA_EXTENSION_FIELD: &str = "DataExtensionField";
const DATA_EXTENSION_OBJECT: &str = "DataExtensionObject";
const DATA_EXTENSION_ROW: &str = "DataExtensionRow";
const CUSTOMER_KEY: &str = "CustomerKey";

/// Data extension definitions, with name/customer key lookups.
#[derive(Debug, Clone, Default)]
pub struct DataExtensionHandler;

impl DataExtensionHandler {
    pub fn new() -> Self {
        Self
    }

    /// Name of the data extension with customer key `key`.
    pub async fn name_for_customer_key(
        &mut self,
        session: &mut Session,
        key: &str,
    ) -> Result<String> {
        self.lookup(session, "CustomerKey", key, "Name")
            .await?
            .ok_or_else(|| {
                Error::handler(format!(
                    "Unable to retrieve DataExtension name for customer key: {}",
                    key
                ))
            })
    }

    /// Customer key of the data extension named `name`.
    pub async fn customer_key_for_name(
        &mut self,
        session: &mut Session,
        name: &str,
    ) -> Result<String> {
        self.lookup(session, "Name", name, "CustomerKey")
            .await?
            .ok_or_else(|| {
                Error::handler(format!(
                    "Unable to retrieve DataExtension customer key for name: {}",
                    name
                ))
            })
    }

    /// `wanted` of the row whose `property` equals `value`, if exactly one
    /// row matched.
    async fn lookup(
        &mut self,
        session: &mut Session,
        property: &str,
        value: &str,
        wanted: &str,
    ) -> Result<Option<String>> {
        let request = retrieve_request(
            DATA_EXTENSION,
            vec!["Name".to_string(), "CustomerKey".to_string()],
            Some(FilterExpression::equals(property, value)),
            None,
        );
        let envelope = session.soap_get(&request).await?;

        Ok(match envelope.rows() {
            [row] if envelope.is_valid() => {
                row.get(wanted).and_then(Value::as_str).map(str::to_string)
            }
            rows => {
                debug!(matches = rows.len(), valid = envelope.is_valid(), "DataExtension lookup missed");
                None
            }
        })
    }
}

#[async_trait]
impl ResourceHandler for DataExtensionHandler {
    fn object_type(&self) -> &str {
        DATA_EXTENSION
    }
}

/// Fields of one data extension, selected by customer key.
#[derive(Debug, Clone, Default)]
pub struct DataExtensionFieldHandler {
    customer_key: Option<String>,
}

impl DataExtensionFieldHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read fields of the data extension with this customer key.
    pub fn set_customer_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.customer_key = Some(key.into());
        self
    }

    pub fn customer_key(&self) -> Option<&str> {
        self.customer_key.as_deref()
    }

    /// The `Name` of every field row in `result`.
    pub fn field_names(result: &ResultSet) -> Vec<String> {
        result
            .rows()
            .iter()
            .filter_map(|row| row.get("Name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl ResourceHandler for DataExtensionFieldHandler {
    fn object_type(&self) -> &str {
        DATA_EXTENSION_FIELD
    }

    /// Reads the fields of the remembered data extension. A caller filter
    /// is combined with the customer key filter.
    async fn get(&mut self, session: &mut Session, request: GetRequest) -> Result<ResultSet> {
        let key = self
            .customer_key
            .clone()
            .ok_or_else(|| Error::handler("DataExtensionField requires a customer key"))?;
        let options = request.retrieve_options()?;
        let properties = match request.properties {
            Some(properties) => properties,
            None => retrievable_properties(self, session).await?,
        };

        let by_key = FilterExpression::equals("DataExtension.CustomerKey", key);
        let filter = match request.filter {
            Some(extra) => FilterExpression::both(by_key, extra),
            None => by_key,
        };

        let retrieve = retrieve_request(DATA_EXTENSION_FIELD, properties, Some(filter), options);
        let envelope = session.soap_get(&retrieve).await?;
        Ok(ResultSet::new(DATA_EXTENSION_FIELD, envelope))
    }
}

/// Wire protocol for row writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowProtocol {
    #[default]
    Soap,
    /// Upsert through the REST `rowset` endpoint. Deletes are not available.
    Rest,
}

/// Rows of one data extension.
///
/// Reads need the data extension name; writes need its customer key.
#[derive(Debug, Clone, Default)]
pub struct DataExtensionRowHandler {
    customer_key: Option<String>,
    name: Option<String>,
    protocol: RowProtocol,
    primary_keys: Vec<String>,
}

impl DataExtensionRowHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_customer_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.customer_key = Some(key.into());
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_protocol(&mut self, protocol: RowProtocol) -> &mut Self {
        self.protocol = protocol;
        self
    }

    /// Columns sent as `keys` in REST rows.
    pub fn set_primary_keys<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn customer_key(&self) -> Option<&str> {
        self.customer_key.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn protocol(&self) -> RowProtocol {
        self.protocol
    }

    fn require_customer_key(&self) -> Result<&str> {
        self.customer_key
            .as_deref()
            .ok_or_else(|| Error::handler("DataExtensionRow requires a customer key"))
    }

    /// Take the record's own `CustomerKey` entry out of `record`, falling
    /// back to the remembered key.
    fn record_customer_key(&self, record: &mut Map<String, Value>) -> Result<String> {
        match record.remove(CUSTOMER_KEY) {
            Some(Value::String(key)) => Ok(key),
            Some(other) => Err(Error::handler(format!(
                "CustomerKey must be a string, got {}",
                other
            ))),
            None => self.require_customer_key().map(str::to_string),
        }
    }

    /// `{CustomerKey, <container>: {<entry>: [{Name, Value}, ...]}}`
    ///
    /// A `CustomerKey` entry in a record targets that record at another
    /// data extension.
    fn soap_objects(
        &self,
        records: Records,
        container: &str,
        entry: &str,
    ) -> Result<Vec<Map<String, Value>>> {
        records
            .into_vec()
            .into_iter()
            .map(|mut record| {
                let key = self.record_customer_key(&mut record)?;
                let pairs: Vec<Value> = record
                    .into_iter()
                    .map(|(name, value)| json!({"Name": name, "Value": value}))
                    .collect();
                let mut entries = Map::new();
                entries.insert(entry.to_string(), Value::Array(pairs));
                let mut object = Map::new();
                object.insert(CUSTOMER_KEY.to_string(), Value::String(key));
                object.insert(container.to_string(), Value::Object(entries));
                Ok(object)
            })
            .collect()
    }

    /// The target customer key and `[{"keys": {...}, "values": {...}}, ...]`.
    ///
    /// One request writes one data extension, so per-record `CustomerKey`
    /// entries must agree.
    fn rest_rows(&self, records: Records) -> Result<(String, Value)> {
        if self.primary_keys.is_empty() {
            return Err(Error::handler(
                "DataExtensionRow REST writes require primary keys",
            ));
        }

        let mut target: Option<String> = None;
        let rows = records
            .into_vec()
            .into_iter()
            .map(|mut record| {
                let key = self.record_customer_key(&mut record)?;
                match &target {
                    Some(existing) if *existing != key => {
                        return Err(Error::handler(format!(
                            "REST rows target both {} and {}",
                            existing, key
                        )));
                    }
                    Some(_) => {}
                    None => target = Some(key),
                }
                let mut keys = Map::new();
                for key in &self.primary_keys {
                    let value = record.remove(key).ok_or_else(|| {
                        Error::handler(format!("row is missing primary key {}", key))
                    })?;
                    keys.insert(key.clone(), value);
                }
                Ok(json!({"keys": keys, "values": record}))
            })
            .collect::<Result<Vec<_>>>()?;
        let target = match target {
            Some(key) => key,
            None => self.require_customer_key()?.to_string(),
        };
        Ok((target, Value::Array(rows)))
    }

    async fn rest_upsert(&self, session: &mut Session, records: Records) -> Result<ResultSet> {
        let (key, body) = self.rest_rows(records)?;
        let path = format!("/hub/v1/dataevents/key:{}/rowset", encode_param(&key));
        let envelope = session.rest(RequestMethod::Post, &path, Some(body)).await?;
        Ok(ResultSet::new(DATA_EXTENSION_ROW, envelope))
    }

    /// Field names of the data extension, used when a read names no
    /// properties.
    async fn column_names(&self, session: &mut Session) -> Result<Vec<String>> {
        let key = self.customer_key.as_deref().ok_or_else(|| {
            Error::handler("DataExtensionRow reads need properties or a customer key")
        })?;
        let request = retrieve_request(
            DATA_EXTENSION_FIELD,
            vec!["Name".to_string()],
            Some(FilterExpression::equals("DataExtension.CustomerKey", key)),
            None,
        );
        let envelope = session.soap_get(&request).await?;
        if !envelope.is_valid() {
            return Err(Error::handler(format!(
                "Can not list fields of data extension {}: {}",
                key, envelope
            )));
        }
        Ok(DataExtensionFieldHandler::field_names(&ResultSet::new(
            DATA_EXTENSION_FIELD,
            envelope,
        )))
    }
}

#[async_trait]
impl ResourceHandler for DataExtensionRowHandler {
    fn object_type(&self) -> &str {
        DATA_EXTENSION_OBJECT
    }

    fn resource_name(&self) -> &str {
        DATA_EXTENSION_ROW
    }

    /// Reads `DataExtensionObject[<name>]`.
    async fn get(&mut self, session: &mut Session, request: GetRequest) -> Result<ResultSet> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| Error::handler("DataExtensionRow requires a data extension name"))?;
        let options = request.retrieve_options()?;
        let properties = match request.properties {
            Some(properties) => properties,
            None => self.column_names(session).await?,
        };

        let object_type = format!("{}[{}]", DATA_EXTENSION_OBJECT, name);
        let retrieve = retrieve_request(&object_type, properties, request.filter, options);
        let envelope = session.soap_get(&retrieve).await?;
        Ok(ResultSet::new(DATA_EXTENSION_ROW, envelope))
    }

    async fn add(&mut self, session: &mut Session, records: Records) -> Result<ResultSet> {
        if self.protocol == RowProtocol::Rest {
            return self.rest_upsert(session, records).await;
        }
        let objects = self.soap_objects(records, "Properties", "Property")?;
        let envelope = session.soap_post(DATA_EXTENSION_OBJECT, &objects).await?;
        Ok(ResultSet::new(DATA_EXTENSION_ROW, envelope))
    }

    async fn update(&mut self, session: &mut Session, records: Records) -> Result<ResultSet> {
        if self.protocol == RowProtocol::Rest {
            return self.rest_upsert(session, records).await;
        }
        let objects = self.soap_objects(records, "Properties", "Property")?;
        let envelope = session.soap_patch(DATA_EXTENSION_OBJECT, &objects).await?;
        Ok(ResultSet::new(DATA_EXTENSION_ROW, envelope))
    }

    async fn delete(&mut self, session: &mut Session, records: Records) -> Result<ResultSet> {
        if self.protocol == RowProtocol::Rest {
            return Err(Error::handler(
                "DataExtensionRow deletes are not available over REST",
            ));
        }
        let objects = self.soap_objects(records, "Keys", "Key")?;
        let envelope = session.soap_delete(DATA_EXTENSION_OBJECT, &objects).await?;
        Ok(ResultSet::new(DATA_EXTENSION_ROW, envelope))
    }
}
