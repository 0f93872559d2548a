//! The resource handler trait and its request types.

use std::any::Any;

use async_trait::async_trait;
use busbar_mc_soap::{FilterExpression, RetrieveOptions, RetrieveRequest};
use serde_json::{Map, Value};

use crate::entity::ObjectDefinition;
use crate::error::{Error, ErrorKind, Result};
use crate::result_set::ResultSet;
use crate::session::Session;

/// Arguments of a read.
///
/// Without properties the handler requests every retrievable property of
/// its object type, which costs an extra describe call.
#[derive(Debug, Clone, Default)]
pub struct GetRequest {
    pub filter: Option<FilterExpression>,
    pub properties: Option<Vec<String>>,
    /// Must be a JSON object; nested objects set sub-fields.
    pub options: Option<Value>,
}

impl GetRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Options as sent on the wire. Anything but an object is a handler error.
    pub fn retrieve_options(&self) -> Result<Option<RetrieveOptions>> {
        self.options
            .clone()
            .map(RetrieveOptions::try_from)
            .transpose()
            .map_err(|e| {
                Error::with_source(ErrorKind::ResourceHandler("options must be a map".to_string()), e)
            })
    }
}

impl From<FilterExpression> for GetRequest {
    fn from(filter: FilterExpression) -> Self {
        Self::new().with_filter(filter)
    }
}

/// Objects for a write: one property map or several.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    One(Map<String, Value>),
    Many(Vec<Map<String, Value>>),
}

impl Records {
    pub fn into_vec(self) -> Vec<Map<String, Value>> {
        match self {
            Records::One(map) => vec![map],
            Records::Many(maps) => maps,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::One(_) => 1,
            Records::Many(maps) => maps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Map<String, Value>> for Records {
    fn from(map: Map<String, Value>) -> Self {
        Records::One(map)
    }
}

impl From<Vec<Map<String, Value>>> for Records {
    fn from(maps: Vec<Map<String, Value>>) -> Self {
        Records::Many(maps)
    }
}

impl TryFrom<Value> for Records {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Records::One(map)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    _ => Err(not_records()),
                })
                .collect::<Result<Vec<_>>>()
                .map(Records::Many),
            _ => Err(not_records()),
        }
    }
}

fn not_records() -> Error {
    Error::handler("records must be a map or a list of maps")
}

/// Behaviour bound to one resource name.
///
/// The default methods give the plain behaviour shared by most object
/// types: describe, read with every retrievable property, and writes that
/// send each property map as the object's fields. Handlers with state or a
/// different wire shape override what they need.
#[async_trait]
pub trait ResourceHandler: Any + Send + Sync {
    /// Object type as named in the WSDL.
    fn object_type(&self) -> &str;

    /// Name the resource is registered under.
    fn resource_name(&self) -> &str {
        self.object_type()
    }

    /// Fetch the schema of [`object_type`](Self::object_type).
    async fn describe(&mut self, session: &mut Session) -> Result<ObjectDefinition> {
        let envelope = session.soap_describe(self.object_type()).await?;
        if !envelope.is_valid() || envelope.is_empty() {
            return Err(Error::handler(format!(
                "Invalid response or response dataset is empty [{}]",
                envelope
            )));
        }
        ObjectDefinition::from_row(&envelope.rows()[0])
    }

    async fn get(&mut self, session: &mut Session, request: GetRequest) -> Result<ResultSet> {
        let options = request.retrieve_options()?;
        let properties = match request.properties {
            Some(properties) => properties,
            None => retrievable_properties(self, session).await?,
        };

        let retrieve = retrieve_request(self.object_type(), properties, request.filter, options);
        let envelope = session.soap_get(&retrieve).await?;
        Ok(ResultSet::new(self.resource_name(), envelope))
    }

    async fn add(&mut self, session: &mut Session, records: Records) -> Result<ResultSet> {
        let envelope = session
            .soap_post(self.object_type(), &records.into_vec())
            .await?;
        Ok(ResultSet::new(self.resource_name(), envelope))
    }

    async fn update(&mut self, session: &mut Session, records: Records) -> Result<ResultSet> {
        let envelope = session
            .soap_patch(self.object_type(), &records.into_vec())
            .await?;
        Ok(ResultSet::new(self.resource_name(), envelope))
    }

    async fn delete(&mut self, session: &mut Session, records: Records) -> Result<ResultSet> {
        let envelope = session
            .soap_delete(self.object_type(), &records.into_vec())
            .await?;
        Ok(ResultSet::new(self.resource_name(), envelope))
    }

    /// Continue an earlier read. Called by result set iteration.
    async fn more_results(&mut self, session: &mut Session, request_id: &str) -> Result<ResultSet> {
        let envelope = session.soap_more_results(request_id).await?;
        Ok(ResultSet::new(self.resource_name(), envelope))
    }
}

/// Every retrievable property of the handler's object type.
///
/// A failed describe is reported as a handler error naming the cause.
pub(crate) async fn retrievable_properties<H>(
    handler: &mut H,
    session: &mut Session,
) -> Result<Vec<String>>
where
    H: ResourceHandler + ?Sized,
{
    match handler.describe(session).await {
        Ok(definition) => Ok(definition.retrievable_property_names()),
        Err(e) => Err(Error::with_source(
            ErrorKind::ResourceHandler(format!("Can not describe object: {}", e)),
            e,
        )),
    }
}

pub(crate) fn retrieve_request(
    object_type: &str,
    properties: Vec<String>,
    filter: Option<FilterExpression>,
    options: Option<RetrieveOptions>,
) -> RetrieveRequest {
    let mut request = RetrieveRequest::new(object_type).with_properties(properties);
    if let Some(filter) = filter {
        request = request.with_filter(filter);
    }
    if let Some(options) = options {
        request = request.with_options(options);
    }
    request
}

/// Handler with only the default behaviour.
#[derive(Debug, Clone)]
pub struct ObjectHandler {
    name: String,
    object_type: String,
}

impl ObjectHandler {
    pub fn new(object_type: impl Into<String>) -> Self {
        let object_type = object_type.into();
        Self {
            name: object_type.clone(),
            object_type,
        }
    }

    /// Register under `name` instead of the object type.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl ResourceHandler for ObjectHandler {
    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn resource_name(&self) -> &str {
        &self.name
    }
}
