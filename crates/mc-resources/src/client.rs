//! The caller-facing client.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use busbar_mc_client::RequestMethod;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::entity::ObjectDefinition;
use crate::envelope::Envelope;
use crate::error::{Error, ErrorKind, Result};
use crate::handler::{GetRequest, Records, ResourceHandler};
use crate::registry::ResourceRegistry;
use crate::result_set::{EntityCursor, ResultSet};
use crate::session::Session;

/// A connected Marketing Cloud client.
///
/// Handlers are created on first use of a resource name and kept for the
/// client's lifetime, so state such as a remembered customer key persists
/// across calls.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_mc_resources::{ClientFactory, ClientSettings, FilterExpression, GetRequest};
///
/// let mut factory = ClientFactory::new(ClientSettings::from_env()?)?;
/// let mut client = factory.make().await?;
///
/// let mut subscribers = client.resource("Subscriber")?;
/// let result = subscribers
///     .get(GetRequest::new().with_filter(FilterExpression::equals("Status", "Active")))
///     .await?;
/// for subscriber in subscribers.iter(result).collect_all().await? {
///     println!("{}", subscriber.get_str("EmailAddress")?);
/// }
/// ```
pub struct Client {
    session: Session,
    registry: Arc<ResourceRegistry>,
    handlers: HashMap<String, Box<dyn ResourceHandler>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Client {
    pub(crate) fn new(session: Session, registry: Arc<ResourceRegistry>) -> Self {
        Self {
            session,
            registry,
            handlers: HashMap::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Names this client can resolve.
    pub fn resource_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// The resource bound to `name`.
    ///
    /// Fails with [`ErrorKind::UnknownResource`] for unbound names.
    pub fn resource(&mut self, name: &str) -> Result<Resource<'_>> {
        if !self.handlers.contains_key(name) {
            let binding = self
                .registry
                .get(name)
                .ok_or_else(|| Error::new(ErrorKind::UnknownResource(name.to_string())))?;
            debug!(resource = name, "Creating handler");
            self.handlers.insert(name.to_string(), binding.build());
        }

        let handler = self
            .handlers
            .get_mut(name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownResource(name.to_string())))?;

        Ok(Resource {
            handler: handler.as_mut(),
            session: &mut self.session,
        })
    }

    /// Refresh the credential and reconfigure the transport.
    ///
    /// With `force` the token is fetched and the endpoint rediscovered
    /// even if the current ones are still valid.
    pub async fn refresh(&mut self, force: bool) -> Result<()> {
        self.session.refresh(force).await
    }

    /// Call a REST path relative to the REST base URL.
    pub async fn rest(
        &mut self,
        method: RequestMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope> {
        self.session.rest(method, path, body).await
    }
}

/// One resource of a [`Client`]: its handler plus the shared session.
pub struct Resource<'c> {
    handler: &'c mut (dyn ResourceHandler + 'static),
    session: &'c mut Session,
}

impl<'c> Resource<'c> {
    pub fn name(&self) -> &str {
        self.handler.resource_name()
    }

    pub fn object_type(&self) -> &str {
        self.handler.object_type()
    }

    #[instrument(skip(self), fields(resource = %self.handler.resource_name()))]
    pub async fn describe(&mut self) -> Result<ObjectDefinition> {
        self.handler.describe(&mut *self.session).await
    }

    #[instrument(skip(self, request), fields(resource = %self.handler.resource_name()))]
    pub async fn get(&mut self, request: GetRequest) -> Result<ResultSet> {
        self.handler.get(&mut *self.session, request).await
    }

    #[instrument(skip(self, records), fields(resource = %self.handler.resource_name()))]
    pub async fn add(&mut self, records: impl Into<Records>) -> Result<ResultSet> {
        self.handler.add(&mut *self.session, records.into()).await
    }

    #[instrument(skip(self, records), fields(resource = %self.handler.resource_name()))]
    pub async fn update(&mut self, records: impl Into<Records>) -> Result<ResultSet> {
        self.handler.update(&mut *self.session, records.into()).await
    }

    #[instrument(skip(self, records), fields(resource = %self.handler.resource_name()))]
    pub async fn delete(&mut self, records: impl Into<Records>) -> Result<ResultSet> {
        self.handler.delete(&mut *self.session, records.into()).await
    }

    pub(crate) async fn more_results(&mut self, request_id: &str) -> Result<ResultSet> {
        self.handler.more_results(&mut *self.session, request_id).await
    }

    /// Walk every entity of `result`, fetching later pages as needed.
    pub fn iter(&mut self, result: ResultSet) -> EntityCursor<'_, 'c> {
        EntityCursor::new(self, result)
    }

    /// The handler as its concrete type, for handler-specific state.
    pub fn handler_mut<T: ResourceHandler>(&mut self) -> Result<&mut T> {
        let name = self.handler.resource_name().to_string();
        let any: &mut dyn Any = &mut *self.handler;
        any.downcast_mut::<T>()
            .ok_or_else(|| Error::handler(format!("handler for {} has a different type", name)))
    }

    /// The concrete handler together with the session, for
    /// handler-specific operations that call the service.
    pub fn handler_with_session<T: ResourceHandler>(&mut self) -> Result<(&mut T, &mut Session)> {
        let name = self.handler.resource_name().to_string();
        let any: &mut dyn Any = &mut *self.handler;
        let handler = any
            .downcast_mut::<T>()
            .ok_or_else(|| Error::handler(format!("handler for {} has a different type", name)))?;
        Ok((handler, &mut *self.session))
    }
}
