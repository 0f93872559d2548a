//! Resource name to handler bindings.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::handler::{ObjectHandler, ResourceHandler};
use crate::handlers::{DataExtensionFieldHandler, DataExtensionHandler, DataExtensionRowHandler};

/// Object types served by [`ObjectHandler`] in the standard registry.
pub const STANDARD_OBJECT_TYPES: &[&str] = &[
    "Account",
    "BusinessUnit",
    "Email",
    "List",
    "Send",
    "TriggeredSendDefinition",
    "SMSTriggeredSend",
    "SMSTriggeredSendDefinition",
    "SMSSharedKeyword",
    "Subscriber",
    "SubscriberSendResult",
    "BounceEvent",
    "SentEvent",
    "SMSMTEvent",
    "SMSMOEvent",
];

type Constructor = Arc<dyn Fn() -> Box<dyn ResourceHandler> + Send + Sync>;

/// Binds a resource name to a handler constructor.
#[derive(Clone)]
pub struct ResourceBinding {
    name: String,
    constructor: Constructor,
}

impl std::fmt::Debug for ResourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ResourceBinding {
    pub fn new<F, H>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: ResourceHandler,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(move || Box::new(constructor()) as Box<dyn ResourceHandler>),
        }
    }

    /// A binding for an object type with the default behaviour, named after
    /// the object type.
    pub fn object(object_type: &str) -> Self {
        let object_type = object_type.to_string();
        Self::new(object_type.clone(), move || ObjectHandler::new(object_type.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn build(&self) -> Box<dyn ResourceHandler> {
        (self.constructor)()
    }
}

/// Every resource a client can resolve.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    bindings: BTreeMap<String, ResourceBinding>,
}

impl ResourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard object types plus the data extension family.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for object_type in STANDARD_OBJECT_TYPES {
            registry.bind(ResourceBinding::object(object_type));
        }
        registry.bind(ResourceBinding::new("DataExtension", DataExtensionHandler::new));
        registry.bind(ResourceBinding::new(
            "DataExtensionField",
            DataExtensionFieldHandler::new,
        ));
        registry.bind(ResourceBinding::new(
            "DataExtensionRow",
            DataExtensionRowHandler::new,
        ));
        registry
    }

    /// Add a binding, replacing any under the same name.
    pub fn bind(&mut self, binding: ResourceBinding) -> &mut Self {
        self.bindings.insert(binding.name.clone(), binding);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ResourceBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.keys().map(String::as_str).collect()
    }
}
