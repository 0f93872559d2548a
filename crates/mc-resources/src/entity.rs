//! Result rows and object definitions.

use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Entity type reported for rows without a `Type` field.
pub const DEFAULT_ENTITY_TYPE: &str = "DefaultEntity";

/// Present in live describe replies but missing from the WSDL schema, so
/// requesting it fails.
pub const UNDECLARED_PLATFORM_PROPERTY: &str = "IsPlatformObject";

/// One `{Name, Value, ...}` entry of a row's `Properties` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperty {
    fields: Map<String, Value>,
}

impl EntityProperty {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("Name").and_then(Value::as_str)
    }

    /// The entry's `Value`, which may be `null`.
    pub fn value(&self) -> Result<&Value> {
        self.get("Value")
    }

    /// Any other field of the entry.
    pub fn get(&self, field: &str) -> Result<&Value> {
        self.fields
            .get(field)
            .ok_or_else(|| Error::new(ErrorKind::MissingAttribute(field.to_string())))
    }
}

/// A single result row.
///
/// Rows carrying a `Properties` collection (data extension rows, for one)
/// are split on construction: the collection is reachable only through
/// [`get_property`](Self::get_property) and friends, everything else
/// through [`get`](Self::get).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    raw: Value,
    fields: Map<String, Value>,
    properties: Option<Vec<EntityProperty>>,
}

impl Entity {
    pub fn new(row: Value) -> Self {
        let mut fields = match &row {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let properties = fields.remove("Properties").map(property_entries);

        Self {
            raw: row,
            fields,
            properties,
        }
    }

    /// The row as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// A plain field. Absent fields fail with
    /// [`ErrorKind::MissingAttribute`]; present-but-empty ones are `null`.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::new(ErrorKind::MissingAttribute(name.to_string())))
    }

    /// A plain field as text.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| Error::handler(format!("field {} is not text", name)))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of the plain fields, in reply order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The row's `Type`, or [`DEFAULT_ENTITY_TYPE`].
    pub fn entity_type(&self) -> &str {
        self.fields
            .get("Type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ENTITY_TYPE)
    }

    pub fn has_properties(&self) -> bool {
        self.properties.is_some()
    }

    /// All `Properties` entries in order.
    pub fn properties(&self) -> Result<&[EntityProperty]> {
        self.properties.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::MissingProperty("row has no Properties".to_string()))
        })
    }

    pub fn get_property(&self, name: &str) -> Result<&EntityProperty> {
        self.properties()?
            .iter()
            .find(|p| p.name() == Some(name))
            .ok_or_else(|| {
                Error::new(ErrorKind::MissingProperty(format!(
                    "Property [{}] is missing in result set",
                    name
                )))
            })
    }

    pub fn get_property_value(&self, name: &str) -> Result<&Value> {
        self.get_property(name)?.value()
    }

    /// Plain fields plus `Properties` flattened to name/value pairs.
    ///
    /// Suitable for feeding a row back into an update or delete.
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = self.fields.clone();
        for property in self.properties.iter().flatten() {
            if let Some(name) = property.name() {
                let value = property.value().cloned().unwrap_or(Value::Null);
                payload.insert(name.to_string(), value);
            }
        }
        payload
    }
}

/// Accepts `{"Property": [...]}`, `{"Property": {...}}`, a bare list, or an
/// empty container.
fn property_entries(container: Value) -> Vec<EntityProperty> {
    let entries = match container {
        Value::Object(mut map) => map.remove("Property").unwrap_or(Value::Null),
        other => other,
    };
    let items = match entries {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(fields) => Some(EntityProperty { fields }),
            _ => None,
        })
        .collect()
}

/// A schema property from a describe reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    fields: Map<String, Value>,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        self.fields.get("Name").and_then(Value::as_str).unwrap_or_default()
    }

    /// Accepts a boolean or `"true"` text.
    pub fn is_retrievable(&self) -> bool {
        match self.fields.get("IsRetrievable") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Any other descriptor field, passed through as received.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// The schema of one object type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDefinition {
    object_type: String,
    properties: Vec<PropertyDescriptor>,
}

impl ObjectDefinition {
    /// Build a definition from the first row of a describe reply.
    pub fn from_row(row: &Value) -> Result<Self> {
        let object_type = row
            .get("ObjectType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let properties = match row.get("Properties") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single.clone()],
        };

        let properties = properties
            .into_iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(PropertyDescriptor { fields }),
                other => Err(Error::handler(format!(
                    "unexpected property descriptor for {}: {}",
                    object_type, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            object_type,
            properties,
        })
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn get_property(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| {
                Error::new(ErrorKind::MissingProperty(format!(
                    "{} has no property {}",
                    self.object_type, name
                )))
            })
    }

    /// Properties that may be requested in a retrieve.
    pub fn retrievable_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties
            .iter()
            .filter(|p| p.is_retrievable() && p.name() != UNDECLARED_PLATFORM_PROPERTY)
    }

    pub fn retrievable_property_names(&self) -> Vec<String> {
        self.retrievable_properties()
            .map(|p| p.name().to_string())
            .collect()
    }
}
