//! Retrieve filter expressions.
//!
//! A filter is either a simple predicate on one property or a compound node
//! joining two filters with `AND`/`OR`. Compound nodes may carry extra simple
//! predicates as additional operands; compound nodes never nest there.
//!
//! ```rust
//! use busbar_mc_soap::FilterExpression;
//!
//! let filter = FilterExpression::both(
//!     FilterExpression::equals("Status", "Active"),
//!     FilterExpression::like("EmailAddress", "%@example.com"),
//! );
//! assert_eq!(filter.payload()["LogicalOperator"], "AND");
//! ```

use busbar_mc_client::security::xml;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Comparison applied by a simple predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleOperator {
    Equals,
    NotEquals,
    IsNull,
    IsNotNull,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    Like,
    In,
}

impl SimpleOperator {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleOperator::Equals => "equals",
            SimpleOperator::NotEquals => "notEquals",
            SimpleOperator::IsNull => "isNull",
            SimpleOperator::IsNotNull => "isNotNull",
            SimpleOperator::GreaterThan => "greaterThan",
            SimpleOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            SimpleOperator::LessThan => "lessThan",
            SimpleOperator::LessThanOrEqual => "lessThanOrEqual",
            SimpleOperator::Between => "between",
            SimpleOperator::Like => "like",
            SimpleOperator::In => "IN",
        }
    }
}

/// Operator joining the two sides of a compound filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// A value compared against a property.
///
/// Temporal values are sent in `DateValue`, everything else in `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    LocalDateTime(NaiveDateTime),
}

impl FilterValue {
    /// Whether the value selects the `DateValue` field.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            FilterValue::DateTime(_) | FilterValue::Date(_) | FilterValue::LocalDateTime(_)
        )
    }

    /// Text sent on the wire.
    pub fn to_wire_string(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            FilterValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FilterValue::LocalDateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FilterValue::Text(s) => Value::String(s.clone()),
            FilterValue::Integer(i) => json!(i),
            FilterValue::Float(f) => json!(f),
            FilterValue::Boolean(b) => Value::Bool(*b),
            _ => Value::String(self.to_wire_string()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        FilterValue::Text(value.clone())
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::DateTime(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(value: NaiveDateTime) -> Self {
        FilterValue::LocalDateTime(value)
    }
}

/// Predicate on a single property.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFilter {
    pub property: String,
    pub operator: SimpleOperator,
    pub values: Vec<FilterValue>,
}

impl SimpleFilter {
    /// Name of the value element, or `None` for null checks.
    ///
    /// Multi-valued predicates use `DateValue` only if every value is temporal.
    pub fn value_field(&self) -> Option<&'static str> {
        if self.values.is_empty() {
            None
        } else if self.values.iter().all(FilterValue::is_temporal) {
            Some("DateValue")
        } else {
            Some("Value")
        }
    }

    fn payload(&self) -> Value {
        let mut data = Map::new();
        data.insert("Property".into(), Value::String(self.property.clone()));
        data.insert(
            "SimpleOperator".into(),
            Value::String(self.operator.as_str().into()),
        );
        if let Some(field) = self.value_field() {
            let value = match self.values.as_slice() {
                [single] => single.to_json(),
                many => Value::Array(many.iter().map(FilterValue::to_json).collect()),
            };
            data.insert(field.into(), value);
        }
        Value::Object(data)
    }

    fn write_xml_body(&self, out: &mut String) {
        out.push_str(&format!(
            "<Property>{}</Property><SimpleOperator>{}</SimpleOperator>",
            xml::escape(&self.property),
            self.operator.as_str()
        ));
        if let Some(field) = self.value_field() {
            for value in &self.values {
                out.push_str(&format!(
                    "<{field}>{}</{field}>",
                    xml::escape(&value.to_wire_string())
                ));
            }
        }
    }
}

/// Compound predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexFilter {
    pub left: Box<FilterExpression>,
    pub operator: LogicalOperator,
    pub right: Box<FilterExpression>,
    pub additional_operands: Vec<SimpleFilter>,
}

/// A retrieve filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Simple(SimpleFilter),
    Complex(ComplexFilter),
}

impl FilterExpression {
    fn simple(operator: SimpleOperator, property: impl Into<String>, values: Vec<FilterValue>) -> Self {
        FilterExpression::Simple(SimpleFilter {
            property: property.into(),
            operator,
            values,
        })
    }

    fn complex(operator: LogicalOperator, left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::Complex(ComplexFilter {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            additional_operands: Vec::new(),
        })
    }

    pub fn equals(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::Equals, property, vec![value.into()])
    }

    pub fn not_equals(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::NotEquals, property, vec![value.into()])
    }

    /// Property has no value. Carries no value element.
    pub fn is_null(property: impl Into<String>) -> Self {
        Self::simple(SimpleOperator::IsNull, property, Vec::new())
    }

    /// Property has a value. Carries no value element.
    pub fn is_not_null(property: impl Into<String>) -> Self {
        Self::simple(SimpleOperator::IsNotNull, property, Vec::new())
    }

    pub fn greater_than(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::GreaterThan, property, vec![value.into()])
    }

    pub fn greater_than_or_equal(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::GreaterThanOrEqual, property, vec![value.into()])
    }

    pub fn less_than(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::LessThan, property, vec![value.into()])
    }

    pub fn less_than_or_equal(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::LessThanOrEqual, property, vec![value.into()])
    }

    /// Inclusive range; sends two value elements.
    pub fn between(
        property: impl Into<String>,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) -> Self {
        Self::simple(SimpleOperator::Between, property, vec![low.into(), high.into()])
    }

    pub fn like(property: impl Into<String>, pattern: impl Into<FilterValue>) -> Self {
        Self::simple(SimpleOperator::Like, property, vec![pattern.into()])
    }

    /// Membership test; sends one value element per candidate.
    pub fn in_array<I, V>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::simple(
            SimpleOperator::In,
            property,
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Both filters must match.
    pub fn both(left: FilterExpression, right: FilterExpression) -> Self {
        Self::complex(LogicalOperator::And, left, right)
    }

    /// Either filter must match.
    pub fn one_from(left: FilterExpression, right: FilterExpression) -> Self {
        Self::complex(LogicalOperator::Or, left, right)
    }

    /// Attach an extra simple predicate to a compound filter.
    ///
    /// Fails if `self` is simple or `operand` is compound.
    pub fn with_additional_operand(self, operand: FilterExpression) -> Result<Self> {
        let FilterExpression::Simple(operand) = operand else {
            return Err(Error::new(ErrorKind::InvalidFilter(
                "additional operands must be simple filters".to_string(),
            )));
        };
        match self {
            FilterExpression::Complex(mut complex) => {
                complex.additional_operands.push(operand);
                Ok(FilterExpression::Complex(complex))
            }
            FilterExpression::Simple(_) => Err(Error::new(ErrorKind::InvalidFilter(
                "additional operands can only be attached to compound filters".to_string(),
            ))),
        }
    }

    /// Generic map form of the filter.
    ///
    /// Simple nodes give `Property`, `SimpleOperator` and `Value` or
    /// `DateValue`; compound nodes give `LeftOperand`, `LogicalOperator`,
    /// `RightOperand` and, when present, `AdditionalOperands.Operand`.
    pub fn payload(&self) -> Value {
        match self {
            FilterExpression::Simple(simple) => simple.payload(),
            FilterExpression::Complex(complex) => {
                let mut data = Map::new();
                data.insert("LeftOperand".into(), complex.left.payload());
                data.insert(
                    "LogicalOperator".into(),
                    Value::String(complex.operator.as_str().into()),
                );
                data.insert("RightOperand".into(), complex.right.payload());
                if !complex.additional_operands.is_empty() {
                    let operands: Vec<Value> = complex
                        .additional_operands
                        .iter()
                        .map(SimpleFilter::payload)
                        .collect();
                    data.insert("AdditionalOperands".into(), json!({ "Operand": operands }));
                }
                Value::Object(data)
            }
        }
    }

    /// Write the filter as an element named `tag` with its `xsi:type`.
    pub fn write_xml(&self, tag: &str, out: &mut String) {
        match self {
            FilterExpression::Simple(simple) => {
                out.push_str(&format!("<{tag} xsi:type=\"SimpleFilterPart\">"));
                simple.write_xml_body(out);
                out.push_str(&format!("</{tag}>"));
            }
            FilterExpression::Complex(complex) => {
                out.push_str(&format!("<{tag} xsi:type=\"ComplexFilterPart\">"));
                complex.left.write_xml("LeftOperand", out);
                out.push_str(&format!(
                    "<LogicalOperator>{}</LogicalOperator>",
                    complex.operator.as_str()
                ));
                complex.right.write_xml("RightOperand", out);
                if !complex.additional_operands.is_empty() {
                    out.push_str("<AdditionalOperands>");
                    for operand in &complex.additional_operands {
                        out.push_str("<Operand xsi:type=\"SimpleFilterPart\">");
                        operand.write_xml_body(out);
                        out.push_str("</Operand>");
                    }
                    out.push_str("</AdditionalOperands>");
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}
