//! XML writing for request payloads and decoding of reply envelopes.

use busbar_mc_client::security::xml::{escape, is_safe_element_name};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Write `value` as one or more elements named `name`.
///
/// Objects become nested elements, arrays repeat the element, scalars become
/// text and nulls are skipped.
pub fn write_value(name: &str, value: &Value, out: &mut String) -> Result<()> {
    if !is_safe_element_name(name) {
        return Err(Error::new(ErrorKind::InvalidPayload(format!(
            "'{}' is not a valid element name",
            name
        ))));
    }

    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_value(name, item, out)?;
            }
        }
        Value::Object(fields) => {
            out.push_str(&format!("<{name}>"));
            write_fields(fields, out)?;
            out.push_str(&format!("</{name}>"));
        }
        Value::String(s) => out.push_str(&format!("<{name}>{}</{name}>", escape(s))),
        Value::Bool(b) => out.push_str(&format!("<{name}>{b}</{name}>")),
        Value::Number(n) => out.push_str(&format!("<{name}>{n}</{name}>")),
    }
    Ok(())
}

/// Write every field of `fields` in order.
pub fn write_fields(fields: &Map<String, Value>, out: &mut String) -> Result<()> {
    for (key, value) in fields {
        write_value(key, value, out)?;
    }
    Ok(())
}

/// A decoded SOAP fault.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapFault {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl SoapFault {
    /// Read a fault from the decoded reply body, if it is one.
    pub fn from_body(body: &Value) -> Option<Self> {
        let fault = body.get("Fault")?;
        let text = |key: &str| {
            fault
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            code: text("faultcode"),
            message: text("faultstring"),
        })
    }
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
    nil: bool,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let mut nil = false;
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.local_name().as_ref() == b"nil" && attr.value.as_ref() == b"true" {
                nil = true;
            }
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            children: Map::new(),
            text: String::new(),
            nil,
        })
    }

    fn close(self) -> (String, Value) {
        let value = if !self.children.is_empty() {
            Value::Object(self.children)
        } else if self.nil || self.text.is_empty() {
            Value::Null
        } else {
            Value::String(self.text)
        };
        (self.name, value)
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// Decode an XML document into `(root element name, value)`.
///
/// Namespace prefixes are dropped. A single child element stays an object;
/// callers that expect a list must accept both shapes.
pub fn decode_document(document: &str) -> Result<(String, Value)> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| {
                    Error::new(ErrorKind::InvalidResponse("unbalanced end tag".to_string()))
                })?;
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => parent.push_child(name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| Error::new(ErrorKind::InvalidResponse("no root element".to_string())))
}

/// Decode a SOAP envelope and return the content of its response element.
///
/// For `<Body><RetrieveResponseMsg>...</RetrieveResponseMsg></Body>` this is
/// the decoded `RetrieveResponseMsg`. A fault comes back as `{"Fault": {...}}`.
/// An empty body decodes to `null`.
pub fn decode_envelope(document: &str) -> Result<Value> {
    let (root, value) = decode_document(document)?;
    if root != "Envelope" {
        return Err(Error::new(ErrorKind::InvalidResponse(format!(
            "expected Envelope, found {}",
            root
        ))));
    }

    let body = match value.get("Body") {
        Some(Value::Object(body)) => body,
        Some(_) => return Ok(Value::Null),
        None => {
            return Err(Error::new(ErrorKind::InvalidResponse(
                "envelope has no Body".to_string(),
            )))
        }
    };

    if let Some(fault) = body.get("Fault") {
        let mut wrapped = Map::new();
        wrapped.insert("Fault".to_string(), fault.clone());
        return Ok(Value::Object(wrapped));
    }

    Ok(body.values().next().cloned().unwrap_or(Value::Null))
}
