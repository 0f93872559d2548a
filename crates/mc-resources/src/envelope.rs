//! Normalization of raw SOAP and REST replies.

use busbar_mc_soap::SoapReply;
use serde_json::Value;

/// Overall status the service reports when a retrieve has further pages.
pub const MORE_DATA_AVAILABLE: &str = "MoreDataAvailable";

/// A raw reply before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// A SOAP `(code, body)` pair.
    Soap(SoapReply),
    /// A REST status and parsed JSON body.
    Rest { status: u16, body: Value },
}

/// The normalized result of one remote call.
///
/// Built once per call and never mutated. Branch on
/// [`is_valid`](Self::is_valid) and [`is_empty`](Self::is_empty).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    raw: Option<RawReply>,
    code: Option<u16>,
    status: bool,
    message: Option<String>,
    more_results: bool,
    request_id: Option<String>,
    rows: Vec<Value>,
}

impl Envelope {
    /// Normalize a reply. The variant selects the protocol rules.
    pub fn make_from_reply(raw: RawReply) -> Self {
        match raw {
            RawReply::Soap(reply) => Self::from_soap(reply),
            RawReply::Rest { status, body } => Self::from_rest(status, body),
        }
    }

    /// Normalize a SOAP reply.
    ///
    /// On a 200 an `OverallStatus` other than `OK` or `MoreDataAvailable`
    /// marks the envelope as failed. Rows come from `Results`, or from
    /// `ObjectDefinition` for describe replies.
    pub fn from_soap(reply: SoapReply) -> Self {
        let body = &reply.body;
        let mut envelope = Self {
            code: Some(reply.code),
            request_id: body
                .get("RequestID")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Self::default()
        };

        if reply.code == 200 {
            envelope.status = true;

            if let Some(overall) = body.get("OverallStatus").and_then(Value::as_str) {
                envelope.message = Some(overall.to_string());
                if overall == MORE_DATA_AVAILABLE {
                    envelope.more_results = true;
                } else if overall != "OK" {
                    envelope.status = false;
                }
            }

            let container = body.get("Results").or_else(|| body.get("ObjectDefinition"));
            if let Some(container) = container {
                envelope.rows = rows_of(container.clone());
            }
        }

        envelope.raw = Some(RawReply::Soap(reply));
        envelope
    }

    /// Normalize a REST reply: successful only on a 200, rows are the body.
    pub fn from_rest(status: u16, body: Value) -> Self {
        Self {
            code: Some(status),
            status: status == 200,
            rows: rows_of(body.clone()),
            raw: Some(RawReply::Rest { status, body }),
            ..Self::default()
        }
    }

    /// Constructed from a reply and reporting success.
    pub fn is_valid(&self) -> bool {
        self.raw.is_some() && self.status
    }

    /// No result rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The service's overall status text, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn has_more_results(&self) -> bool {
        self.more_results
    }

    /// Continuation id for the next page.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn raw(&self) -> Option<&RawReply> {
        self.raw.as_ref()
    }

    pub(crate) fn into_rows(self) -> Vec<Value> {
        self.rows
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "request_id[{}], rows[{}], code[{}], status[{}], message[{}], more_results[{}]",
            self.request_id.as_deref().unwrap_or("none"),
            self.rows.len(),
            self.code.map(|c| c.to_string()).unwrap_or_else(|| "none".into()),
            self.status,
            self.message.as_deref().unwrap_or("none"),
            self.more_results,
        )
    }
}

/// A single decoded element arrives as an object, repeated ones as an array.
fn rows_of(container: Value) -> Vec<Value> {
    match container {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
