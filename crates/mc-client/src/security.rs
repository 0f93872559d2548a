//! Escaping utilities for values placed into SOAP envelopes and URLs.
//!
//! Every caller-supplied value that ends up inside a SOAP envelope MUST go
//! through [`xml::escape`]; every value interpolated into a REST path MUST go
//! through [`url::encode_param`].
//!
//! ```rust
//! use busbar_mc_client::security::xml;
//!
//! let name = xml::escape("Tom & Jerry <Promo>");
//! let element = format!("<Value>{}</Value>", name);
//! assert_eq!(element, "<Value>Tom &amp; Jerry &lt;Promo&gt;</Value>");
//! ```

/// URL encoding utilities.
pub mod url {
    /// Percent-encode a value for use as a single URL path segment or query value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use busbar_mc_client::security::url;
    ///
    /// assert_eq!(url::encode_param("my key/1"), "my%20key%2F1");
    /// ```
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}

/// XML escaping utilities.
pub mod xml {
    /// Escape a string for safe inclusion in XML content or attribute values.
    ///
    /// This escapes the five predefined XML entities.
    ///
    /// # Example
    ///
    /// ```rust
    /// use busbar_mc_client::security::xml;
    ///
    /// let safe = xml::escape("Hello <World> & 'Friends'");
    /// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
    /// ```
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Returns true if `name` can be used as an XML element name as-is.
    ///
    /// Element names come from caller-supplied field names when objects are
    /// written, so anything outside `[A-Za-z_][A-Za-z0-9_.-]*` is rejected.
    #[must_use]
    pub fn is_safe_element_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
    }
}
