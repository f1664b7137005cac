//! `Endpoint` - path template and HTTP verb for one API operation.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Placeholder tokens in a path template (`{id}`).
#[allow(clippy::expect_used)]
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("failed to compile placeholder regex"));

/// HTTP verb semantics of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Params are sent as query string.
    Get,
    /// Data is sent as JSON body.
    Post,
    /// Data is sent as JSON body.
    Put,
    /// Params are sent as query string.
    Delete,
}

impl HttpMethod {
    /// Returns the uppercase verb (`GET`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the remaining params travel in the JSON body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of one API operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Operation name (e.g. `seriesById`).
    name: String,
    /// HTTP verb.
    method: HttpMethod,
    /// Path template with `{name}` placeholders.
    template: String,
}

impl Endpoint {
    /// Creates a new endpoint.
    #[must_use]
    pub fn new(name: impl Into<String>, method: HttpMethod, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            template: template.into(),
        }
    }

    /// Shorthand for a `GET` endpoint.
    #[must_use]
    pub fn get(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Get, template)
    }

    /// Shorthand for a `POST` endpoint.
    #[must_use]
    pub fn post(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Post, template)
    }

    /// Shorthand for a `PUT` endpoint.
    #[must_use]
    pub fn put(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Put, template)
    }

    /// Shorthand for a `DELETE` endpoint.
    #[must_use]
    pub fn delete(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Delete, template)
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP verb.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Raw path template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in template order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER_RE
            .captures_iter(&self.template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Renders the template, substituting known placeholders.
    ///
    /// Substituted values are percent-encoded as a single path segment.
    /// Placeholders without a value (or with `null`) stay verbatim.
    #[must_use]
    pub fn path(&self, substitutions: &HashMap<String, Value>) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &regex::Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                caps.get(1)
                    .and_then(|name| substitutions.get(name.as_str()))
                    .filter(|value| !value.is_null())
                    .map_or_else(
                        || String::from(whole),
                        |value| urlencoding::encode(&render_value(value)).into_owned(),
                    )
            })
            .into_owned()
    }
}

/// Renders a JSON value for a path segment or query string.
///
/// Strings are used verbatim, `null` becomes empty, everything else uses
/// its compact JSON text.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
