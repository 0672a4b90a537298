//! Header rule normalization.
//!
//! Users write header additions as a map of name → spec where each spec is a
//! plain string or a `{value, append}` object. The normalizer turns that into
//! the one canonical [`HeaderRule`] form, keeping the user's key order.
//!
//! Values are opaque. Proxy substitution tokens such as `%PROTOCOL%` pass
//! through verbatim.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::{DiagnosticKind, HeaderSpec, OrderedMap};

/// A canonical header-addition instruction.
///
/// Serializes in the proxy's `HeaderValueOption` shape:
///
/// ```
/// use routegen::HeaderRule;
///
/// let rule = HeaderRule::new("x-test-proto", "%PROTOCOL%", true);
/// assert_eq!(
///     serde_json::to_value(&rule).unwrap(),
///     serde_json::json!({ "header": { "key": "x-test-proto", "value": "%PROTOCOL%" }, "append": true })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderRule {
    pub key: String,
    pub value: String,
    /// Append to an existing header of the same name instead of replacing it.
    pub append: bool,
}

impl HeaderRule {
    pub fn new(key: impl Into<String>, value: impl Into<String>, append: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            append,
        }
    }
}

impl Serialize for HeaderRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct HeaderValue<'a> {
            key: &'a str,
            value: &'a str,
        }

        let mut state = serializer.serialize_struct("HeaderValueOption", 2)?;
        state.serialize_field(
            "header",
            &HeaderValue {
                key: &self.key,
                value: &self.value,
            },
        )?;
        state.serialize_field("append", &self.append)?;
        state.end()
    }
}

/// Normalizer output: the rules that survived plus one diagnostic per
/// rejected header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedHeaders {
    pub rules: Vec<HeaderRule>,
    pub errors: Vec<DiagnosticKind>,
}

/// Normalize a header map into ordered [`HeaderRule`]s.
///
/// One rule per entry, in input order. `append` defaults to `true` for both
/// the string and the object shape. A malformed spec drops only that header;
/// its siblings are still normalized.
#[must_use]
pub fn normalize_headers(headers: &OrderedMap<HeaderSpec>) -> NormalizedHeaders {
    let mut out = NormalizedHeaders::default();

    for (key, spec) in headers.iter() {
        match spec {
            HeaderSpec::Plain(value) => out.rules.push(HeaderRule::new(key, value, true)),
            HeaderSpec::Object { value, append } => {
                out.rules
                    .push(HeaderRule::new(key, value, append.unwrap_or(true)));
            }
            HeaderSpec::Malformed(found) => out.errors.push(DiagnosticKind::MalformedHeaderSpec {
                header: key.to_owned(),
                found: describe(found).to_owned(),
            }),
        }
    }

    out
}

/// Deduplicate header names case-insensitively, keeping the first spelling
/// and position of each.
#[must_use]
pub fn dedup_header_names(names: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let folded = name.to_ascii_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            out.push(name.clone());
        }
    }
    out
}

fn describe(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a bare string outside the plain form",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object without a string `value`",
    }
}
