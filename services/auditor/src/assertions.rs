//! Composable conformance predicates over raw JSON.
//!
//! Every property assertion follows the same contract:
//!
//! - property absent and optional: returns `Ok(false)` and checks nothing
//!   more, so callers can gate dependent checks on it;
//! - property absent and required: fails;
//! - property present: applies the predicate and returns `Ok(true)`, or
//!   fails with a message embedding the subject's JSON.
//!
//! Failures carry the URL the subject was fetched from. An [`Asserter`]
//! holds no mutable state, so re-running an assertion on the same subject
//! always yields the same outcome.

use chrono::DateTime;
use reqwest::Url;
use serde_json::Value;
use services_common::{AssertionError, parse_numeric};

/// Per-call assertion options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertOpts {
    /// Fail when the property is absent
    pub required: bool,
    /// URL assertions only: demand the `https` scheme
    pub https: bool,
}

impl Default for AssertOpts {
    fn default() -> Self {
        Self::REQUIRED
    }
}

impl AssertOpts {
    pub const REQUIRED: Self = Self {
        required: true,
        https: false,
    };

    pub const OPTIONAL: Self = Self {
        required: false,
        https: false,
    };

    pub fn required(required: bool) -> Self {
        Self {
            required,
            ..Self::REQUIRED
        }
    }

    pub fn with_https(self) -> Self {
        Self {
            https: true,
            ..self
        }
    }
}

/// JSON value kinds a property can be checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl JsonType {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Compact JSON rendering for failure messages
pub fn to_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unprintable>".to_string())
}

/// Assertion context bound to the URL the subjects came from
#[derive(Debug, Clone, Copy)]
pub struct Asserter<'a> {
    url: Option<&'a str>,
}

impl<'a> Asserter<'a> {
    pub fn new(url: &'a str) -> Self {
        Self { url: Some(url) }
    }

    /// Asserter for checks not tied to a fetched document
    pub fn detached() -> Self {
        Self { url: None }
    }

    pub fn url(&self) -> Option<&'a str> {
        self.url
    }

    pub fn fail(&self, message: impl Into<String>) -> AssertionError {
        AssertionError::new(self.url, message)
    }

    /// Fail with `message` unless `condition` holds
    pub fn ensure(&self, condition: bool, message: impl Into<String>) -> Result<(), AssertionError> {
        if condition { Ok(()) } else { Err(self.fail(message)) }
    }

    /// Like [`Asserter::ensure`] with a lazily built message
    pub fn ensure_with(
        &self,
        condition: bool,
        message: impl FnOnce() -> String,
    ) -> Result<(), AssertionError> {
        if condition { Ok(()) } else { Err(self.fail(message())) }
    }

    /// `o` has key `p`
    pub fn property(&self, o: &Value, p: &str, opts: AssertOpts) -> Result<bool, AssertionError> {
        if o.get(p).is_some() {
            return Ok(true);
        }
        if !opts.required {
            return Ok(false);
        }
        Err(self.fail(format!("Expected '{p}' key: {}", to_json(o))))
    }

    /// `o[p]` is of JSON type `t`
    pub fn property_type(&self, o: &Value, p: &str, t: JsonType) -> Result<(), AssertionError> {
        let ok = o.get(p).is_some_and(|v| t.matches(v));
        self.ensure_with(ok, || {
            format!("Expected '{p}' to be a {}: {}", t.label(), to_json(o))
        })
    }

    /// `o[p]` has positive length
    pub fn property_not_empty(&self, o: &Value, p: &str) -> Result<(), AssertionError> {
        let ok = match o.get(p) {
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(m)) => !m.is_empty(),
            _ => false,
        };
        self.ensure_with(ok, || format!("Expected '{p}' not to be blank: {}", to_json(o)))
    }

    /// `o[p]` is a non-empty string
    pub fn string_property(&self, o: &Value, p: &str, opts: AssertOpts) -> Result<bool, AssertionError> {
        if !self.property(o, p, opts)? {
            return Ok(false);
        }
        self.property_type(o, p, JsonType::String)?;
        self.property_not_empty(o, p)?;
        Ok(true)
    }

    /// `o[p]` is a boolean
    pub fn boolean_property(&self, o: &Value, p: &str, opts: AssertOpts) -> Result<bool, AssertionError> {
        if !self.property(o, p, opts)? {
            return Ok(false);
        }
        self.property_type(o, p, JsonType::Boolean)?;
        Ok(true)
    }

    /// `o[p]` is an array (possibly empty)
    pub fn array_property(&self, o: &Value, p: &str, opts: AssertOpts) -> Result<bool, AssertionError> {
        if !self.property(o, p, opts)? {
            return Ok(false);
        }
        self.property_type(o, p, JsonType::Array)?;
        Ok(true)
    }

    /// `o[p]` is an absolute URL, optionally `https`
    pub fn url_property(&self, o: &Value, p: &str, opts: AssertOpts) -> Result<bool, AssertionError> {
        if !self.property(o, p, opts)? {
            return Ok(false);
        }
        self.property_type(o, p, JsonType::String)?;
        let parsed = o.get(p).and_then(Value::as_str).and_then(|s| Url::parse(s).ok());
        self.ensure_with(parsed.is_some(), || {
            format!("Expected '{p}' to be a valid URL: {}", to_json(o))
        })?;
        if opts.https {
            let secure = parsed.is_some_and(|u| u.scheme() == "https");
            self.ensure_with(secure, || {
                format!("Expected '{p}' to be an https URL: {}", to_json(o))
            })?;
        }
        Ok(true)
    }

    /// `o[p]` is an RFC3339 timestamp in UTC with a literal `Z` suffix
    pub fn timestamp_property(&self, o: &Value, p: &str, opts: AssertOpts) -> Result<bool, AssertionError> {
        if !self.property(o, p, opts)? {
            return Ok(false);
        }
        self.property_type(o, p, JsonType::String)?;
        let raw = o.get(p).and_then(Value::as_str).unwrap_or_default();
        let detail = match DateTime::parse_from_rfc3339(raw) {
            Err(e) => Some(format!("{e} ")),
            Ok(ts) if ts.offset().local_minus_utc() != 0 || !raw.ends_with('Z') => {
                Some("timestamp is not in UTC ".to_string())
            }
            Ok(_) => None,
        };
        match detail {
            None => Ok(true),
            Some(detail) => Err(self.fail(format!(
                "Expected '{p}' to be a valid RFC3339 Timestamp: {detail}{}",
                to_json(o)
            ))),
        }
    }

    /// `o[p]` is a non-empty string holding a finite number
    pub fn numeric_string_property(
        &self,
        o: &Value,
        p: &str,
        opts: AssertOpts,
    ) -> Result<bool, AssertionError> {
        if !self.string_property(o, p, opts)? {
            return Ok(false);
        }
        let numeric = o.get(p).and_then(Value::as_str).and_then(parse_numeric).is_some();
        self.ensure_with(numeric, || {
            format!("Expected '{p}' to be a numeric string: {}", to_json(o))
        })?;
        Ok(true)
    }

    /// `o[p]` is a member of `set`; when `o[p]` is an array every element
    /// must be a member.
    pub fn property_in_set(
        &self,
        o: &Value,
        p: &str,
        set: &[&str],
        opts: AssertOpts,
    ) -> Result<bool, AssertionError> {
        if !self.property(o, p, opts)? {
            return Ok(false);
        }
        let member = |v: &Value| v.as_str().is_some_and(|s| set.contains(&s));
        let ok = match o.get(p) {
            Some(Value::Array(items)) => items.iter().all(member),
            Some(v) => member(v),
            None => false,
        };
        self.ensure_with(ok, || {
            format!(
                "Expected '{p}' to be one of '{}': {}",
                to_json(&Value::from(set.to_vec())),
                to_json(o)
            )
        })?;
        Ok(true)
    }

    /// `o` carries no keys outside `allowed`
    pub fn known_properties(&self, o: &Value, allowed: &[&str], what: &str) -> Result<(), AssertionError> {
        let unknown = o
            .as_object()
            .and_then(|m| m.keys().find(|k| !allowed.contains(&k.as_str())));
        match unknown {
            None => Ok(()),
            Some(k) => Err(self.fail(format!("{what} has unknown property '{k}': {}", to_json(o)))),
        }
    }

    /// One of `primary`/`fallback` must be a numeric string; the other is
    /// checked when present. Returns the parsed value of whichever was used.
    pub fn numeric_string_either(
        &self,
        o: &Value,
        primary: &str,
        fallback: &str,
    ) -> Result<f64, AssertionError> {
        let (used, other) = if is_truthy(o.get(primary)) {
            (primary, fallback)
        } else {
            (fallback, primary)
        };
        self.numeric_string_property(o, used, AssertOpts::REQUIRED)?;
        self.numeric_string_property(o, other, AssertOpts::OPTIONAL)?;
        Ok(o
            .get(used)
            .and_then(Value::as_str)
            .and_then(parse_numeric)
            .unwrap_or_default())
    }

    /// `value` is an array; returns its elements
    pub fn array<'v>(&self, value: &'v Value, what: &str) -> Result<&'v [Value], AssertionError> {
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.fail(format!("Expected {what} to be an array: {}", to_json(value))))
    }

    /// `value` is a non-empty array; returns its elements
    pub fn non_empty_array<'v>(&self, value: &'v Value, what: &str) -> Result<&'v [Value], AssertionError> {
        let items = self.array(value, what)?;
        self.ensure_with(!items.is_empty(), || format!("Expected at least one {what}"))?;
        Ok(items)
    }
}

/// Present and not an empty string, null or false
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}
