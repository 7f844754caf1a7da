//! Client options and their validated, immutable form.
//!
//! Options can be set through [`crate::WikiClientBuilder`], loaded from a
//! JSON/YAML document, or overridden from the environment:
//! - `HOLOWIKI_REQUEST_TIMEOUT_MS`
//! - `HOLOWIKI_REQUEST_INTERVAL_MS`
//! - `HOLOWIKI_ENDPOINT`

use crate::identity::{build_identity, Contact, Identity, UserAgentOptions};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://hololive.wiki/w/api.php";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(1_000);
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(500);
pub const MAX_REQUEST_INTERVAL: Duration = Duration::from_millis(5_000);

const ENV_REQUEST_TIMEOUT: &str = "HOLOWIKI_REQUEST_TIMEOUT_MS";
const ENV_REQUEST_INTERVAL: &str = "HOLOWIKI_REQUEST_INTERVAL_MS";
const ENV_ENDPOINT: &str = "HOLOWIKI_ENDPOINT";

/// Raw, unvalidated client options. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub request_timeout: Option<Duration>,
    pub request_interval: Option<Duration>,
    pub user_agent: Option<UserAgentOptions>,
    pub endpoint: Option<String>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = Some(interval);
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgentOptions) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Read options from a dynamic document.
    ///
    /// Keys use the wire spelling: `requestTimeout`, `requestInterval`
    /// (milliseconds), `userAgent { name, version, contact }`, `endpoint`.
    /// `null` means "use the default". Values of the wrong kind fail with
    /// [`Error::TypeMismatch`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(obj) => obj,
            other => return Err(Error::type_mismatch("options", "object", kind(other))),
        };

        let mut opts = Self::default();
        for (key, v) in obj {
            if v.is_null() {
                continue;
            }
            match key.as_str() {
                "requestTimeout" => opts.request_timeout = Some(millis_from_value(key, v)?),
                "requestInterval" => opts.request_interval = Some(millis_from_value(key, v)?),
                "userAgent" => opts.user_agent = Some(user_agent_from_value(v)?),
                "endpoint" => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| Error::type_mismatch(key.as_str(), "string", kind(v)))?;
                    opts.endpoint = Some(s.to_string());
                }
                other => {
                    tracing::warn!(option = other, "ignoring unknown client option");
                }
            }
        }
        Ok(opts)
    }

    /// Parse a YAML (or JSON) document with the same layout as [`Self::from_value`].
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(doc).map_err(|e| {
            Error::validation_with_context(
                format!("Failed to parse options document: {}", e),
                ErrorContext::new().with_source("options_loader"),
            )
        })?;
        Self::from_value(&value)
    }

    /// Overlay values from `HOLOWIKI_*` environment variables.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    pub(crate) fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout = Some(millis_from_env(ENV_REQUEST_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_REQUEST_INTERVAL) {
            self.request_interval = Some(millis_from_env(ENV_REQUEST_INTERVAL, &raw)?);
        }
        if let Some(raw) = lookup(ENV_ENDPOINT) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.endpoint = Some(raw.to_string());
            }
        }
        Ok(self)
    }

    /// Validate every field and produce the frozen [`ClientConfig`].
    pub fn validate(self) -> Result<ClientConfig> {
        let request_timeout = check_range(
            "requestTimeout",
            self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            MIN_REQUEST_TIMEOUT,
            MAX_REQUEST_TIMEOUT,
        )?;
        let request_interval = check_range(
            "requestInterval",
            self.request_interval.unwrap_or(DEFAULT_REQUEST_INTERVAL),
            MIN_REQUEST_INTERVAL,
            MAX_REQUEST_INTERVAL,
        )?;
        let identity = build_identity(&self.user_agent.unwrap_or_default())?;
        let endpoint = parse_endpoint(self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT))?;

        Ok(ClientConfig {
            request_timeout,
            request_interval,
            identity,
            endpoint,
        })
    }
}

/// Validated client configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    request_timeout: Duration,
    request_interval: Duration,
    identity: Identity,
    endpoint: Url,
}

impl ClientConfig {
    /// Max time a single in-flight call may run before it is cancelled.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Minimum spacing between the starts of two dispatches.
    pub fn request_interval(&self) -> Duration {
        self.request_interval
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn out_of_range(field: &str, msg: String, details: impl Into<String>) -> Error {
    Error::validation_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("options_validator"),
    )
}

fn millis_from_value(field: &str, v: &Value) -> Result<Duration> {
    let n = v
        .as_f64()
        .ok_or_else(|| Error::type_mismatch(field, "number of milliseconds", kind(v)))?;
    if let Some(ms) = v.as_u64() {
        return Ok(Duration::from_millis(ms));
    }
    if !n.is_finite() || n < 0.0 {
        return Err(out_of_range(
            field,
            format!("{} must be a non-negative number of milliseconds", field),
            n.to_string(),
        ));
    }
    Ok(Duration::from_micros((n * 1000.0).round() as u64))
}

fn millis_from_env(name: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| Error::type_mismatch(name, "integer milliseconds", raw))
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::type_mismatch(
            format!("userAgent.{}", key),
            "string",
            kind(other),
        )),
    }
}

fn user_agent_from_value(v: &Value) -> Result<UserAgentOptions> {
    let obj = v
        .as_object()
        .ok_or_else(|| Error::type_mismatch("userAgent", "object", kind(v)))?;
    let defaults = UserAgentOptions::default();

    let name = string_field(obj, "name")?.unwrap_or(defaults.name);
    let version = string_field(obj, "version")?.unwrap_or(defaults.version);
    let contact = match obj.get("contact") {
        None => defaults.contact,
        Some(Value::Null) => Contact::None,
        Some(Value::String(s)) => Contact::One(s.clone()),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let s = item.as_str().ok_or_else(|| {
                    Error::type_mismatch(format!("userAgent.contact[{}]", i), "string", kind(item))
                })?;
                out.push(s.to_string());
            }
            Contact::Many(out)
        }
        Some(other) => {
            return Err(Error::type_mismatch(
                "userAgent.contact",
                "string or array of strings",
                kind(other),
            ))
        }
    };

    Ok(UserAgentOptions {
        name,
        version,
        contact,
    })
}

fn check_range(field: &str, value: Duration, min: Duration, max: Duration) -> Result<Duration> {
    if value < min || value > max {
        return Err(out_of_range(
            field,
            format!(
                "{} must be between {}ms and {}ms",
                field,
                min.as_millis(),
                max.as_millis()
            ),
            format!("{}ms", value.as_millis()),
        ));
    }
    Ok(value)
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| out_of_range("endpoint", format!("endpoint is not a valid URL: {}", e), raw))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(out_of_range(
            "endpoint",
            "endpoint must use http or https".to_string(),
            raw,
        ));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_defaults() {
        let cfg = ClientOptions::new().validate().unwrap();
        assert_eq!(cfg.request_timeout(), ms(10_000));
        assert_eq!(cfg.request_interval(), ms(1_000));
        assert_eq!(cfg.endpoint().as_str(), DEFAULT_ENDPOINT);
        assert!(cfg.identity().as_str().contains("bot for Rust"));
    }

    #[test]
    fn test_timeout_bounds() {
        for ok in [500, 30_000] {
            let cfg = ClientOptions::new().with_request_timeout(ms(ok)).validate().unwrap();
            assert_eq!(cfg.request_timeout(), ms(ok));
        }
        for bad in [499, 30_001] {
            let err = ClientOptions::new()
                .with_request_timeout(ms(bad))
                .validate()
                .unwrap_err();
            assert!(err.is_value_range(), "{bad}: {err}");
        }
    }

    #[test]
    fn test_interval_bounds() {
        for ok in [500, 5_000] {
            assert!(ClientOptions::new().with_request_interval(ms(ok)).validate().is_ok());
        }
        for bad in [499, 5_001] {
            let err = ClientOptions::new()
                .with_request_interval(ms(bad))
                .validate()
                .unwrap_err();
            assert!(err.is_value_range(), "{bad}: {err}");
            assert_eq!(
                err.context().and_then(|c| c.field_path.as_deref()),
                Some("requestInterval")
            );
        }
    }

    #[test]
    fn test_endpoint_validation() {
        let cfg = ClientOptions::new()
            .with_endpoint("http://127.0.0.1:8080/w/api.php")
            .validate()
            .unwrap();
        assert_eq!(cfg.endpoint().port(), Some(8080));

        for bad in ["not a url", "ftp://example.com/api.php"] {
            let err = ClientOptions::new().with_endpoint(bad).validate().unwrap_err();
            assert!(err.is_value_range(), "{bad}");
        }
    }

    #[test]
    fn test_invalid_identity_aborts_validation() {
        let err = ClientOptions::new()
            .with_user_agent(UserAgentOptions::new("crawler", "1.0.0"))
            .validate()
            .unwrap_err();
        assert!(err.is_value_range());
    }

    #[test]
    fn test_from_value_full() {
        let opts = ClientOptions::from_value(&json!({
            "requestTimeout": 2000,
            "requestInterval": 750,
            "userAgent": {
                "name": "TalentBot",
                "version": "0.2.0",
                "contact": ["https://example.com", "a@example.com"]
            },
            "endpoint": "http://localhost:9000/api.php"
        }))
        .unwrap();
        assert_eq!(opts.request_timeout, Some(ms(2000)));
        assert_eq!(opts.request_interval, Some(ms(750)));
        let cfg = opts.validate().unwrap();
        assert!(cfg
            .identity()
            .as_str()
            .starts_with("TalentBot/0.2.0 (https://example.com; a@example.com) "));
    }

    #[test]
    fn test_from_value_nulls_mean_defaults() {
        let opts = ClientOptions::from_value(&json!({
            "requestTimeout": null,
            "userAgent": { "name": "abot", "version": "1.0.0", "contact": null }
        }))
        .unwrap();
        assert_eq!(opts.request_timeout, None);
        let cfg = opts.validate().unwrap();
        assert!(!cfg.identity().as_str().contains('('));
        assert_eq!(ClientOptions::from_value(&Value::Null).unwrap(), ClientOptions::default());
    }

    #[test]
    fn test_from_value_type_mismatches() {
        let cases = [
            json!("fast"),
            json!({ "requestTimeout": "1000" }),
            json!({ "requestInterval": true }),
            json!({ "userAgent": "abot/1.0.0" }),
            json!({ "userAgent": { "name": 42 } }),
            json!({ "userAgent": { "name": "abot", "version": 1.0 } }),
            json!({ "userAgent": { "contact": 5 } }),
            json!({ "userAgent": { "contact": ["a", 1] } }),
            json!({ "endpoint": 80 }),
        ];
        for case in cases {
            let err = ClientOptions::from_value(&case).unwrap_err();
            assert!(err.is_type_mismatch(), "{case}: {err}");
        }
    }

    #[test]
    fn test_from_value_negative_is_value_range() {
        let err = ClientOptions::from_value(&json!({ "requestTimeout": -5 })).unwrap_err();
        assert!(err.is_value_range());
    }

    #[test]
    fn test_from_value_fractional_millis() {
        let opts = ClientOptions::from_value(&json!({ "requestInterval": 500.5 })).unwrap();
        assert_eq!(opts.request_interval, Some(Duration::from_micros(500_500)));
    }

    #[test]
    fn test_from_yaml_str() {
        let opts = ClientOptions::from_yaml_str(
            "requestTimeout: 3000\nuserAgent:\n  name: YamlBot\n  version: 1.4.2\n  contact: \"(ops@example.com)\"\n",
        )
        .unwrap();
        let cfg = opts.validate().unwrap();
        assert_eq!(cfg.request_timeout(), ms(3000));
        assert!(cfg.identity().as_str().starts_with("YamlBot/1.4.2 (ops@example.com) "));

        let err = ClientOptions::from_yaml_str("requestTimeout: [1, 2").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("HOLOWIKI_REQUEST_TIMEOUT_MS", "1500"),
            ("HOLOWIKI_REQUEST_INTERVAL_MS", " 600 "),
            ("HOLOWIKI_ENDPOINT", "http://localhost:1234/api.php"),
        ]
        .into_iter()
        .collect();
        let opts = ClientOptions::new()
            .with_request_timeout(ms(9000))
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(opts.request_timeout, Some(ms(1500)));
        assert_eq!(opts.request_interval, Some(ms(600)));
        assert_eq!(opts.endpoint.as_deref(), Some("http://localhost:1234/api.php"));
    }

    #[test]
    fn test_env_override_not_a_number() {
        let err = ClientOptions::new()
            .apply_env(|k| (k == "HOLOWIKI_REQUEST_INTERVAL_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.is_type_mismatch());
    }
}
