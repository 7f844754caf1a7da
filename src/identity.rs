//! Client identification (User-Agent) string.
//!
//! Wiki operators ask automated clients to identify themselves: the name has
//! to say it is a bot, the version has to be a real semantic version, and a
//! contact should be given so the operator can reach the owner. The string is
//! built once when the client is constructed and never changes afterwards.

use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Maximum length (in characters) of the name and of the normalized contact.
pub const MAX_FIELD_LEN: usize = 256;

/// Identity of this library, baked in at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLibrary {
    pub name: &'static str,
    pub version: &'static str,
    pub repository: &'static str,
    pub maintainer: &'static str,
}

pub const HOST_LIBRARY: HostLibrary = HostLibrary {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    repository: env!("CARGO_PKG_REPOSITORY"),
    maintainer: env!("CARGO_PKG_AUTHORS"),
};

// SemVer 2.0.0 grammar (semver.org), without the optional capture names.
static SEMVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .expect("semver pattern is valid")
});

/// Contact information for the bot owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Contact {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Contact {
    /// Collapse to the single string embedded in the identity.
    ///
    /// Lists are joined with `"; "`. A single string fully wrapped in one
    /// pair of parentheses loses that pair (once).
    pub fn normalize(&self) -> String {
        match self {
            Contact::None => String::new(),
            Contact::One(s) => strip_outer_parens(s).to_string(),
            Contact::Many(items) => items.join("; "),
        }
    }
}

impl From<&str> for Contact {
    fn from(s: &str) -> Self {
        Contact::One(s.to_string())
    }
}

impl From<String> for Contact {
    fn from(s: String) -> Self {
        Contact::One(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for Contact {
    fn from(items: Vec<S>) -> Self {
        Contact::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> From<Option<S>> for Contact {
    fn from(s: Option<S>) -> Self {
        s.map(|s| Contact::One(s.into())).unwrap_or_default()
    }
}

/// Strip one pair of parentheses if the opening one at the start is closed
/// by the one at the very end.
fn strip_outer_parens(s: &str) -> &str {
    if s.len() < 2 || !s.starts_with('(') || !s.ends_with(')') {
        return s;
    }
    let last = s.len() - 1;
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return if i == last { &s[1..last] } else { s };
                }
            }
            _ => {}
        }
    }
    s
}

/// Caller-provided parts of the identity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentOptions {
    pub name: String,
    pub version: String,
    pub contact: Contact,
}

impl UserAgentOptions {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            contact: Contact::None,
        }
    }

    pub fn with_contact(mut self, contact: impl Into<Contact>) -> Self {
        self.contact = contact.into();
        self
    }
}

impl Default for UserAgentOptions {
    /// The library's own bot identity.
    fn default() -> Self {
        Self {
            name: format!("{} bot for Rust", HOST_LIBRARY.name),
            version: HOST_LIBRARY.version.to_string(),
            contact: Contact::Many(vec![
                HOST_LIBRARY.repository.to_string(),
                HOST_LIBRARY.maintainer.to_string(),
            ]),
        }
    }
}

/// A validated identification string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn invalid(field: &str, msg: String, details: impl Into<String>) -> Error {
    Error::validation_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("identity_validator"),
    )
}

/// Check whether `version` is a SemVer 2.0.0 version string.
pub fn is_semver(version: &str) -> bool {
    SEMVER.is_match(version)
}

/// Validate the options and format
/// `"{name}/{version} ({contact}) {lib}/{libVersion}"`.
pub fn build_identity(opts: &UserAgentOptions) -> Result<Identity> {
    build_identity_for(opts, &HOST_LIBRARY)
}

pub(crate) fn build_identity_for(opts: &UserAgentOptions, host: &HostLibrary) -> Result<Identity> {
    let name = opts.name.as_str();
    let name_len = name.chars().count();
    if name_len > MAX_FIELD_LEN {
        return Err(invalid(
            "userAgent.name",
            format!("name must be at most {} characters", MAX_FIELD_LEN),
            format!("{} characters", name_len),
        ));
    }
    if !name.to_lowercase().contains("bot") {
        return Err(invalid(
            "userAgent.name",
            "name must contain \"bot\"".to_string(),
            name,
        ));
    }

    if !is_semver(&opts.version) {
        return Err(invalid(
            "userAgent.version",
            "version must be a valid semantic version".to_string(),
            opts.version.as_str(),
        ));
    }

    let contact = opts.contact.normalize();
    let contact_len = contact.chars().count();
    if contact_len > MAX_FIELD_LEN {
        return Err(invalid(
            "userAgent.contact",
            format!("contact must be at most {} characters", MAX_FIELD_LEN),
            format!("{} characters", contact_len),
        ));
    }

    let s = if contact.is_empty() {
        format!("{}/{} {}/{}", name, opts.version, host.name, host.version)
    } else {
        format!(
            "{}/{} ({}) {}/{}",
            name, opts.version, contact, host.name, host.version
        )
    };
    Ok(Identity(s))
}
