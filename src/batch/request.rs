//! Query descriptors and how a batch of them becomes one wire query.

/// Parameters that every dispatch sets itself.
pub const RESERVED_PARAMS: &[&str] = &["action", "format"];

/// Separator MediaWiki uses for multi-value parameters.
pub const MULTI_VALUE_SEPARATOR: char = '|';

/// Parameters whose values from different requests can be joined into one
/// call. Everything else is single-valued and must agree between requests
/// that share a call.
pub const MULTI_VALUE_PARAMS: &[&str] = &["titles", "pageids", "revids", "prop", "list", "meta"];

/// One `action=query` request: an ordered multimap of query parameters.
///
/// ```rust
/// use holowiki::QueryRequest;
///
/// let req = QueryRequest::new()
///     .prop(["info", "categories"])
///     .titles(["Gawr Gura", "Mori Calliope"]);
/// assert_eq!(req.values("titles"), Some(&["Gawr Gura".to_string(), "Mori Calliope".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    params: Vec<(String, Vec<String>)>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to `key`. Values containing `|` are split into several.
    ///
    /// `action` and `format` are fixed by the client and ignored here.
    pub fn param(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        let key = key.into();
        if RESERVED_PARAMS.contains(&key.as_str()) {
            tracing::warn!(param = key.as_str(), "ignoring reserved query parameter");
            return self;
        }
        for v in value.as_ref().split(MULTI_VALUE_SEPARATOR) {
            self.push_value(&key, v);
        }
        self
    }

    pub fn params<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = key.into();
        for v in values {
            self = self.param(key.clone(), v);
        }
        self
    }

    pub fn titles<I, S>(self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.params("titles", titles)
    }

    pub fn prop<I, S>(self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.params("prop", props)
    }

    pub fn list<I, S>(self, lists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.params("list", lists)
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parameters in wire form, multi-values joined with `|`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.join("|")))
            .collect()
    }

    fn push_value(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => {
                if !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
            }
            None => self.params.push((key.to_string(), vec![value.to_string()])),
        }
    }

    /// The single-value parameters, sorted by key.
    pub fn batch_key(&self) -> Vec<(&str, &[String])> {
        let mut key: Vec<_> = self
            .iter()
            .filter(|(k, _)| !MULTI_VALUE_PARAMS.contains(k))
            .collect();
        key.sort_by(|a, b| a.0.cmp(b.0));
        key
    }

    /// Whether both requests can ride in the same call: their single-value
    /// parameters (`srsearch`, `generator`, limits...) must be identical.
    pub fn can_merge_with(&self, other: &QueryRequest) -> bool {
        self.batch_key() == other.batch_key()
    }

    /// Fold several requests into one: keys keep first-seen order, values
    /// are de-duplicated in first-seen order.
    ///
    /// Callers only merge requests that agree on [`Self::batch_key`];
    /// otherwise single-value parameters end up `|`-joined.
    pub fn merge<'a>(requests: impl IntoIterator<Item = &'a QueryRequest>) -> QueryRequest {
        let mut merged = QueryRequest::new();
        for req in requests {
            for (k, values) in &req.params {
                for v in values {
                    merged.push_value(k, v);
                }
            }
        }
        merged
    }
}
