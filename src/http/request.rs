//! Abstract request handed to the SCGI client.
//!
//! # Responsibilities
//! - Hold method, protocol string, header multimap and a fully buffered body
//! - Preserve header key case and insertion order
//! - Convert from `http::Request<Bytes>` for callers already using `http`

use bytes::Bytes;

/// Ordered header multimap.
///
/// Keys are compared exactly as given (case-sensitive). Each key keeps its
/// values in insertion order, and keys keep the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `key`, after any values already present.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replace all values for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove(&key);
        self.entries.push((key, vec![value.into()]));
    }

    /// Remove `key` and return its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// All values for `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over keys and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

/// A request to send over SCGI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Protocol version string, e.g. `HTTP/1.1`.
    pub protocol: String,
    /// Headers forwarded as SCGI header pairs.
    pub headers: Headers,
    /// Fully buffered request body.
    pub body: Bytes,
}

impl Request {
    /// Create a bodiless `HTTP/1.1` request with the given method.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            protocol: "HTTP/1.1".to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Set the protocol version string.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Append a header value.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// True when the reply to this request never carries a body.
    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let mut headers = Headers::new();
        for (name, value) in parts.headers.iter() {
            headers.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        Self {
            method: parts.method.as_str().to_string(),
            protocol: format!("{:?}", parts.version),
            headers,
            body,
        }
    }
}
