//! SCGI header block encoding.
//!
//! The block is a sequence of `key NUL value NUL` pairs. The first four pairs
//! are fixed: `CONTENT_LENGTH`, `SCGI`, `REQUEST_METHOD`, `SERVER_PROTOCOL`.
//! [`HeaderBlock`] stores them as dedicated fields so nothing can be placed
//! ahead of them.

use crate::http::request::Request;

pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
pub const SCGI: &str = "SCGI";
pub const SCGI_VERSION: &str = "1";
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";

/// Keys the encoder emits itself.
const RESERVED: [&str; 4] = [CONTENT_LENGTH, SCGI, REQUEST_METHOD, SERVER_PROTOCOL];

/// An SCGI header block ready for netstring framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    content_length: usize,
    method: String,
    protocol: String,
    extra: Vec<(String, String)>,
}

impl HeaderBlock {
    /// Build the header block for `request`.
    ///
    /// Multi-valued headers are joined with `,`. Keys and values are not
    /// validated; an embedded NUL corrupts the frame.
    pub fn from_request(request: &Request) -> Self {
        let extra = request
            .headers
            .iter()
            .filter(|(key, _)| !RESERVED.iter().any(|reserved| reserved == key))
            .map(|(key, values)| (key.to_string(), values.join(",")))
            .collect();

        Self {
            content_length: request.body.len(),
            method: request.method.clone(),
            protocol: request.protocol.clone(),
            extra,
        }
    }

    /// Declared body length.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Iterate over all pairs in wire order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        let fixed = [
            (CONTENT_LENGTH, self.content_length.to_string()),
            (SCGI, SCGI_VERSION.to_string()),
            (REQUEST_METHOD, self.method.clone()),
            (SERVER_PROTOCOL, self.protocol.clone()),
        ];
        fixed
            .into_iter()
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }

    /// Serialize the block (without netstring framing).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        for (key, value) in self.pairs() {
            buf.extend_from_slice(key.as_bytes());
            buf.push(0);
            buf.extend_from_slice(value.as_bytes());
            buf.push(0);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_exact_block() {
        let request = Request::new("GET")
            .with_protocol("HTTP/1.1")
            .with_header("X-Test", "a")
            .with_header("X-Test", "b");

        let block = HeaderBlock::from_request(&request);
        assert_eq!(
            block.to_bytes(),
            b"CONTENT_LENGTH\x000\x00SCGI\x001\x00REQUEST_METHOD\x00GET\x00SERVER_PROTOCOL\x00HTTP/1.1\x00X-Test\x00a,b\x00"
        );
    }

    #[test]
    fn test_content_length_from_body() {
        let request = Request::new("POST").with_body("hello world");
        let block = HeaderBlock::from_request(&request);
        assert_eq!(block.content_length(), 11);

        let first: Vec<(&str, String)> = block.pairs().take(2).collect();
        assert_eq!(first[0], (CONTENT_LENGTH, "11".to_string()));
        assert_eq!(first[1], (SCGI, "1".to_string()));
    }

    #[test]
    fn test_reserved_keys_not_duplicated() {
        let request = Request::new("GET")
            .with_header("CONTENT_LENGTH", "999")
            .with_header("SCGI", "2")
            .with_header("REQUEST_URI", "/index");

        let block = HeaderBlock::from_request(&request);
        let keys: Vec<&str> = block.pairs().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![CONTENT_LENGTH, SCGI, REQUEST_METHOD, SERVER_PROTOCOL, "REQUEST_URI"]
        );
        assert_eq!(block.pairs().next().unwrap().1, "0");
    }

    #[test]
    fn test_extra_headers_keep_insertion_order() {
        let request = Request::new("GET")
            .with_header("B", "2")
            .with_header("A", "1");

        let bytes = HeaderBlock::from_request(&request).to_bytes();
        let tail = b"B\x002\x00A\x001\x00";
        assert!(bytes.ends_with(tail));
    }
}
