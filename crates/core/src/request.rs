//! Requests the controller sees and the responses it stores.

use bytes::Bytes;
use url::Url;

use crate::Error;
use crate::cache::hash::compute_body_digest;
use crate::cache::key::request_key;

/// An outgoing request dispatched to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
}

impl Request {
    /// Create a request; the method is normalized to upper case.
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.trim().to_ascii_uppercase(), url }
    }

    /// Shorthand for a GET request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Only GET requests are reads the cache may answer.
    pub fn is_read(&self) -> bool {
        self.method == "GET"
    }

    /// Key this request is stored under.
    pub fn cache_key(&self) -> String {
        request_key(&self.url)
    }
}

/// A captured response: status, headers and a body snapshot.
///
/// `Bytes` makes clones cheap, so the same capture can be handed to the
/// caller and written to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// URL the response was served from (after redirects).
    pub url: String,
    pub status: u16,
    /// Header pairs in arrival order; names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// RFC 3339 time the entry was written; `None` until stored.
    pub stored_at: Option<String>,
}

impl CachedResponse {
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        let headers = headers.into_iter().map(|(name, value)| (name.to_ascii_lowercase(), value)).collect();
        Self { url: url.into(), status, headers, body: body.into(), stored_at: None }
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Hex SHA-256 of the body.
    pub fn body_sha256(&self) -> String {
        compute_body_digest(&self.body)
    }

    /// Headers encoded for storage.
    pub fn headers_json(&self) -> Result<String, Error> {
        serde_json::to_string(&self.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))
    }

    /// Decode headers written by [`CachedResponse::headers_json`].
    pub fn headers_from_json(json: &str) -> Result<Vec<(String, String)>, Error> {
        serde_json::from_str(json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_method_normalized() {
        let req = Request::new("get", Url::parse("http://localhost/").unwrap());
        assert_eq!(req.method(), "GET");
        assert!(req.is_read());
    }

    #[test]
    fn test_request_non_get_is_not_read() {
        for method in ["POST", "PUT", "DELETE", "HEAD", "PATCH"] {
            let req = Request::new(method, Url::parse("http://localhost/").unwrap());
            assert!(!req.is_read(), "{method} should not be a read");
        }
    }

    #[test]
    fn test_request_cache_key() {
        let req = Request::get(Url::parse("http://localhost/a?x=1#frag").unwrap());
        assert_eq!(req.cache_key(), "http://localhost/a?x=1");
    }

    #[test]
    fn test_response_header_lookup() {
        let resp = CachedResponse::new(
            "http://localhost/",
            200,
            vec![("Content-Type".into(), "text/html".into())],
            "<html></html>",
        );
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.headers[0].0, "content-type");
    }

    #[test]
    fn test_response_is_ok() {
        assert!(CachedResponse::new("u", 204, vec![], "").is_ok());
        assert!(!CachedResponse::new("u", 304, vec![], "").is_ok());
        assert!(!CachedResponse::new("u", 404, vec![], "").is_ok());
    }

    #[test]
    fn test_headers_json_round_trip() {
        let resp = CachedResponse::new("u", 200, vec![("etag".into(), "\"abc\"".into())], "");
        let json = resp.headers_json().unwrap();
        assert_eq!(CachedResponse::headers_from_json(&json).unwrap(), resp.headers);
    }

    #[test]
    fn test_headers_from_bad_json() {
        assert!(matches!(CachedResponse::headers_from_json("{"), Err(Error::CorruptEntry(_))));
    }
}
