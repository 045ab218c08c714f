//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Carry the parts of a request that handlers need after routing
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is buffered before dispatch; handlers see plain bytes

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::Query,
    http::{request::Parts, HeaderValue, Request, Uri},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Stamps requests that arrive without an `x-request-id` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request context handed to handlers after the route parameters.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    uri: Uri,
    body: Bytes,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, parts: Parts, body: Bytes) -> Self {
        Self {
            request_id: request_id.into(),
            uri: parts.uri,
            body,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decoded query parameter `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        let Query(mut query) = Query::<HashMap<String, String>>::try_from_uri(&self.uri).ok()?;
        query.remove(key)
    }

    /// True when query parameter `key` is present and not empty, `0` or `false`.
    pub fn query_flag(&self, key: &str) -> bool {
        matches!(
            self.query(key).as_deref(),
            Some(value) if !value.is_empty() && value != "0" && value != "false"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(uri: &str) -> RequestContext {
        let (parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        RequestContext::new("req-1", parts, Bytes::new())
    }

    #[test]
    fn test_query_flag() {
        assert!(context("/v?redirect=1").query_flag("redirect"));
        assert!(context("/v?redirect=yes").query_flag("redirect"));
        assert!(!context("/v?redirect=0").query_flag("redirect"));
        assert!(!context("/v?redirect=").query_flag("redirect"));
        assert!(!context("/v").query_flag("redirect"));
    }

    #[test]
    fn test_query_decoding() {
        let ctx = context("/search?q=front%20door");
        assert_eq!(ctx.query("q").as_deref(), Some("front door"));
        assert_eq!(ctx.request_id(), "req-1");
    }

    #[test]
    fn test_make_request_uuid() {
        let request = Request::builder().body(()).unwrap();
        let id = MakeRequestUuid.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }
}
