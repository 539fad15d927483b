//! rbac-test: Test request context and conformance fixtures
//!
//! Provides a plain-data [`RequestContext`] for tests, docs and the CLI.
//! With the `fixtures` feature, also a YAML conformance runner.
//!
//! # Example
//!
//! ```
//! use rbac_test::prelude::*;
//!
//! let req = TestRequest::new("/store.Reader/Get")
//!     .with_principal("svc-admin")
//!     .with_header("X-Trace", "a")
//!     .with_header("x-trace", "b")
//!     .with_source("10.0.0.7");
//!
//! assert_eq!(req.header("x-trace"), Some("a,b"));
//! assert_eq!(req.principal_name(), Some("svc-admin"));
//! ```

use rbac::RequestContext;
use std::collections::HashMap;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// A request snapshot built from literal values.
///
/// Header names are lower-cased on insert; inserting the same header twice
/// joins the values with `,`.
#[derive(Debug, Clone, Default)]
pub struct TestRequest {
    method: String,
    principal: Option<String>,
    headers: HashMap<String, String>,
    source: String,
    destination: String,
}

impl TestRequest {
    /// Create a request for the given full method name.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Set the authenticated principal (builder pattern).
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Add a header value (builder pattern).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
        self
    }

    /// Set the peer address (builder pattern).
    #[must_use]
    pub fn with_source(mut self, address: impl Into<String>) -> Self {
        self.source = address.into();
        self
    }

    /// Set the local address (builder pattern).
    #[must_use]
    pub fn with_destination(mut self, address: impl Into<String>) -> Self {
        self.destination = address.into();
        self
    }
}

impl RequestContext for TestRequest {
    fn full_method_name(&self) -> &str {
        &self.method
    }

    fn principal_name(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn source_address(&self) -> &str {
        &self.source
    }

    fn destination_address(&self) -> &str {
        &self.destination
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::TestRequest;
    pub use rbac::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = TestRequest::new("/a.B/C");
        assert_eq!(req.full_method_name(), "/a.B/C");
        assert_eq!(req.principal_name(), None);
        assert_eq!(req.header("anything"), None);
        assert_eq!(req.source_address(), "");
    }

    #[test]
    fn test_header_names_lowercased() {
        let req = TestRequest::new("/").with_header("Content-Type", "application/grpc");
        assert_eq!(req.header("content-type"), Some("application/grpc"));
        assert_eq!(req.header("Content-Type"), None);
    }

    #[test]
    fn test_repeated_headers_joined() {
        let req = TestRequest::new("/")
            .with_header("x-role", "reader")
            .with_header("X-Role", "writer")
            .with_header("x-role", "");
        assert_eq!(req.header("x-role"), Some("reader,writer,"));
    }
}
