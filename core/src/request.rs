//! `RequestContext` — Read-only view of the request being authorized
//!
//! The engine never owns request data. The RPC layer implements this trait
//! over whatever it already holds (call metadata, peer addresses, the
//! authenticated identity) and hands a reference to
//! [`AuthorizationEngine::evaluate`](crate::AuthorizationEngine::evaluate).

/// Request attributes consumed by matchers.
///
/// Every accessor is synchronous and infallible; the only failure mode is
/// "value absent", expressed as `None`. Matchers treat absent or malformed
/// values as a non-match, so implementations should pass data through as-is
/// rather than validating it.
///
/// # Example
///
/// ```
/// use rbac::RequestContext;
/// use std::collections::HashMap;
///
/// struct Call {
///     method: String,
///     metadata: HashMap<String, String>,
///     peer: String,
/// }
///
/// impl RequestContext for Call {
///     fn full_method_name(&self) -> &str { &self.method }
///     fn principal_name(&self) -> Option<&str> { None }
///     fn header(&self, name: &str) -> Option<&str> {
///         self.metadata.get(name).map(String::as_str)
///     }
///     fn source_address(&self) -> &str { &self.peer }
///     fn destination_address(&self) -> &str { "0.0.0.0" }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `RequestContext`",
    label = "this type cannot be authorized",
    note = "implement the five read accessors (method name, principal, header, source and destination address)"
)]
pub trait RequestContext {
    /// Full RPC method name, e.g. `/package.Service/Method`.
    fn full_method_name(&self) -> &str;

    /// Authenticated principal name, if the peer was authenticated.
    fn principal_name(&self) -> Option<&str>;

    /// Header value by name.
    ///
    /// Matchers pass lower-cased names. Multiple values for one header are
    /// expected to be joined with `,`.
    fn header(&self, name: &str) -> Option<&str>;

    /// Textual source (peer) address.
    fn source_address(&self) -> &str;

    /// Textual destination (local) address.
    fn destination_address(&self) -> &str;
}

impl<T: RequestContext + ?Sized> RequestContext for &T {
    fn full_method_name(&self) -> &str {
        (**self).full_method_name()
    }

    fn principal_name(&self) -> Option<&str> {
        (**self).principal_name()
    }

    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }

    fn source_address(&self) -> &str {
        (**self).source_address()
    }

    fn destination_address(&self) -> &str {
        (**self).destination_address()
    }
}
