//! `FieldMatcher` — Binds a value matcher to one request attribute
//!
//! This is where request-specific ([`Field`]) meets request-agnostic
//! ([`ValueMatcher`]). The field extracts a string from the request; the
//! value matcher decides.
//!
//! # INV: absent → false
//!
//! If the field has no value (e.g. an unauthenticated peer has no principal),
//! the matcher evaluates to `false` without consulting the value matcher.

use crate::{IpMatcher, RequestContext, StringMatcher, ValueMatcher};
use std::fmt;

/// A request attribute a [`FieldMatcher`] can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Full RPC method name (`/package.Service/Method`).
    MethodName,
    /// Authenticated principal name.
    PrincipalName,
    /// Peer address.
    SourceAddress,
    /// Local address.
    DestinationAddress,
}

impl Field {
    /// Extract this field's value from the request.
    #[must_use]
    pub fn value<'a, C: RequestContext + ?Sized>(&self, ctx: &'a C) -> Option<&'a str> {
        match self {
            Self::MethodName => Some(ctx.full_method_name()),
            Self::PrincipalName => ctx.principal_name(),
            Self::SourceAddress => Some(ctx.source_address()),
            Self::DestinationAddress => Some(ctx.destination_address()),
        }
    }

    /// Short name used in traces and diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MethodName => "method_name",
            Self::PrincipalName => "principal_name",
            Self::SourceAddress => "source_address",
            Self::DestinationAddress => "destination_address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value matcher applied to one request field.
///
/// # Example
///
/// ```
/// use rbac::{FieldMatcher, IpMatcher, StringMatcher};
///
/// let path = FieldMatcher::path(StringMatcher::prefix("/admin.", false));
/// let peer = FieldMatcher::source_ip(IpMatcher::new("10.0.0.0", 8).unwrap());
/// # let _ = (path, peer);
/// ```
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    field: Field,
    matcher: ValueMatcher,
}

impl FieldMatcher {
    /// Bind `matcher` to `field`.
    #[must_use]
    pub fn new(field: Field, matcher: impl Into<ValueMatcher>) -> Self {
        Self {
            field,
            matcher: matcher.into(),
        }
    }

    /// Match the full method name.
    #[must_use]
    pub fn path(matcher: StringMatcher) -> Self {
        Self::new(Field::MethodName, matcher)
    }

    /// Match the authenticated principal name.
    #[must_use]
    pub fn authenticated(matcher: StringMatcher) -> Self {
        Self::new(Field::PrincipalName, matcher)
    }

    /// Match the peer address against a CIDR range.
    #[must_use]
    pub fn source_ip(matcher: IpMatcher) -> Self {
        Self::new(Field::SourceAddress, matcher)
    }

    /// Match the local address against a CIDR range.
    #[must_use]
    pub fn destination_ip(matcher: IpMatcher) -> Self {
        Self::new(Field::DestinationAddress, matcher)
    }

    /// The selected field.
    #[must_use]
    pub fn field(&self) -> Field {
        self.field
    }

    /// The value matcher.
    #[must_use]
    pub fn matcher(&self) -> &ValueMatcher {
        &self.matcher
    }

    /// Evaluate against the request.
    #[must_use]
    pub fn matches<C: RequestContext + ?Sized>(&self, ctx: &C) -> bool {
        self.field
            .value(ctx)
            .is_some_and(|value| self.matcher.matches(value))
    }
}
