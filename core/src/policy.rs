//! Policy — A named permission/principal pair

use crate::{Matcher, RbacError, RequestContext};
use std::sync::Arc;

/// A named policy: matches iff both its permission and principal matchers match.
///
/// # Example
///
/// ```
/// use rbac::{FieldMatcher, IpMatcher, Matcher, Policy, StringMatcher};
///
/// // Any of these methods, from any of these callers
/// let policy = Policy::from_rules(
///     "readers",
///     vec![
///         FieldMatcher::path(StringMatcher::prefix("/store.Reader/", false)).into(),
///         FieldMatcher::path(StringMatcher::exact("/store.Admin/Status", false)).into(),
///     ],
///     vec![
///         FieldMatcher::source_ip(IpMatcher::new("10.0.0.0", 8).unwrap()).into(),
///     ],
/// );
/// assert_eq!(policy.name(), "readers");
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
    name: Arc<str>,
    permissions: Matcher,
    principals: Matcher,
}

impl Policy {
    /// Create a policy from a permission matcher and a principal matcher.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, permissions: Matcher, principals: Matcher) -> Self {
        Self {
            name: name.into(),
            permissions,
            principals,
        }
    }

    /// Create a policy from rule lists: any permission AND any principal.
    ///
    /// An empty list matches nothing.
    #[must_use]
    pub fn from_rules(
        name: impl Into<Arc<str>>,
        permissions: Vec<Matcher>,
        principals: Vec<Matcher>,
    ) -> Self {
        Self::new(
            name,
            Matcher::from_any(permissions),
            Matcher::from_any(principals),
        )
    }

    /// The policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// The permission matcher (what is being accessed).
    #[must_use]
    pub fn permissions(&self) -> &Matcher {
        &self.permissions
    }

    /// The principal matcher (who is accessing).
    #[must_use]
    pub fn principals(&self) -> &Matcher {
        &self.principals
    }

    /// Whether the request satisfies both matchers.
    #[must_use]
    pub fn matches<C: RequestContext + ?Sized>(&self, ctx: &C) -> bool {
        self.permissions.matches(ctx) && self.principals.matches(ctx)
    }

    /// Validate both matcher trees.
    ///
    /// # Errors
    ///
    /// See [`Matcher::validate`].
    pub fn validate(&self) -> Result<(), RbacError> {
        self.permissions.validate()?;
        self.principals.validate()
    }
}
