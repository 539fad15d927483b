//! Matcher — Boolean expressions over a request
//!
//! A closed enum of predicate variants evaluated by a single dispatch.
//! Composite variants (`And`, `Or`, `Not`) delegate to their children;
//! leaves (`Header`, `Field`) read the request.

use crate::{
    FieldMatcher, HeaderMatcher, MatcherTrace, RbacError, RequestContext, MAX_DEPTH,
    MAX_PREDICATES_PER_COMPOUND,
};
use std::fmt;

/// A request predicate.
///
/// # Variants
///
/// - `Any` — Always matches
/// - `Or` — Any child must match (short-circuit on first `true`); empty is `false`
/// - `And` — All children must match (short-circuit on first `false`); empty is `true`
/// - `Not` — Inverts the result of the inner matcher
/// - `Header` — A named header's value or presence
/// - `Field` — A value matcher bound to one request attribute
///
/// # Example
///
/// ```
/// use rbac::{FieldMatcher, HeaderMatcher, Matcher, StringMatcher};
///
/// // Read-only methods, unless the caller asked for a dry run
/// let m = Matcher::And(vec![
///     Matcher::Field(FieldMatcher::path(StringMatcher::prefix("/store.Reader/", false))),
///     Matcher::Not(Box::new(Matcher::Header(HeaderMatcher::for_present("x-dry-run", true, false)))),
/// ]);
/// assert_eq!(m.depth(), 3);
/// ```
#[derive(Clone)]
pub enum Matcher {
    /// Always true.
    Any,
    /// True iff any child is true.
    Or(Vec<Matcher>),
    /// True iff all children are true.
    And(Vec<Matcher>),
    /// Negation of the inner matcher.
    Not(Box<Matcher>),
    /// Header value or presence.
    Header(HeaderMatcher),
    /// Request attribute.
    Field(FieldMatcher),
}

impl Matcher {
    /// Evaluate this matcher against the given request.
    ///
    /// Recursive; the depth limit is enforced at engine construction
    /// ([`validate`](Self::validate)), not here.
    #[must_use]
    pub fn matches<C: RequestContext + ?Sized>(&self, ctx: &C) -> bool {
        match self {
            Self::Any => true,
            Self::Or(children) => children.iter().any(|m| m.matches(ctx)),
            Self::And(children) => children.iter().all(|m| m.matches(ctx)),
            Self::Not(inner) => !inner.matches(ctx),
            Self::Header(h) => h.matches(ctx),
            Self::Field(f) => f.matches(ctx),
        }
    }

    /// Evaluate with full trace for debugging.
    ///
    /// Unlike [`matches()`](Self::matches), this does NOT short-circuit
    /// And/Or. The `matched` result is still identical.
    #[must_use]
    pub fn evaluate_with_trace<C: RequestContext + ?Sized>(&self, ctx: &C) -> MatcherTrace {
        match self {
            Self::Any => MatcherTrace::Any,
            Self::Or(children) => {
                let children: Vec<MatcherTrace> =
                    children.iter().map(|m| m.evaluate_with_trace(ctx)).collect();
                let matched = children.iter().any(MatcherTrace::matched);
                MatcherTrace::Or { matched, children }
            }
            Self::And(children) => {
                let children: Vec<MatcherTrace> =
                    children.iter().map(|m| m.evaluate_with_trace(ctx)).collect();
                let matched = children.iter().all(MatcherTrace::matched);
                MatcherTrace::And { matched, children }
            }
            Self::Not(inner) => {
                let inner = inner.evaluate_with_trace(ctx);
                MatcherTrace::Not {
                    matched: !inner.matched(),
                    inner: Box::new(inner),
                }
            }
            Self::Header(h) => {
                let value = ctx.header(h.name());
                MatcherTrace::Header {
                    matched: h.matches_value(value),
                    name: h.name().to_owned(),
                    value: value.map(str::to_owned),
                }
            }
            Self::Field(f) => {
                let value = f.field().value(ctx);
                MatcherTrace::Field {
                    matched: value.is_some_and(|v| f.matcher().matches(v)),
                    field: f.field(),
                    value: value.map(str::to_owned),
                    matcher: format!("{:?}", f.matcher()),
                }
            }
        }
    }

    /// Compose matchers with AND semantics.
    ///
    /// - Empty → `Any` (no conditions = match everything)
    /// - Single → unwrapped
    /// - Multiple → `And(matchers)`
    #[must_use]
    pub fn from_all(matchers: Vec<Self>) -> Self {
        Self::collapse(matchers, Self::Any, Self::And)
    }

    /// Compose matchers with OR semantics.
    ///
    /// - Empty → `Or([])` (no alternatives = match nothing)
    /// - Single → unwrapped
    /// - Multiple → `Or(matchers)`
    #[must_use]
    pub fn from_any(matchers: Vec<Self>) -> Self {
        Self::collapse(matchers, Self::Or(Vec::new()), Self::Or)
    }

    fn collapse(mut matchers: Vec<Self>, empty: Self, wrap: fn(Vec<Self>) -> Self) -> Self {
        match matchers.len() {
            0 => empty,
            1 => matchers.pop().unwrap_or(empty),
            _ => wrap(matchers),
        }
    }

    /// Calculate the depth of this matcher tree. Leaves have depth 1.
    ///
    /// Walks with an explicit stack, so arbitrarily deep trees built in code
    /// can be measured (and rejected) without overflowing the call stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1)];
        while let Some((matcher, depth)) = stack.pop() {
            max = max.max(depth);
            match matcher {
                Self::Or(children) | Self::And(children) => {
                    stack.extend(children.iter().map(|child| (child, depth + 1)));
                }
                Self::Not(inner) => stack.push((&**inner, depth + 1)),
                Self::Any | Self::Header(_) | Self::Field(_) => {}
            }
        }
        max
    }

    /// Validate this matcher against safety constraints.
    ///
    /// Checks:
    /// - Nesting depth does not exceed [`MAX_DEPTH`]
    /// - No `And`/`Or` has more than [`MAX_PREDICATES_PER_COMPOUND`] children
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::DepthExceeded`] or [`RbacError::TooManyPredicates`].
    pub fn validate(&self) -> Result<(), RbacError> {
        let depth = self.depth();
        if depth > MAX_DEPTH {
            return Err(RbacError::DepthExceeded {
                depth,
                max: MAX_DEPTH,
            });
        }
        self.validate_width()
    }

    fn validate_width(&self) -> Result<(), RbacError> {
        match self {
            Self::Or(children) | Self::And(children) => {
                if children.len() > MAX_PREDICATES_PER_COMPOUND {
                    return Err(RbacError::TooManyPredicates {
                        count: children.len(),
                        max: MAX_PREDICATES_PER_COMPOUND,
                    });
                }
                children.iter().try_for_each(Self::validate_width)
            }
            Self::Not(inner) => inner.validate_width(),
            Self::Any | Self::Header(_) | Self::Field(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Or(children) => f.debug_tuple("Or").field(children).finish(),
            Self::And(children) => f.debug_tuple("And").field(children).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Self::Header(h) => f.debug_tuple("Header").field(h).finish(),
            Self::Field(m) => f.debug_tuple("Field").field(m).finish(),
        }
    }
}

impl From<HeaderMatcher> for Matcher {
    fn from(m: HeaderMatcher) -> Self {
        Self::Header(m)
    }
}

impl From<FieldMatcher> for Matcher {
    fn from(m: FieldMatcher) -> Self {
        Self::Field(m)
    }
}
