//! rbac - Envoy-style role-based access control for RPC servers
//!
//! An authorization engine that evaluates a request against a set of named
//! policies and returns ALLOW or DENY, plus the first policy responsible for
//! the decision.
//!
//! # Architecture
//!
//! Two layers, leaves first:
//!
//! - [`StringMatcher`], [`IpMatcher`] — Value matchers over a single string
//! - [`HeaderMatcher`] — Header value, numeric range, or presence
//! - [`FieldMatcher`] — Binds a value matcher to one request attribute
//! - [`Matcher`] — Closed enum: Any, And, Or, Not, Header, Field
//! - [`Policy`] — Permission matcher AND principal matcher
//! - [`AuthorizationEngine`] — Ordered policies + global [`Action`], first-match-wins
//!
//! # Key Invariants
//!
//! 1. **Malformed request data never errors**: an absent header, an unparsable
//!    address or a non-numeric header against a range all resolve to
//!    "this matcher does not match".
//!
//! 2. **Construction rejects bad config**: ambiguous or empty discriminants,
//!    invalid regexes, malformed CIDR ranges and duplicate policy names fail
//!    with [`RbacError`] at build time, never at evaluation time.
//!
//! 3. **Immutable after construction**: engines and matchers are `Send + Sync`
//!    and can be evaluated concurrently without locking.
//!
//! # Example
//!
//! ```
//! use rbac::prelude::*;
//!
//! struct Request { principal: Option<String> }
//!
//! impl RequestContext for Request {
//!     fn full_method_name(&self) -> &str { "/pkg.Service/Method" }
//!     fn principal_name(&self) -> Option<&str> { self.principal.as_deref() }
//!     fn header(&self, _name: &str) -> Option<&str> { None }
//!     fn source_address(&self) -> &str { "10.0.0.1" }
//!     fn destination_address(&self) -> &str { "10.0.0.2" }
//! }
//!
//! let admin = Policy::new(
//!     "admin",
//!     Matcher::Any,
//!     Matcher::Field(FieldMatcher::authenticated(StringMatcher::exact("svc-admin", false))),
//! );
//! let engine = AuthorizationEngine::new(Action::Allow, vec![admin]).unwrap();
//!
//! let decision = engine.evaluate(&Request { principal: Some("svc-admin".into()) });
//! assert_eq!(decision.decision(), DecisionType::Allow);
//! assert_eq!(decision.matched_policy_name(), Some("admin"));
//!
//! let decision = engine.evaluate(&Request { principal: None });
//! assert_eq!(decision.decision(), DecisionType::Deny);
//! assert_eq!(decision.matched_policy_name(), None);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod cidr;
mod config;
mod engine;
mod field_matcher;
mod fraction;
mod header_match;
mod input_matcher;
mod matcher;
mod policy;
mod request;
mod string_match;
mod trace;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use engine::{Action, AuthorizationEngine, Decision, DecisionType};
pub use field_matcher::{Field, FieldMatcher};
pub use matcher::Matcher;
pub use policy::Policy;
pub use request::RequestContext;

// Value matchers
pub use cidr::IpMatcher;
pub use fraction::FractionMatcher;
pub use header_match::{HeaderMatchKind, HeaderMatcher, Int64Range};
pub use input_matcher::{StringMatcher, ValueMatcher};

// Config types
pub use cidr::CidrSpec;
pub use config::{PermissionConfig, PolicyConfig, PrincipalConfig, RbacConfig};
pub use header_match::{HeaderMatchSpec, RangeSpec};
pub use string_match::StringMatchSpec;

// Trace types
pub use trace::{EvalTrace, MatcherTrace, PolicyStep};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use rbac::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Engine
        Action,
        AuthorizationEngine,
        Decision,
        DecisionType,
        // Trace types
        EvalTrace,
        // Core types
        Field,
        FieldMatcher,
        // Value matchers
        HeaderMatcher,
        Int64Range,
        IpMatcher,
        Matcher,
        MatcherTrace,
        Policy,
        // Errors
        RbacError,
        // Traits
        RequestContext,
        StringMatcher,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum allowed depth for nested matchers.
///
/// This limit protects against stack overflow from deeply nested matcher
/// trees. Enforced when an [`AuthorizationEngine`] is constructed.
pub const MAX_DEPTH: usize = 32;

/// Maximum number of children in a single `And` or `Or` matcher.
///
/// A flat list of millions of children bypasses [`MAX_DEPTH`] but still causes
/// excessive per-request work.
pub const MAX_PREDICATES_PER_COMPOUND: usize = 256;

/// Maximum length for non-regex string match patterns (exact, prefix, suffix, contains).
pub const MAX_PATTERN_LENGTH: usize = 8192;

/// Maximum length for regex patterns.
///
/// Shorter limit than [`MAX_PATTERN_LENGTH`] because regex compilation cost
/// scales faster than literal matching.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from matcher, policy, and engine construction.
///
/// These errors are caught at config load time, not evaluation time.
/// Fix the configuration and reconstruct the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RbacError {
    /// Matcher nesting exceeds [`MAX_DEPTH`].
    #[error(
        "matcher nesting depth is {depth}, but maximum allowed is {max} \
         (reduce nesting or flatten your matcher tree)"
    )]
    DepthExceeded {
        /// Actual depth of the matcher tree.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// Too many children in a compound `And` or `Or`.
    #[error("compound matcher has {count} children, but maximum allowed is {max}")]
    TooManyPredicates {
        /// Actual count of children.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A matcher spec sets no pattern discriminant.
    #[error("{kind} sets no match pattern; exactly one of {expected:?} is required")]
    EmptyMatcher {
        /// Which spec was being compiled (`"string matcher"`, `"header matcher"`).
        kind: &'static str,
        /// The discriminants that could have been set.
        expected: &'static [&'static str],
    },

    /// A matcher spec sets more than one pattern discriminant.
    #[error("{kind} is ambiguous: {set:?} are all set, but exactly one is allowed")]
    AmbiguousMatcher {
        /// Which spec was being compiled.
        kind: &'static str,
        /// The discriminants that were set.
        set: Vec<&'static str>,
    },

    /// A regex failed to compile.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },

    /// A string match pattern exceeds the maximum allowed length.
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A CIDR address prefix is not an IP literal.
    #[error("invalid CIDR address prefix \"{address}\": {reason}")]
    InvalidAddress {
        /// The address prefix as configured.
        address: String,
        /// The underlying parse error.
        reason: String,
    },

    /// A CIDR prefix length is wider than the address family.
    #[error("CIDR prefix length {prefix_len} exceeds {max} bits for \"{address}\"")]
    InvalidPrefixLength {
        /// The address prefix as configured.
        address: String,
        /// The configured prefix length.
        prefix_len: u32,
        /// Bit width of the address family (32 or 128).
        max: u32,
    },

    /// An integer range whose start is after its end.
    #[error("invalid range [{start}, {end}]: start is greater than end")]
    InvalidRange {
        /// Range start (inclusive).
        start: i64,
        /// Range end (inclusive).
        end: i64,
    },

    /// A fraction with a zero denominator.
    #[error("invalid fraction {numerator}/{denominator}: denominator must be non-zero")]
    InvalidFraction {
        /// The numerator.
        numerator: u32,
        /// The denominator.
        denominator: u32,
    },

    /// Two policies share a name.
    #[error("duplicate policy name \"{name}\"")]
    DuplicatePolicy {
        /// The repeated name.
        name: String,
    },

    /// Configuration is structurally valid but semantically unsupported.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}
