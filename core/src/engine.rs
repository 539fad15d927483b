//! `AuthorizationEngine` — Ordered policies with first-match-wins semantics
//!
//! The engine is the entry point for evaluation. It holds a global
//! [`Action`] and an ordered list of [`Policy`] values, evaluates them in
//! order, and turns "did any policy match" into ALLOW or DENY.
//!
//! # INV: first-match-wins
//!
//! Policies are evaluated in construction order. The first matching policy
//! terminates evaluation, even if later policies would also match.
//!
//! # INV: polarity
//!
//! `decision == Allow` iff `(action == Deny) == (no policy matched)`.
//! An ALLOW engine allows only what a policy matches; a DENY engine denies
//! only what a policy matches.

use crate::{EvalTrace, Policy, PolicyStep, RbacError, RequestContext};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// What a matched policy means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Action {
    /// Matched requests are allowed; everything else is denied.
    #[cfg_attr(feature = "serde", serde(alias = "allow"))]
    Allow,
    /// Matched requests are denied; everything else is allowed.
    #[cfg_attr(feature = "serde", serde(alias = "deny"))]
    Deny,
}

/// The outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum DecisionType {
    /// The request may proceed.
    #[cfg_attr(feature = "serde", serde(alias = "allow"))]
    Allow,
    /// The request must be rejected.
    #[cfg_attr(feature = "serde", serde(alias = "deny"))]
    Deny,
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
        })
    }
}

/// An authorization decision and the policy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decision {
    decision: DecisionType,
    matched_policy_name: Option<Arc<str>>,
}

impl Decision {
    /// Create a decision.
    #[must_use]
    pub fn new(decision: DecisionType, matched_policy_name: Option<Arc<str>>) -> Self {
        Self {
            decision,
            matched_policy_name,
        }
    }

    /// ALLOW or DENY.
    #[must_use]
    pub fn decision(&self) -> DecisionType {
        self.decision
    }

    /// Whether the request is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.decision == DecisionType::Allow
    }

    /// The first matching policy, or `None` if no policy matched.
    #[must_use]
    pub fn matched_policy_name(&self) -> Option<&str> {
        self.matched_policy_name.as_deref()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matched_policy_name {
            Some(name) => write!(f, "{} ({name})", self.decision),
            None => write!(f, "{}", self.decision),
        }
    }
}

/// Evaluates requests against an ordered policy list.
///
/// Immutable after construction and `Send + Sync`. To change policies,
/// build a new engine and swap it in (e.g. behind an `Arc`).
///
/// # Example
///
/// ```
/// use rbac::{Action, AuthorizationEngine, DecisionType, FieldMatcher, IpMatcher, Matcher, Policy};
///
/// let blocklist = Policy::new(
///     "blocklist",
///     Matcher::Any,
///     FieldMatcher::source_ip(IpMatcher::new("192.168.1.5", 32).unwrap()).into(),
/// );
/// let engine = AuthorizationEngine::new(Action::Deny, [blocklist]).unwrap();
/// assert_eq!(engine.action(), Action::Deny);
/// assert_eq!(engine.policies().len(), 1);
/// ```
#[derive(Clone)]
pub struct AuthorizationEngine {
    action: Action,
    policies: Vec<Policy>,
}

impl AuthorizationEngine {
    /// Build an engine. Policies are evaluated in iteration order.
    ///
    /// # Errors
    ///
    /// - [`RbacError::DuplicatePolicy`] if two policies share a name
    /// - [`RbacError::DepthExceeded`] / [`RbacError::TooManyPredicates`] if a
    ///   matcher tree is too deep or too wide
    pub fn new(action: Action, policies: impl IntoIterator<Item = Policy>) -> Result<Self, RbacError> {
        let policies: Vec<Policy> = policies.into_iter().collect();

        let mut seen = HashSet::with_capacity(policies.len());
        for policy in &policies {
            if !seen.insert(policy.name()) {
                return Err(RbacError::DuplicatePolicy {
                    name: policy.name().to_owned(),
                });
            }
            policy.validate()?;
        }

        tracing::debug!(?action, policies = policies.len(), "built authorization engine");
        Ok(Self { action, policies })
    }

    /// The global action.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// The policies, in evaluation order.
    #[must_use]
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Decide whether the request is allowed.
    #[must_use]
    pub fn evaluate<C: RequestContext + ?Sized>(&self, ctx: &C) -> Decision {
        let matched = self.policies.iter().find(|p| p.matches(ctx));
        if let Some(policy) = matched {
            tracing::trace!(
                policy = policy.name(),
                method = ctx.full_method_name(),
                "policy matched"
            );
        }
        self.decide(matched)
    }

    /// Evaluate with full trace for debugging.
    ///
    /// Each policy's permission and principal matchers are traced in full
    /// (no short-circuit inside a policy). Policy iteration still stops at
    /// the first match, so `decision` equals [`evaluate()`](Self::evaluate).
    #[must_use]
    pub fn evaluate_with_trace<C: RequestContext + ?Sized>(&self, ctx: &C) -> EvalTrace {
        let mut steps = Vec::new();
        let mut matched = None;

        for policy in &self.policies {
            let permissions = policy.permissions().evaluate_with_trace(ctx);
            let principals = policy.principals().evaluate_with_trace(ctx);
            let hit = permissions.matched() && principals.matched();
            steps.push(PolicyStep {
                name: Arc::clone(policy.shared_name()),
                matched: hit,
                permissions,
                principals,
            });
            if hit {
                matched = Some(policy);
                break;
            }
        }

        EvalTrace {
            decision: self.decide(matched),
            steps,
        }
    }

    fn decide(&self, matched: Option<&Policy>) -> Decision {
        let allow = (self.action == Action::Deny) == matched.is_none();
        let decision = if allow {
            DecisionType::Allow
        } else {
            DecisionType::Deny
        };
        Decision::new(decision, matched.map(|p| Arc::clone(p.shared_name())))
    }
}

impl fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationEngine")
            .field("action", &self.action)
            .field(
                "policies",
                &self.policies.iter().map(Policy::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
