//! Config types for policy construction.
//!
//! These types mirror the runtime types but carry optional fields and are
//! serde-deserializable (feature `serde`), so an RBAC document in YAML or
//! JSON can be compiled into an [`AuthorizationEngine`]. The shapes follow
//! Envoy's RBAC filter config.
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type |
//! |-------------|-------------|
//! | [`RbacConfig`] | [`AuthorizationEngine`] |
//! | [`PolicyConfig`] | [`Policy`] |
//! | [`PermissionConfig`] | [`Matcher`] (what is accessed) |
//! | [`PrincipalConfig`] | [`Matcher`] (who is accessing) |
//! | [`HeaderMatchSpec`] | [`HeaderMatcher`](crate::HeaderMatcher) |
//! | [`StringMatchSpec`] | [`StringMatcher`](crate::StringMatcher) |
//! | [`CidrSpec`] | [`IpMatcher`](crate::IpMatcher) |
//!
//! # Example
//!
//! ```yaml
//! action: DENY
//! policies:
//!   block-debug:
//!     permissions:
//!       - header: { name: x-debug, present_match: true }
//!     principals:
//!       - not_id: { source_ip: { address_prefix: "10.0.0.0", prefix_len: 8 } }
//! ```

use crate::{
    Action, AuthorizationEngine, CidrSpec, FieldMatcher, HeaderMatchSpec, Matcher, Policy,
    RbacError, StringMatchSpec, StringMatcher,
};
use std::collections::BTreeMap;

/// A whole RBAC document.
///
/// Policies are keyed by name. They are evaluated in lexicographic name
/// order, which makes first-match-wins deterministic for config input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct RbacConfig {
    /// Global action.
    pub action: Action,
    /// Named policies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub policies: BTreeMap<String, PolicyConfig>,
}

impl RbacConfig {
    /// Compile every policy and build the engine.
    ///
    /// # Errors
    ///
    /// Any [`RbacError`] from compiling a matcher or building the engine.
    pub fn compile(&self) -> Result<AuthorizationEngine, RbacError> {
        let policies = self
            .policies
            .iter()
            .map(|(name, policy)| policy.compile(name.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        AuthorizationEngine::new(self.action, policies)
    }
}

/// One policy: any permission AND any principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct PolicyConfig {
    /// Permission rules, OR-ed. Empty matches nothing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub permissions: Vec<PermissionConfig>,
    /// Principal rules, OR-ed. Empty matches nothing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub principals: Vec<PrincipalConfig>,
}

impl PolicyConfig {
    /// Compile into a named [`Policy`].
    ///
    /// # Errors
    ///
    /// Any [`RbacError`] from compiling a rule.
    pub fn compile(&self, name: &str) -> Result<Policy, RbacError> {
        let permissions = compile_all(&self.permissions, PermissionConfig::compile)?;
        let principals = compile_all(&self.principals, PrincipalConfig::compile)?;
        Ok(Policy::from_rules(name, permissions, principals))
    }
}

/// What is being accessed.
///
/// Externally tagged, one key per rule. With `serde_yaml`, deserialize
/// through `serde_yaml::with::singleton_map_recursive` so rules read as
/// single-key maps rather than YAML tags:
///
/// ```yaml
/// - url_path: { prefix: "/store.Reader/" }
/// - and_rules: { rules: [ { any: true } ] }
/// - not_rule: { header: { name: x-debug, present_match: true } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PermissionConfig {
    /// Matches everything. Must be `true`.
    Any(bool),
    /// All rules must match.
    AndRules {
        /// Child rules.
        rules: Vec<PermissionConfig>,
    },
    /// Any rule must match.
    OrRules {
        /// Child rules.
        rules: Vec<PermissionConfig>,
    },
    /// Negates the rule.
    NotRule(Box<PermissionConfig>),
    /// A request header.
    Header(HeaderMatchSpec),
    /// The full method name.
    UrlPath(StringMatchSpec),
    /// The local address.
    DestinationIp(CidrSpec),
}

impl PermissionConfig {
    /// Compile into a [`Matcher`].
    ///
    /// # Errors
    ///
    /// [`RbacError::InvalidConfig`] for `any: false`, or any error from a leaf spec.
    pub fn compile(&self) -> Result<Matcher, RbacError> {
        Ok(match self {
            Self::Any(flag) => compile_any(*flag, "permission")?,
            Self::AndRules { rules } => Matcher::And(compile_all(rules, Self::compile)?),
            Self::OrRules { rules } => Matcher::Or(compile_all(rules, Self::compile)?),
            Self::NotRule(inner) => Matcher::Not(Box::new(inner.compile()?)),
            Self::Header(spec) => Matcher::Header(spec.compile()?),
            Self::UrlPath(spec) => Matcher::Field(FieldMatcher::path(spec.compile()?)),
            Self::DestinationIp(spec) => {
                Matcher::Field(FieldMatcher::destination_ip(spec.compile()?))
            }
        })
    }
}

/// Who is accessing.
///
/// ```yaml
/// - authenticated: { principal_name: { suffix: ".svc.cluster.local" } }
/// - source_ip: { address_prefix: "10.0.0.0", prefix_len: 8 }
/// - or_ids: { ids: [ { any: true } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PrincipalConfig {
    /// Matches everyone. Must be `true`.
    Any(bool),
    /// All ids must match.
    AndIds {
        /// Child ids.
        ids: Vec<PrincipalConfig>,
    },
    /// Any id must match.
    OrIds {
        /// Child ids.
        ids: Vec<PrincipalConfig>,
    },
    /// Negates the id.
    NotId(Box<PrincipalConfig>),
    /// The authenticated principal name.
    Authenticated {
        /// Principal name pattern; omitted means "any authenticated peer".
        #[cfg_attr(feature = "serde", serde(default))]
        principal_name: Option<StringMatchSpec>,
    },
    /// The peer address.
    SourceIp(CidrSpec),
    /// A request header.
    Header(HeaderMatchSpec),
    /// The full method name.
    UrlPath(StringMatchSpec),
}

impl PrincipalConfig {
    /// Compile into a [`Matcher`].
    ///
    /// # Errors
    ///
    /// [`RbacError::InvalidConfig`] for `any: false`, or any error from a leaf spec.
    pub fn compile(&self) -> Result<Matcher, RbacError> {
        Ok(match self {
            Self::Any(flag) => compile_any(*flag, "principal")?,
            Self::AndIds { ids } => Matcher::And(compile_all(ids, Self::compile)?),
            Self::OrIds { ids } => Matcher::Or(compile_all(ids, Self::compile)?),
            Self::NotId(inner) => Matcher::Not(Box::new(inner.compile()?)),
            Self::Authenticated { principal_name } => {
                let matcher = match principal_name {
                    Some(spec) => spec.compile()?,
                    None => StringMatcher::prefix("", false),
                };
                Matcher::Field(FieldMatcher::authenticated(matcher))
            }
            Self::SourceIp(spec) => Matcher::Field(FieldMatcher::source_ip(spec.compile()?)),
            Self::Header(spec) => Matcher::Header(spec.compile()?),
            Self::UrlPath(spec) => Matcher::Field(FieldMatcher::path(spec.compile()?)),
        })
    }
}

fn compile_any(flag: bool, rule: &str) -> Result<Matcher, RbacError> {
    if flag {
        Ok(Matcher::Any)
    } else {
        Err(RbacError::InvalidConfig {
            reason: format!("{rule} `any` must be true when set"),
        })
    }
}

fn compile_all<T>(
    items: &[T],
    compile: fn(&T) -> Result<Matcher, RbacError>,
) -> Result<Vec<Matcher>, RbacError> {
    items.iter().map(compile).collect()
}
