//! `HeaderMatcher` — Header value, numeric range, or presence
//!
//! A header matcher looks up one header on the request and applies one match
//! kind to its value. Presence matching is the only kind that can succeed on
//! an absent header; every other kind treats absence as a non-match, even
//! when inverted.

use crate::string_match::check_len;
use crate::{input_matcher, RbacError, RequestContext};
use regex::Regex;

/// Inclusive signed 64-bit range.
///
/// ```
/// use rbac::Int64Range;
///
/// let r = Int64Range::new(200, 299).unwrap();
/// assert!(r.contains(200));
/// assert!(r.contains(299));
/// assert!(!r.contains(300));
/// assert!(Int64Range::new(5, 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int64Range {
    start: i64,
    end: i64,
}

impl Int64Range {
    /// Create a range covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::InvalidRange`] if `start > end`.
    pub fn new(start: i64, end: i64) -> Result<Self, RbacError> {
        if start > end {
            return Err(RbacError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Whether `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        (self.start..=self.end).contains(&value)
    }
}

/// How a header value is matched.
#[derive(Debug, Clone)]
pub enum HeaderMatchKind {
    /// Value equals the string exactly (case-sensitive).
    Exact(String),
    /// Value fully matches the regular expression.
    SafeRegex(Regex),
    /// Value parses as `i64` and lies within the range.
    Range(Int64Range),
    /// Header existence equals the flag.
    Present(bool),
    /// Value starts with the string.
    Prefix(String),
    /// Value ends with the string.
    Suffix(String),
}

impl HeaderMatchKind {
    fn matches_value(&self, value: &str) -> bool {
        match self {
            Self::Exact(s) => value == s,
            Self::SafeRegex(re) => re.is_match(value),
            Self::Range(range) => value.parse::<i64>().is_ok_and(|v| range.contains(v)),
            Self::Present(_) => true,
            Self::Prefix(s) => value.starts_with(s.as_str()),
            Self::Suffix(s) => value.ends_with(s.as_str()),
        }
    }
}

/// Matches a single named request header.
///
/// # Example
///
/// ```
/// use rbac::{HeaderMatcher, Int64Range};
///
/// let present = HeaderMatcher::for_present("X-Debug", true, false);
/// assert_eq!(present.name(), "x-debug");
///
/// let retries = HeaderMatcher::for_range(
///     "x-retry-count",
///     Int64Range::new(0, 3).unwrap(),
///     false,
/// );
/// assert!(!retries.is_inverted());
/// ```
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    name: String,
    kind: HeaderMatchKind,
    inverted: bool,
}

impl HeaderMatcher {
    /// Create a header matcher. The name is lower-cased.
    #[must_use]
    pub fn new(name: &str, kind: HeaderMatchKind, inverted: bool) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            kind,
            inverted,
        }
    }

    /// Match the value exactly.
    #[must_use]
    pub fn for_exact_value(name: &str, value: impl Into<String>, inverted: bool) -> Self {
        Self::new(name, HeaderMatchKind::Exact(value.into()), inverted)
    }

    /// Match the whole value against a regular expression.
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::PatternTooLong`] or [`RbacError::InvalidPattern`].
    pub fn for_safe_regex(name: &str, pattern: &str, inverted: bool) -> Result<Self, RbacError> {
        let re = input_matcher::compile_full_match(pattern)?;
        Ok(Self::new(name, HeaderMatchKind::SafeRegex(re), inverted))
    }

    /// Match the value as an integer in `range`.
    #[must_use]
    pub fn for_range(name: &str, range: Int64Range, inverted: bool) -> Self {
        Self::new(name, HeaderMatchKind::Range(range), inverted)
    }

    /// Match on the header's presence (`true`) or absence (`false`).
    #[must_use]
    pub fn for_present(name: &str, present: bool, inverted: bool) -> Self {
        Self::new(name, HeaderMatchKind::Present(present), inverted)
    }

    /// Match a value prefix.
    #[must_use]
    pub fn for_prefix(name: &str, prefix: impl Into<String>, inverted: bool) -> Self {
        Self::new(name, HeaderMatchKind::Prefix(prefix.into()), inverted)
    }

    /// Match a value suffix.
    #[must_use]
    pub fn for_suffix(name: &str, suffix: impl Into<String>, inverted: bool) -> Self {
        Self::new(name, HeaderMatchKind::Suffix(suffix.into()), inverted)
    }

    /// The lower-cased header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The match kind.
    #[must_use]
    pub fn kind(&self) -> &HeaderMatchKind {
        &self.kind
    }

    /// Whether the result is inverted.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Evaluate against the request's header value.
    #[must_use]
    pub fn matches<C: RequestContext + ?Sized>(&self, ctx: &C) -> bool {
        self.matches_value(ctx.header(&self.name))
    }

    /// Evaluate against an already looked-up header value.
    pub(crate) fn matches_value(&self, value: Option<&str>) -> bool {
        if let HeaderMatchKind::Present(present) = self.kind {
            return (value.is_some() == present) != self.inverted;
        }
        match value {
            None => false,
            Some(v) => self.kind.matches_value(v) != self.inverted,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config
// ═══════════════════════════════════════════════════════════════════════════════

const DISCRIMINANTS: &[&str] = &[
    "exact_match",
    "safe_regex_match",
    "range_match",
    "present_match",
    "prefix_match",
    "suffix_match",
];

/// An inclusive integer range from user configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct RangeSpec {
    /// Lower bound (inclusive).
    pub start: i64,
    /// Upper bound (inclusive).
    pub end: i64,
}

/// A header match specification from user configuration.
///
/// ```yaml
/// header: { name: ":authority", suffix_match: ".internal", invert_match: true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct HeaderMatchSpec {
    /// Header name (case-insensitive).
    pub name: String,
    /// Exact value.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exact_match: Option<String>,
    /// Full-match regular expression.
    #[cfg_attr(feature = "serde", serde(default))]
    pub safe_regex_match: Option<String>,
    /// Inclusive integer range.
    #[cfg_attr(feature = "serde", serde(default))]
    pub range_match: Option<RangeSpec>,
    /// Presence (`true`) or absence (`false`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub present_match: Option<bool>,
    /// Value prefix.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prefix_match: Option<String>,
    /// Value suffix.
    #[cfg_attr(feature = "serde", serde(default))]
    pub suffix_match: Option<String>,
    /// Invert the result.
    #[cfg_attr(feature = "serde", serde(default))]
    pub invert_match: bool,
}

impl HeaderMatchSpec {
    /// Compile this spec into a runtime [`HeaderMatcher`].
    ///
    /// # Errors
    ///
    /// - [`RbacError::EmptyMatcher`] / [`RbacError::AmbiguousMatcher`] unless exactly one kind is set
    /// - [`RbacError::InvalidRange`] if the range start is after its end
    /// - [`RbacError::PatternTooLong`] / [`RbacError::InvalidPattern`] for bad patterns
    pub fn compile(&self) -> Result<HeaderMatcher, RbacError> {
        let set: Vec<&'static str> = [
            self.exact_match.is_some(),
            self.safe_regex_match.is_some(),
            self.range_match.is_some(),
            self.present_match.is_some(),
            self.prefix_match.is_some(),
            self.suffix_match.is_some(),
        ]
        .into_iter()
        .zip(DISCRIMINANTS)
        .filter_map(|(present, name)| present.then_some(*name))
        .collect();

        if set.len() > 1 {
            return Err(RbacError::AmbiguousMatcher {
                kind: "header matcher",
                set,
            });
        }

        let name = self.name.as_str();
        let inverted = self.invert_match;
        if let Some(v) = &self.exact_match {
            check_len(v)?;
            Ok(HeaderMatcher::for_exact_value(name, v.as_str(), inverted))
        } else if let Some(v) = &self.safe_regex_match {
            HeaderMatcher::for_safe_regex(name, v, inverted)
        } else if let Some(r) = self.range_match {
            let range = Int64Range::new(r.start, r.end)?;
            Ok(HeaderMatcher::for_range(name, range, inverted))
        } else if let Some(p) = self.present_match {
            Ok(HeaderMatcher::for_present(name, p, inverted))
        } else if let Some(v) = &self.prefix_match {
            check_len(v)?;
            Ok(HeaderMatcher::for_prefix(name, v.as_str(), inverted))
        } else if let Some(v) = &self.suffix_match {
            check_len(v)?;
            Ok(HeaderMatcher::for_suffix(name, v.as_str(), inverted))
        } else {
            Err(RbacError::EmptyMatcher {
                kind: "header matcher",
                expected: DISCRIMINANTS,
            })
        }
    }
}
