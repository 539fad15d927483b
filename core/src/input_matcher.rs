//! Value matchers — Request-agnostic matching over a single string
//!
//! These matchers know nothing about requests. They are bound to a request
//! attribute by [`FieldMatcher`](crate::FieldMatcher) or used directly by
//! [`HeaderMatcher`](crate::HeaderMatcher).
//!
//! # Available Matchers
//!
//! - [`StringMatcher`] — exact, prefix, suffix, contains, or safe regex
//! - [`IpMatcher`](crate::IpMatcher) — CIDR range membership
//! - [`ValueMatcher`] — either of the above, as held by a field binding

use crate::{IpMatcher, RbacError, MAX_REGEX_PATTERN_LENGTH};
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// StringMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// String matcher with Envoy `StringMatcher` semantics.
///
/// Exactly one strategy per matcher; the enum makes ambiguous configurations
/// unrepresentable. Use [`StringMatchSpec`](crate::StringMatchSpec) to build
/// one from optional config fields.
///
/// # Case sensitivity
///
/// `ignore_case` applies to exact, prefix, and suffix only: both operands are
/// lower-cased one `char` at a time with [`char::to_lowercase`] before
/// comparing. The mapping is context-free: `Σ`, `σ` and the final form `ς`
/// all fold to `σ`, wherever they appear. `Contains` is always a raw substring test,
/// and safe-regex case sensitivity is controlled by the pattern itself
/// (e.g. `(?i)`).
///
/// # Example
///
/// ```
/// use rbac::StringMatcher;
///
/// let m = StringMatcher::prefix("Foo", true);
/// assert!(m.matches("foobar"));
///
/// let m = StringMatcher::prefix("Foo", false);
/// assert!(!m.matches("foobar"));
///
/// // Regex is a full match, not a search
/// let m = StringMatcher::safe_regex(r"user-\d+").unwrap();
/// assert!(m.matches("user-123"));
/// assert!(!m.matches("admin/user-123"));
/// ```
#[derive(Debug, Clone)]
pub enum StringMatcher {
    /// Exact string equality.
    Exact { value: String, ignore_case: bool },
    /// String prefix match.
    Prefix { value: String, ignore_case: bool },
    /// String suffix match.
    Suffix { value: String, ignore_case: bool },
    /// Raw substring match.
    Contains { value: String },
    /// Full-string regular expression match (RE2 semantics, linear time).
    SafeRegex(Regex),
}

impl StringMatcher {
    /// Create an exact match.
    ///
    /// When `ignore_case` is true, the pattern is pre-lowercased at
    /// construction so only the input is folded per match call.
    #[must_use]
    pub fn exact(value: impl Into<String>, ignore_case: bool) -> Self {
        Self::Exact {
            value: fold_pattern(value.into(), ignore_case),
            ignore_case,
        }
    }

    /// Create a prefix match.
    #[must_use]
    pub fn prefix(value: impl Into<String>, ignore_case: bool) -> Self {
        Self::Prefix {
            value: fold_pattern(value.into(), ignore_case),
            ignore_case,
        }
    }

    /// Create a suffix match.
    #[must_use]
    pub fn suffix(value: impl Into<String>, ignore_case: bool) -> Self {
        Self::Suffix {
            value: fold_pattern(value.into(), ignore_case),
            ignore_case,
        }
    }

    /// Create a substring match.
    #[must_use]
    pub fn contains(value: impl Into<String>) -> Self {
        Self::Contains {
            value: value.into(),
        }
    }

    /// Create a regex match against the whole value.
    ///
    /// The pattern is anchored at both ends, so `abc` matches `"abc"` but not
    /// `"xabcx"`. Uses Rust's `regex` crate, which guarantees linear time
    /// matching (no `ReDoS`).
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::PatternTooLong`] if the pattern exceeds
    /// [`MAX_REGEX_PATTERN_LENGTH`], or [`RbacError::InvalidPattern`] if it
    /// does not compile.
    pub fn safe_regex(pattern: &str) -> Result<Self, RbacError> {
        compile_full_match(pattern).map(Self::SafeRegex)
    }

    /// Check if the given value matches.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        match self {
            Self::Exact { value, ignore_case } => {
                if *ignore_case {
                    folded(input).eq(value.chars())
                } else {
                    input == value
                }
            }
            Self::Prefix { value, ignore_case } => {
                if *ignore_case {
                    let mut chars = folded(input);
                    value.chars().all(|c| chars.next() == Some(c))
                } else {
                    input.starts_with(value.as_str())
                }
            }
            Self::Suffix { value, ignore_case } => {
                if *ignore_case {
                    folded(input).collect::<String>().ends_with(value.as_str())
                } else {
                    input.ends_with(value.as_str())
                }
            }
            Self::Contains { value } => input.contains(value.as_str()),
            Self::SafeRegex(re) => re.is_match(input),
        }
    }
}

fn fold_pattern(value: String, ignore_case: bool) -> String {
    if ignore_case {
        folded(&value).collect()
    } else {
        value
    }
}

fn folded(input: &str) -> impl Iterator<Item = char> + '_ {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ς' { 'σ' } else { c })
}

/// Compile `pattern` so that it must match the entire input.
///
/// The bare pattern is compiled first: a pattern such as `a)|(b` is only
/// valid once wrapped, and would then escape the anchors.
pub(crate) fn compile_full_match(pattern: &str) -> Result<Regex, RbacError> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(RbacError::PatternTooLong {
            len: pattern.len(),
            max: MAX_REGEX_PATTERN_LENGTH,
        });
    }
    let invalid = |e: regex::Error| RbacError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
    };
    Regex::new(pattern).map_err(invalid)?;
    Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(invalid)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ValueMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// The value matcher a [`FieldMatcher`](crate::FieldMatcher) delegates to.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// Match the field as a string.
    String(StringMatcher),
    /// Match the field as an IP address against a CIDR range.
    Ip(IpMatcher),
}

impl ValueMatcher {
    /// Check if the given value matches.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::String(m) => m.matches(value),
            Self::Ip(m) => m.matches(value),
        }
    }
}

impl From<StringMatcher> for ValueMatcher {
    fn from(m: StringMatcher) -> Self {
        Self::String(m)
    }
}

impl From<IpMatcher> for ValueMatcher {
    fn from(m: IpMatcher) -> Self {
        Self::Ip(m)
    }
}
