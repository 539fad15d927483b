//! `StringMatchSpec` — Config-level string match specification
//!
//! This type represents a user's *intent* for string matching as it appears
//! in policy configuration: a bag of optional pattern fields of which exactly
//! one must be set. It compiles to the runtime [`StringMatcher`] via
//! [`compile()`](StringMatchSpec::compile), which is where ambiguous or empty
//! configurations are rejected.
//!
//! # Naming: Spec vs Matcher
//!
//! - [`StringMatchSpec`] = config-level specification (what the user wrote)
//! - [`StringMatcher`] = runtime engine (what evaluates at match time)

use crate::{RbacError, StringMatcher, MAX_PATTERN_LENGTH};
use std::fmt;

const DISCRIMINANTS: &[&str] = &["exact", "prefix", "suffix", "contains", "safe_regex"];

/// A string match specification from user configuration.
///
/// # Example
///
/// ```
/// use rbac::StringMatchSpec;
///
/// let spec = StringMatchSpec {
///     prefix: Some("/grpc.health".into()),
///     ..Default::default()
/// };
/// let matcher = spec.compile().unwrap();
/// assert!(matcher.matches("/grpc.health.v1.Health/Check"));
///
/// // No pattern at all is a configuration error
/// assert!(StringMatchSpec::default().compile().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct StringMatchSpec {
    /// Exact string equality.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exact: Option<String>,
    /// String starts with prefix.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prefix: Option<String>,
    /// String ends with suffix.
    #[cfg_attr(feature = "serde", serde(default))]
    pub suffix: Option<String>,
    /// String contains substring (always case-sensitive).
    #[cfg_attr(feature = "serde", serde(default))]
    pub contains: Option<String>,
    /// Full-match regular expression (Rust `regex` crate syntax, linear time).
    #[cfg_attr(feature = "serde", serde(default))]
    pub safe_regex: Option<String>,
    /// Case-insensitive exact/prefix/suffix matching.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ignore_case: bool,
}

impl StringMatchSpec {
    /// Compile this spec into a runtime [`StringMatcher`].
    ///
    /// # Errors
    ///
    /// - [`RbacError::EmptyMatcher`] if no pattern field is set
    /// - [`RbacError::AmbiguousMatcher`] if more than one is set
    /// - [`RbacError::PatternTooLong`] / [`RbacError::InvalidPattern`] for bad patterns
    pub fn compile(&self) -> Result<StringMatcher, RbacError> {
        let set: Vec<&'static str> = [
            self.exact.is_some(),
            self.prefix.is_some(),
            self.suffix.is_some(),
            self.contains.is_some(),
            self.safe_regex.is_some(),
        ]
        .into_iter()
        .zip(DISCRIMINANTS)
        .filter_map(|(present, name)| present.then_some(*name))
        .collect();

        if set.len() > 1 {
            return Err(RbacError::AmbiguousMatcher {
                kind: "string matcher",
                set,
            });
        }

        let ignore_case = self.ignore_case;
        if let Some(v) = &self.exact {
            check_len(v)?;
            Ok(StringMatcher::exact(v.as_str(), ignore_case))
        } else if let Some(v) = &self.prefix {
            check_len(v)?;
            Ok(StringMatcher::prefix(v.as_str(), ignore_case))
        } else if let Some(v) = &self.suffix {
            check_len(v)?;
            Ok(StringMatcher::suffix(v.as_str(), ignore_case))
        } else if let Some(v) = &self.contains {
            check_len(v)?;
            Ok(StringMatcher::contains(v.as_str()))
        } else if let Some(v) = &self.safe_regex {
            StringMatcher::safe_regex(v)
        } else {
            Err(RbacError::EmptyMatcher {
                kind: "string matcher",
                expected: DISCRIMINANTS,
            })
        }
    }
}

pub(crate) fn check_len(pattern: &str) -> Result<(), RbacError> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(RbacError::PatternTooLong {
            len: pattern.len(),
            max: MAX_PATTERN_LENGTH,
        });
    }
    Ok(())
}

impl fmt::Display for StringMatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("Exact", &self.exact),
            ("Prefix", &self.prefix),
            ("Suffix", &self.suffix),
            ("Contains", &self.contains),
            ("SafeRegex", &self.safe_regex),
        ];
        let mut first = true;
        for (name, value) in fields {
            if let Some(v) = value {
                if !first {
                    f.write_str(" + ")?;
                }
                write!(f, "{name}(\"{v}\")")?;
                first = false;
            }
        }
        if first {
            f.write_str("Empty")?;
        }
        if self.ignore_case {
            f.write_str(" [ignore_case]")?;
        }
        Ok(())
    }
}
