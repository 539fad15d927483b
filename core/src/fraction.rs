//! `FractionMatcher` — a sampling fraction carried alongside policies
//!
//! This is configuration data for an external sampling mechanism (e.g. shadow
//! rule rollout percentages). It is deliberately not a [`Matcher`](crate::Matcher)
//! variant: nothing in a request decides whether a fraction "matches".

use crate::RbacError;

/// A `numerator / denominator` fraction.
///
/// # Example
///
/// ```
/// use rbac::FractionMatcher;
///
/// let f = FractionMatcher::new(25, 100).unwrap();
/// assert_eq!(f.numerator(), 25);
/// assert_eq!(f.denominator(), 100);
/// assert!((f.ratio() - 0.25).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "FractionConfig"))]
pub struct FractionMatcher {
    numerator: u32,
    denominator: u32,
}

impl FractionMatcher {
    /// Create a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::InvalidFraction`] if `denominator` is zero.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, RbacError> {
        if denominator == 0 {
            return Err(RbacError::InvalidFraction {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// The numerator.
    #[must_use]
    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    /// The denominator (never zero).
    #[must_use]
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// The fraction as a floating point ratio.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct FractionConfig {
    numerator: u32,
    denominator: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<FractionConfig> for FractionMatcher {
    type Error = RbacError;

    fn try_from(config: FractionConfig) -> Result<Self, Self::Error> {
        Self::new(config.numerator, config.denominator)
    }
}
