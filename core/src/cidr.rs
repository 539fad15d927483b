//! `IpMatcher` — CIDR range membership for textual addresses

use crate::RbacError;
use std::fmt;
use std::net::IpAddr;

/// Matches an address string against a CIDR block.
///
/// The prefix is validated at construction; the candidate address is parsed
/// per match. Any candidate that is not an IP literal, or belongs to the
/// other address family, is a non-match. IPv4-mapped IPv6 addresses
/// (`::ffff:a.b.c.d`) are treated as IPv4 on both sides.
///
/// # Example
///
/// ```
/// use rbac::IpMatcher;
///
/// let m = IpMatcher::new("10.1.0.0", 16).unwrap();
/// assert!(m.matches("10.1.2.3"));
/// assert!(!m.matches("10.2.0.1"));
/// assert!(!m.matches("::1"));
/// assert!(!m.matches("not an address"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct IpMatcher {
    prefix: IpAddr,
    prefix_len: u32,
}

impl IpMatcher {
    /// Create a CIDR matcher from an address literal and prefix length in bits.
    ///
    /// # Errors
    ///
    /// Returns [`RbacError::InvalidAddress`] if `address_prefix` is not an IP
    /// literal, or [`RbacError::InvalidPrefixLength`] if `prefix_len` exceeds
    /// the family's bit width.
    pub fn new(address_prefix: &str, prefix_len: u32) -> Result<Self, RbacError> {
        let prefix = parse_address(address_prefix).ok_or_else(|| RbacError::InvalidAddress {
            address: address_prefix.to_owned(),
            reason: "not an IPv4 or IPv6 literal".to_owned(),
        })?;

        let max = match prefix {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(RbacError::InvalidPrefixLength {
                address: address_prefix.to_owned(),
                prefix_len,
                max,
            });
        }

        Ok(Self { prefix, prefix_len })
    }

    /// The network address as configured.
    #[must_use]
    pub fn address_prefix(&self) -> IpAddr {
        self.prefix
    }

    /// The prefix length in bits.
    #[must_use]
    pub fn prefix_len(&self) -> u32 {
        self.prefix_len
    }

    /// Check whether `address` falls inside this CIDR block.
    #[must_use]
    pub fn matches(&self, address: &str) -> bool {
        let Some(candidate) = parse_address(address) else {
            return false;
        };

        match (candidate, self.prefix) {
            (IpAddr::V4(a), IpAddr::V4(p)) => prefix_eq(&a.octets(), &p.octets(), self.prefix_len),
            (IpAddr::V6(a), IpAddr::V6(p)) => prefix_eq(&a.octets(), &p.octets(), self.prefix_len),
            _ => false,
        }
    }
}

/// Compare the leading `bits` bits of two equal-width byte sequences.
fn prefix_eq(addr: &[u8], prefix: &[u8], bits: u32) -> bool {
    let mut remaining = bits;
    for (a, p) in addr.iter().zip(prefix) {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(8);
        let mask = u8::MAX << (8 - take);
        if a & mask != p & mask {
            return false;
        }
        remaining -= take;
    }
    true
}

/// Parse an IP literal, accepting bracketed IPv6 and folding IPv4-mapped IPv6 to IPv4.
fn parse_address(s: &str) -> Option<IpAddr> {
    let s = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);
    s.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

impl fmt::Debug for IpMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IpMatcher({}/{})", self.prefix, self.prefix_len)
    }
}

impl fmt::Display for IpMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.prefix_len)
    }
}

/// A CIDR range from user configuration.
///
/// ```yaml
/// source_ip: { address_prefix: "10.0.0.0", prefix_len: 8 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct CidrSpec {
    /// Network address literal.
    pub address_prefix: String,
    /// Prefix length in bits.
    pub prefix_len: u32,
}

impl CidrSpec {
    /// Compile this spec into an [`IpMatcher`].
    ///
    /// # Errors
    ///
    /// See [`IpMatcher::new`].
    pub fn compile(&self) -> Result<IpMatcher, RbacError> {
        IpMatcher::new(&self.address_prefix, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_prefix_16() {
        let m = IpMatcher::new("10.1.0.0", 16).unwrap();
        assert!(m.matches("10.1.2.3"));
        assert!(m.matches("10.1.255.255"));
        assert!(!m.matches("10.2.0.1"));
        assert!(!m.matches("11.1.0.0"));
    }

    #[test]
    fn test_ipv4_partial_byte_mask() {
        // 192.168.0.0/20 covers 192.168.0.0 - 192.168.15.255
        let m = IpMatcher::new("192.168.0.0", 20).unwrap();
        assert!(m.matches("192.168.0.1"));
        assert!(m.matches("192.168.15.254"));
        assert!(!m.matches("192.168.16.0"));

        // /3 keeps only the top three bits of the first octet
        let m = IpMatcher::new("224.0.0.0", 3).unwrap();
        assert!(m.matches("239.255.255.255"));
        assert!(m.matches("255.0.0.0"));
        assert!(!m.matches("223.255.255.255"));
    }

    #[test]
    fn test_host_prefix() {
        let m = IpMatcher::new("192.168.1.5", 32).unwrap();
        assert!(m.matches("192.168.1.5"));
        assert!(!m.matches("192.168.1.6"));
    }

    #[test]
    fn test_zero_prefix_matches_whole_family() {
        let m = IpMatcher::new("0.0.0.0", 0).unwrap();
        assert!(m.matches("1.2.3.4"));
        assert!(m.matches("255.255.255.255"));
        assert!(!m.matches("::1"));

        let m = IpMatcher::new("::", 0).unwrap();
        assert!(m.matches("2001:db8::1"));
        assert!(!m.matches("10.0.0.1"));
    }

    #[test]
    fn test_ipv6() {
        let m = IpMatcher::new("2001:db8::", 32).unwrap();
        assert!(m.matches("2001:db8::1"));
        assert!(m.matches("[2001:db8:ffff::1]"));
        assert!(!m.matches("2001:db9::1"));
    }

    #[test]
    fn test_mixed_family_is_non_match() {
        let m = IpMatcher::new("10.0.0.0", 8).unwrap();
        assert!(!m.matches("2001:db8::1"));

        let m = IpMatcher::new("2001:db8::", 32).unwrap();
        assert!(!m.matches("10.0.0.1"));
    }

    #[test]
    fn test_ipv4_mapped_ipv6_is_ipv4() {
        let m = IpMatcher::new("10.0.0.0", 8).unwrap();
        assert!(m.matches("::ffff:10.1.2.3"));

        let m = IpMatcher::new("::ffff:10.0.0.0", 8).unwrap();
        assert!(m.matches("10.9.9.9"));
    }

    #[test]
    fn test_unparsable_candidate_is_non_match() {
        let m = IpMatcher::new("10.0.0.0", 8).unwrap();
        assert!(!m.matches(""));
        assert!(!m.matches("localhost"));
        assert!(!m.matches("10.0.0"));
        assert!(!m.matches("10.0.0.1:8080"));
    }

    #[test]
    fn test_invalid_prefix_address() {
        let err = IpMatcher::new("example.com", 8).unwrap_err();
        assert!(matches!(err, RbacError::InvalidAddress { .. }));
    }

    #[test]
    fn test_prefix_len_too_wide() {
        let err = IpMatcher::new("10.0.0.0", 33).unwrap_err();
        assert_eq!(
            err,
            RbacError::InvalidPrefixLength {
                address: "10.0.0.0".into(),
                prefix_len: 33,
                max: 32,
            }
        );
        assert!(IpMatcher::new("::", 128).is_ok());
        assert!(IpMatcher::new("::", 129).is_err());
    }

    #[test]
    fn test_spec_compiles() {
        let spec = CidrSpec {
            address_prefix: "172.16.0.0".into(),
            prefix_len: 12,
        };
        let m = spec.compile().unwrap();
        assert!(m.matches("172.31.0.1"));
        assert!(!m.matches("172.32.0.1"));
        assert_eq!(m.to_string(), "172.16.0.0/12");
    }
}
