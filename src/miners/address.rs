//! Scan target descriptions and their enumeration.
//!
//! An [`AddressSpec`] is a declarative, finite set of IPv4 addresses.
//! Enumeration is lazy and restartable: [`AddressSpec::iter`] hands out a
//! fresh iterator every time, always yielding addresses in ascending
//! numeric order with no duplicates. All validation happens at
//! construction time; enumeration itself cannot fail.

use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

use crate::error::{Error, Result};

/// One octet of an [`AddressSpec::Octets`] target: a fixed value, an
/// inclusive range, or the `*` wildcard covering 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctetSpec {
    Value(u8),
    Range(u8, u8),
    Wildcard,
}

impl OctetSpec {
    fn first(&self) -> u8 {
        match self {
            OctetSpec::Value(v) => *v,
            OctetSpec::Range(lo, _) => *lo,
            OctetSpec::Wildcard => 0,
        }
    }

    fn next_after(&self, current: u8) -> Option<u8> {
        let last = match self {
            OctetSpec::Value(v) => *v,
            OctetSpec::Range(_, hi) => *hi,
            OctetSpec::Wildcard => 255,
        };
        if current < last { Some(current + 1) } else { None }
    }

    fn count(&self) -> usize {
        match self {
            OctetSpec::Value(_) => 1,
            OctetSpec::Range(lo, hi) => (*hi as usize) - (*lo as usize) + 1,
            OctetSpec::Wildcard => 256,
        }
    }
}

impl FromStr for OctetSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "*" {
            return Ok(OctetSpec::Wildcard);
        }
        match s.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_octet(lo)?;
                let hi = parse_octet(hi)?;
                if lo > hi {
                    Err(Error::invalid_spec(format!("start > end in `{s}`")))
                } else {
                    Ok(OctetSpec::Range(lo, hi))
                }
            }
            None => Ok(OctetSpec::Value(parse_octet(s)?)),
        }
    }
}

fn parse_octet(s: &str) -> Result<u8> {
    s.trim()
        .parse()
        .map_err(|_| Error::invalid_spec(format!("octet `{}` is not in 0-255", s.trim())))
}

/// A declarative description of the IPv4 addresses to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSpec {
    /// Exactly one address.
    Single(Ipv4Addr),
    /// Per-octet values, ranges, or wildcards; octet 1 varies slowest.
    Octets([OctetSpec; 4]),
    /// A CIDR subnet. Enumerates host addresses only: network and
    /// broadcast are excluded below /31, while /31 and /32 yield every
    /// address.
    Subnet(Ipv4Net),
    /// An explicit inclusive range of addresses.
    Range(Ipv4Addr, Ipv4Addr),
}

impl AddressSpec {
    pub fn single(ip: Ipv4Addr) -> Self {
        AddressSpec::Single(ip)
    }

    pub fn subnet(cidr: &str) -> Result<Self> {
        let net = Ipv4Net::from_str(cidr)
            .map_err(|e| Error::invalid_spec(format!("bad CIDR `{cidr}`: {e}")))?;
        Ok(AddressSpec::Subnet(net))
    }

    pub fn octets(octet1: &str, octet2: &str, octet3: &str, octet4: &str) -> Result<Self> {
        Ok(AddressSpec::Octets([
            octet1.parse()?,
            octet2.parse()?,
            octet3.parse()?,
            octet4.parse()?,
        ]))
    }

    pub fn range(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self> {
        if u32::from(start) > u32::from(end) {
            return Err(Error::invalid_spec(format!(
                "range start {start} is above end {end}"
            )));
        }
        Ok(AddressSpec::Range(start, end))
    }

    /// Parse a range string: either two full addresses (`"10.0.0.1-10.0.1.50"`)
    /// or the per-octet form (`"10.1-199.0.1-199"`).
    pub fn parse_range(range: &str) -> Result<Self> {
        if let Some((start, end)) = range.split_once('-') {
            let full_ips = (
                Ipv4Addr::from_str(start.trim()),
                Ipv4Addr::from_str(end.trim()),
            );
            if let (Ok(start), Ok(end)) = full_ips {
                return Self::range(start, end);
            }
        }

        let parts: Vec<&str> = range.split('.').collect();
        if parts.len() != 4 {
            return Err(Error::invalid_spec(format!(
                "expected `a.b.c.d-e.f.g.h` or `10.1-199.0.1-199`, got `{range}`"
            )));
        }
        Self::octets(parts[0], parts[1], parts[2], parts[3])
    }

    /// Exact number of addresses this spec enumerates.
    pub fn len(&self) -> usize {
        match self {
            AddressSpec::Single(_) => 1,
            AddressSpec::Octets(octets) => octets.iter().map(OctetSpec::count).product(),
            AddressSpec::Subnet(net) => {
                let span = 1u64 << (32 - net.prefix_len());
                if net.prefix_len() >= 31 {
                    span as usize
                } else {
                    (span - 2) as usize
                }
            }
            AddressSpec::Range(start, end) => {
                (u64::from(u32::from(*end)) - u64::from(u32::from(*start)) + 1) as usize
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh, lazy enumeration of the spec.
    pub fn iter(&self) -> AddressIter {
        let inner = match self {
            AddressSpec::Single(ip) => IterInner::Single(Some(*ip)),
            AddressSpec::Octets(octets) => IterInner::Octets {
                spec: *octets,
                cursor: Some([
                    octets[0].first(),
                    octets[1].first(),
                    octets[2].first(),
                    octets[3].first(),
                ]),
            },
            AddressSpec::Subnet(net) => IterInner::Hosts(net.hosts()),
            AddressSpec::Range(start, end) => IterInner::Range {
                next: Some(u32::from(*start)),
                end: u32::from(*end),
            },
        };
        AddressIter { inner }
    }
}

impl IntoIterator for &AddressSpec {
    type Item = Ipv4Addr;
    type IntoIter = AddressIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy enumeration state. Owns everything it needs, so it outlives the
/// spec it came from.
pub struct AddressIter {
    inner: IterInner,
}

enum IterInner {
    Single(Option<Ipv4Addr>),
    Octets {
        spec: [OctetSpec; 4],
        cursor: Option<[u8; 4]>,
    },
    Hosts(ipnet::Ipv4AddrRange),
    Range {
        next: Option<u32>,
        end: u32,
    },
}

impl Iterator for AddressIter {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        match &mut self.inner {
            IterInner::Single(ip) => ip.take(),
            IterInner::Octets { spec, cursor } => {
                let current = (*cursor)?;
                // Advance from the last octet inward, resetting everything
                // to the right of the octet that moved.
                let mut next = current;
                let mut advanced = false;
                for i in (0..4).rev() {
                    if let Some(value) = spec[i].next_after(next[i]) {
                        next[i] = value;
                        for (j, later) in next.iter_mut().enumerate().skip(i + 1) {
                            *later = spec[j].first();
                        }
                        advanced = true;
                        break;
                    }
                }
                *cursor = if advanced { Some(next) } else { None };
                Some(Ipv4Addr::new(
                    current[0], current[1], current[2], current[3],
                ))
            }
            IterInner::Hosts(hosts) => hosts.next(),
            IterInner::Range { next, end } => {
                let current = (*next)?;
                *next = if current == *end {
                    None
                } else {
                    Some(current + 1)
                };
                Some(Ipv4Addr::from(current))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(spec: &AddressSpec) -> Vec<Ipv4Addr> {
        spec.iter().collect()
    }

    fn assert_ascending_unique(addresses: &[Ipv4Addr]) {
        for pair in addresses.windows(2) {
            assert!(
                u32::from(pair[0]) < u32::from(pair[1]),
                "{} not below {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn single_yields_one_address() {
        let spec = AddressSpec::single(Ipv4Addr::new(192, 168, 1, 5));
        assert_eq!(collect(&spec), vec![Ipv4Addr::new(192, 168, 1, 5)]);
        assert_eq!(spec.len(), 1);
    }

    #[test]
    fn octet_range_expands_in_order() {
        let spec = AddressSpec::octets("192", "168", "1", "1-5").unwrap();
        let addresses = collect(&spec);
        assert_eq!(addresses.len(), 5);
        assert_eq!(spec.len(), 5);
        assert_eq!(addresses[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(addresses[4], Ipv4Addr::new(192, 168, 1, 5));
        assert_ascending_unique(&addresses);
    }

    #[test]
    fn octet_wildcard_covers_full_octet() {
        let spec = AddressSpec::octets("10", "0", "0", "*").unwrap();
        let addresses = collect(&spec);
        assert_eq!(addresses.len(), 256);
        assert_eq!(addresses[0], Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(addresses[255], Ipv4Addr::new(10, 0, 0, 255));
        assert_ascending_unique(&addresses);
    }

    #[test]
    fn multi_octet_ranges_nest_with_octet_one_outermost() {
        let spec = AddressSpec::octets("10", "1-2", "0", "1-2").unwrap();
        let addresses = collect(&spec);
        assert_eq!(
            addresses,
            vec![
                Ipv4Addr::new(10, 1, 0, 1),
                Ipv4Addr::new(10, 1, 0, 2),
                Ipv4Addr::new(10, 2, 0, 1),
                Ipv4Addr::new(10, 2, 0, 2),
            ]
        );
        assert_eq!(spec.len(), 4);
    }

    #[test]
    fn octet_validation_fails_fast() {
        assert!(matches!(
            AddressSpec::octets("300", "0", "0", "1"),
            Err(Error::InvalidAddressSpec(_))
        ));
        assert!(matches!(
            AddressSpec::octets("10", "0", "0", "200-100"),
            Err(Error::InvalidAddressSpec(_))
        ));
        assert!(matches!(
            AddressSpec::octets("10", "0", "0", "1-5-10"),
            Err(Error::InvalidAddressSpec(_))
        ));
    }

    #[test]
    fn subnet_enumerates_hosts_only() {
        let spec = AddressSpec::subnet("10.0.0.0/30").unwrap();
        assert_eq!(
            collect(&spec),
            vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]
        );
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn slash_31_and_32_include_all_addresses() {
        let spec = AddressSpec::subnet("10.0.0.0/31").unwrap();
        assert_eq!(
            collect(&spec),
            vec![Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 1)]
        );
        assert_eq!(spec.len(), 2);

        let spec = AddressSpec::subnet("10.0.0.9/32").unwrap();
        assert_eq!(collect(&spec), vec![Ipv4Addr::new(10, 0, 0, 9)]);
        assert_eq!(spec.len(), 1);
    }

    #[test]
    fn subnet_24_is_254_hosts_ascending() {
        let spec = AddressSpec::subnet("192.168.1.0/24").unwrap();
        let addresses = collect(&spec);
        assert_eq!(addresses.len(), 254);
        assert_eq!(spec.len(), 254);
        assert_eq!(addresses[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(addresses[253], Ipv4Addr::new(192, 168, 1, 254));
        assert_ascending_unique(&addresses);
    }

    #[test]
    fn malformed_cidr_is_rejected() {
        assert!(matches!(
            AddressSpec::subnet("10.0.0.0/33"),
            Err(Error::InvalidAddressSpec(_))
        ));
        assert!(matches!(
            AddressSpec::subnet("10.0.0.0"),
            Err(Error::InvalidAddressSpec(_))
        ));
    }

    #[test]
    fn explicit_range_spans_octet_boundaries() {
        let spec = AddressSpec::range(
            Ipv4Addr::new(10, 0, 0, 254),
            Ipv4Addr::new(10, 0, 1, 1),
        )
        .unwrap();
        assert_eq!(
            collect(&spec),
            vec![
                Ipv4Addr::new(10, 0, 0, 254),
                Ipv4Addr::new(10, 0, 0, 255),
                Ipv4Addr::new(10, 0, 1, 0),
                Ipv4Addr::new(10, 0, 1, 1),
            ]
        );
        assert_eq!(spec.len(), 4);
    }

    #[test]
    fn inverted_range_fails_construction() {
        assert!(matches!(
            AddressSpec::range(Ipv4Addr::new(10, 0, 1, 0), Ipv4Addr::new(10, 0, 0, 255)),
            Err(Error::InvalidAddressSpec(_))
        ));
    }

    #[test]
    fn range_string_parses_both_forms() {
        let spec = AddressSpec::parse_range("10.0.0.1-10.0.0.3").unwrap();
        assert_eq!(
            collect(&spec),
            vec![
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
                Ipv4Addr::new(10, 0, 0, 3),
            ]
        );

        let spec = AddressSpec::parse_range("192.168.1.1-3").unwrap();
        assert_eq!(
            collect(&spec),
            vec![
                Ipv4Addr::new(192, 168, 1, 1),
                Ipv4Addr::new(192, 168, 1, 2),
                Ipv4Addr::new(192, 168, 1, 3),
            ]
        );

        assert!(AddressSpec::parse_range("192.168.1").is_err());
    }

    #[test]
    fn enumeration_is_restartable() {
        let spec = AddressSpec::octets("10", "0", "0", "1-3").unwrap();
        let first: Vec<_> = spec.iter().collect();
        let second: Vec<_> = spec.iter().collect();
        assert_eq!(first, second);
    }
}
