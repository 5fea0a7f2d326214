//! Remote fetch policy
//!
//! A fetch passes only when every gate agrees:
//!
//! 1. the global network switch is on
//! 2. the policy allows fetching at all
//! 3. the scheme is `http` or `https`, and `https` when secure transport is required
//! 4. the host is on the allowlist (exact name or `*.domain`)
//! 5. every address the host resolved to is public
//!
//! Step 5 runs even for allowlisted names, so a name that rebinds to a
//! loopback or metadata-service address is still refused. Callers resolve the
//! name themselves and pass the addresses to [`NetworkFetchPolicy::check_resolved`];
//! nothing here performs I/O.

use crate::error::{NetworkDenial, SecurityError};
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use url::{Host, Url};

pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkFetchPolicy {
    /// Global kill switch; when set nothing is fetched regardless of the rest.
    /// Not read from configuration files: callers fold it in from their
    /// global settings.
    #[serde(skip)]
    pub network_disabled: bool,
    pub allow: bool,
    pub allowed_hosts: Vec<String>,
    pub require_secure_transport: bool,
    pub max_bytes: u64,
    pub timeout_seconds: f64,
    pub max_redirects: u32,
}

impl Default for NetworkFetchPolicy {
    fn default() -> Self {
        Self {
            network_disabled: false,
            allow: false,
            allowed_hosts: Vec::new(),
            require_secure_transport: true,
            max_bytes: DEFAULT_MAX_BYTES,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl NetworkFetchPolicy {
    /// Policy that fetches from the given hosts
    pub fn allowing<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: true,
            allowed_hosts: hosts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Configured time limit; values that are not a positive duration fall
    /// back to the default, and values too large for [`Duration`] saturate
    pub fn timeout(&self) -> Duration {
        if !(self.timeout_seconds.is_finite() && self.timeout_seconds > 0.0) {
            return Duration::from_secs(DEFAULT_TIMEOUT_SECONDS as u64);
        }
        Duration::try_from_secs_f64(self.timeout_seconds).unwrap_or(Duration::MAX)
    }

    /// Check the URL before resolving its host: switches, scheme and host name
    ///
    /// IP-literal hosts are also checked against the address ranges here. An
    /// `Allow` for a domain name only means resolving is worth it; fetch only
    /// after [`check_resolved`](Self::check_resolved) agrees.
    pub fn precheck_url(&self, url: &str) -> Verdict {
        if self.network_disabled {
            return Verdict::deny(NetworkDenial::NetworkDisabled);
        }
        if !self.allow {
            return Verdict::deny(NetworkDenial::FetchNotAllowed);
        }
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => return Verdict::deny(NetworkDenial::InvalidUrl(err.to_string())),
        };
        match parsed.scheme() {
            "https" => {}
            "http" if !self.require_secure_transport => {}
            "http" => return Verdict::deny(NetworkDenial::InsecureTransport),
            other => return Verdict::deny(NetworkDenial::UnsupportedScheme(other.to_string())),
        }
        let host = match parsed.host() {
            Some(host) => host,
            None => return Verdict::deny(NetworkDenial::InvalidUrl("missing host".to_string())),
        };
        let name = host_name(&host);
        if !self.host_allowed(&name) {
            return Verdict::deny(NetworkDenial::HostNotAllowed(name));
        }
        match host {
            Host::Ipv4(v4) => check_address(IpAddr::V4(v4)),
            Host::Ipv6(v6) => check_address(IpAddr::V6(v6)),
            Host::Domain(_) => Verdict::Allow,
        }
    }

    /// Check the URL and the addresses its host resolved to
    ///
    /// An empty address list is a denial.
    pub fn check_resolved(&self, url: &str, addresses: &[IpAddr]) -> Verdict {
        self.precheck_url(url).and_then(|| {
            if addresses.is_empty() {
                return Verdict::deny(NetworkDenial::NoResolvedAddress);
            }
            addresses
                .iter()
                .map(|addr| check_address(*addr))
                .find(Verdict::is_denied)
                .unwrap_or(Verdict::Allow)
        })
    }

    /// Check one redirect hop; `hop` counts from 1
    pub fn check_redirect(&self, hop: u32, url: &str, addresses: &[IpAddr]) -> Verdict {
        if hop > self.max_redirects {
            return Verdict::deny(NetworkDenial::TooManyRedirects {
                limit: self.max_redirects,
            });
        }
        self.check_resolved(url, addresses)
    }

    /// Fail once a fetch has run past the timeout
    pub fn check_elapsed(&self, elapsed: Duration) -> Result<(), SecurityError> {
        let limit = self.timeout();
        if elapsed > limit {
            log::warn!("remote fetch aborted after {:?}", elapsed);
            return Err(NetworkDenial::Timeout {
                limit_ms: limit.as_millis(),
            }
            .into());
        }
        Ok(())
    }

    pub fn byte_budget(&self) -> ByteBudget {
        ByteBudget::new(self.max_bytes)
    }

    /// Wrap a response body so reading past `max_bytes` fails
    pub fn cap<R: Read>(&self, inner: R) -> CappedReader<R> {
        CappedReader::new(inner, self.max_bytes)
    }

    fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts
            .iter()
            .any(|pattern| host_matches(pattern, host))
    }
}

fn host_name(host: &Host<&str>) -> String {
    match host {
        Host::Domain(d) => d.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(v4) => v4.to_string(),
        Host::Ipv6(v6) => v6.to_string(),
    }
}

/// Allowlist entry match: exact (case-insensitive) or `*.suffix` for subdomains
pub fn host_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern
        .trim()
        .trim_end_matches('.')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    match pattern.strip_prefix("*.") {
        Some(suffix) if !suffix.is_empty() => {
            host.len() > suffix.len() + 1
                && host.ends_with(suffix)
                && host[..host.len() - suffix.len()].ends_with('.')
        }
        _ => pattern == host,
    }
}

fn check_address(address: IpAddr) -> Verdict {
    match non_public_class(address) {
        Some(class) => Verdict::deny(NetworkDenial::NonPublicAddress { address, class }),
        None => Verdict::Allow,
    }
}

pub fn is_public_address(address: IpAddr) -> bool {
    non_public_class(address).is_none()
}

/// The reserved range an address falls in, if any
pub fn non_public_class(address: IpAddr) -> Option<&'static str> {
    match address {
        IpAddr::V4(v4) => v4_class(v4),
        IpAddr::V6(v6) => v6_class(v6),
    }
}

fn v4_class(ip: Ipv4Addr) -> Option<&'static str> {
    let [a, b, c, _] = ip.octets();
    if a == 0 {
        Some("unspecified")
    } else if ip.is_loopback() {
        Some("loopback")
    } else if ip == Ipv4Addr::new(169, 254, 169, 254) {
        Some("a metadata service")
    } else if ip.is_link_local() {
        Some("link-local")
    } else if ip.is_private() {
        Some("private")
    } else if a == 100 && (64..128).contains(&b) {
        Some("shared (CGNAT)")
    } else if ip.is_broadcast() {
        Some("broadcast")
    } else if ip.is_multicast() {
        Some("multicast")
    } else if (a, b, c) == (192, 0, 2) || (a, b, c) == (198, 51, 100) || (a, b, c) == (203, 0, 113)
    {
        Some("documentation")
    } else if a == 198 && (b == 18 || b == 19) {
        Some("benchmarking")
    } else if (a, b, c) == (192, 0, 0) {
        Some("protocol assignment")
    } else if a >= 240 {
        Some("reserved")
    } else {
        None
    }
}

fn v6_class(ip: Ipv6Addr) -> Option<&'static str> {
    let segments = ip.segments();
    if ip.is_unspecified() {
        Some("unspecified")
    } else if ip.is_loopback() {
        Some("loopback")
    } else if ip.is_multicast() {
        Some("multicast")
    } else if segments[0] & 0xfe00 == 0xfc00 {
        Some("unique local")
    } else if segments[0] & 0xffc0 == 0xfe80 {
        Some("link-local")
    } else if segments[0] == 0x2001 && segments[1] == 0x0db8 {
        Some("documentation")
    } else if segments[..5] == [0, 0, 0, 0, 0] && segments[5] == 0xffff {
        Some("IPv4-mapped")
    } else if segments[..6] == [0, 0, 0, 0, 0, 0] {
        Some("IPv4-compatible")
    } else if segments[0] == 0x0064 && segments[1] == 0xff9b {
        // NAT64: judge by the embedded IPv4 address
        let [_, _, _, _, _, _, hi, lo] = segments;
        let embedded = Ipv4Addr::new((hi >> 8) as u8, hi as u8, (lo >> 8) as u8, lo as u8);
        v4_class(embedded)
    } else {
        None
    }
}

/// Running total of bytes received against a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteBudget {
    limit: u64,
    used: u64,
}

impl ByteBudget {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Record `bytes` more; fails as soon as the total passes the limit
    pub fn consume(&mut self, bytes: u64) -> Result<(), SecurityError> {
        self.used = self.used.saturating_add(bytes);
        if self.used > self.limit {
            log::warn!("remote fetch aborted past {} bytes", self.limit);
            return Err(NetworkDenial::SizeLimitExceeded { limit: self.limit }.into());
        }
        Ok(())
    }
}

/// `Read` adapter that errors once more than `limit` bytes come through
///
/// The error's inner value is the [`SecurityError`], recoverable with
/// `io::Error::get_ref` and `downcast_ref`.
pub struct CappedReader<R> {
    inner: R,
    budget: ByteBudget,
}

impl<R: Read> CappedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            budget: ByteBudget::new(limit),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CappedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Read one byte past the budget so an exact-size body still succeeds
        let window = (self.budget.remaining().saturating_add(1)).min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..window])?;
        self.budget
            .consume(n as u64)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_denies_everything() {
        let policy = NetworkFetchPolicy::default();
        assert!(policy.precheck_url("https://example.com/").is_denied());
        assert!(policy
            .check_resolved("https://example.com/", &[ip("93.184.216.34")])
            .is_denied());
    }

    #[test]
    fn test_empty_allowlist_denies() {
        let policy = NetworkFetchPolicy {
            allow: true,
            ..Default::default()
        };
        assert_eq!(
            policy.precheck_url("https://a.com/x"),
            Verdict::Deny(NetworkDenial::HostNotAllowed("a.com".into()).into())
        );
    }

    #[test]
    fn test_secure_transport() {
        let policy = NetworkFetchPolicy::allowing(["a.com"]);
        assert_eq!(
            policy.precheck_url("http://a.com/x"),
            Verdict::Deny(NetworkDenial::InsecureTransport.into())
        );
        assert!(policy.precheck_url("https://a.com/x").is_allowed());

        let relaxed = NetworkFetchPolicy {
            require_secure_transport: false,
            ..policy
        };
        assert!(relaxed.precheck_url("http://a.com/x").is_allowed());
        assert!(relaxed.precheck_url("ftp://a.com/x").is_denied());
    }

    #[test]
    fn test_allowlisted_name_resolving_to_loopback() {
        let policy = NetworkFetchPolicy::allowing(["a.com"]);
        let verdict = policy.check_resolved("https://a.com/x", &[ip("127.0.0.1")]);
        assert_eq!(
            verdict,
            Verdict::Deny(
                NetworkDenial::NonPublicAddress {
                    address: ip("127.0.0.1"),
                    class: "loopback"
                }
                .into()
            )
        );
        assert!(policy
            .check_resolved("https://a.com/x", &[ip("93.184.216.34")])
            .is_allowed());
        assert!(policy.check_resolved("https://a.com/x", &[]).is_denied());
        assert!(policy
            .check_resolved("https://a.com/x", &[ip("93.184.216.34"), ip("10.0.0.1")])
            .is_denied());
    }

    #[rstest]
    #[case("127.0.0.1")]
    #[case("10.1.2.3")]
    #[case("172.16.0.1")]
    #[case("192.168.1.1")]
    #[case("169.254.169.254")]
    #[case("169.254.1.1")]
    #[case("100.64.0.1")]
    #[case("0.0.0.0")]
    #[case("255.255.255.255")]
    #[case("224.0.0.1")]
    #[case("192.0.2.10")]
    #[case("::1")]
    #[case("::")]
    #[case("fc00::1")]
    #[case("fd00:ec2::254")]
    #[case("fe80::1")]
    #[case("::ffff:127.0.0.1")]
    #[case("::ffff:8.8.8.8")]
    #[case("64:ff9b::a00:1")]
    #[case("2001:db8::1")]
    fn test_non_public_addresses(#[case] addr: &str) {
        assert!(!is_public_address(ip(addr)), "{} should not be public", addr);
    }

    #[rstest]
    #[case("8.8.8.8")]
    #[case("93.184.216.34")]
    #[case("100.128.0.1")]
    #[case("2606:4700::1111")]
    #[case("64:ff9b::808:808")]
    fn test_public_addresses(#[case] addr: &str) {
        assert!(is_public_address(ip(addr)));
    }

    #[test]
    fn test_ip_literal_hosts() {
        let policy = NetworkFetchPolicy::allowing(["127.0.0.1", "::1", "8.8.8.8"]);
        assert!(policy.precheck_url("https://127.0.0.1/").is_denied());
        assert!(policy.precheck_url("https://[::1]/").is_denied());
        assert!(policy.precheck_url("https://8.8.8.8/").is_allowed());
    }

    #[rstest]
    #[case("a.com", "a.com", true)]
    #[case("A.COM", "a.com", true)]
    #[case("a.com", "b.a.com", false)]
    #[case("*.a.com", "b.a.com", true)]
    #[case("*.a.com", "c.b.a.com", true)]
    #[case("*.a.com", "a.com", false)]
    #[case("*.a.com", "evila.com", false)]
    #[case("*.", "a.com", false)]
    fn test_host_matching(#[case] pattern: &str, #[case] host: &str, #[case] expected: bool) {
        assert_eq!(host_matches(pattern, host), expected);
    }

    #[test]
    fn test_network_disabled_wins() {
        let policy = NetworkFetchPolicy {
            network_disabled: true,
            ..NetworkFetchPolicy::allowing(["a.com"])
        };
        assert_eq!(
            policy.precheck_url("https://a.com/"),
            Verdict::Deny(NetworkDenial::NetworkDisabled.into())
        );
    }

    #[test]
    fn test_redirect_hops() {
        let policy = NetworkFetchPolicy {
            max_redirects: 2,
            ..NetworkFetchPolicy::allowing(["a.com", "b.com"])
        };
        let public = [ip("93.184.216.34")];
        assert!(policy.check_redirect(2, "https://b.com/", &public).is_allowed());
        assert!(policy.check_redirect(3, "https://b.com/", &public).is_denied());
        assert!(policy.check_redirect(1, "https://c.com/", &public).is_denied());
    }

    #[test]
    fn test_byte_budget_aborts() {
        let mut budget = ByteBudget::new(10);
        assert!(budget.consume(6).is_ok());
        assert!(budget.consume(4).is_ok());
        assert_eq!(
            budget.consume(1),
            Err(SecurityError::Network(NetworkDenial::SizeLimitExceeded { limit: 10 }))
        );
    }

    #[test]
    fn test_capped_reader() {
        let data = vec![7u8; 32];
        let mut exact = CappedReader::new(&data[..], 32);
        let mut out = Vec::new();
        assert!(exact.read_to_end(&mut out).is_ok());
        assert_eq!(out.len(), 32);

        let mut capped = CappedReader::new(&data[..], 16);
        let mut out = Vec::new();
        let err = capped.read_to_end(&mut out).unwrap_err();
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<SecurityError>());
        assert!(matches!(
            inner,
            Some(SecurityError::Network(NetworkDenial::SizeLimitExceeded { limit: 16 }))
        ));
    }

    #[test]
    fn test_elapsed() {
        let policy = NetworkFetchPolicy {
            timeout_seconds: 1.0,
            ..Default::default()
        };
        assert!(policy.check_elapsed(Duration::from_millis(500)).is_ok());
        assert!(policy.check_elapsed(Duration::from_secs(2)).is_err());
    }

    #[test]
    fn test_out_of_range_timeouts_do_not_panic() {
        let huge = NetworkFetchPolicy {
            timeout_seconds: 1e300,
            ..Default::default()
        };
        assert_eq!(huge.timeout(), Duration::MAX);
        assert!(huge.check_elapsed(Duration::from_secs(1)).is_ok());

        for bad in [f64::NAN, f64::INFINITY, -3.0, 0.0] {
            let policy = NetworkFetchPolicy {
                timeout_seconds: bad,
                ..Default::default()
            };
            assert_eq!(policy.timeout(), Duration::from_secs(30));
        }
    }
}
