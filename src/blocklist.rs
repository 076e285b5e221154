//! Reserved-range classification for IP addresses, plus the hostname denylist.
//!
//! Classification is by prefix, never by string match: attackers vary the
//! textual form of an address, so the checks operate on parsed
//! [`IpAddr`] values and the caller is responsible for normalization
//! (see [`crate::SafeUrl`]).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::Policy;

/// Hostnames that are always denied (checked before DNS resolution).
const DENIED_HOSTNAMES: &[&str] = &[
    "metadata.google.internal",
    "metadata.goog",
    "metadata.azure.internal",
    "instance-data", // AWS alternate (EC2-Classic)
];

/// Check if a hostname is on the always-deny list.
///
/// Matches the hostname itself and any subdomain of it, case-insensitively.
pub(crate) fn denied_hostname(host: &str) -> Option<&'static str> {
    let host_lower = host.to_lowercase();
    for &denied in DENIED_HOSTNAMES {
        if host_lower == denied || host_lower.ends_with(&format!(".{}", denied)) {
            return Some(denied);
        }
    }
    None
}

/// Return true iff the address is non-routable from the public internet or
/// otherwise reserved such that a server should never be tricked into
/// contacting it on a caller's behalf.
///
/// Pure and synchronous; no I/O, no state. IPv4-mapped IPv6 addresses are
/// classified by the rules for the embedded IPv4 address, so
/// `::ffff:127.0.0.1` and `127.0.0.1` classify identically.
pub fn is_private_ip(ip: IpAddr) -> bool {
    deny_reason(ip, Policy::PublicOnly).is_some()
}

/// Policy-aware deny check. Returns the name of the matched range, for error
/// messages, or `None` when the address is an acceptable target.
pub(crate) fn deny_reason(ip: IpAddr, policy: Policy) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => deny_reason_v4(v4, policy),
        IpAddr::V6(v6) => deny_reason_v6(v6, policy),
    }
}

fn deny_reason_v4(ip: Ipv4Addr, policy: Policy) -> Option<&'static str> {
    let o = ip.octets();

    // Denied under every policy.
    if o[0] == 0 {
        return Some("this-network (0.0.0.0/8)");
    }
    if ip == Ipv4Addr::new(169, 254, 169, 254) || ip == Ipv4Addr::new(100, 100, 100, 200) {
        return Some("cloud metadata endpoint");
    }
    if ip.is_link_local() {
        return Some("link-local (169.254.0.0/16)");
    }
    if o[0] == 192 && o[1] == 0 && o[2] == 0 {
        return Some("IETF protocol assignments (192.0.0.0/24)");
    }
    if o[0] == 192 && o[1] == 0 && o[2] == 2 {
        return Some("documentation (192.0.2.0/24)");
    }
    if o[0] == 192 && o[1] == 88 && o[2] == 99 {
        return Some("6to4 relay anycast (192.88.99.0/24)");
    }
    if o[0] == 198 && (o[1] & 0xfe) == 18 {
        return Some("benchmarking (198.18.0.0/15)");
    }
    if o[0] == 198 && o[1] == 51 && o[2] == 100 {
        return Some("documentation (198.51.100.0/24)");
    }
    if o[0] == 203 && o[1] == 0 && o[2] == 113 {
        return Some("documentation (203.0.113.0/24)");
    }
    if (224..=239).contains(&o[0]) {
        return Some("multicast (224.0.0.0/4)");
    }
    if ip.is_broadcast() {
        return Some("limited broadcast (255.255.255.255)");
    }
    if o[0] >= 240 {
        return Some("reserved (240.0.0.0/4)");
    }

    if policy == Policy::AllowPrivate {
        return None;
    }

    if ip.is_loopback() {
        return Some("loopback (127.0.0.0/8)");
    }
    if ip.is_private() {
        return Some("private (RFC 1918)");
    }
    if o[0] == 100 && (o[1] & 0xc0) == 64 {
        return Some("shared address space / CGNAT (100.64.0.0/10)");
    }

    None
}

fn deny_reason_v6(ip: Ipv6Addr, policy: Policy) -> Option<&'static str> {
    if ip.is_unspecified() {
        return Some("unspecified (::)");
    }

    // ::1 before any IPv4-embedding checks.
    if ip.is_loopback() {
        return match policy {
            Policy::PublicOnly => Some("loopback (::1)"),
            Policy::AllowPrivate => None,
        };
    }

    // IPv4-mapped (::ffff:a.b.c.d): classify by the embedded IPv4 rules.
    if let Some(v4) = ip.to_ipv4_mapped() {
        return deny_reason_v4(v4, policy);
    }

    let seg = ip.segments();

    // Deprecated IPv4-compatible form (::a.b.c.d) still embeds a routable
    // IPv4 address in the low 32 bits.
    if seg[0..6] == [0, 0, 0, 0, 0, 0] && (seg[6] != 0 || seg[7] > 1) {
        let v4 = Ipv4Addr::new(
            (seg[6] >> 8) as u8,
            seg[6] as u8,
            (seg[7] >> 8) as u8,
            seg[7] as u8,
        );
        return deny_reason_v4(v4, policy);
    }

    if (seg[0] & 0xffc0) == 0xfe80 {
        return Some("link-local (fe80::/10)");
    }
    if seg[0] == 0x64 && seg[1] == 0xff9b && seg[2..6] == [0, 0, 0, 0] {
        return Some("NAT64 translation (64:ff9b::/96)");
    }
    if seg[0] == 0x2001 && seg[1] == 0x0db8 {
        return Some("documentation (2001:db8::/32)");
    }
    if seg[0] == 0x2002 {
        return Some("6to4 (2002::/16)");
    }
    // AWS IPv6 metadata endpoint, denied under every policy.
    if seg == [0xfd00, 0x0ec2, 0, 0, 0, 0, 0, 0x0254] {
        return Some("cloud metadata endpoint");
    }

    if policy == Policy::AllowPrivate {
        return None;
    }

    if (seg[0] & 0xfe00) == 0xfc00 {
        return Some("unique local (fc00::/7)");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private(s: &str) -> bool {
        is_private_ip(s.parse().unwrap())
    }

    // ==================== IPv4 range representatives ====================

    #[test]
    fn test_ipv4_reserved_ranges_are_private() {
        for ip in [
            "0.0.0.0",
            "0.255.0.1",
            "10.0.0.1",
            "100.64.0.1",
            "127.0.0.1",
            "169.254.1.1",
            "172.16.0.1",
            "192.0.0.1",
            "192.0.2.1",
            "192.88.99.1",
            "192.168.0.1",
            "198.18.0.1",
            "198.19.255.255",
            "198.51.100.1",
            "203.0.113.1",
            "224.0.0.1",
            "240.0.0.1",
            "255.255.255.255",
        ] {
            assert!(private(ip), "{ip} should classify as private");
        }
    }

    #[test]
    fn test_ipv4_public_addresses() {
        for ip in ["8.8.8.8", "1.1.1.1", "93.184.216.34", "198.20.0.1"] {
            assert!(!private(ip), "{ip} should classify as public");
        }
    }

    // ==================== IPv6 range representatives ====================

    #[test]
    fn test_ipv6_reserved_ranges_are_private() {
        for ip in [
            "::",
            "::1",
            "0:0:0:0:0:0:0:1",
            "0000:0000:0000:0000:0000:0000:0000:0001",
            "fc00::1",
            "fd12:3456:789a::1",
            "fe80::1",
            "fe80::ffff:ffff:ffff:ffff",
            "::ffff:127.0.0.1",
            "64:ff9b::8.8.8.8",
            "2001:db8::1",
            "2002::1",
        ] {
            assert!(private(ip), "{ip} should classify as private");
        }
    }

    #[test]
    fn test_ipv6_public_addresses() {
        assert!(!private("2001:4860:4860::8888"));
        assert!(!private("2606:4700:4700::1111"));
    }

    // ==================== IPv4-mapped recursion ====================

    #[test]
    fn test_mapped_classifies_like_embedded_ipv4() {
        for (mapped, plain) in [
            ("::ffff:127.0.0.1", "127.0.0.1"),
            ("::ffff:7f00:1", "127.0.0.1"),
            ("::ffff:10.0.0.1", "10.0.0.1"),
            ("::ffff:172.16.0.1", "172.16.0.1"),
            ("::ffff:192.168.0.1", "192.168.0.1"),
            ("::ffff:169.254.169.254", "169.254.169.254"),
            ("::ffff:8.8.8.8", "8.8.8.8"),
        ] {
            assert_eq!(private(mapped), private(plain), "{mapped} vs {plain}");
        }
    }

    #[test]
    fn test_ipv4_compatible_embedding() {
        assert!(private("::127.0.0.1"));
        assert!(private("::169.254.169.254"));
    }

    // ==================== Range boundaries ====================

    #[test]
    fn test_rfc1918_boundaries() {
        assert!(private("10.0.0.0"));
        assert!(private("10.255.255.255"));
        assert!(!private("9.255.255.255"));
        assert!(!private("11.0.0.0"));

        assert!(private("172.16.0.0"));
        assert!(private("172.31.255.255"));
        assert!(!private("172.15.255.255"));
        assert!(!private("172.32.0.0"));

        assert!(private("192.168.0.0"));
        assert!(private("192.168.255.255"));
        assert!(!private("192.167.255.255"));
        assert!(!private("192.169.0.0"));
    }

    #[test]
    fn test_cgnat_boundaries() {
        assert!(private("100.64.0.0"));
        assert!(private("100.127.255.255"));
        assert!(!private("100.63.255.255"));
        assert!(!private("100.128.0.0"));
    }

    #[test]
    fn test_benchmarking_boundaries() {
        assert!(private("198.18.0.0"));
        assert!(private("198.19.255.255"));
        assert!(!private("198.17.255.255"));
        assert!(!private("198.20.0.0"));
    }

    #[test]
    fn test_multicast_and_reserved_boundaries() {
        assert!(!private("223.255.255.255"));
        assert!(private("224.0.0.0"));
        assert!(private("239.255.255.255"));
        assert!(private("240.0.0.0"));
        assert!(private("255.255.255.254"));
    }

    #[test]
    fn test_ula_boundaries() {
        assert!(private("fc00::"));
        assert!(private("fdff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"));
        assert!(!private("fbff::1"));
        assert!(!private("fe00::1"));
    }

    // ==================== Policy behaviour ====================

    #[test]
    fn test_allow_private_permits_internal_ranges() {
        let allow = Policy::AllowPrivate;
        assert!(deny_reason("127.0.0.1".parse().unwrap(), allow).is_none());
        assert!(deny_reason("::1".parse().unwrap(), allow).is_none());
        assert!(deny_reason("10.1.2.3".parse().unwrap(), allow).is_none());
        assert!(deny_reason("192.168.1.1".parse().unwrap(), allow).is_none());
        assert!(deny_reason("100.64.0.1".parse().unwrap(), allow).is_none());
        assert!(deny_reason("fd00::1".parse().unwrap(), allow).is_none());
    }

    #[test]
    fn test_allow_private_still_denies_hard_ranges() {
        let allow = Policy::AllowPrivate;
        for ip in [
            "0.0.0.0",
            "169.254.169.254",
            "169.254.1.1",
            "100.100.100.200",
            "224.0.0.1",
            "240.0.0.1",
            "255.255.255.255",
            "::",
            "fe80::1",
            "fd00:ec2::254",
            "2001:db8::1",
        ] {
            assert!(
                deny_reason(ip.parse().unwrap(), allow).is_some(),
                "{ip} should stay denied under AllowPrivate"
            );
        }
    }

    // ==================== Metadata endpoints ====================

    #[test]
    fn test_metadata_endpoints_always_denied() {
        for ip in ["169.254.169.254", "100.100.100.200", "fd00:ec2::254"] {
            let addr: IpAddr = ip.parse().unwrap();
            assert_eq!(
                deny_reason(addr, Policy::PublicOnly),
                Some("cloud metadata endpoint")
            );
            assert!(deny_reason(addr, Policy::AllowPrivate).is_some());
        }
        // Mapped form of the metadata address too.
        assert!(private("::ffff:169.254.169.254"));
    }

    #[test]
    fn test_deny_reason_names_the_range() {
        let reason = deny_reason("127.0.0.1".parse().unwrap(), Policy::PublicOnly);
        assert_eq!(reason, Some("loopback (127.0.0.0/8)"));
    }

    // ==================== Hostname denylist ====================

    #[test]
    fn test_hostname_denylist() {
        assert!(denied_hostname("metadata.google.internal").is_some());
        assert!(denied_hostname("METADATA.GOOGLE.INTERNAL").is_some());
        assert!(denied_hostname("sub.metadata.google.internal").is_some());
        assert!(denied_hostname("metadata.azure.internal").is_some());
        assert!(denied_hostname("instance-data").is_some());
        assert!(denied_hostname("example.com").is_none());
        assert!(denied_hostname("notmetadata.goog.example.com").is_none());
    }
}
