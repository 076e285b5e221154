//! Validation policies.

/// Which reserved ranges are fatal during validation.
///
/// Ranges that are never legitimate fetch targets (the unspecified address,
/// link-local space, cloud metadata endpoints, multicast, documentation and
/// benchmarking prefixes) are denied under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Deny every non-routable or reserved address. This is the default and
    /// the right choice for anything that fetches URLs on behalf of users.
    #[default]
    PublicOnly,

    /// Permit loopback, RFC 1918, CGNAT and unique-local targets, for
    /// pointing the fetcher at services on localhost or an internal network
    /// during development and tests. The always-denied ranges above still
    /// apply.
    AllowPrivate,
}
