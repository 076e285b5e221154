//! URL validation with DNS resolution.

use std::net::{IpAddr, SocketAddr};

use tracing::{debug, warn};
use url::Url;

use crate::blocklist::{denied_hostname, deny_reason};
use crate::resolver::{Resolve, SystemResolver};
use crate::safe_url::{HostKind, SafeUrl};
use crate::{Error, Policy};

/// Result of successful URL validation.
#[derive(Debug, Clone)]
pub struct Validated {
    /// The first verified IP address; the fetch layer pins plain-http
    /// connections to it.
    pub ip: IpAddr,

    /// Normalized hostname (use for the `Host` header / SNI).
    pub host: String,

    /// Port number.
    pub port: u16,

    /// Whether HTTPS.
    pub https: bool,

    /// The parsed, normalized URL.
    pub url: Url,
}

impl Validated {
    /// The socket address to connect to.
    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// Validate a URL with the system DNS resolver.
///
/// This is the primary entry point for SSRF protection. It:
/// 1. Parses and normalizes the URL (scheme allow-list, no userinfo)
/// 2. Classifies the hostname shape from the raw text
/// 3. For literals, classifies the address directly with no DNS
/// 4. For names, checks the hostname denylist, resolves, and classifies
///    every returned address
///
/// The result is only good for the moment of the call. Do not cache it
/// across requests: a hostname validated once can later re-resolve to a
/// private address (DNS rebinding). [`fetch`](crate::fetch) re-validates at
/// every redirect hop for the same reason.
///
/// # Errors
///
/// Returns an error if the URL is malformed or uses a forbidden scheme, the
/// hostname is denied, resolution fails or returns no records, or any
/// literal or resolved address falls in a reserved range.
pub async fn validate(url: &str, policy: Policy) -> Result<Validated, Error> {
    validate_with(url, policy, &SystemResolver).await
}

/// Validate a URL with a caller-supplied resolver.
pub async fn validate_with(
    url: &str,
    policy: Policy,
    resolver: &dyn Resolve,
) -> Result<Validated, Error> {
    let safe = SafeUrl::parse(url)?;

    let ip = match safe.kind() {
        HostKind::Ipv4(addr) => check_literal(url, IpAddr::V4(*addr), policy)?,
        HostKind::Ipv6(addr) => check_literal(url, IpAddr::V6(*addr), policy)?,
        HostKind::Name => {
            let host = safe.host();

            if let Some(denied) = denied_hostname(host) {
                warn!(host, "denied hostname");
                return Err(Error::hostname_denied(
                    host,
                    format!("hostname '{}' is a known metadata endpoint", denied),
                ));
            }

            debug!(host, "resolving hostname");
            let ips = resolver.resolve(host).await?;
            if ips.is_empty() {
                return Err(Error::resolution_failed(host, "no addresses found"));
            }

            // Every address must be safe, not just the one we connect to.
            for &ip in &ips {
                if let Some(reason) = deny_reason(ip, policy) {
                    warn!(host, %ip, reason, "resolved address denied");
                    return Err(Error::private_ip_denied(url, ip, reason));
                }
            }

            ips[0]
        }
    };

    Ok(Validated {
        ip,
        host: safe.host().to_string(),
        port: safe.port(),
        https: safe.is_https(),
        url: safe.into_url(),
    })
}

/// Synchronous version of [`validate`].
///
/// Blocks the current thread while performing DNS resolution; prefer the
/// async version when possible. Works both inside and outside of a Tokio
/// runtime (a temporary one is created when needed).
pub fn validate_sync(url: &str, policy: Policy) -> Result<Validated, Error> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(validate(url, policy)))
    } else {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| Error::resolution_failed("runtime", e.to_string()))?;
        rt.block_on(validate(url, policy))
    }
}

fn check_literal(url: &str, ip: IpAddr, policy: Policy) -> Result<IpAddr, Error> {
    if let Some(reason) = deny_reason(ip, policy) {
        warn!(%ip, reason, "literal address denied");
        return Err(Error::private_ip_denied(url, ip, reason));
    }
    Ok(ip)
}
