//! Error types for fetchguard.

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during URL validation and safe fetching.
///
/// Every variant is a hard failure: nothing is retried internally and no
/// validation failure is ever downgraded to "assume safe".
#[derive(Debug, Error)]
pub enum Error {
    /// URL is malformed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Scheme is not http or https.
    #[error("invalid protocol '{scheme}': only http and https are allowed")]
    InvalidProtocol { url: String, scheme: String },

    /// A literal or resolved address falls in a reserved range.
    ///
    /// The offending IP is part of the message so operators can see what the
    /// caller actually targeted.
    #[error("access to private IP {ip} is denied: {reason}")]
    PrivateIpDenied {
        url: String,
        ip: IpAddr,
        reason: &'static str,
    },

    /// Hostname is on the always-deny list (cloud metadata endpoints).
    #[error("access to hostname '{host}' is denied: {reason}")]
    HostnameDenied { host: String, reason: String },

    /// DNS lookup failed or returned zero records.
    #[error("failed to resolve hostname '{host}': {message}")]
    ResolutionFailed { host: String, message: String },

    /// A `Location` header could not be resolved into an absolute URL.
    #[error("invalid redirect URL '{location}': {reason}")]
    InvalidRedirectUrl { location: String, reason: String },

    /// Redirect chain exceeded the configured ceiling.
    #[error("too many redirects (max {max})")]
    TooManyRedirects { url: String, max: u32 },

    /// Response body exceeded the configured byte ceiling.
    #[error("response too large: body exceeded {limit} bytes")]
    ResponseTooLarge { url: String, limit: usize },

    /// A hop did not complete within the configured timeout.
    #[error("request to '{url}' timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Underlying transport failure (connect, TLS, read).
    #[error("transport error for '{url}': {message}")]
    Transport { url: String, message: String },
}

impl Error {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_protocol(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::InvalidProtocol {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    pub(crate) fn private_ip_denied(
        url: impl Into<String>,
        ip: IpAddr,
        reason: &'static str,
    ) -> Self {
        Self::PrivateIpDenied {
            url: url.into(),
            ip,
            reason,
        }
    }

    pub(crate) fn hostname_denied(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HostnameDenied {
            host: host.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resolution_failed(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            host: host.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_redirect(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRedirectUrl {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}
