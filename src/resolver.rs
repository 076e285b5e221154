//! DNS resolution behind an injectable seam.
//!
//! Native resolver facilities differ by platform and are the one piece of
//! I/O in validation, so they sit behind the [`Resolve`] trait. Production
//! code uses [`SystemResolver`]; tests and offline callers can supply a
//! [`StaticResolver`] or their own implementation.

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;

use crate::Error;

/// Resolve a hostname to the full set of addresses it maps to.
///
/// Implementations must return every address, not just the first: the
/// validator classifies all of them, and a hostname is only safe when none
/// of its addresses is reserved.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolve `host` to its addresses.
    ///
    /// # Errors
    ///
    /// [`Error::ResolutionFailed`] when the lookup fails. An empty `Ok`
    /// result is treated as a failure by the validator as well.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, Error>;
}

/// The system DNS resolver (A records with AAAA fallback).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| Error::resolution_failed(host, e.to_string()))?
            .build();

        let response = resolver
            .lookup_ip(host)
            .await
            .map_err(|e| Error::resolution_failed(host, e.to_string()))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(Error::resolution_failed(host, "no addresses found"));
        }

        Ok(ips)
    }
}

/// A fixed-table resolver.
///
/// Useful in tests and in environments where the set of reachable hosts is
/// known ahead of time. Lookups are case-insensitive; hosts absent from the
/// table fail with [`Error::ResolutionFailed`].
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    table: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping from `host` to `ips`.
    pub fn with(mut self, host: &str, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.table
            .insert(host.to_lowercase(), ips.into_iter().collect());
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        self.table
            .get(&host.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::resolution_failed(host, "name not found"))
    }
}
