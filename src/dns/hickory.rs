//! Async DNS resolver using hickory-dns.
//!
//! This resolver provides fully async DNS resolution with support for:
//! - Per-family record queries (A / AAAA) via [`RecordResolve`]
//! - System DNS configuration auto-detection
//! - Dual-stack lookups via [`Resolve`]
//!
//! The record queries talk to the configured name servers directly and
//! never go through getaddrinfo, which is what makes them useful when the
//! OS resolver misbehaves.

use super::{Addrs, Name, Querying, RecordResolve, Resolve, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::LazyLock,
};

/// Async DNS resolver backed by hickory-dns.
///
/// This resolver is lazily initialized on first use and shared across
/// all instances via a static `LazyLock`. It automatically configures
/// itself based on the system's DNS settings.
///
/// # Example
///
/// ```rust,ignore
/// use dualnet::dns::{HickoryResolver, Name, RecordResolve};
///
/// let resolver = HickoryResolver::new();
/// let v4 = resolver.resolve4(&Name::new("example.com")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: &'static LazyLock<TokioResolver>,
}

impl HickoryResolver {
    /// Creates a new `HickoryResolver`.
    ///
    /// The underlying resolver is lazily initialized on first DNS query.
    /// It will attempt to read system DNS configuration; if that fails,
    /// it falls back to sensible defaults.
    pub fn new() -> Self {
        static RESOLVER: LazyLock<TokioResolver> = LazyLock::new(|| {
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };

            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

            builder.build()
        });

        Self {
            resolver: &RESOLVER,
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordResolve for HickoryResolver {
    fn resolve4(&self, name: &Name) -> Querying<Ipv4Addr> {
        let resolver = self.resolver;
        let name = name.clone();
        Box::pin(async move {
            let lookup = resolver.ipv4_lookup(name.as_str()).await.map_err(|e| {
                tracing::debug!(domain = %name, error = %e, "A query failed");
                NetError::dns_failed(name.as_str(), e)
            })?;
            Ok(lookup.iter().map(|a| a.0).collect())
        })
    }

    fn resolve6(&self, name: &Name) -> Querying<Ipv6Addr> {
        let resolver = self.resolver;
        let name = name.clone();
        Box::pin(async move {
            let lookup = resolver.ipv6_lookup(name.as_str()).await.map_err(|e| {
                tracing::debug!(domain = %name, error = %e, "AAAA query failed");
                NetError::dns_failed(name.as_str(), e)
            })?;
            Ok(lookup.iter().map(|aaaa| aaaa.0).collect())
        })
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let domain = name.as_str();
            tracing::debug!(domain = %domain, "resolving via hickory-dns");

            let lookup = resolver
                .resolver
                .lookup_ip(domain)
                .await
                .map_err(|e| {
                    tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                    NetError::dns_failed(domain, e)
                })?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();

            if addrs.is_empty() {
                return Err(NetError::dns_failed(domain, "No addresses returned"));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "hickory-dns resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
