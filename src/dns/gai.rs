//! System DNS resolver using getaddrinfo.
//!
//! This resolver uses the operating system's native DNS resolution via
//! `getaddrinfo`, executed in a thread pool to avoid blocking the async runtime.
//! It is the last resort of every resolution chain in this crate, so it also
//! handles IP literals without touching the OS.
//!
//! # Result ordering
//!
//! Results are ordered according to the process-wide
//! [`DnsResultOrder`](crate::config::DnsResultOrder) (see
//! [`runtime::default_result_order`]) unless the resolver was built with an
//! explicit order.

use super::{
    AddressRecord, Addrs, Looking, Lookup, LookupOptions, LookupOutcome, Name, Resolve, Resolving,
};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::config::DnsResultOrder;
use crate::runtime;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// System DNS resolver using `getaddrinfo` in a thread pool.
///
/// This resolver wraps the standard library's `ToSocketAddrs` trait and
/// executes resolution in `tokio::task::spawn_blocking` to avoid blocking
/// the async runtime.
///
/// # Performance
///
/// Each resolution spawns a blocking task. For high-throughput scenarios,
/// consider using `HickoryResolver` which is fully async.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver {
    order: Option<DnsResultOrder>,
}

impl GaiResolver {
    /// Creates a new `GaiResolver` following the process result order.
    pub fn new() -> Self {
        Self { order: None }
    }

    /// Creates a resolver that always applies `order`.
    pub fn with_order(order: DnsResultOrder) -> Self {
        Self { order: Some(order) }
    }

    fn effective_order(&self) -> DnsResultOrder {
        self.order.unwrap_or_else(runtime::default_result_order)
    }
}

async fn getaddrinfo(name: &Name) -> Result<Vec<IpAddr>, NetError> {
    if let Some(ip) = name.as_ip() {
        return Ok(vec![ip]);
    }

    let host = name.as_str().to_string();
    let domain = host.clone();

    let result = tokio::task::spawn_blocking(move || {
        tracing::debug!(host = %host, "resolving via getaddrinfo");
        (host.as_str(), 0u16).to_socket_addrs().map(|iter| iter.collect::<Vec<_>>())
    })
    .await;

    // Handle task join error (cancellation, panic)
    let addrs = result
        .map_err(|e| {
            tracing::error!(error = %e, "DNS resolution task failed");
            NetError::NameNotResolved
        })?
        .dns_context(&domain)?;

    let mut ips: Vec<IpAddr> = Vec::with_capacity(addrs.len());
    for addr in addrs {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }
    Ok(ips)
}

/// Moves IPv4 records in front of IPv6 ones for `Ipv4First`, keeping the
/// relative order inside each family.
pub(crate) fn apply_result_order(records: &mut [AddressRecord], order: DnsResultOrder) {
    if order == DnsResultOrder::Ipv4First {
        records.sort_by_key(|r| r.address.is_ipv6());
    }
}

impl Lookup for GaiResolver {
    fn lookup(&self, name: Name, options: LookupOptions) -> Looking {
        let order = self.effective_order();
        Box::pin(async move {
            let mut records: Vec<AddressRecord> =
                getaddrinfo(&name).await?.into_iter().map(AddressRecord::new).collect();

            if let Some(family) = options.family {
                records.retain(|r| r.family == family);
            }
            apply_result_order(&mut records, order);

            if records.is_empty() {
                tracing::debug!(domain = %name, "getaddrinfo returned no usable addresses");
                return Err(NetError::dns_failed(
                    name.as_str(),
                    "No addresses returned by getaddrinfo",
                ));
            }

            tracing::debug!(domain = %name, count = records.len(), %order, "system lookup complete");
            if options.all {
                Ok(LookupOutcome::All(records))
            } else {
                Ok(LookupOutcome::Single(records[0]))
            }
        })
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let lookup = self.lookup(name, LookupOptions::all());
        Box::pin(async move {
            let addrs: Vec<SocketAddr> =
                lookup.await?.into_records().iter().map(|r| r.socket_addr(0)).collect();
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::AddressFamily;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn records(ips: &[&str]) -> Vec<AddressRecord> {
        ips.iter().map(|ip| AddressRecord::new(ip.parse().unwrap())).collect()
    }

    #[test]
    fn test_ipv4first_is_stable() {
        let mut list = records(&["::1", "10.0.0.1", "::2", "10.0.0.2"]);
        apply_result_order(&mut list, DnsResultOrder::Ipv4First);

        assert_eq!(list, records(&["10.0.0.1", "10.0.0.2", "::1", "::2"]));
    }

    #[test]
    fn test_verbatim_keeps_order() {
        let mut list = records(&["::1", "10.0.0.1"]);
        apply_result_order(&mut list, DnsResultOrder::Verbatim);

        assert_eq!(list, records(&["::1", "10.0.0.1"]));
    }

    #[tokio::test]
    async fn test_literal_ipv4_skips_os() {
        let resolver = GaiResolver::with_order(DnsResultOrder::Verbatim);
        let outcome = resolver.lookup(Name::new("127.0.0.1"), LookupOptions::single()).await;

        assert_eq!(
            outcome.unwrap(),
            LookupOutcome::Single(AddressRecord::from(Ipv4Addr::LOCALHOST))
        );
    }

    #[tokio::test]
    async fn test_literal_ipv6_all() {
        let resolver = GaiResolver::with_order(DnsResultOrder::Verbatim);
        let outcome = resolver.lookup(Name::new("[::1]"), LookupOptions::all()).await;

        assert_eq!(
            outcome.unwrap(),
            LookupOutcome::All(vec![AddressRecord::from(Ipv6Addr::LOCALHOST)])
        );
    }

    #[tokio::test]
    async fn test_family_filter_can_empty_result() {
        let resolver = GaiResolver::new();
        let result = resolver
            .lookup(Name::new("127.0.0.1"), LookupOptions::all().with_family(AddressFamily::V6))
            .await;

        assert!(matches!(result, Err(NetError::NameNotResolvedFor { .. })));
    }

    #[tokio::test]
    async fn test_gai_resolver_localhost() {
        let resolver = GaiResolver::new();
        let result = resolver.resolve(Name::new("localhost")).await;

        // localhost should always resolve
        assert!(result.is_ok());
        let addrs: Vec<_> = result.unwrap().collect();
        assert!(!addrs.is_empty());
    }
}
