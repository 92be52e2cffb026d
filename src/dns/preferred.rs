//! IPv4-preferring dual-family resolver.
//!
//! Networks that advertise IPv6 without routing it are common enough that
//! connecting to the first AAAA record can hang a request. This resolver
//! asks for A records through [`RecordResolve`] first and only falls back
//! to the system lookup when that produces nothing.
//!
//! # Single mode
//!
//! One A query. The first returned address wins; otherwise the system
//! lookup runs with the caller's options untouched.
//!
//! # All mode
//!
//! A and AAAA queries run concurrently. Once the A query has produced at
//! least one address a [`GRACE_PERIOD`] timer is armed, giving the AAAA
//! query a short chance to finish; when it fires the result is built from
//! whatever arrived. An AAAA answer alone never triggers delivery: the A
//! outcome is always awaited. If neither query produced an address, the
//! system lookup decides the outcome.
//!
//! IP literals skip the record queries in both modes and go straight to
//! the system lookup.

use super::{
    AddressRecord, Addrs, GaiResolver, Looking, Lookup, LookupOptions, LookupOutcome, Name,
    RecordResolve, Resolve, Resolving,
};
use crate::base::neterror::NetError;
use crate::dns::HickoryResolver;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// How long all-mode waits for AAAA answers once A answers are in.
pub const GRACE_PERIOD: Duration = Duration::from_millis(50);

/// Dual-family resolver preferring IPv4.
///
/// Cheap to clone; the record resolver and system lookup are shared.
#[derive(Clone)]
pub struct Ipv4PreferredResolver {
    records: Arc<dyn RecordResolve>,
    system: Arc<dyn Lookup>,
    grace_period: Duration,
}

impl Ipv4PreferredResolver {
    /// Hickory record queries with getaddrinfo as fallback.
    pub fn new() -> Self {
        Self::with_resolvers(Arc::new(HickoryResolver::new()), Arc::new(GaiResolver::new()))
    }

    /// Build from explicit collaborators.
    pub fn with_resolvers(records: Arc<dyn RecordResolve>, system: Arc<dyn Lookup>) -> Self {
        Self { records, system, grace_period: GRACE_PERIOD }
    }

    async fn lookup_single(&self, name: Name, options: LookupOptions) -> Result<LookupOutcome, NetError> {
        match self.records.resolve4(&name).await {
            Ok(addrs) if !addrs.is_empty() => {
                tracing::debug!(domain = %name, address = %addrs[0], "A query answered");
                return Ok(LookupOutcome::Single(AddressRecord::from(addrs[0])));
            }
            Ok(_) => tracing::debug!(domain = %name, "A query returned no records"),
            Err(e) => tracing::debug!(domain = %name, error = %e, "A query failed"),
        }

        tracing::debug!(domain = %name, "falling back to system lookup");
        self.system.lookup(name, options).await
    }

    async fn lookup_all(&self, name: Name, options: LookupOptions) -> Result<LookupOutcome, NetError> {
        let mut state = QueryState::default();
        let mut v4 = self.records.resolve4(&name);
        let mut v6 = self.records.resolve6(&name);

        let grace = sleep(self.grace_period);
        tokio::pin!(grace);
        let mut grace_armed = false;

        loop {
            tokio::select! {
                result = &mut v4, if !state.v4_done => {
                    state.v4_addrs = addresses_or_empty(&name, "A", result);
                    state.v4_done = true;
                }
                result = &mut v6, if !state.v6_done => {
                    state.v6_addrs = addresses_or_empty(&name, "AAAA", result);
                    state.v6_done = true;
                }
                () = &mut grace, if grace_armed => {
                    tracing::debug!(
                        domain = %name,
                        v6_done = state.v6_done,
                        "grace period elapsed, delivering accumulated addresses"
                    );
                    break;
                }
                else => break,
            }

            if state.v4_done && state.v6_done {
                break;
            }
            if state.v4_done && !state.v4_addrs.is_empty() && !grace_armed {
                grace.as_mut().reset(Instant::now() + self.grace_period);
                grace_armed = true;
            }
        }

        // Returning drops the outstanding query and the timer, so nothing
        // after this point can deliver a second result.
        let records = state.combine();
        if records.is_empty() {
            tracing::debug!(domain = %name, "no A/AAAA records, falling back to system lookup");
            return self.system.lookup(name, options).await;
        }

        tracing::debug!(domain = %name, count = records.len(), "dual-family lookup complete");
        Ok(LookupOutcome::All(records))
    }
}

impl Default for Ipv4PreferredResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ipv4PreferredResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4PreferredResolver")
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct QueryState {
    v4_done: bool,
    v6_done: bool,
    v4_addrs: Vec<Ipv4Addr>,
    v6_addrs: Vec<Ipv6Addr>,
}

impl QueryState {
    fn combine(self) -> Vec<AddressRecord> {
        self.v4_addrs
            .into_iter()
            .map(AddressRecord::from)
            .chain(self.v6_addrs.into_iter().map(AddressRecord::from))
            .collect()
    }
}

fn addresses_or_empty<T>(name: &Name, kind: &str, result: Result<Vec<T>, NetError>) -> Vec<T> {
    match result {
        Ok(addrs) => {
            tracing::debug!(domain = %name, kind, count = addrs.len(), "record query complete");
            addrs
        }
        Err(e) => {
            tracing::debug!(domain = %name, kind, error = %e, "record query failed");
            Vec::new()
        }
    }
}

impl Lookup for Ipv4PreferredResolver {
    fn lookup(&self, name: Name, options: LookupOptions) -> Looking {
        let resolver = self.clone();
        Box::pin(async move {
            // IP literals are never sent to name servers.
            if name.as_ip().is_some() {
                return resolver.system.lookup(name, options).await;
            }
            if options.all {
                resolver.lookup_all(name, options).await
            } else {
                resolver.lookup_single(name, options).await
            }
        })
    }
}

impl Resolve for Ipv4PreferredResolver {
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
    use crate::dns::{AddressFamily, Querying};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with fixed lists after fixed delays; `None` never completes.
    struct ScriptedRecords {
        v4: Option<(u64, Result<Vec<Ipv4Addr>, NetError>)>,
        v6: Option<(u64, Result<Vec<Ipv6Addr>, NetError>)>,
    }

    fn scripted<T: Clone + Send + 'static>(
        script: &Option<(u64, Result<Vec<T>, NetError>)>,
    ) -> Querying<T> {
        match script.clone() {
            Some((delay, result)) => Box::pin(async move {
                sleep(Duration::from_millis(delay)).await;
                result
            }),
            None => Box::pin(std::future::pending()),
        }
    }

    impl RecordResolve for ScriptedRecords {
        fn resolve4(&self, _name: &Name) -> Querying<Ipv4Addr> {
            scripted(&self.v4)
        }

        fn resolve6(&self, _name: &Name) -> Querying<Ipv6Addr> {
            scripted(&self.v6)
        }
    }

    struct CountingSystem {
        calls: AtomicUsize,
        outcome: Result<LookupOutcome, NetError>,
    }

    impl Lookup for CountingSystem {
        fn lookup(&self, _name: Name, _options: LookupOptions) -> Looking {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcome.clone();
            Box::pin(async move { outcome })
        }
    }

    fn resolver(records: ScriptedRecords, system: Arc<CountingSystem>) -> Ipv4PreferredResolver {
        Ipv4PreferredResolver::with_resolvers(Arc::new(records), system)
    }

    fn system(outcome: Result<LookupOutcome, NetError>) -> Arc<CountingSystem> {
        Arc::new(CountingSystem { calls: AtomicUsize::new(0), outcome })
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_mode_does_not_query_aaaa() {
        let sys = system(Err(NetError::NameNotResolved));
        let resolver = resolver(
            ScriptedRecords { v4: Some((5, Ok(vec![Ipv4Addr::new(9, 9, 9, 9)]))), v6: None },
            sys.clone(),
        );

        let outcome = resolver.lookup(Name::new("a.test"), LookupOptions::single()).await.unwrap();

        assert_eq!(outcome, LookupOutcome::Single(AddressRecord::from(Ipv4Addr::new(9, 9, 9, 9))));
        assert_eq!(outcome.first().unwrap().family, AddressFamily::V4);
        assert_eq!(sys.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_timer_not_armed_by_empty_v4() {
        let sys = system(Err(NetError::NameNotResolved));
        let resolver = resolver(
            ScriptedRecords {
                v4: Some((0, Ok(vec![]))),
                v6: Some((500, Ok(vec![Ipv6Addr::LOCALHOST]))),
            },
            sys.clone(),
        );

        let start = Instant::now();
        let outcome = resolver.lookup(Name::new("a.test"), LookupOptions::all()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert_eq!(outcome, LookupOutcome::All(vec![AddressRecord::from(Ipv6Addr::LOCALHOST)]));
        assert_eq!(sys.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_v6_arriving_within_grace_is_included() {
        let sys = system(Err(NetError::NameNotResolved));
        let resolver = resolver(
            ScriptedRecords {
                v4: Some((10, Ok(vec![Ipv4Addr::new(1, 1, 1, 1)]))),
                v6: Some((40, Ok(vec![Ipv6Addr::LOCALHOST]))),
            },
            sys,
        );

        let start = Instant::now();
        let outcome = resolver.lookup(Name::new("a.test"), LookupOptions::all()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(40));
        assert_eq!(
            outcome,
            LookupOutcome::All(vec![
                AddressRecord::from(Ipv4Addr::new(1, 1, 1, 1)),
                AddressRecord::from(Ipv6Addr::LOCALHOST),
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_trait_uses_all_mode() {
        let sys = system(Err(NetError::NameNotResolved));
        let resolver = resolver(
            ScriptedRecords {
                v4: Some((0, Ok(vec![Ipv4Addr::new(1, 2, 3, 4)]))),
                v6: Some((0, Ok(vec![Ipv6Addr::LOCALHOST]))),
            },
            sys,
        );

        let addrs: Vec<SocketAddr> = resolver.resolve(Name::new("a.test")).await.unwrap().collect();
        assert_eq!(addrs.len(), 2);
        assert!(addrs[0].is_ipv4());
        assert!(addrs[1].is_ipv6());
        assert_eq!(addrs[0].port(), 0);
    }
}
