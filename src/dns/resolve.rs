//! Core DNS resolution types and traits.
//!
//! This module defines the `Resolve`, `Lookup` and `RecordResolve` traits
//! and supporting types that form the foundation of the DNS abstraction
//! layer.

use crate::base::neterror::NetError;
use std::{
    fmt,
    future::Future,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    pin::Pin,
    sync::Arc,
};

/// A domain name to resolve into IP addresses.
///
/// This is a lightweight wrapper around a hostname string that provides
/// a type-safe way to pass domain names to resolvers.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }

    /// Returns the address if the name is an IP literal.
    ///
    /// Bracketed IPv6 literals (`[::1]`) as found in URLs are accepted.
    pub fn as_ip(&self) -> Option<IpAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        host.parse().ok()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// IP address family of a resolved record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4 = 4,
    V6 = 6,
}

impl AddressFamily {
    /// Numeric family tag (4 or 6).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

/// One resolved address tagged with its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRecord {
    pub address: IpAddr,
    pub family: AddressFamily,
}

impl AddressRecord {
    pub fn new(address: IpAddr) -> Self {
        Self { address, family: AddressFamily::of(&address) }
    }

    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.address, port)
    }
}

impl From<IpAddr> for AddressRecord {
    fn from(address: IpAddr) -> Self {
        AddressRecord::new(address)
    }
}

impl From<Ipv4Addr> for AddressRecord {
    fn from(address: Ipv4Addr) -> Self {
        AddressRecord::new(IpAddr::V4(address))
    }
}

impl From<Ipv6Addr> for AddressRecord {
    fn from(address: Ipv6Addr) -> Self {
        AddressRecord::new(IpAddr::V6(address))
    }
}

/// Options accompanying a [`Lookup`] request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Return every address instead of a single preferred one.
    pub all: bool,
    /// Restrict results to one family.
    pub family: Option<AddressFamily>,
}

impl LookupOptions {
    /// Options requesting a single address.
    pub fn single() -> Self {
        Self::default()
    }

    /// Options requesting every address.
    pub fn all() -> Self {
        Self { all: true, family: None }
    }

    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = Some(family);
        self
    }
}

/// Result of a [`Lookup`], shaped by [`LookupOptions::all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Single(AddressRecord),
    All(Vec<AddressRecord>),
}

impl LookupOutcome {
    /// Flattens either shape into a list of records.
    pub fn into_records(self) -> Vec<AddressRecord> {
        match self {
            LookupOutcome::Single(record) => vec![record],
            LookupOutcome::All(records) => records,
        }
    }

    /// The first (preferred) record, if any.
    pub fn first(&self) -> Option<&AddressRecord> {
        match self {
            LookupOutcome::Single(record) => Some(record),
            LookupOutcome::All(records) => records.first(),
        }
    }
}

/// Alias for an `Iterator` trait object over `SocketAddr`.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, NetError>> + Send>>;

/// Alias for the `Future` type returned by a [`Lookup`].
pub type Looking = Pin<Box<dyn Future<Output = Result<LookupOutcome, NetError>> + Send>>;

/// Alias for the `Future` type returned by a single record query.
pub type Querying<T> = Pin<Box<dyn Future<Output = Result<Vec<T>, NetError>> + Send>>;

/// Trait for DNS resolution.
///
/// This is the core abstraction for DNS resolvers in dualnet, equivalent
/// to Chromium's `HostResolver`. Implementations must be thread-safe.
///
/// # Design Notes
///
/// - Resolution is assumed to always be ready (no backpressure).
/// - Uses `&self` for concurrent resolution without mutable access.
/// - Returns boxed futures for trait object compatibility.
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to IP addresses.
    ///
    /// The returned addresses will have port 0; callers should set the
    /// appropriate port based on the target service.
    fn resolve(&self, name: Name) -> Resolving;
}

/// Blanket implementation for Arc-wrapped resolvers.
impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Hostname lookup with the two classic calling conventions.
///
/// With `options.all == false` the outcome is a single
/// [`LookupOutcome::Single`]; with `options.all == true` it is
/// [`LookupOutcome::All`]. This is the function an [`Agent`] calls before
/// connecting.
///
/// [`Agent`]: crate::socket::agent::Agent
pub trait Lookup: Send + Sync {
    fn lookup(&self, name: Name, options: LookupOptions) -> Looking;
}

impl<L: Lookup + ?Sized> Lookup for Arc<L> {
    fn lookup(&self, name: Name, options: LookupOptions) -> Looking {
        (**self).lookup(name, options)
    }
}

/// Per-family record queries (A and AAAA), bypassing getaddrinfo.
///
/// An empty `Ok` is a valid answer; callers decide how to treat it.
pub trait RecordResolve: Send + Sync {
    fn resolve4(&self, name: &Name) -> Querying<Ipv4Addr>;
    fn resolve6(&self, name: &Name) -> Querying<Ipv6Addr>;
}

impl<R: RecordResolve + ?Sized> RecordResolve for Arc<R> {
    fn resolve4(&self, name: &Name) -> Querying<Ipv4Addr> {
        (**self).resolve4(name)
    }

    fn resolve6(&self, name: &Name) -> Querying<Ipv6Addr> {
        (**self).resolve6(name)
    }
}
