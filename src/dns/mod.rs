//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution with support for:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver with per-family record queries
//! - An IPv4-preferring dual-family resolver racing A against AAAA
//!
//! # Architecture
//!
//! This module mirrors Chromium's `HostResolver` concept but with a cleaner
//! Rust-idiomatic design. Three traits form the seams:
//!
//! - [`Resolve`]: name to socket addresses (port 0)
//! - [`Lookup`]: name plus [`LookupOptions`] to one or all [`AddressRecord`]s;
//!   this is what a connection [`Agent`](crate::socket::agent::Agent) calls
//! - [`RecordResolve`]: raw A / AAAA queries
//!
//! # Example
//!
//! ```rust,ignore
//! use dualnet::dns::{Ipv4PreferredResolver, Lookup, LookupOptions, Name};
//!
//! let resolver = Ipv4PreferredResolver::new();
//! let outcome = resolver.lookup(Name::new("example.com"), LookupOptions::all()).await?;
//! for record in outcome.into_records() {
//!     println!("{} (IPv{})", record.address, record.family.as_u8());
//! }
//! ```

mod gai;
mod hickory;
mod preferred;
mod resolve;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use preferred::{Ipv4PreferredResolver, GRACE_PERIOD};
pub use resolve::{
    AddressFamily, AddressRecord, Addrs, Looking, Lookup, LookupOptions, LookupOutcome, Name,
    Querying, RecordResolve, Resolve, Resolving,
};
