//! # dualnet
//!
//! IPv4-preferring name resolution and connection workarounds for networks
//! where IPv6 is advertised but broken.
//!
//! On such networks a plain dual-family lookup often hands back an AAAA
//! record first, and connecting to it stalls until the OS gives up. This
//! crate offers two remedies that can be used on their own or together:
//!
//! - [`dns::Ipv4PreferredResolver`]: races A against AAAA, waits a short
//!   grace period for IPv6 once IPv4 answered, and always lists IPv4 first.
//! - [`workaround::WorkaroundCoordinator`]: idempotently flips process-wide
//!   defaults (address-family auto-selection, DNS result order) and installs
//!   a global dispatcher built with the matching connect options.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dualnet::config::{DnsResultOrder, NetworkConfig};
//! use dualnet::workaround::resolve_fetch;
//! use bytes::Bytes;
//!
//! #[tokio::main]
//! async fn main() {
//!     let network = NetworkConfig::default()
//!         .with_auto_select_family(true)
//!         .with_dns_result_order(DnsResultOrder::Ipv4First);
//!
//!     let fetch = resolve_fetch(None, Some(&network)).unwrap();
//!     let request = http::Request::get("http://example.com/").body(Bytes::new()).unwrap();
//!     let response = fetch.fetch(request).await.unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes and IO error context
//! - [`config`] - Network configuration and environment overrides
//! - [`dns`] - Lookup traits, system/hickory resolvers, IPv4-preferred resolver
//! - [`fetch`] - Fetch abstraction, abort signals, HTTP/1.1 fetch over an agent
//! - [`runtime`] - Process-wide defaults and the global dispatcher
//! - [`socket`] - Connect jobs and the dispatcher [`Agent`](socket::Agent)
//! - [`workaround`] - The workaround coordinator and `resolve_fetch`

pub mod base;
pub mod config;
pub mod dns;
pub mod fetch;
pub mod runtime;
pub mod socket;
pub mod workaround;

pub use base::neterror::NetError;
pub use config::{DnsResultOrder, NetworkConfig};
pub use dns::Ipv4PreferredResolver;
pub use workaround::{resolve_fetch, WorkaroundCoordinator};
