//! Socket and connection management.
//!
//! Mirrors the parts of Chromium's `net/socket/` this crate needs:
//! - [`agent`]: the outbound dispatcher and its connect-time options
//! - [`connectjob`]: DNS → TCP (family interleaving) → TLS connection flow
//! - [`client`]: polymorphic TCP / TLS socket
//! - [`tls`]: TLS configuration with BoringSSL

pub mod agent;
pub mod client;
pub mod connectjob;
pub mod tls;

pub use agent::{Agent, ConnectOptions};
