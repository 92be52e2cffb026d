//! Process-wide network workarounds.
//!
//! Two independent decisions, each resolved from environment overrides and
//! [`NetworkConfig`](crate::config::NetworkConfig):
//!
//! - address-family auto-selection (on / off / leave alone);
//! - DNS result order (`ipv4first` / `verbatim` / leave alone).
//!
//! The [`WorkaroundCoordinator`] turns them into at most three runtime
//! mutations and remembers what it applied, so calling it before every
//! connection is cheap. When either decision is set it also replaces the
//! global dispatcher, because agents freeze their connect options at
//! construction. IPv4-first ordering installs the
//! [`Ipv4PreferredResolver`](crate::dns::Ipv4PreferredResolver) as that
//! dispatcher's lookup.

mod coordinator;
mod decision;

pub use coordinator::{
    resolve_fetch, AppliedDecisions, DispatcherFingerprint, WorkaroundCoordinator, ATTEMPT_TIMEOUT,
};
pub use decision::{
    resolve_auto_select_family, resolve_dns_result_order, Decision, DecisionSource,
};
