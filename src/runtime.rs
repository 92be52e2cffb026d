//! Process-wide network defaults.
//!
//! Three pieces of global state shape every outbound connection made
//! through the default wiring:
//!
//! - the default address-family auto-selection flag, snapshotted by each
//!   [`Agent`] when it is constructed;
//! - the default [`DnsResultOrder`], read by [`GaiResolver`] on every lookup;
//! - the global dispatcher, the [`Agent`] used by [`AgentFetch`] when no
//!   agent was given explicitly.
//!
//! Because agents snapshot the auto-selection flag, flipping it does not
//! affect an already installed dispatcher. Replacing the dispatcher is the
//! only way to make a new flag observable to later requests.
//!
//! [`NetRuntime`] is the seam the workaround coordinator mutates through;
//! [`ProcessRuntime`] binds it to the globals in this module.
//!
//! [`GaiResolver`]: crate::dns::GaiResolver
//! [`AgentFetch`]: crate::fetch::AgentFetch

use crate::base::neterror::NetError;
use crate::config::DnsResultOrder;
use crate::fetch::{AgentFetch, Fetch};
use crate::socket::agent::Agent;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, LazyLock};

const ORDER_IPV4FIRST: u8 = 1;
const ORDER_VERBATIM: u8 = 2;

static DEFAULT_AUTO_SELECT_FAMILY: AtomicBool = AtomicBool::new(true);
static DEFAULT_RESULT_ORDER: AtomicU8 = AtomicU8::new(ORDER_VERBATIM);
static GLOBAL_DISPATCHER: LazyLock<ArcSwap<Agent>> =
    LazyLock::new(|| ArcSwap::from_pointee(Agent::default()));

/// Current default for address-family auto-selection.
pub fn default_auto_select_family() -> bool {
    DEFAULT_AUTO_SELECT_FAMILY.load(Ordering::Acquire)
}

pub fn set_default_auto_select_family(enabled: bool) {
    DEFAULT_AUTO_SELECT_FAMILY.store(enabled, Ordering::Release);
}

/// Current default ordering of system resolver results.
pub fn default_result_order() -> DnsResultOrder {
    match DEFAULT_RESULT_ORDER.load(Ordering::Acquire) {
        ORDER_IPV4FIRST => DnsResultOrder::Ipv4First,
        _ => DnsResultOrder::Verbatim,
    }
}

pub fn set_default_result_order(order: DnsResultOrder) {
    let raw = match order {
        DnsResultOrder::Ipv4First => ORDER_IPV4FIRST,
        DnsResultOrder::Verbatim => ORDER_VERBATIM,
    };
    DEFAULT_RESULT_ORDER.store(raw, Ordering::Release);
}

/// The agent currently used for outbound requests.
pub fn global_dispatcher() -> Arc<Agent> {
    GLOBAL_DISPATCHER.load_full()
}

/// Install `agent` as the global dispatcher, returning the previous one.
pub fn set_global_dispatcher(agent: Arc<Agent>) -> Arc<Agent> {
    GLOBAL_DISPATCHER.swap(agent)
}

/// Global switches the workaround coordinator is allowed to flip.
///
/// Every method may fail when the underlying capability is missing; callers
/// treat failures as "workaround not applied".
pub trait NetRuntime: Send + Sync {
    fn set_default_auto_select_family(&self, enabled: bool) -> Result<(), NetError>;

    fn set_default_result_order(&self, order: DnsResultOrder) -> Result<(), NetError>;

    fn set_global_dispatcher(&self, agent: Agent) -> Result<(), NetError>;

    /// The fetch implementation used when the caller supplies none.
    fn default_fetch(&self) -> Option<Arc<dyn Fetch>>;
}

/// [`NetRuntime`] backed by this process's globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRuntime;

impl NetRuntime for ProcessRuntime {
    fn set_default_auto_select_family(&self, enabled: bool) -> Result<(), NetError> {
        set_default_auto_select_family(enabled);
        Ok(())
    }

    fn set_default_result_order(&self, order: DnsResultOrder) -> Result<(), NetError> {
        set_default_result_order(order);
        Ok(())
    }

    fn set_global_dispatcher(&self, agent: Agent) -> Result<(), NetError> {
        set_global_dispatcher(Arc::new(agent));
        Ok(())
    }

    fn default_fetch(&self) -> Option<Arc<dyn Fetch>> {
        Some(Arc::new(AgentFetch::global()))
    }
}
