use super::decision::{resolve_auto_select_family, resolve_dns_result_order, Decision};
use crate::base::neterror::NetError;
use crate::config::{DnsResultOrder, EnvOverrides, NetworkConfig};
use crate::dns::{Ipv4PreferredResolver, Lookup};
use crate::fetch::{wrap_fetch_with_abort_signal, Fetch};
use crate::runtime::{NetRuntime, ProcessRuntime};
use crate::socket::agent::{Agent, ConnectOptions};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Per-attempt budget of dispatchers installed by the coordinator.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(300);

/// Inputs that determine the installed dispatcher's connect options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatcherFingerprint {
    pub auto_select_family: Option<bool>,
    pub ipv4_preferred_lookup: bool,
}

/// What has already been pushed into the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedDecisions {
    pub auto_select_family: Option<bool>,
    pub dns_result_order: Option<DnsResultOrder>,
    pub dispatcher: Option<DispatcherFingerprint>,
}

impl AppliedDecisions {
    pub fn reset(&mut self) {
        *self = AppliedDecisions::default();
    }
}

/// Applies network workarounds to a [`NetRuntime`] at most once per
/// distinct decision.
///
/// Meant to run before every outbound connection setup; repeated calls
/// with an unchanged configuration do not touch the runtime.
pub struct WorkaroundCoordinator {
    runtime: Arc<dyn NetRuntime>,
    lookup: Arc<dyn Lookup>,
    applied: Mutex<AppliedDecisions>,
}

static GLOBAL: LazyLock<WorkaroundCoordinator> =
    LazyLock::new(|| WorkaroundCoordinator::new(Arc::new(ProcessRuntime)));

impl WorkaroundCoordinator {
    /// Coordinator installing [`Ipv4PreferredResolver`] when IPv4-first
    /// ordering is requested.
    pub fn new(runtime: Arc<dyn NetRuntime>) -> Self {
        Self {
            runtime,
            lookup: Arc::new(Ipv4PreferredResolver::new()),
            applied: Mutex::new(AppliedDecisions::default()),
        }
    }

    /// Replace the lookup installed into IPv4-first dispatchers.
    pub fn with_lookup(mut self, lookup: Arc<dyn Lookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// The process-wide coordinator bound to [`ProcessRuntime`].
    pub fn global() -> &'static WorkaroundCoordinator {
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, AppliedDecisions> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the applied-decision cache.
    pub fn applied(&self) -> AppliedDecisions {
        self.lock().clone()
    }

    /// Forget everything applied so far. Test seam; the runtime itself is
    /// not rolled back.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Apply workarounds using the current process environment.
    pub fn apply(&self, network: Option<&NetworkConfig>) {
        self.apply_with_env(network, &EnvOverrides::from_env());
    }

    pub fn apply_with_env(&self, network: Option<&NetworkConfig>, env: &EnvOverrides) {
        let auto_select_family = resolve_auto_select_family(network, env);
        let dns_result_order = resolve_dns_result_order(network, env);

        let mut applied = self.lock();
        self.apply_auto_select_family(&mut applied, auto_select_family);
        self.apply_dns_result_order(&mut applied, dns_result_order);
        self.replace_dispatcher(&mut applied, auto_select_family, dns_result_order);
    }

    fn apply_auto_select_family(&self, applied: &mut AppliedDecisions, decision: Decision<bool>) {
        let Some(enabled) = decision.value else { return };
        if applied.auto_select_family == Some(enabled) {
            return;
        }
        match self.runtime.set_default_auto_select_family(enabled) {
            Ok(()) => {
                applied.auto_select_family = Some(enabled);
                tracing::info!(enabled, source = %decision.source, "applied auto-select-family default");
            }
            Err(e) => {
                tracing::warn!(enabled, error = %e, "could not apply auto-select-family default")
            }
        }
    }

    fn apply_dns_result_order(
        &self,
        applied: &mut AppliedDecisions,
        decision: Decision<DnsResultOrder>,
    ) {
        let Some(order) = decision.value else { return };
        if applied.dns_result_order == Some(order) {
            return;
        }
        match self.runtime.set_default_result_order(order) {
            Ok(()) => {
                applied.dns_result_order = Some(order);
                tracing::info!(%order, source = %decision.source, "applied DNS result order");
            }
            Err(e) => tracing::warn!(%order, error = %e, "could not apply DNS result order"),
        }
    }

    fn replace_dispatcher(
        &self,
        applied: &mut AppliedDecisions,
        auto_select_family: Decision<bool>,
        dns_result_order: Decision<DnsResultOrder>,
    ) {
        let fingerprint = DispatcherFingerprint {
            auto_select_family: auto_select_family.value,
            ipv4_preferred_lookup: dns_result_order.value == Some(DnsResultOrder::Ipv4First),
        };
        if applied.dispatcher == Some(fingerprint) {
            return;
        }
        if fingerprint.auto_select_family.is_none() && !fingerprint.ipv4_preferred_lookup {
            return;
        }

        let mut options = ConnectOptions::default().with_attempt_timeout(ATTEMPT_TIMEOUT);
        if let Some(enabled) = fingerprint.auto_select_family {
            options = options.with_auto_select_family(enabled);
        }
        if fingerprint.ipv4_preferred_lookup {
            options = options.with_lookup(self.lookup.clone());
        }

        match self.runtime.set_global_dispatcher(Agent::new(options)) {
            Ok(()) => {
                applied.dispatcher = Some(fingerprint);
                tracing::info!(
                    auto_select_family = ?fingerprint.auto_select_family,
                    ipv4_preferred_lookup = fingerprint.ipv4_preferred_lookup,
                    "replaced global dispatcher"
                );
            }
            Err(e) => tracing::warn!(error = %e, "could not replace global dispatcher"),
        }
    }

    /// Apply workarounds, then pick the fetch implementation to use.
    ///
    /// A caller-supplied `proxy_fetch` wins and is wrapped for abort-signal
    /// handling unless it already is. Otherwise the runtime default is used;
    /// without one this fails with [`NetError::FetchUnavailable`].
    pub fn resolve_fetch(
        &self,
        proxy_fetch: Option<Arc<dyn Fetch>>,
        network: Option<&NetworkConfig>,
    ) -> Result<Arc<dyn Fetch>, NetError> {
        self.resolve_fetch_with_env(proxy_fetch, network, &EnvOverrides::from_env())
    }

    pub fn resolve_fetch_with_env(
        &self,
        proxy_fetch: Option<Arc<dyn Fetch>>,
        network: Option<&NetworkConfig>,
        env: &EnvOverrides,
    ) -> Result<Arc<dyn Fetch>, NetError> {
        self.apply_with_env(network, env);

        if let Some(fetch) = proxy_fetch {
            return Ok(wrap_fetch_with_abort_signal(fetch));
        }
        let fetch = self.runtime.default_fetch().ok_or(NetError::FetchUnavailable)?;
        Ok(wrap_fetch_with_abort_signal(fetch))
    }
}

/// [`WorkaroundCoordinator::resolve_fetch`] on the global coordinator.
pub fn resolve_fetch(
    proxy_fetch: Option<Arc<dyn Fetch>>,
    network: Option<&NetworkConfig>,
) -> Result<Arc<dyn Fetch>, NetError> {
    WorkaroundCoordinator::global().resolve_fetch(proxy_fetch, network)
}
