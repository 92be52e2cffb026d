use crate::config::{DnsResultOrder, EnvOverrides, NetworkConfig};
use std::fmt;

/// Where a resolved decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    EnvDisable,
    EnvEnable,
    EnvOrder,
    Config,
    Unset,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::EnvDisable => "env:disable",
            DecisionSource::EnvEnable => "env:enable",
            DecisionSource::EnvOrder => "env:order",
            DecisionSource::Config => "config",
            DecisionSource::Unset => "unset",
        }
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved decision. `value == None` means "leave the runtime default".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision<T> {
    pub value: Option<T>,
    pub source: DecisionSource,
}

impl<T> Decision<T> {
    fn from(value: T, source: DecisionSource) -> Self {
        Self { value: Some(value), source }
    }

    fn unset() -> Self {
        Self { value: None, source: DecisionSource::Unset }
    }
}

/// Env disable beats env enable, which beats config.
pub fn resolve_auto_select_family(
    network: Option<&NetworkConfig>,
    env: &EnvOverrides,
) -> Decision<bool> {
    if env.disable_auto_select_family {
        return Decision::from(false, DecisionSource::EnvDisable);
    }
    if env.enable_auto_select_family {
        return Decision::from(true, DecisionSource::EnvEnable);
    }
    match network.and_then(|n| n.auto_select_family) {
        Some(value) => Decision::from(value, DecisionSource::Config),
        None => Decision::unset(),
    }
}

/// Env order beats config.
pub fn resolve_dns_result_order(
    network: Option<&NetworkConfig>,
    env: &EnvOverrides,
) -> Decision<DnsResultOrder> {
    if let Some(order) = env.dns_result_order {
        return Decision::from(order, DecisionSource::EnvOrder);
    }
    match network.and_then(|n| n.dns_result_order) {
        Some(order) => Decision::from(order, DecisionSource::Config),
        None => Decision::unset(),
    }
}
