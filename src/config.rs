//! Network workaround configuration.
//!
//! Two decisions are configurable: whether the process enables
//! address-family auto-selection ("Happy Eyeballs") for new connections,
//! and which ordering the system resolver applies to its results. Both can
//! come from a [`NetworkConfig`] (usually deserialized from JSON) and be
//! overridden through environment variables captured in [`EnvOverrides`].
//!
//! ```json
//! { "autoSelectFamily": false, "dnsResultOrder": "ipv4first" }
//! ```

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Forces address-family auto-selection off. Wins over every other source.
pub const ENV_DISABLE_AUTO_SELECT_FAMILY: &str = "DUALNET_DISABLE_AUTO_SELECT_FAMILY";
/// Forces address-family auto-selection on, unless the disable variable is set.
pub const ENV_ENABLE_AUTO_SELECT_FAMILY: &str = "DUALNET_ENABLE_AUTO_SELECT_FAMILY";
/// Overrides the configured DNS result order (`ipv4first` or `verbatim`).
pub const ENV_DNS_RESULT_ORDER: &str = "DUALNET_DNS_RESULT_ORDER";

/// Ordering applied to system resolver results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsResultOrder {
    /// IPv4 addresses are placed before IPv6 addresses.
    Ipv4First,
    /// Addresses are returned in the order the resolver produced them.
    Verbatim,
}

impl DnsResultOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsResultOrder::Ipv4First => "ipv4first",
            DnsResultOrder::Verbatim => "verbatim",
        }
    }
}

impl fmt::Display for DnsResultOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsResultOrder {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipv4first" => Ok(DnsResultOrder::Ipv4First),
            "verbatim" => Ok(DnsResultOrder::Verbatim),
            other => Err(NetError::InvalidConfiguration(format!(
                "unknown DNS result order {other:?}"
            ))),
        }
    }
}

/// Explicit per-decision overrides. `None` leaves the decision to the next
/// source (or to the runtime default).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    pub auto_select_family: Option<bool>,
    pub dns_result_order: Option<DnsResultOrder>,
}

impl NetworkConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::InvalidConfiguration(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NetError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            NetError::InvalidConfiguration(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn with_auto_select_family(mut self, enabled: bool) -> Self {
        self.auto_select_family = Some(enabled);
        self
    }

    pub fn with_dns_result_order(mut self, order: DnsResultOrder) -> Self {
        self.dns_result_order = Some(order);
        self
    }
}

/// Snapshot of the environment variables that override [`NetworkConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub disable_auto_select_family: bool,
    pub enable_auto_select_family: bool,
    pub dns_result_order: Option<DnsResultOrder>,
}

impl EnvOverrides {
    /// Capture overrides from the process environment.
    ///
    /// Only the three override variables are read. Unrelated variables are
    /// never decoded, and an override that is not valid UTF-8 is ignored.
    pub fn from_env() -> Self {
        let keys = [ENV_DISABLE_AUTO_SELECT_FAMILY, ENV_ENABLE_AUTO_SELECT_FAMILY, ENV_DNS_RESULT_ORDER];
        Self::from_vars(keys.into_iter().filter_map(|key| match std::env::var(key) {
            Ok(value) => Some((key, value)),
            Err(std::env::VarError::NotPresent) => None,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring {}", key);
                None
            }
        }))
    }

    /// Capture overrides from arbitrary key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut overrides = EnvOverrides::default();
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_DISABLE_AUTO_SELECT_FAMILY => {
                    overrides.disable_auto_select_family = is_truthy(value)
                }
                ENV_ENABLE_AUTO_SELECT_FAMILY => {
                    overrides.enable_auto_select_family = is_truthy(value)
                }
                ENV_DNS_RESULT_ORDER if !value.trim().is_empty() => match value.parse() {
                    Ok(order) => overrides.dns_result_order = Some(order),
                    Err(e) => {
                        tracing::warn!(value = %value, error = %e, "ignoring {}", ENV_DNS_RESULT_ORDER)
                    }
                },
                _ => {}
            }
        }
        overrides
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
