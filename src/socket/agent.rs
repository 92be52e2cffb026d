//! Connection agent (the outbound "dispatcher").
//!
//! An [`Agent`] owns the connect-time options used for every connection it
//! opens: whether to auto-select the address family, how long each family
//! attempt may take, and which [`Lookup`] resolves hostnames. Options are
//! fixed at construction. In particular an agent built without an explicit
//! `auto_select_family` snapshots the process default at that moment and
//! never observes later changes to it.

use crate::base::neterror::NetError;
use crate::dns::{GaiResolver, Lookup};
use crate::runtime;
use crate::socket::client::SocketType;
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::TlsConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use url::Url;

/// Per-attempt budget used when no explicit timeout is configured.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(250);

/// Connect-time options of an [`Agent`].
#[derive(Clone)]
pub struct ConnectOptions {
    /// `None` means "use the process default at construction time".
    pub auto_select_family: Option<bool>,
    pub auto_select_family_attempt_timeout: Duration,
    /// Custom hostname lookup; `None` means the system resolver.
    pub lookup: Option<Arc<dyn Lookup>>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            auto_select_family: None,
            auto_select_family_attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            lookup: None,
        }
    }
}

impl ConnectOptions {
    pub fn with_auto_select_family(mut self, enabled: bool) -> Self {
        self.auto_select_family = Some(enabled);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.auto_select_family_attempt_timeout = timeout;
        self
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn Lookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn has_lookup(&self) -> bool {
        self.lookup.is_some()
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("auto_select_family", &self.auto_select_family)
            .field("auto_select_family_attempt_timeout", &self.auto_select_family_attempt_timeout)
            .field("has_lookup", &self.lookup.is_some())
            .finish()
    }
}

/// Opens connections with a fixed set of [`ConnectOptions`].
pub struct Agent {
    options: ConnectOptions,
    auto_select_family: bool,
    lookup: Arc<dyn Lookup>,
    tls: TlsConfig,
}

impl Agent {
    pub fn new(options: ConnectOptions) -> Self {
        let auto_select_family =
            options.auto_select_family.unwrap_or_else(runtime::default_auto_select_family);
        let lookup: Arc<dyn Lookup> = match &options.lookup {
            Some(lookup) => lookup.clone(),
            None => Arc::new(GaiResolver::new()),
        };
        Self { options, auto_select_family, lookup, tls: TlsConfig::default() }
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// The options this agent was constructed with.
    pub fn connect_options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Effective auto-select-family flag (explicit option or snapshot).
    pub fn auto_select_family(&self) -> bool {
        self.auto_select_family
    }

    fn job(&self) -> ConnectJob<'_> {
        ConnectJob {
            lookup: self.lookup.as_ref(),
            auto_select_family: self.auto_select_family,
            attempt_timeout: self.options.auto_select_family_attempt_timeout,
            tls: &self.tls,
        }
    }

    /// Open a plain TCP connection to `host:port`.
    pub async fn connect_tcp(&self, host: &str, port: u16) -> Result<TcpStream, NetError> {
        self.job().connect_tcp(host, port).await
    }

    /// Open a connection suitable for `url` (TLS for `https`).
    pub async fn connect(&self, url: &Url) -> Result<SocketType, NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(NetError::DisallowedUrlScheme),
        };
        self.job().connect(host, port, secure).await
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(ConnectOptions::default())
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("options", &self.options)
            .field("auto_select_family", &self.auto_select_family)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{AddressRecord, Looking, LookupOptions, LookupOutcome, Name};
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    struct LoopbackLookup {
        calls: AtomicUsize,
    }

    impl Lookup for LoopbackLookup {
        fn lookup(&self, _name: Name, options: LookupOptions) -> Looking {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let record = AddressRecord::from(Ipv4Addr::LOCALHOST);
            Box::pin(async move {
                Ok(if options.all {
                    LookupOutcome::All(vec![record])
                } else {
                    LookupOutcome::Single(record)
                })
            })
        }
    }

    #[test]
    fn test_explicit_auto_select_family_wins() {
        let agent = Agent::new(ConnectOptions::default().with_auto_select_family(false));
        assert!(!agent.auto_select_family());
        assert_eq!(agent.connect_options().auto_select_family, Some(false));
        assert!(!agent.connect_options().has_lookup());
    }

    #[tokio::test]
    async fn test_connect_uses_custom_lookup() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { while listener.accept().await.is_ok() {} });

        let lookup = Arc::new(LoopbackLookup { calls: AtomicUsize::new(0) });
        for auto in [true, false] {
            let agent = Agent::new(
                ConnectOptions::default().with_auto_select_family(auto).with_lookup(lookup.clone()),
            );
            let stream = agent.connect_tcp("service.test", port).await.unwrap();
            assert_eq!(stream.peer_addr().unwrap().port(), port);
        }
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ip_literal_skips_lookup() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { while listener.accept().await.is_ok() {} });

        let lookup = Arc::new(LoopbackLookup { calls: AtomicUsize::new(0) });
        let agent = Agent::new(ConnectOptions::default().with_lookup(lookup.clone()));
        agent.connect_tcp("127.0.0.1", port).await.unwrap();
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejects_unknown_scheme() {
        let agent = Agent::default();
        let url = Url::parse("ftp://127.0.0.1/").unwrap();
        assert_eq!(agent.connect(&url).await.unwrap_err(), NetError::DisallowedUrlScheme);
    }
}
