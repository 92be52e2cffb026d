use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::dns::{AddressRecord, Lookup, LookupOptions, Name};
use crate::socket::client::SocketType;
use crate::socket::tls::TlsConfig;
use boring::ssl::{SslConnector, SslMethod};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob<'a> {
    pub lookup: &'a dyn Lookup,
    pub auto_select_family: bool,
    pub attempt_timeout: Duration,
    pub tls: &'a TlsConfig,
}

impl ConnectJob<'_> {
    /// Resolve `host` and open a TCP connection to `port`.
    ///
    /// With auto-select-family every address is tried in family-interleaved
    /// order, each attempt but the last bounded by `attempt_timeout`.
    /// Without it a single address is resolved and connected to.
    pub async fn connect_tcp(&self, host: &str, port: u16) -> Result<TcpStream, NetError> {
        let name = Name::new(host);

        // IP literals never go through the lookup function.
        if let Some(ip) = name.as_ip() {
            return TcpStream::connect(SocketAddr::new(ip, port)).await.connection_context(host, port);
        }

        if !self.auto_select_family {
            let outcome = self.lookup.lookup(name, LookupOptions::single()).await?;
            let record = outcome.first().copied().ok_or(NetError::NameNotResolved)?;
            tracing::debug!(host = %host, address = %record.address, "connecting to single address");
            return TcpStream::connect(record.socket_addr(port)).await.connection_context(host, port);
        }

        let records = self.lookup.lookup(name, LookupOptions::all()).await?.into_records();
        let candidates = interleave_families(&records);
        if candidates.is_empty() {
            return Err(NetError::NameNotResolved);
        }

        let mut last_error = NetError::ConnectionFailed;
        for (i, ip) in candidates.iter().enumerate() {
            let addr = SocketAddr::new(*ip, port);
            let attempt = TcpStream::connect(addr);
            let result = if i + 1 == candidates.len() {
                attempt.await.connection_context(host, port)
            } else {
                match tokio::time::timeout(self.attempt_timeout, attempt).await {
                    Ok(result) => result.connection_context(host, port),
                    Err(_) => Err(NetError::ConnectionTimedOut),
                }
            };

            match result {
                Ok(stream) => {
                    tracing::debug!(host = %host, %addr, attempt = i + 1, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(host = %host, %addr, error = %e, "connection attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Full connection: TCP, then TLS when `secure` is set.
    pub async fn connect(&self, host: &str, port: u16, secure: bool) -> Result<SocketType, NetError> {
        let stream = self.connect_tcp(host, port).await?;
        if !secure {
            return Ok(SocketType::Tcp(stream));
        }

        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        self.tls.apply_to_builder(&mut builder)?;

        let connector = builder.build();
        let mut config = connector.configure().map_err(|_| NetError::SslProtocolError)?;
        let server_name = host.trim_start_matches('[').trim_end_matches(']');
        if !TlsConfig::should_set_sni(host) {
            config.set_use_server_name_indication(false);
        }

        let tls_stream = tokio_boring::connect(config, server_name, stream).await.map_err(|e| {
            tracing::debug!(host = %host, error = ?e, "SSL handshake failed");
            NetError::SslProtocolError
        })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}

/// Orders addresses for connection attempts, alternating families and
/// starting with the family of the first record.
pub(crate) fn interleave_families(records: &[AddressRecord]) -> Vec<IpAddr> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let (mut preferred, mut other): (Vec<IpAddr>, Vec<IpAddr>) = (Vec::new(), Vec::new());
    for record in records {
        if record.family == first.family {
            preferred.push(record.address);
        } else {
            other.push(record.address);
        }
    }

    let mut ordered = Vec::with_capacity(records.len());
    let mut preferred = preferred.into_iter();
    let mut other = other.into_iter();
    loop {
        match (preferred.next(), other.next()) {
            (None, None) => break,
            (a, b) => ordered.extend(a.into_iter().chain(b)),
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ips: &[&str]) -> Vec<AddressRecord> {
        ips.iter().map(|ip| AddressRecord::new(ip.parse().unwrap())).collect()
    }

    fn ips(ips: &[&str]) -> Vec<IpAddr> {
        ips.iter().map(|ip| ip.parse().unwrap()).collect()
    }

    #[test]
    fn test_interleave_starts_with_first_family() {
        let ordered = interleave_families(&records(&["1.1.1.1", "2.2.2.2", "::1", "::2"]));
        assert_eq!(ordered, ips(&["1.1.1.1", "::1", "2.2.2.2", "::2"]));

        let ordered = interleave_families(&records(&["::1", "1.1.1.1", "2.2.2.2"]));
        assert_eq!(ordered, ips(&["::1", "1.1.1.1", "2.2.2.2"]));
    }

    #[test]
    fn test_interleave_single_family() {
        let ordered = interleave_families(&records(&["1.1.1.1", "2.2.2.2"]));
        assert_eq!(ordered, ips(&["1.1.1.1", "2.2.2.2"]));
        assert!(interleave_families(&[]).is_empty());
    }
}
