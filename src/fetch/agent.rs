use super::{Fetch, FetchFuture, FetchRequest, FetchResponse};
use crate::base::neterror::NetError;
use crate::runtime;
use crate::socket::agent::Agent;
use futures::future::FutureExt;
use http::header::{HeaderValue, HOST};
use http::{Request, Response, Uri};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use url::Url;

/// HTTP/1.1 fetch over an [`Agent`].
///
/// One connection per request. Without an explicit agent the global
/// dispatcher is read at request time, so a dispatcher replaced by the
/// workaround coordinator applies to every later request.
#[derive(Debug, Clone, Default)]
pub struct AgentFetch {
    agent: Option<Arc<Agent>>,
}

impl AgentFetch {
    /// Fetch through whatever the global dispatcher is at request time.
    pub fn global() -> Self {
        Self { agent: None }
    }

    /// Fetch through a fixed agent.
    pub fn with_agent(agent: Arc<Agent>) -> Self {
        Self { agent: Some(agent) }
    }

    fn agent(&self) -> Arc<Agent> {
        match &self.agent {
            Some(agent) => agent.clone(),
            None => runtime::global_dispatcher(),
        }
    }
}

impl Fetch for AgentFetch {
    fn fetch(&self, request: FetchRequest) -> FetchFuture {
        let agent = self.agent();
        send(agent, request).boxed()
    }
}

async fn send(agent: Arc<Agent>, request: FetchRequest) -> Result<FetchResponse, NetError> {
    let url = Url::parse(&request.uri().to_string()).map_err(|_| NetError::InvalidUrl)?;
    let host = url.host_str().ok_or(NetError::InvalidUrl)?;

    let socket = agent.connect(&url).await?;
    tracing::debug!(url = %url, peer = ?socket.tcp().peer_addr().ok(), tls = socket.is_tls(), "connected");
    let io = TokioIo::new(socket);
    let (mut sender, conn) = http1::handshake(io).await.map_err(|e| {
        tracing::debug!(error = %e, "HTTP/1.1 handshake failed");
        NetError::ConnectionFailed
    })?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "connection driver finished with error");
        }
    });

    let (mut parts, body) = request.into_parts();

    // Origin-form request target, absolute URL goes into Host.
    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    parts.uri = target.parse::<Uri>().map_err(|_| NetError::InvalidUrl)?;
    if !parts.headers.contains_key(HOST) {
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let value = HeaderValue::from_str(&authority).map_err(|_| NetError::InvalidUrl)?;
        parts.headers.insert(HOST, value);
    }

    let response = sender.send_request(Request::from_parts(parts, Full::new(body))).await.map_err(|e| {
        tracing::debug!(error = %e, url = %url, "request failed");
        if e.is_incomplete_message() {
            NetError::EmptyResponse
        } else {
            NetError::ConnectionClosed
        }
    })?;

    let (parts, body) = response.into_parts();
    let body = body.collect().await.map_err(|_| NetError::HttpBodyError)?.to_bytes();
    tracing::debug!(url = %url, status = %parts.status, bytes = body.len(), "fetch complete");
    Ok(Response::from_parts(parts, body))
}
