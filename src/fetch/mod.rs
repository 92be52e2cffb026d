//! Fetch capability.
//!
//! A [`Fetch`] turns an [`http::Request`] with a buffered body into an
//! [`http::Response`] with a buffered body. Three implementations ship with
//! the crate:
//!
//! - [`AgentFetch`]: HTTP/1.1 over an [`Agent`](crate::socket::Agent),
//!   by default the process-wide global dispatcher;
//! - [`SignalNormalized`]: wraps any fetch so an [`AbortSignal`] stored in
//!   the request extensions cancels it;
//! - [`FnFetch`]: adapts an async closure, typically a proxy-aware client
//!   supplied by the caller.

mod agent;
mod signal;

pub use agent::AgentFetch;
pub use signal::{wrap_fetch_with_abort_signal, AbortController, AbortSignal, SignalNormalized};

use crate::base::neterror::NetError;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

pub type FetchRequest = http::Request<Bytes>;
pub type FetchResponse = http::Response<Bytes>;
pub type FetchFuture = BoxFuture<'static, Result<FetchResponse, NetError>>;

pub trait Fetch: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> FetchFuture;

    /// True when abort signals in request extensions are already honored.
    fn is_signal_normalized(&self) -> bool {
        false
    }
}

impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    fn fetch(&self, request: FetchRequest) -> FetchFuture {
        (**self).fetch(request)
    }

    fn is_signal_normalized(&self) -> bool {
        (**self).is_signal_normalized()
    }
}

/// [`Fetch`] backed by an async closure. Built with [`fetch_fn`].
pub struct FnFetch<F> {
    f: F,
}

/// Adapt an async closure into a [`Fetch`].
pub fn fetch_fn<F, Fut>(f: F) -> FnFetch<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResponse, NetError>> + Send + 'static,
{
    FnFetch { f }
}

impl<F, Fut> Fetch for FnFetch<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchResponse, NetError>> + Send + 'static,
{
    fn fetch(&self, request: FetchRequest) -> FetchFuture {
        (self.f)(request).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_fn_delegates() {
        let fetch = fetch_fn(|req: FetchRequest| async move {
            Ok(http::Response::new(Bytes::from(req.uri().path().to_string())))
        });

        let req = http::Request::get("http://example.test/hello").body(Bytes::new()).unwrap();
        let resp = fetch.fetch(req).await.unwrap();

        assert_eq!(resp.body(), &Bytes::from_static(b"/hello"));
        assert!(!fetch.is_signal_normalized());
    }
}
