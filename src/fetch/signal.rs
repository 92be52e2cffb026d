use super::{Fetch, FetchFuture, FetchRequest};
use crate::base::neterror::NetError;
use futures::future::{self, FutureExt};
use std::sync::Arc;
use tokio::sync::watch;

/// Owner side of an [`AbortSignal`].
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, signal: AbortSignal { rx } }
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort every fetch observing this controller's signal. Idempotent.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation signal carried in request extensions.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once aborted. Never resolves if the controller is dropped
    /// without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            future::pending::<()>().await;
        }
    }
}

/// Makes any [`Fetch`] honor an [`AbortSignal`] in the request extensions.
///
/// A request whose signal is already aborted fails with
/// [`NetError::Aborted`] without reaching the inner fetch; a signal that
/// fires mid-flight drops the inner future.
pub struct SignalNormalized {
    inner: Arc<dyn Fetch>,
}

impl SignalNormalized {
    pub fn new(inner: Arc<dyn Fetch>) -> Self {
        Self { inner }
    }
}

impl Fetch for SignalNormalized {
    fn fetch(&self, request: FetchRequest) -> FetchFuture {
        let Some(signal) = request.extensions().get::<AbortSignal>().cloned() else {
            return self.inner.fetch(request);
        };
        if signal.is_aborted() {
            return future::ready(Err(NetError::Aborted)).boxed();
        }

        let inner = self.inner.fetch(request);
        async move {
            tokio::select! {
                biased;
                () = signal.aborted() => Err(NetError::Aborted),
                result = inner => result,
            }
        }
        .boxed()
    }

    fn is_signal_normalized(&self) -> bool {
        true
    }
}

/// Wrap `fetch` in [`SignalNormalized`] unless it already is.
pub fn wrap_fetch_with_abort_signal(fetch: Arc<dyn Fetch>) -> Arc<dyn Fetch> {
    if fetch.is_signal_normalized() {
        fetch
    } else {
        Arc::new(SignalNormalized::new(fetch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{fetch_fn, FetchResponse};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(signal: Option<AbortSignal>) -> FetchRequest {
        let mut req = http::Request::get("http://example.test/").body(Bytes::new()).unwrap();
        if let Some(signal) = signal {
            req.extensions_mut().insert(signal);
        }
        req
    }

    fn slow_fetch(calls: Arc<AtomicUsize>) -> Arc<dyn Fetch> {
        Arc::new(fetch_fn(move |_req: FetchRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<FetchResponse, NetError>(http::Response::new(Bytes::new()))
            }
        }))
    }

    #[tokio::test]
    async fn test_pre_aborted_request_never_reaches_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = wrap_fetch_with_abort_signal(slow_fetch(calls.clone()));

        let controller = AbortController::new();
        controller.abort();

        let err = fetch.fetch(request(Some(controller.signal()))).await.unwrap_err();
        assert_eq!(err, NetError::Aborted);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = wrap_fetch_with_abort_signal(slow_fetch(calls.clone()));

        let controller = AbortController::new();
        let pending = fetch.fetch(request(Some(controller.signal())));
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.abort();
        });

        assert_eq!(pending.await.unwrap_err(), NetError::Aborted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_signal_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = wrap_fetch_with_abort_signal(slow_fetch(calls.clone()));

        assert!(fetch.fetch(request(None)).await.is_ok());
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let once = wrap_fetch_with_abort_signal(slow_fetch(calls));
        let twice = wrap_fetch_with_abort_signal(once.clone());

        assert!(twice.is_signal_normalized());
        assert!(Arc::ptr_eq(&once, &twice));
    }
}
