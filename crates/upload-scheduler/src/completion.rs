//! The one-shot signal an `AwaitStart` caller blocks on.
//!
//! Wrapped behind crate-local types rather than exposing `tokio::sync::oneshot`
//! directly, matching this codebase's practice of hiding the concrete channel
//! type behind a purpose-built handle (see `ringmpsc_stream::ShutdownSignal`).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The scheduler-side half: signaled exactly once by the Admission Loop,
/// after the lock guard protecting scheduler state has been dropped, so
/// that waking the awaiter never happens while the lock is held.
pub(crate) struct Completion {
    tx: oneshot::Sender<()>,
}

/// The caller-side half, returned by `AwaitStart`.
///
/// Resolves when the Admission Loop releases the corresponding upload.
/// There is no cancellation API: abandoning this future does not release
/// the slot — the transfer engine must still call `Complete`.
pub struct Awaiting {
    rx: oneshot::Receiver<()>,
}

/// Creates a fresh completion pair for a newly enqueued upload.
pub(crate) fn pair() -> (Completion, Awaiting) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, Awaiting { rx })
}

impl Completion {
    /// Signals the waiter. Consumes `self`, so a `Completion` cannot be
    /// signaled twice.
    pub(crate) fn signal(self) {
        // A dropped receiver (caller abandoned the future) makes `send`
        // return `Err`; that is not a scheduler error, it is the caller's
        // prerogative, so the result is discarded.
        let _ = self.tx.send(());
    }
}

impl Future for Awaiting {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}
