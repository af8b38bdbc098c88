//! Thin wrappers around the async runtime.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

/// Spawn a task in the background to run a future. The task is detached;
/// dropping the returned handle does not cancel it.
pub(crate) fn spawn<F, O>(fut: F) -> AsyncJoinHandle<O>
where
    F: Future<Output = O> + Send + 'static,
    O: Send + 'static,
{
    AsyncJoinHandle(tokio::task::spawn(fut))
}

/// Await a point in time `delay` from now.
pub(crate) async fn delay_for(delay: Duration) {
    tokio::time::sleep(delay).await
}

/// Handle to a spawned background task.
#[derive(Debug)]
pub(crate) struct AsyncJoinHandle<T>(tokio::task::JoinHandle<T>);

impl<T> Future for AsyncJoinHandle<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0)
            .poll(cx)
            .map(|result| result.expect("task spawned by the pool panicked"))
    }
}
