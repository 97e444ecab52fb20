//! Async runtime helpers for blocking callers.
//!
//! Provides the single entry point synchronous wrappers use to drive the
//! asynchronous provider core, reusing the current Tokio runtime when one exists.

use anyhow::anyhow;
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;

/// Execute an async future from synchronous code.
///
/// # Returns
/// The future's output, or an error when no runtime can be used or built.
///
/// # Notes
/// - Inside a multi-threaded runtime the worker is handed to `block_in_place`
///   so other tasks keep running.
/// - Inside a current-thread runtime blocking would deadlock the caller's event
///   loop, so an error is returned instead.
/// - Outside Tokio a single-threaded runtime is built for the call.
pub fn block_on_future<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = T>,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => Err(anyhow!(
            "blocking calls are not allowed on a current-thread runtime; use the async API instead"
        )),
        Ok(handle) => Ok(task::block_in_place(|| handle.block_on(future))),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|error| anyhow!(error))?;
            Ok(runtime.block_on(future))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_runtime_outside_tokio() {
        let value = block_on_future(async { 21 * 2 }).unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reuses_multi_thread_runtime() {
        let value = block_on_future(async {
            tokio::task::yield_now().await;
            "done"
        })
        .unwrap();
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn refuses_to_block_current_thread_runtime() {
        assert!(block_on_future(async {}).is_err());
    }
}
