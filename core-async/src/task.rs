//! Task spawning and execution.
//!
//! Thin wrapper over `tokio::task` so that spawned work always runs on the
//! host's runtime. Spawned futures must be `Send + 'static`.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! # async fn example() {
//! let handle = task::spawn(async { 42 });
//! assert_eq!(handle.await.unwrap(), 42);
//! # }
//! ```

pub use tokio::task::JoinHandle;

/// Spawns a new asynchronous task on the current runtime.
///
/// The task may run on a different worker thread. Await the returned
/// [`JoinHandle`] to observe its output or panic.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}
