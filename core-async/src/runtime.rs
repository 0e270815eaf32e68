//! Runtime utilities that abstract over the underlying async executor.
//!
//! Downstream crates use [`Handle::try_current`] to decide whether they can
//! spawn onto an existing runtime, and [`block_on`] when they cannot.

use tokio::runtime::Builder;

pub use tokio::runtime::Handle;

/// Runs the provided future to completion on a throwaway current-thread runtime.
///
/// Returns `None` when the runtime cannot be built (for example when the
/// process is out of file descriptors for the timer driver).
pub fn block_on<F>(future: F) -> Option<F::Output>
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .ok()
        .map(|runtime| runtime.block_on(future))
}
