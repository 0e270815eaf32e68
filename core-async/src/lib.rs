//! Runtime facade for the playback coordinator crates.
//!
//! Every `core-*` crate reaches the async runtime through this crate instead
//! of naming tokio directly. Keeping the runtime behind one seam means the
//! coordinator, the event bus, and the service facade all agree on which
//! channel, lock, and timer types are in play.
//!
//! # Modules
//!
//! - `task`: Task spawning and join handles
//! - `time`: Sleep, timeout, durations
//! - `sync`: Channels, locks, and cooperative cancellation
//! - `runtime`: Runtime handles and a blocking entry point
//!
//! The [`select!`] macro is re-exported for event loops that multiplex
//! several channels.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

/// Waits on several branches and runs the first one that completes.
pub use tokio::select;
