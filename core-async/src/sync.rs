//! Synchronization primitives.
//!
//! Re-exports the tokio channel and lock types used across the workspace,
//! plus [`CancellationToken`] for cooperative shutdown of long-lived tasks.
//!
//! All primitives are async-aware: holding a [`Mutex`] guard across an
//! `.await` does not block the executor thread.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{mpsc, CancellationToken};
//!
//! # async fn example() {
//! let token = CancellationToken::new();
//! let (tx, mut rx) = mpsc::channel::<u32>(8);
//!
//! tx.send(7).await.unwrap();
//! assert_eq!(rx.recv().await, Some(7));
//!
//! token.cancel();
//! token.cancelled().await;
//! # }
//! ```

pub use tokio::sync::{broadcast, mpsc, watch, Mutex};

pub use tokio_util::sync::CancellationToken;
