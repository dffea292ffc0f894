//! Core plumbing for Horizon Structure.
//!
//! This crate provides the project-agnostic building blocks the structure
//! engine is assembled from:
//!
//! - **Signals**: Typed, synchronous change notifications with blocking support
//! - **Dispatch**: A queue that serializes cross-thread deliveries onto one owning thread
//! - **Thread affinity**: Assertions that single-writer state is only touched from its owner
//! - **Logging**: `tracing` targets, perf spans and tree formatting options
//!
//! # Signal Example
//!
//! ```
//! use horizon_structure_core::Signal;
//!
//! let node_changed = Signal::<u32>::new();
//!
//! let conn_id = node_changed.connect(|id| {
//!     println!("Node {} changed", id);
//! });
//!
//! node_changed.emit(7);
//! node_changed.disconnect(conn_id);
//! ```
//!
//! # Dispatch Example
//!
//! ```
//! use horizon_structure_core::{DeliveryMode, DispatchQueue};
//!
//! let queue = DispatchQueue::<String>::new(DeliveryMode::Queued);
//! let sender = queue.sender();
//!
//! std::thread::spawn(move || {
//!     sender.send("delta".to_string()).ok();
//! })
//! .join()
//! .ok();
//!
//! // Back on the owning thread.
//! let drained = queue.drain();
//! assert_eq!(drained, vec!["delta".to_string()]);
//! ```

pub mod dispatch;
mod error;
pub mod logging;
pub mod signal;
pub mod thread_check;

pub use dispatch::{DeliveryMode, DispatchQueue, DispatchSender};
pub use error::{DispatchError, SignalError};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
