//! skyfuse-core: Pure track fusion and interpolation library.
//!
//! No async, no I/O — just algorithms. This crate is the shared core used by
//! `skyfuse-daemon`, which owns the polling loops and the network edge.

pub mod config;
pub mod filter;
pub mod interp;
pub mod project;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use filter::{GeoBounds, TrackFilter};
pub use interp::InterpolationEngine;
pub use project::project;
pub use store::{Entity, TrackStore};
pub use types::*;
