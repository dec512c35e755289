#![forbid(unsafe_code)]

//! Core: geometry and logging shared by the AnyDock crates.
//!
//! # Role in AnyDock
//! `anydock-core` holds the pieces that are not specific to the dock tree:
//! cell-space rectangles and pointer positions reported by the host view
//! layer, and the one-shot `tracing` subscriber bootstrap used by binaries.

pub mod geometry;
pub mod logging;

pub use geometry::{PointerPosition, Rect};
pub use logging::{LogConfig, LogFormat, LoggingError};
