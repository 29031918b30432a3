//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: frame and
//! twist records, the transform history capability, the publish capability, and
//! the error taxonomy. Business crates depend on this crate, never the reverse.
//!
//! ## Time Model
//! - Timestamps are `f64` seconds (wall clock since the UNIX epoch, or the clock
//!   of a replayed transform stream)
//! - `LookupTime::Latest` lets the provider pick the newest usable time

mod config;
mod error;
mod frames;
mod geometry;
mod provider;
mod sink;

pub use config::*;
pub use error::*;
pub use frames::{normalize_frame_id, FramePair};
pub use geometry::*;
pub use provider::*;
pub use sink::*;
