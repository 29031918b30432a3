//! # TF Buffer
//!
//! In-memory transform history.
//!
//! Responsibilities:
//! - Keep a bounded, time-indexed history per parent -> child edge
//! - Resolve lookups across the frame graph with interpolation
//! - Derive averaged twists from the history
//! - Ingest transform streams (JSON lines from a file or stdin)
//!
//! `SharedTransformBuffer` and `ScriptedProvider` both implement
//! `contracts::TransformHistoryProvider`.

pub mod buffer;
pub mod feed;
pub mod history;
pub mod mock;
pub mod shared;

pub use buffer::{BufferConfig, TransformBuffer};
pub use feed::{parse_line, FeedConfig, FeedSource, FeedStats, TransformFeed};
pub use history::TransformHistory;
pub use mock::{Availability, ScriptedProvider, TwistQuery};
pub use shared::SharedTransformBuffer;
