//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CheckpointState`: whether a conversation or files crawl has not started,
//!   was interrupted, or is complete

mod checkpoint_state;

pub use checkpoint_state::CheckpointState;
