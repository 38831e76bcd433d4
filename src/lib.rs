//! chapter-gen - chapter timestamp generation for videos
//!
//! Submits a video to a remote indexing/summarization service, waits for the
//! asynchronous job, and renders the resulting chapters as a "MM:SS-title"
//! timeline. Videos longer than a single job's window are indexed in pieces
//! and stitched back into one offset-corrected timeline; an assembled
//! timeline can also be cut into per-chapter clips.

pub mod config;
pub mod error;
pub mod extract;
pub mod hls;
pub mod indexing;
pub mod splitter;
pub mod timecode;
pub mod timeline;
pub mod video;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::extract::{ClipSpec, SegmentExtractor};
pub use crate::hls::{MediaPlaylist, MediaSegment};
pub use crate::indexing::{
    Indexer, IndexingJobClient, JobHandle, JobStatus, LogSink, StatusSink, VideoEntry,
};
pub use crate::splitter::LongVideoSplitter;
pub use crate::timeline::{AssembledChapters, Chapter, Timeline};
pub use crate::video::{FfmpegTools, VideoTools};
