//! Chapter records and the offset-corrected timeline text built from them.
//!
//! All offsets in an assembled timeline are expressed in the coordinate
//! space of the original, untrimmed source video. When a long video is
//! indexed in pieces, each piece's chapters are shifted by the seconds
//! already covered before being appended; that shift happens here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timecode::format_mmss;

/// A semantic span of a video, as returned by the summarization endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    /// Start offset in seconds from the beginning of the indexed clip
    pub start: u64,
    /// Chapter title
    pub title: String,
}

/// One indexing job's chapters rendered as "MM:SS-title" lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledChapters {
    /// Newline-joined "MM:SS-title" lines
    pub text: String,
    /// Shifted start of the last chapter in the input
    pub new_origin: u64,
}

/// The full-video chapter listing, possibly stitched from several jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub text: String,
    /// Start offset of the last chapter, in original-video coordinates
    pub covered_until: u64,
}

/// Shift a job's chapters by `origin` seconds and render them as timeline
/// lines. The summarizer is assumed to return chapters in start order, but
/// that is not part of its documented contract, so they are sorted here
/// before formatting.
pub fn assemble(chapters: &[Chapter], origin: u64) -> Result<AssembledChapters> {
    if chapters.is_empty() {
        return Err(Error::EmptyChapterList);
    }

    let mut ordered = chapters.to_vec();
    ordered.sort_by_key(|chapter| chapter.start);

    let lines: Vec<String> = ordered
        .iter()
        .map(|chapter| format!("{}-{}", format_mmss(chapter.start + origin), chapter.title))
        .collect();

    // Safe: emptiness was rejected above
    let new_origin = ordered.last().map(|chapter| chapter.start + origin).unwrap_or(origin);

    Ok(AssembledChapters {
        text: lines.join("\n"),
        new_origin,
    })
}
