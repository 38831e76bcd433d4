//! Per-chapter clip extraction.
//!
//! Takes an assembled "MM:SS-title" timeline plus the source video's
//! streaming URL, materializes the whole video once into a scratch file,
//! and trims one clip per timeline record. Clips are sent through a channel
//! as soon as each one is written, so a consumer can present early results
//! while later records are still rendering. The stream is finite and not
//! restartable; clips already produced before a failure stay on disk and
//! belong to the caller.
//!
//! Downloading the full source instead of slicing HLS segments per chapter
//! is deliberate here: a batch of N clips would otherwise re-walk the
//! manifest N times. The byte-accurate single-range path lives in
//! `crate::hls`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::timecode::parse_mmss;
use crate::video::{self, VideoTools};

/// One clip to cut: a start, an optional end (the last record runs to end
/// of input), and the chapter title it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSpec {
    pub start: u64,
    pub end: Option<u64>,
    pub title: String,
}

/// Parse timeline text back into clip specs. Each record's end is the next
/// record's start; the last record is open-ended.
pub fn parse_clip_specs(text: &str) -> Result<Vec<ClipSpec>> {
    let mut specs = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (time, title) = line.split_once('-').ok_or_else(|| Error::Format {
            text: line.to_string(),
        })?;

        specs.push(ClipSpec {
            start: parse_mmss(time.trim())?,
            end: None,
            title: title.trim().to_string(),
        });
    }

    for i in 0..specs.len().saturating_sub(1) {
        let next_start = specs[i + 1].start;
        specs[i].end = Some(next_start);
    }

    Ok(specs)
}

/// Output filename for the `index`-th clip (0-based in, 1-based out):
/// "NN_title_with_underscores.mp4", lowercased.
pub fn clip_filename(index: usize, title: &str) -> String {
    format!("{:02}_{}.mp4", index + 1, title.to_lowercase().replace(' ', "_"))
}

/// Cuts per-chapter clips from a remote source video
pub struct SegmentExtractor<V> {
    client: reqwest::Client,
    tools: Arc<V>,
    output_dir: PathBuf,
}

impl<V: VideoTools + 'static> SegmentExtractor<V> {
    pub fn new(client: reqwest::Client, tools: V, output_dir: PathBuf) -> Self {
        Self {
            client,
            tools: Arc::new(tools),
            output_dir,
        }
    }

    /// Start extraction and return a receiver that yields each clip's path
    /// as soon as the file is written. A failure is delivered in-stream as
    /// the final item; clips yielded before it remain valid.
    pub fn extract_clips(&self, timeline_text: String, source_url: String) -> mpsc::Receiver<Result<PathBuf>> {
        let (tx, rx) = mpsc::channel(1);
        let client = self.client.clone();
        let tools = Arc::clone(&self.tools);
        let output_dir = self.output_dir.clone();

        tokio::spawn(async move {
            if let Err(e) = run_extraction(client, tools, timeline_text, source_url, output_dir, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        rx
    }
}

async fn run_extraction<V: VideoTools>(
    client: reqwest::Client,
    tools: Arc<V>,
    timeline_text: String,
    source_url: String,
    output_dir: PathBuf,
    tx: &mpsc::Sender<Result<PathBuf>>,
) -> Result<()> {
    let specs = parse_clip_specs(&timeline_text)?;
    if specs.is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(&output_dir).await?;

    let scratch = tempfile::Builder::new()
        .prefix("chapter-gen-source-")
        .suffix(".mp4")
        .tempfile()?
        .into_temp_path();

    let outcome = async {
        video::download_to(&client, &source_url, &scratch).await?;
        info!("🎞️ Cutting {} clips into {}", specs.len(), output_dir.display());

        for (index, spec) in specs.iter().enumerate() {
            let clip_path = output_dir.join(clip_filename(index, &spec.title));
            tools.trim(&scratch, &clip_path, spec.start, spec.end).await?;

            if tx.send(Ok(clip_path)).await.is_err() {
                // Receiver dropped; stop cutting
                break;
            }
        }

        Ok(())
    }
    .await;

    if let Err(e) = scratch.close() {
        warn!("Failed to remove downloaded source copy: {}", e);
    }

    outcome
}

/// Cut clips from an already-local source file, yielding paths in order.
/// Used when the caller has its own copy of the video.
pub async fn extract_clips_from_file<V: VideoTools>(
    tools: &V,
    source: &Path,
    timeline_text: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let specs = parse_clip_specs(timeline_text)?;
    tokio::fs::create_dir_all(output_dir).await?;

    let mut produced = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let clip_path = output_dir.join(clip_filename(index, &spec.title));
        tools.trim(source, &clip_path, spec.start, spec.end).await?;
        produced.push(clip_path);
    }

    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clip_specs_chains_ends() {
        let specs = parse_clip_specs("00:00-Intro\n01:00-Body").unwrap();

        assert_eq!(
            specs,
            vec![
                ClipSpec { start: 0, end: Some(60), title: "Intro".to_string() },
                ClipSpec { start: 60, end: None, title: "Body".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_clip_specs_keeps_hyphenated_titles() {
        let specs = parse_clip_specs("02:05-Q&A - closing remarks").unwrap();
        assert_eq!(specs[0].start, 125);
        assert_eq!(specs[0].title, "Q&A - closing remarks");
    }

    #[test]
    fn test_parse_clip_specs_rejects_malformed_lines() {
        assert!(matches!(parse_clip_specs("no timestamp here"), Err(Error::Format { .. })));
        assert!(matches!(parse_clip_specs("1:2:3-Title"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_parse_clip_specs_skips_blank_lines() {
        let specs = parse_clip_specs("00:00-Intro\n\n01:00-Body\n").unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn test_clip_filename_shape() {
        assert_eq!(clip_filename(0, "Intro"), "01_intro.mp4");
        assert_eq!(clip_filename(11, "Closing Remarks"), "12_closing_remarks.mp4");
    }

    struct TouchTools;

    #[async_trait::async_trait]
    impl VideoTools for TouchTools {
        async fn duration_seconds(&self, _path: &Path) -> Result<f64> {
            Ok(0.0)
        }

        async fn trim(
            &self,
            _input: &Path,
            output: &Path,
            _start: u64,
            _end: Option<u64>,
        ) -> Result<()> {
            tokio::fs::write(output, b"clip").await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_extract_from_file_writes_ordered_clips() {
        let dir = tempfile::tempdir().unwrap();

        let produced = extract_clips_from_file(
            &TouchTools,
            Path::new("source.mp4"),
            "00:00-Intro\n01:00-Body",
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(produced.len(), 2);
        assert_eq!(produced[0].file_name().unwrap(), "01_intro.mp4");
        assert_eq!(produced[1].file_name().unwrap(), "02_body.mp4");
        for path in &produced {
            assert!(path.exists());
        }
    }
}
