//! HLS media playlist handling and byte-accurate segment range extraction.
//!
//! A media playlist is an ordered list of small segments, each with a
//! duration; the cumulative durations define a running timeline. To pull a
//! [start, end) window out of a rendition, walk that timeline, keep the
//! contiguous run of segments whose windows intersect the requested range,
//! fetch each one, and concatenate the raw bytes.

use tracing::info;
use url::Url;

use crate::error::{Error, Result};
use crate::timecode::parse_mmss;

/// One media segment entry from a playlist
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSegment {
    /// Relative or absolute URI as written in the playlist
    pub uri: String,
    /// Segment duration in seconds
    pub duration: f64,
}

/// A parsed HLS media playlist
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    pub segments: Vec<MediaSegment>,
}

impl MediaPlaylist {
    /// Parse media playlist text (#EXTM3U / #EXTINF / URI lines).
    pub fn parse(contents: &str) -> Result<Self> {
        if !contents.trim_start().starts_with("#EXTM3U") {
            return Err(Error::Playlist("missing #EXTM3U header".to_string()));
        }

        let mut segments = Vec::new();
        let mut pending_duration: Option<f64> = None;

        for line in contents.lines().map(|line| line.trim()) {
            if let Some(value) = line.strip_prefix("#EXTINF:") {
                let duration = value
                    .split(',')
                    .next()
                    .unwrap_or("")
                    .parse()
                    .map_err(|_| Error::Playlist(format!("invalid EXTINF duration: {}", line)))?;
                pending_duration = Some(duration);
            } else if line.starts_with('#') || line.is_empty() {
                continue;
            } else if let Some(duration) = pending_duration.take() {
                segments.push(MediaSegment {
                    uri: line.to_string(),
                    duration,
                });
            }
        }

        if segments.is_empty() {
            return Err(Error::Playlist("playlist has no segments".to_string()));
        }

        Ok(Self { segments })
    }

    /// Select the contiguous run of segments whose cumulative-duration
    /// window intersects [start, end). `end = None` means through the end
    /// of the rendition.
    pub fn select_range(&self, start: f64, end: Option<f64>) -> Vec<&MediaSegment> {
        let mut selected = Vec::new();
        let mut elapsed = 0.0;

        for segment in &self.segments {
            let segment_end = elapsed + segment.duration;
            let overlaps_start = segment_end > start;
            let overlaps_end = end.map_or(true, |end| elapsed < end);

            if overlaps_start && overlaps_end {
                selected.push(segment);
            }

            elapsed = segment_end;
        }

        selected
    }
}

/// Fetch the playlist at `playlist_url` and download the raw bytes of the
/// segments covering [start, end), given as "MM:SS" text. Returns the
/// concatenated segment payloads.
pub async fn download_segment_range(
    client: &reqwest::Client,
    playlist_url: &str,
    start_mmss: &str,
    end_mmss: &str,
) -> Result<Vec<u8>> {
    let start = parse_mmss(start_mmss)? as f64;
    let end = parse_mmss(end_mmss)? as f64;

    let response = client.get(playlist_url).send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
        return Err(Error::Dependency { status, message });
    }

    let playlist_text = response.text().await?;
    let playlist = MediaPlaylist::parse(&playlist_text)?;

    let base = Url::parse(playlist_url)
        .map_err(|e| Error::Playlist(format!("invalid playlist URL {}: {}", playlist_url, e)))?;

    let selected = playlist.select_range(start, Some(end));
    info!(
        "🧩 Selected {} of {} segments for [{}..{})",
        selected.len(),
        playlist.segments.len(),
        start_mmss,
        end_mmss
    );

    let mut buffer = Vec::new();
    for segment in selected {
        let segment_url = base
            .join(&segment.uri)
            .map_err(|e| Error::Playlist(format!("invalid segment URI {}: {}", segment.uri, e)))?;

        let bytes = client
            .get(segment_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::Download {
                url: segment_url.to_string(),
                source,
            })?
            .bytes()
            .await
            .map_err(|source| Error::Download {
                url: segment_url.to_string(),
                source,
            })?;

        buffer.extend_from_slice(&bytes);
    }

    Ok(buffer)
}
