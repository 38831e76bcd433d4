//! Local video operations: duration probing, window trimming, and
//! whole-file download. Probing and trimming shell out to ffprobe/ffmpeg;
//! the trait seam exists so workflow code can be exercised without either
//! binary installed.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{Error, Result};

/// Duration probing and window trimming over local video files
#[async_trait]
pub trait VideoTools: Send + Sync {
    /// Total duration of the container, in seconds
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;

    /// Write a copy of `input` covering [start, end) (or through end of
    /// input when `end` is `None`) to `output`
    async fn trim(&self, input: &Path, output: &Path, start: u64, end: Option<u64>) -> Result<()>;
}

/// ffprobe/ffmpeg-backed implementation
#[derive(Debug, Clone, Default)]
pub struct FfmpegTools;

impl FfmpegTools {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VideoTools for FfmpegTools {
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Tool(format!("non-UTF8 path: {}", path.display())))?;

        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                path_str,
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Tool(format!("ffprobe failed for {}", path.display())));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let ffprobe_data: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|e| Error::Tool(format!("unparseable ffprobe output: {}", e)))?;

        ffprobe_data["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| Error::Tool(format!("no duration reported for {}", path.display())))
    }

    async fn trim(&self, input: &Path, output: &Path, start: u64, end: Option<u64>) -> Result<()> {
        let input_str = input
            .to_str()
            .ok_or_else(|| Error::Tool(format!("non-UTF8 path: {}", input.display())))?;
        let output_str = output
            .to_str()
            .ok_or_else(|| Error::Tool(format!("non-UTF8 path: {}", output.display())))?;

        let start_arg = start.to_string();
        let end_arg = end.map(|e| e.to_string());

        let mut args = vec!["-i", input_str, "-ss", &start_arg];
        if let Some(ref end_arg) = end_arg {
            args.extend(["-to", end_arg.as_str()]);
        }

        args.extend([
            "-c:v",
            "libx264",
            "-c:a",
            "aac",
            "-y",
            output_str,
        ]);

        info!(
            "✂️ Trimming {} [{}s..{}] -> {}",
            input.display(),
            start,
            end.map(|e| format!("{}s", e)).unwrap_or_else(|| "eof".to_string()),
            output.display()
        );

        let status = tokio::process::Command::new("ffmpeg")
            .args(&args)
            .status()
            .await?;

        if !status.success() {
            return Err(Error::Tool(format!(
                "ffmpeg trim failed for {} [{}s..)",
                input.display(),
                start
            )));
        }

        Ok(())
    }
}

/// Download a remote video to a local file, streaming chunk by chunk.
pub async fn download_to(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    info!("⬇️ Downloading {} -> {}", url, dest.display());

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|source| Error::Download {
            url: url.to_string(),
            source,
        })?;

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| Error::Download {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}
