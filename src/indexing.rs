//! Client for the remote video indexing/summarization service.
//!
//! The service ingests a video asynchronously: submit returns a job handle,
//! the job moves through queued/processing states, and once ready the
//! resulting video id can be summarized into a chapter list. This module
//! owns the submit/poll/summarize plumbing; every non-success response is
//! surfaced as `Error::Dependency` with the status and body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::timeline::Chapter;

/// Lifecycle status of an indexing job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Validating,
    Pending,
    Queued,
    Indexing,
    Processing,
    Ready,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// `ready` and `failed` are the only terminal states
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            JobStatus::Validating => "validating",
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Indexing => "indexing",
            JobStatus::Processing => "processing",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        };
        write!(f, "{}", text)
    }
}

/// Handle to a submitted indexing job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    pub status: JobStatus,
    /// Id of the indexed video, populated once the job is ready
    pub video_id: Option<String>,
}

/// A previously indexed video, as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    pub id: String,
    pub filename: String,
}

/// Receives every status observed while waiting on a job. Replaces the
/// per-poll callback shape: the wait call blocks and returns the terminal
/// handle, and the sink is informed of each transition along the way.
pub trait StatusSink: Send + Sync {
    fn on_status(&self, job_id: &str, status: JobStatus);
}

/// Sink that reports poll statuses through the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn on_status(&self, job_id: &str, status: JobStatus) {
        info!("⏳ Job {}: {}", job_id, status);
    }
}

/// Submit/poll/summarize surface of the indexing service, kept behind a
/// trait so the splitting workflow can be driven without the network.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Upload a video file and register it against the target index
    async fn submit(&self, file: &Path) -> Result<JobHandle>;

    /// Block until the job reaches a terminal status, reporting every
    /// observed status to `sink`
    async fn wait_for_done(&self, handle: &JobHandle, sink: &dyn StatusSink) -> Result<JobHandle>;

    /// Fetch the chapter summary for an already-indexed video
    async fn summarize_chapters(&self, video_id: &str) -> Result<Vec<Chapter>>;
}

/// HTTP client for the indexing service
pub struct IndexingJobClient {
    config: ApiConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default)]
    status: Option<JobStatus>,
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    #[serde(default)]
    chapters: Vec<RawChapter>,
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    start: f64,
    chapter_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    data: Vec<VideoListEntry>,
}

#[derive(Debug, Deserialize)]
struct VideoListEntry {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default)]
    metadata: VideoListMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct VideoListMetadata {
    #[serde(default)]
    filename: String,
}

impl IndexingJobClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn dependency_error(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        Error::Dependency { status, message }
    }

    async fn fetch_task(&self, task_id: &str) -> Result<JobHandle> {
        let response = self
            .client
            .get(self.url(&format!("tasks/{}", task_id)))
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::dependency_error(response).await);
        }

        let task: TaskResponse = response.json().await?;
        Ok(JobHandle {
            id: task.id,
            status: task.status.unwrap_or(JobStatus::Unknown),
            video_id: task.video_id,
        })
    }

    /// List previously indexed videos in the target index: first page,
    /// fixed page size, newest first.
    pub async fn list_videos(&self) -> Result<Vec<VideoEntry>> {
        let url = self.url(&format!(
            "indexes/{}/videos?page=1&page_limit={}&sort_by=created_at&sort_option=desc",
            self.config.index_id, self.config.page_size
        ));

        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::dependency_error(response).await);
        }

        let listing: VideoListResponse = response.json().await?;
        Ok(listing
            .data
            .into_iter()
            .map(|entry| VideoEntry {
                id: entry.id,
                filename: entry.metadata.filename,
            })
            .collect())
    }

    /// Fetch a video's metadata and extract its HLS playlist URL, if the
    /// service has produced one.
    pub async fn streaming_url(&self, video_id: &str) -> Result<Option<String>> {
        let url = self.url(&format!("indexes/{}/videos/{}", self.config.index_id, video_id));

        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::dependency_error(response).await);
        }

        let metadata: serde_json::Value = response.json().await?;
        Ok(metadata["hls"]["video_url"].as_str().map(String::from))
    }
}

#[async_trait]
impl Indexer for IndexingJobClient {
    async fn submit(&self, file: &Path) -> Result<JobHandle> {
        let filename = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        info!("📤 Submitting {} for indexing", filename);

        let data = tokio::fs::read(file).await?;
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str("video/mp4")?;

        let form = reqwest::multipart::Form::new()
            .text("index_id", self.config.index_id.clone())
            .part("video_file", part);

        let response = self
            .client
            .post(self.url("tasks"))
            .header("x-api-key", &self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::dependency_error(response).await);
        }

        let task: TaskResponse = response.json().await?;
        info!("🆕 Indexing job created: {}", task.id);

        Ok(JobHandle {
            id: task.id,
            status: task.status.unwrap_or(JobStatus::Queued),
            video_id: task.video_id,
        })
    }

    async fn wait_for_done(&self, handle: &JobHandle, sink: &dyn StatusSink) -> Result<JobHandle> {
        // No poll ceiling: the loop runs until the service reports a
        // terminal status.
        loop {
            let current = self.fetch_task(&handle.id).await?;
            sink.on_status(&current.id, current.status);

            if current.status.is_terminal() {
                return Ok(current);
            }

            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_seconds)).await;
        }
    }

    async fn summarize_chapters(&self, video_id: &str) -> Result<Vec<Chapter>> {
        info!("📝 Requesting chapter summary for video {}", video_id);

        let body = serde_json::json!({
            "video_id": video_id,
            "type": "chapter",
        });

        let response = self
            .client
            .post(self.url("summarize"))
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::dependency_error(response).await);
        }

        let summary: SummarizeResponse = response.json().await?;
        Ok(summary
            .chapters
            .into_iter()
            .map(|chapter| Chapter {
                start: chapter.start.max(0.0) as u64,
                title: chapter.chapter_title,
            })
            .collect())
    }
}
