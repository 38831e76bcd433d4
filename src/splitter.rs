//! Long-video splitting: drive one or two indexing jobs over a source video
//! and stitch the per-job chapter lists into one offset-corrected timeline.
//!
//! Videos longer than the indexing ceiling are rejected outright. Videos
//! longer than a single sub-job window are indexed in two phases: [0, S)
//! then [S, duration). Phases are strictly sequential, each one is
//! trim -> submit -> poll -> cleanup, and the trim scratch file is removed
//! on every exit path. A phase that ends `failed` fails the whole
//! operation; the remote side keeps whatever it already indexed, but no
//! partial timeline is returned locally.

use std::path::Path;
use tracing::{info, warn};

use crate::config::SplitConfig;
use crate::error::{Error, Result};
use crate::indexing::{Indexer, JobStatus, StatusSink};
use crate::timeline::{self, Chapter, Timeline};
use crate::video::VideoTools;

pub struct LongVideoSplitter<I, V> {
    indexer: I,
    tools: V,
    limits: SplitConfig,
}

impl<I: Indexer, V: VideoTools> LongVideoSplitter<I, V> {
    pub fn new(indexer: I, tools: V, limits: SplitConfig) -> Self {
        Self {
            indexer,
            tools,
            limits,
        }
    }

    /// Index `video` (in one or two jobs depending on its duration) and
    /// return the assembled chapter timeline.
    pub async fn generate_timeline(&self, video: &Path, sink: &dyn StatusSink) -> Result<Timeline> {
        let duration = self.tools.duration_seconds(video).await?;
        self.build_timeline(video, duration, sink).await
    }

    async fn build_timeline(
        &self,
        video: &Path,
        duration: f64,
        sink: &dyn StatusSink,
    ) -> Result<Timeline> {
        let limit = self.limits.max_duration_seconds;
        if duration > limit as f64 {
            return Err(Error::DurationExceeded {
                actual: duration.ceil() as u64,
                limit,
            });
        }

        let window = self.limits.segment_duration_seconds;
        if duration <= window as f64 {
            info!("🎬 Indexing whole video ({:.1}s) in a single job", duration);
            let chapters = self.index_whole(video, sink).await?;
            let assembled = timeline::assemble(&chapters, 0)?;
            return Ok(Timeline {
                text: assembled.text,
                covered_until: assembled.new_origin,
            });
        }

        let end = duration.ceil() as u64;
        info!(
            "🎬 Indexing {:.1}s video in two jobs: [0s..{}s) and [{}s..{}s)",
            duration, window, window, end
        );

        let first = self.index_window(video, 0, window, sink).await?;
        let part_a = timeline::assemble(&first, 0)?;

        // The second job's chapters are shifted by its trim-window start,
        // which keeps all offsets in original-video coordinates even when
        // the first job's last chapter starts well before the cut.
        let second = self.index_window(video, window, end, sink).await?;
        let part_b = timeline::assemble(&second, window)?;

        Ok(Timeline {
            text: format!("{}\n{}", part_a.text, part_b.text),
            covered_until: part_b.new_origin,
        })
    }

    /// Submit the untrimmed source as a single job.
    async fn index_whole(&self, video: &Path, sink: &dyn StatusSink) -> Result<Vec<Chapter>> {
        self.index_file(video, sink).await
    }

    /// Trim [start, end) into a scratch file, index it, and delete the
    /// scratch file whether or not indexing succeeded.
    async fn index_window(
        &self,
        video: &Path,
        start: u64,
        end: u64,
        sink: &dyn StatusSink,
    ) -> Result<Vec<Chapter>> {
        let scratch = tempfile::Builder::new()
            .prefix("chapter-gen-trim-")
            .suffix(".mp4")
            .tempfile()?
            .into_temp_path();

        let outcome = async {
            self.tools.trim(video, &scratch, start, Some(end)).await?;
            self.index_file(&scratch, sink).await
        }
        .await;

        // TempPath would also delete on drop; closing explicitly lets a
        // cleanup failure be reported instead of ignored.
        if let Err(e) = scratch.close() {
            warn!("Failed to remove trim scratch file: {}", e);
        }

        outcome
    }

    async fn index_file(&self, file: &Path, sink: &dyn StatusSink) -> Result<Vec<Chapter>> {
        let handle = self.indexer.submit(file).await?;
        let finished = self.indexer.wait_for_done(&handle, sink).await?;

        if finished.status != JobStatus::Ready {
            return Err(Error::IndexingFailed {
                id: finished.id,
                status: finished.status.to_string(),
            });
        }

        let video_id = finished.video_id.ok_or(Error::Dependency {
            status: 200,
            message: format!("job {} is ready but reported no video id", finished.id),
        })?;

        info!("✅ Job {} ready, video id {}", finished.id, video_id);
        self.indexer.summarize_chapters(&video_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::JobHandle;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Indexer double: returns scripted chapter lists per submission and
    /// counts remote calls.
    struct ScriptedIndexer {
        submissions: AtomicUsize,
        /// Chapters handed out per job, in submission order
        chapters: Vec<Vec<Chapter>>,
        /// 1-based index of the submission that should end `failed`, if any
        fail_on: Option<usize>,
    }

    impl ScriptedIndexer {
        fn new(chapters: Vec<Vec<Chapter>>) -> Self {
            Self {
                submissions: AtomicUsize::new(0),
                chapters,
                fail_on: None,
            }
        }

        fn failing_on(mut self, submission: usize) -> Self {
            self.fail_on = Some(submission);
            self
        }

        fn submission_count(&self) -> usize {
            self.submissions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Indexer for ScriptedIndexer {
        async fn submit(&self, _file: &Path) -> Result<JobHandle> {
            let n = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(JobHandle {
                id: format!("task-{}", n),
                status: JobStatus::Queued,
                video_id: None,
            })
        }

        async fn wait_for_done(
            &self,
            handle: &JobHandle,
            sink: &dyn StatusSink,
        ) -> Result<JobHandle> {
            sink.on_status(&handle.id, JobStatus::Indexing);

            let n: usize = handle.id.trim_start_matches("task-").parse().unwrap();
            if self.fail_on == Some(n) {
                sink.on_status(&handle.id, JobStatus::Failed);
                return Ok(JobHandle {
                    id: handle.id.clone(),
                    status: JobStatus::Failed,
                    video_id: None,
                });
            }

            sink.on_status(&handle.id, JobStatus::Ready);
            Ok(JobHandle {
                id: handle.id.clone(),
                status: JobStatus::Ready,
                video_id: Some(format!("vid-{}", n)),
            })
        }

        async fn summarize_chapters(&self, video_id: &str) -> Result<Vec<Chapter>> {
            let n: usize = video_id.trim_start_matches("vid-").parse().unwrap();
            Ok(self.chapters[n - 1].clone())
        }
    }

    /// VideoTools double: fixed duration, trims by writing a marker file,
    /// and records every scratch path it produced.
    struct FakeTools {
        duration: f64,
        trimmed: Mutex<Vec<PathBuf>>,
    }

    impl FakeTools {
        fn new(duration: f64) -> Self {
            Self {
                duration,
                trimmed: Mutex::new(Vec::new()),
            }
        }

        fn trimmed_paths(&self) -> Vec<PathBuf> {
            self.trimmed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoTools for FakeTools {
        async fn duration_seconds(&self, _path: &Path) -> Result<f64> {
            Ok(self.duration)
        }

        async fn trim(
            &self,
            _input: &Path,
            output: &Path,
            _start: u64,
            _end: Option<u64>,
        ) -> Result<()> {
            tokio::fs::write(output, b"trimmed").await?;
            self.trimmed.lock().unwrap().push(output.to_path_buf());
            Ok(())
        }
    }

    struct NullSink;

    impl StatusSink for NullSink {
        fn on_status(&self, _job_id: &str, _status: JobStatus) {}
    }

    fn limits() -> SplitConfig {
        SplitConfig {
            max_duration_seconds: 3600,
            segment_duration_seconds: 1800,
        }
    }

    fn chapter(start: u64, title: &str) -> Chapter {
        Chapter {
            start,
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejects_over_ceiling_before_any_remote_call() {
        let indexer = ScriptedIndexer::new(vec![]);
        let splitter = LongVideoSplitter::new(indexer, FakeTools::new(3601.0), limits());

        let result = splitter
            .build_timeline(Path::new("long.mp4"), 3601.0, &NullSink)
            .await;

        assert!(matches!(result, Err(Error::DurationExceeded { actual: 3601, limit: 3600 })));
        assert_eq!(splitter.indexer.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_short_video_uses_single_job_without_trimming() {
        let indexer = ScriptedIndexer::new(vec![vec![
            chapter(0, "Intro"),
            chapter(125, "Body"),
        ]]);
        let splitter = LongVideoSplitter::new(indexer, FakeTools::new(900.0), limits());

        let timeline = splitter
            .generate_timeline(Path::new("short.mp4"), &NullSink)
            .await
            .unwrap();

        assert_eq!(timeline.text, "00:00-Intro\n02:05-Body");
        assert_eq!(timeline.covered_until, 125);
        assert_eq!(splitter.indexer.submission_count(), 1);
        assert!(splitter.tools.trimmed_paths().is_empty());
    }

    #[tokio::test]
    async fn test_long_video_runs_two_jobs_with_shifted_offsets() {
        let indexer = ScriptedIndexer::new(vec![
            vec![chapter(0, "Opening"), chapter(600, "Middle")],
            vec![chapter(30, "Closing")],
        ]);
        let splitter = LongVideoSplitter::new(indexer, FakeTools::new(2000.0), limits());

        let timeline = splitter
            .generate_timeline(Path::new("podcast.mp4"), &NullSink)
            .await
            .unwrap();

        assert_eq!(splitter.indexer.submission_count(), 2);
        // Second job's chapters land at window start (1800s) + their own
        // offsets, never below the cut point
        assert_eq!(timeline.text, "00:00-Opening\n10:00-Middle\n30:30-Closing");
        assert_eq!(timeline.covered_until, 1830);
    }

    #[tokio::test]
    async fn test_failed_second_job_fails_whole_operation() {
        let indexer = ScriptedIndexer::new(vec![
            vec![chapter(0, "Opening")],
            vec![chapter(30, "Closing")],
        ])
        .failing_on(2);
        let splitter = LongVideoSplitter::new(indexer, FakeTools::new(2000.0), limits());

        let result = splitter
            .generate_timeline(Path::new("podcast.mp4"), &NullSink)
            .await;

        match result {
            Err(Error::IndexingFailed { id, status }) => {
                assert_eq!(id, "task-2");
                assert_eq!(status, "failed");
            }
            other => panic!("expected IndexingFailed, got {:?}", other.map(|t| t.text)),
        }
    }

    #[tokio::test]
    async fn test_trim_scratch_files_removed_on_success_and_failure() {
        // Success path
        let indexer = ScriptedIndexer::new(vec![
            vec![chapter(0, "Opening")],
            vec![chapter(30, "Closing")],
        ]);
        let splitter = LongVideoSplitter::new(indexer, FakeTools::new(2000.0), limits());
        splitter
            .generate_timeline(Path::new("podcast.mp4"), &NullSink)
            .await
            .unwrap();

        let paths = splitter.tools.trimmed_paths();
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert!(!path.exists(), "scratch file left behind: {}", path.display());
        }

        // Failure path: first job fails, its scratch file must still be gone
        let indexer = ScriptedIndexer::new(vec![vec![chapter(0, "Opening")]]).failing_on(1);
        let splitter = LongVideoSplitter::new(indexer, FakeTools::new(2000.0), limits());
        let result = splitter
            .generate_timeline(Path::new("podcast.mp4"), &NullSink)
            .await;
        assert!(result.is_err());

        let paths = splitter.tools.trimmed_paths();
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].exists());
    }
}
