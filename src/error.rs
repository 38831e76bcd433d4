//! Error taxonomy for the chapter generation workflows.
//!
//! Every component wraps its underlying cause into one of these variants and
//! propagates it; nothing is swallowed. Callers pattern-match on the kind
//! instead of string-inspecting a generic error.

/// Result type for chapter-gen operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Source video is longer than the hard indexing ceiling. Raised before
    /// any remote call is made.
    #[error("video duration {actual}s exceeds the {limit}s indexing ceiling")]
    DurationExceeded { actual: u64, limit: u64 },

    /// A submitted indexing job reached terminal `failed` status.
    #[error("indexing job {id} finished with status {status}")]
    IndexingFailed { id: String, status: String },

    /// Non-success response from the indexing service.
    #[error("indexing service returned {status}: {message}")]
    Dependency { status: u16, message: String },

    /// Summarization succeeded but produced zero chapters. Distinct from
    /// `Dependency` because the response itself was valid, just unusable.
    #[error("summarization returned an empty chapter list")]
    EmptyChapterList,

    /// Malformed "MM:SS" text or timeline line.
    #[error("malformed timestamp text {text:?}: expected MM:SS")]
    Format { text: String },

    /// Failure while materializing a video or media segment from a URL.
    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Malformed or unusable HLS playlist.
    #[error("invalid HLS playlist: {0}")]
    Playlist(String),

    /// ffmpeg/ffprobe invocation failure.
    #[error("external tool failed: {0}")]
    Tool(String),

    /// Missing or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}
