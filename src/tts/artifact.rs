use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use chrono::Utc;
use futures::Stream;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

pub const DEFAULT_PREFIX: &str = "tts";
pub const EXTENSION: &str = "mp3";
pub const MEDIA_TYPE: &str = "audio/mpeg";

const SUFFIX_LEN: usize = 6;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

/// Generate `<prefix>_<YYYYMMDDTHHMMSSZ>_<6 hex>.mp3`.
pub fn generate_name(prefix: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}.{}",
        prefix,
        timestamp,
        &suffix[..SUFFIX_LEN],
        EXTENSION
    )
}

/// Derive an artifact prefix from an uploaded file name.
///
/// Only the last path component is used, its extension is dropped and
/// anything outside `[A-Za-z0-9._-]` becomes `_`, so the result is safe both
/// as a file name and inside a quoted `Content-Disposition` value.
pub fn prefix_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or(Cow::Borrowed(""));

    let cleaned = UNSAFE_CHARS.replace_all(&stem, "_");
    if cleaned.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Best-effort delete. Never fails; problems are only logged.
pub fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed artifact"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
    }
}

/// A synthesized audio file owned by a single request.
///
/// Dropping the value deletes the file, whether or not it was ever written.
#[derive(Debug)]
pub struct TempArtifact {
    name: String,
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(dir: &Path, name: String) -> Self {
        let path = dir.join(&name);
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the artifact for streaming. Returns its size in bytes and a
    /// stream that keeps the artifact alive until the stream is dropped.
    pub async fn into_stream(self) -> io::Result<(u64, ArtifactStream)> {
        let file = File::open(&self.path).await?;
        let len = file.metadata().await?.len();

        Ok((
            len,
            ArtifactStream {
                inner: ReaderStream::new(file),
                _artifact: self,
            },
        ))
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        // Synchronous unlink: the file is gone by the time drop returns.
        remove_quietly(&self.path);
    }
}

/// Chunked reader over an artifact. The file handle is dropped before the
/// artifact guard, so deletion runs after the last read.
pub struct ArtifactStream {
    inner: ReaderStream<File>,
    _artifact: TempArtifact,
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
