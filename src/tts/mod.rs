pub mod artifact;
pub mod edge;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;

pub use artifact::TempArtifact;
pub use edge::EdgeTtsEngine;

/// External text-to-speech backend. Implementations write MP3 audio for
/// `text`, spoken with `voice`, to `output`.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), AppError>;
}

pub struct TtsService {
    engine: Arc<dyn SpeechEngine>,
    voice: String,
    output_dir: PathBuf,
}

impl TtsService {
    pub fn new(engine: Arc<dyn SpeechEngine>, voice: String, output_dir: PathBuf) -> Self {
        Self {
            engine,
            voice,
            output_dir,
        }
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist yet.
    pub async fn prepare(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    /// Synthesize `text` into a fresh artifact named after `prefix`.
    ///
    /// On any failure the partially written artifact is dropped, and with it
    /// deleted, before the error is returned.
    pub async fn speak(&self, text: &str, prefix: &str) -> Result<TempArtifact, AppError> {
        let artifact = TempArtifact::new(&self.output_dir, artifact::generate_name(prefix));

        tracing::info!(
            artifact = artifact.name(),
            voice = %self.voice,
            chars = text.chars().count(),
            "Synthesizing speech"
        );

        self.engine
            .synthesize(text, &self.voice, artifact.path())
            .await?;

        let written = tokio::fs::metadata(artifact.path())
            .await
            .map_err(|e| AppError::Synthesis(format!("engine produced no audio: {}", e)))?;
        if written.len() == 0 {
            return Err(AppError::Synthesis("engine produced no audio".into()));
        }

        tracing::debug!(artifact = artifact.name(), bytes = written.len(), "Speech ready");

        Ok(artifact)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Behavior, FakeEngine, FAKE_MP3};
    use super::*;

    fn service(dir: &Path, behavior: Behavior) -> (Arc<FakeEngine>, TtsService) {
        let engine = Arc::new(FakeEngine::new(behavior));
        let service = TtsService::new(
            engine.clone(),
            "en-US-JennyNeural".to_string(),
            dir.to_path_buf(),
        );
        (engine, service)
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn speak_writes_artifact_with_fixed_voice() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, service) = service(dir.path(), Behavior::Succeed);

        let artifact = service.speak("Hello world", "tts").await.unwrap();
        assert!(artifact.name().starts_with("tts_"));
        assert_eq!(std::fs::read(artifact.path()).unwrap(), FAKE_MP3);

        let calls = engine.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("Hello world".to_string(), "en-US-JennyNeural".to_string())]
        );

        drop(artifact);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn failure_removes_partial_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let (_, service) = service(dir.path(), Behavior::FailAfterPartialWrite);

        let err = service.speak("Hello", "tts").await.unwrap_err();
        assert!(matches!(err, AppError::Synthesis(_)));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_, service) = service(dir.path(), Behavior::WriteNothing);

        let err = service.speak("Hello", "tts").await.unwrap_err();
        assert!(err.to_string().contains("engine produced no audio"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn prepare_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("audio").join("out");
        let (_, service) = service(&nested, Behavior::Succeed);

        service.prepare().await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(service.output_dir(), nested.as_path());
    }
}
