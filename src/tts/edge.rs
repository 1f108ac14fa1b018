use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::SpeechEngine;
use crate::error::AppError;

/// Speech engine backed by the `edge-tts` command-line tool.
pub struct EdgeTtsEngine {
    program: PathBuf,
}

impl EdgeTtsEngine {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    fn spawn_error(&self, e: io::Error) -> AppError {
        let hint = if e.kind() == io::ErrorKind::NotFound {
            " (is it installed?)"
        } else {
            ""
        };
        AppError::Synthesis(format!(
            "Failed to run {}{}: {}",
            self.program.display(),
            hint,
            e
        ))
    }
}

#[async_trait]
impl SpeechEngine for EdgeTtsEngine {
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<(), AppError> {
        // Text goes through stdin: argv caps a single argument at 128 KiB and
        // cannot carry NUL bytes.
        let mut child = Command::new(&self.program)
            .arg(format!("--voice={}", voice))
            .arg("--file=/dev/stdin")
            .arg(format!("--write-media={}", output.display()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Synthesis("engine stdin unavailable".into()))?;

        // Feed stdin while collecting output so neither pipe can fill up and stall.
        let feed = async move {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, result) = tokio::join!(feed, child.wait_with_output());

        let result = result.map_err(|e| {
            AppError::Synthesis(format!("{} did not finish: {}", self.program.display(), e))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AppError::Synthesis(format!(
                "{} failed ({}): {}",
                self.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        fed.map_err(|e| {
            AppError::Synthesis(format!(
                "Failed to pass text to {}: {}",
                self.program.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_a_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = EdgeTtsEngine::new(dir.path().join("no-such-edge-tts"));

        let err = engine
            .synthesize("Hello", "en-US-JennyNeural", &dir.path().join("out.mp3"))
            .await
            .unwrap_err();

        match err {
            AppError::Synthesis(msg) => {
                assert!(msg.contains("no-such-edge-tts"));
                assert!(msg.contains("is it installed?"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_executable_binary_has_no_install_hint() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("edge-tts");
        std::fs::write(&program, "not a program").unwrap();

        let err = EdgeTtsEngine::new(program)
            .synthesize("Hello", "en-US-JennyNeural", &dir.path().join("out.mp3"))
            .await
            .unwrap_err();

        match err {
            AppError::Synthesis(msg) => assert!(!msg.contains("is it installed?"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// One test drives the script so the executable is written once.
    #[cfg(unix)]
    #[tokio::test]
    async fn runs_engine_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-edge-tts");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             for arg in \"$@\"; do\n\
               case \"$arg\" in\n\
                 --voice=*) voice=\"${arg#--voice=}\" ;;\n\
                 --file=*) input=\"${arg#--file=}\" ;;\n\
                 --write-media=*) out=\"${arg#--write-media=}\" ;;\n\
               esac\n\
             done\n\
             cat \"$input\" > \"$out.txt\"\n\
             if [ \"$voice\" = broken ]; then echo 'no audio was received' >&2; exit 1; fi\n\
             printf 'ID3 %s' \"$voice\" > \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = EdgeTtsEngine::new(script);

        let out = dir.path().join("hello.mp3");
        engine
            .synthesize("Hello world", "en-US-JennyNeural", &out)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"ID3 en-US-JennyNeural");
        assert_eq!(
            std::fs::read(dir.path().join("hello.mp3.txt")).unwrap(),
            b"Hello world"
        );

        // Larger than a single argv entry may be.
        let long_text = "a".repeat(200_000);
        let out = dir.path().join("long.mp3");
        engine
            .synthesize(&long_text, "en-US-JennyNeural", &out)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("long.mp3.txt")).unwrap(),
            long_text.as_bytes()
        );

        let out = dir.path().join("nul.mp3");
        engine
            .synthesize("Hello\0world", "en-US-JennyNeural", &out)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("nul.mp3.txt")).unwrap(),
            b"Hello\0world"
        );

        let err = engine
            .synthesize("-leading dash", "broken", &dir.path().join("x.mp3"))
            .await
            .unwrap_err();
        match err {
            AppError::Synthesis(msg) => assert!(msg.contains("no audio was received")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            std::fs::read(dir.path().join("x.mp3.txt")).unwrap(),
            b"-leading dash"
        );
    }
}
