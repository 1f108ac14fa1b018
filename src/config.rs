use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9000;
const DEFAULT_OUTPUT_DIR: &str = "/tmp/audio";
const DEFAULT_ENGINE_BIN: &str = "edge-tts";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Static server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub output_dir: PathBuf,
    pub voice: String,
    pub engine_bin: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT must be a number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid address {}:{}: {}", host, port, e)))?;

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                AppError::Config(format!("MAX_UPLOAD_BYTES must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let voice = lookup("TTS_VOICE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VOICE.to_string());

        Ok(Self {
            addr,
            output_dir: lookup("TTS_OUTPUT_DIR")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string())
                .into(),
            voice,
            engine_bin: lookup("EDGE_TTS_BIN")
                .unwrap_or_else(|| DEFAULT_ENGINE_BIN.to_string())
                .into(),
            max_upload_bytes,
        })
    }
}
