//! Text extraction through the Tesseract command line.

use std::io::Write;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use kuppi_core::{defaults, Error, OcrEngine, Result};

/// Runs `tesseract <image> stdout -l <lang>` for each request.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    timeout_secs: u64,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            timeout_secs,
        }
    }

    /// Create from `TESSERACT_CMD` and `OCR_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let command = std::env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string());
        let timeout_secs = std::env::var("OCR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::OCR_TIMEOUT_SECS);
        Self::new(command, timeout_secs)
    }
}

/// Tesseract language specs are model names joined by `+`, e.g. `sin+eng`.
pub fn is_valid_language(language: &str) -> bool {
    !language.is_empty()
        && language.len() <= 64
        && language
            .split('+')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

/// Run a command with a timeout, returning stdout as a string.
async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| Error::Ocr(format!("OCR timed out after {}s", timeout_secs)))?
        .map_err(|e| Error::Ocr(format!("Failed to execute OCR command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Ocr(format!(
            "OCR command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract(&self, image: &[u8], language: &str) -> Result<String> {
        if !is_valid_language(language) {
            return Err(Error::InvalidInput(format!(
                "Invalid OCR language: {}",
                language
            )));
        }
        let start = Instant::now();

        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::Ocr(format!("Failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(image)
            .map_err(|e| Error::Ocr(format!("Failed to write temp file: {}", e)))?;

        let text = run_cmd_with_timeout(
            Command::new(&self.command)
                .arg(tmpfile.path())
                .arg("stdout")
                .arg("-l")
                .arg(language)
                .kill_on_drop(true),
            self.timeout_secs,
        )
        .await?;

        debug!(
            subsystem = "ocr",
            component = "tesseract",
            op = "extract",
            language,
            image_bytes = image.len(),
            text_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "OCR complete"
        );
        Ok(text)
    }
}
