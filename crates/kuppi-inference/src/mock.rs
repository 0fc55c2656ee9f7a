//! Mock backends for deterministic testing.
//!
//! ```rust,ignore
//! use kuppi_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new().with_fixed_response("Osmosis is...");
//! assert_eq!(backend.call_count(), 0);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kuppi_core::{Error, GenerationBackend, OcrEngine, Result};

/// Generation backend returning a canned response and recording prompts.
#[derive(Clone)]
pub struct MockGenerationBackend {
    response: String,
    fail_with: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            response: "Mock response".to_string(),
            fail_with: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Make every call fail with `Error::Inference(message)`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        match &self.fail_with {
            Some(message) => Err(Error::Inference(message.clone())),
            None => Ok(self.response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// OCR engine returning fixed text and recording the requested languages.
#[derive(Clone, Default)]
pub struct MockOcrEngine {
    text: String,
    fail: bool,
    languages: Arc<Mutex<Vec<String>>>,
}

impl MockOcrEngine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn extract(&self, _image: &[u8], language: &str) -> Result<String> {
        self.languages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(language.to_string());
        if self.fail {
            return Err(Error::Ocr("mock OCR failure".to_string()));
        }
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generation_records_prompts() {
        let backend = MockGenerationBackend::new().with_fixed_response("42");
        assert_eq!(backend.generate("question").await.unwrap(), "42");
        assert_eq!(backend.prompts(), vec!["question".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_generation_failure() {
        let backend = MockGenerationBackend::new().failing("quota");
        assert!(matches!(
            backend.generate("q").await,
            Err(Error::Inference(msg)) if msg == "quota"
        ));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_ocr() {
        let ocr = MockOcrEngine::new("text");
        assert_eq!(ocr.extract(b"x", "sin").await.unwrap(), "text");
        assert_eq!(ocr.languages(), vec!["sin".to_string()]);
        assert!(MockOcrEngine::failing().extract(b"x", "sin").await.is_err());
    }
}
