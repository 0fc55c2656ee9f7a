//! # kuppi-inference
//!
//! External text services for the Kuppi backend: Gemini text generation,
//! Tesseract OCR, and the prompts the API sends to them.
//!
//! Enable the `mock` feature for deterministic test doubles.

pub mod gemini;
pub mod ocr;
pub mod prompts;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use gemini::GeminiBackend;
pub use ocr::{is_valid_language, TesseractOcr};
pub use prompts::{answer_prompt, clamp_percentage, summary_prompt, SummaryStyle};

// Re-export core traits for convenience
pub use kuppi_core::{GenerationBackend, OcrEngine};
