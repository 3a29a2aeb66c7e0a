//! Optional text recognition over canonical screenshots.
//!
//! Recognizers receive PNG-encoded bytes and run beside the detector on a
//! separate thread; their results only ever reach the log and the report.

pub mod cloud;
pub mod tesseract;

use serde::Serialize;
use thiserror::Error;

use crate::config::TextConfig;

/// One recognized piece of text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextAnnotation {
    pub text: String,
    /// Bounding polygon in image pixels, when the engine reports one.
    pub bounds: Option<Vec<(i32, i32)>>,
}

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vision API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Response(String),

    #[error("no API key configured; set `api_key` or {env}")]
    MissingKey { env: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait TextRecognizer: Send + Sync {
    /// Recognizes text in a PNG-encoded image.
    fn recognize(&self, png: &[u8]) -> Result<Vec<TextAnnotation>, RecognizeError>;
}

/// Builds the recognizer selected by `config`, or `None` when disabled.
pub fn from_config(config: &TextConfig) -> Result<Option<Box<dyn TextRecognizer>>, RecognizeError> {
    Ok(match config {
        TextConfig::None => None,
        TextConfig::Tesseract(cfg) => Some(Box::new(tesseract::TesseractRecognizer::new(
            cfg.clone(),
        ))),
        TextConfig::Cloud(cfg) => Some(Box::new(cloud::CloudTextAnnotator::new(cfg.clone())?)),
    })
}
