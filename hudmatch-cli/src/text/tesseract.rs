//! Local OCR through the `tesseract` executable.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::{RecognizeError, TextAnnotation, TextRecognizer};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TesseractConfig {
    /// Executable name or path.
    pub program: String,
    /// Characters the engine may emit.
    pub whitelist: String,
    /// Language and font packs, in priority order.
    pub languages: Vec<String>,
    /// Page segmentation mode (11: sparse text).
    pub page_seg_mode: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            program: "tesseract".to_string(),
            whitelist: "0123456789.%QWERTYUIOPASDFGHJKLZXCVBNM|:".to_string(),
            languages: ["eng", "Futura", "BigNoodleToo", "BigNoodleTooOblique"]
                .into_iter()
                .map(String::from)
                .collect(),
            page_seg_mode: 11,
        }
    }
}

pub struct TesseractRecognizer {
    config: TesseractConfig,
}

impl TesseractRecognizer {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Arguments for reading from stdin and printing plain text to stdout.
    fn args(&self) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        if !self.config.languages.is_empty() {
            args.push("-l".to_string());
            args.push(self.config.languages.join("+"));
        }
        args.push("--psm".to_string());
        args.push(self.config.page_seg_mode.to_string());
        if !self.config.whitelist.is_empty() {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={}", self.config.whitelist));
        }
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, png: &[u8]) -> Result<Vec<TextAnnotation>, RecognizeError> {
        let program = self.config.program.as_str();
        let mut child = Command::new(program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RecognizeError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Reap the child even when it closed stdin early.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(png),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(RecognizeError::Exit {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        Ok(parse_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// One annotation per non-blank output line; plain-text mode has no geometry.
fn parse_text(stdout: &str) -> Vec<TextAnnotation> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| TextAnnotation {
            text: line.to_string(),
            bounds: None,
        })
        .collect()
}
