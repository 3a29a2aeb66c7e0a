//! Per-image outcomes and batch summaries.

use std::fmt;

use crate::image::OwnedImage;
use crate::util::{HudMatchError, HudMatchResult};

/// A reported match of one template inside one canonical image.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Name of the matched template.
    pub template: String,
    /// Best score across all variants of the template.
    pub confidence: f32,
    /// Top-left x of the best placement, in canonical-image pixels.
    pub x: usize,
    /// Top-left y of the best placement, in canonical-image pixels.
    pub y: usize,
    /// Scale factor of the variant that produced the best score.
    pub scale: f32,
    /// Width of that variant in pixels.
    pub width: usize,
    /// Height of that variant in pixels.
    pub height: usize,
}

/// One example image as delivered by the discovery layer.
#[derive(Debug)]
pub struct ImageSource {
    /// Identifier used in reports (typically the file name).
    pub id: String,
    /// Decoded grayscale pixels at their original resolution, or the decode
    /// failure.
    pub image: HudMatchResult<OwnedImage>,
}

impl ImageSource {
    /// Wraps successfully decoded pixels.
    pub fn new(id: impl Into<String>, image: OwnedImage) -> Self {
        Self {
            id: id.into(),
            image: Ok(image),
        }
    }

    /// Wraps a decode failure.
    pub fn failed(id: impl Into<String>, error: HudMatchError) -> Self {
        Self {
            id: id.into(),
            image: Err(error),
        }
    }
}

/// Outcome of processing a single image.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageStatus {
    /// Every template was matched; `detections` may be empty.
    Processed { detections: Vec<Detection> },
    /// The image could not be decoded or canonicalized.
    Failed { error: HudMatchError },
    /// The run deadline passed before every template finished; `completed`
    /// holds detections from templates whose variants all finished.
    TimedOut { completed: Vec<Detection> },
}

impl ImageStatus {
    /// Returns the published detections, if any.
    pub fn detections(&self) -> &[Detection] {
        match self {
            ImageStatus::Processed { detections } => detections.as_slice(),
            ImageStatus::TimedOut { completed } => completed.as_slice(),
            ImageStatus::Failed { .. } => &[],
        }
    }
}

/// Outcome for one image, tagged with its identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageReport {
    pub id: String,
    pub status: ImageStatus,
}

/// Reports for a batch, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionReport {
    images: Vec<ImageReport>,
}

impl DetectionReport {
    /// Wraps already collected reports.
    pub fn new(images: Vec<ImageReport>) -> Self {
        Self { images }
    }

    /// Appends one image report.
    pub fn push(&mut self, report: ImageReport) {
        self.images.push(report);
    }

    /// Returns all image reports.
    pub fn images(&self) -> &[ImageReport] {
        &self.images
    }

    /// Returns the report for `id`.
    pub fn get(&self, id: &str) -> Option<&ImageReport> {
        self.images.iter().find(|r| r.id == id)
    }

    /// Iterates over every published detection with its image id.
    pub fn detections(&self) -> impl Iterator<Item = (&str, &Detection)> {
        self.images
            .iter()
            .flat_map(|r| r.status.detections().iter().map(move |d| (r.id.as_str(), d)))
    }

    /// Counts images by outcome.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            images: self.images.len(),
            ..RunSummary::default()
        };
        for report in &self.images {
            match &report.status {
                ImageStatus::Processed { detections } if detections.is_empty() => {
                    summary.without_detections += 1;
                }
                ImageStatus::Processed { detections } => {
                    summary.with_detections += 1;
                    summary.detections += detections.len();
                }
                ImageStatus::Failed { .. } => summary.failed += 1,
                ImageStatus::TimedOut { completed } => {
                    summary.timed_out += 1;
                    summary.detections += completed.len();
                }
            }
        }
        summary
    }
}

/// Batch counters that keep "nothing found" apart from "could not process".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub images: usize,
    pub with_detections: usize,
    pub without_detections: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub detections: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images: {} with detections ({} detections), {} without detections, {} failed, {} timed out",
            self.images,
            self.with_detections,
            self.detections,
            self.without_detections,
            self.failed,
            self.timed_out
        )
    }
}
