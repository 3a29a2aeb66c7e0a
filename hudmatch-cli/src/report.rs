//! On-disk output: annotated screenshots and `report.json`.

use hudmatch::io::to_gray_image;
use hudmatch::{Detection, DetectionReport, HudMatchResult, ImageStatus, OwnedImage, RunSummary};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;

use crate::text::TextAnnotation;

/// Text recognition result for one image: annotations or the error message.
pub type TextOutcome = Option<Result<Vec<TextAnnotation>, String>>;

/// Copies the canonical image and outlines every detection in white.
pub fn annotate(canonical: &OwnedImage, detections: &[Detection]) -> HudMatchResult<GrayImage> {
    let mut out = to_gray_image(canonical)?;
    for d in detections {
        let rect = Rect::at(d.x as i32, d.y as i32).of_size(d.width as u32, d.height as u32);
        draw_hollow_rect_mut(&mut out, rect, Luma([255u8]));
    }
    Ok(out)
}

#[derive(Debug, Serialize)]
pub struct DetectionRecord {
    template: String,
    confidence: f32,
    x: usize,
    y: usize,
    scale: f32,
    width: usize,
    height: usize,
}

impl From<&Detection> for DetectionRecord {
    fn from(value: &Detection) -> Self {
        Self {
            template: value.template.clone(),
            confidence: value.confidence,
            x: value.x,
            y: value.y,
            scale: value.scale,
            width: value.width,
            height: value.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageRecord {
    id: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    detections: Vec<DetectionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<Vec<TextAnnotation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryRecord {
    images: usize,
    with_detections: usize,
    without_detections: usize,
    failed: usize,
    timed_out: usize,
    detections: usize,
}

impl From<RunSummary> for SummaryRecord {
    fn from(value: RunSummary) -> Self {
        Self {
            images: value.images,
            with_detections: value.with_detections,
            without_detections: value.without_detections,
            failed: value.failed,
            timed_out: value.timed_out,
            detections: value.detections,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Output {
    summary: SummaryRecord,
    images: Vec<ImageRecord>,
}

impl Output {
    /// Pairs every image report with its text outcome (same order).
    pub fn new(report: &DetectionReport, texts: Vec<TextOutcome>) -> Self {
        let images = report
            .images()
            .iter()
            .zip(texts.into_iter().chain(std::iter::repeat_with(|| None)))
            .map(|(image, text)| {
                let (status, error) = match &image.status {
                    ImageStatus::Processed { .. } => ("processed", None),
                    ImageStatus::Failed { error } => ("failed", Some(error.to_string())),
                    ImageStatus::TimedOut { .. } => ("timed_out", None),
                };
                let (text, text_error) = match text {
                    Some(Ok(annotations)) => (Some(annotations), None),
                    Some(Err(err)) => (None, Some(err)),
                    None => (None, None),
                };
                ImageRecord {
                    id: image.id.clone(),
                    status,
                    error,
                    detections: image.status.detections().iter().map(Into::into).collect(),
                    text,
                    text_error,
                }
            })
            .collect();
        Self {
            summary: report.summary().into(),
            images,
        }
    }
}
