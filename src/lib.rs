//! HudMatch finds known graphical markers (icons, HUD overlays, status glyphs)
//! in screenshots with normalized cross-correlation.
//!
//! The pipeline is: a `TemplateStore` loaded once with scale variants of every
//! template, a `Canonicalizer` pinning screenshots to a working resolution,
//! a `MatchEngine` producing correlation score maps, and a `Detector` that
//! runs the full (image, template) cross product and applies the confidence
//! threshold. Decoding, OCR and persistence live outside this crate; the
//! `image-io` feature adds decoding helpers, `rayon` a bounded worker pool and
//! `tracing` structured spans and events.

pub mod detect;
pub mod engine;
pub mod image;
pub mod kernel;
pub mod template;
mod trace;
pub mod util;

pub use detect::{
    Detection, DetectionReport, Detector, DetectorConfig, ImageReport, ImageSource, ImageStatus,
    RunSummary,
};
pub use engine::{MatchEngine, MatchOutcome, ScoreMethod};
pub use image::canon::{CanonicalConfig, Canonicalizer};
#[cfg(feature = "image-io")]
pub use image::io;
pub use image::resize::Interpolation;
pub use image::{ImageView, OwnedImage};
pub use kernel::{Peak, ScoreMap, SearchImage};
pub use template::{StoreConfig, Template, TemplatePlan, TemplateSource, TemplateStore, Variant};
pub use util::{HudMatchError, HudMatchResult};
