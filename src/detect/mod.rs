//! Detector: every template against every canonical image.
//!
//! For each (image, template) pair the engine scores every variant of the
//! template; the best score across variants is the pair's confidence, and a
//! `Detection` is published when it reaches the threshold. Templates are
//! independent: no suppression between overlapping detections.
//!
//! All inputs are read-only (`TemplateStore` behind an `Arc`, canonical image
//! per task), so pairs run on a bounded rayon pool without locking when the
//! `rayon` feature is enabled. A run deadline is checked before every variant
//! scan; a pair that did not finish all of its variants publishes nothing.

mod report;

pub use report::{Detection, DetectionReport, ImageReport, ImageSource, ImageStatus, RunSummary};

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::{MatchEngine, ScoreMethod};
use crate::image::canon::{CanonicalConfig, Canonicalizer};
use crate::image::ImageView;
use crate::kernel::{Peak, SearchImage};
use crate::template::{Template, TemplateStore};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{HudMatchError, HudMatchResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Detector configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Minimum confidence for a detection (inclusive).
    pub threshold: f32,
    /// Score-map method used by the engine.
    pub method: ScoreMethod,
    /// Run pairs (and score-map rows) on a rayon pool when the `rayon` feature
    /// is enabled.
    pub parallel: bool,
    /// Worker count for a dedicated pool; `None` uses rayon's global pool.
    pub max_workers: Option<usize>,
    /// Run-level deadline measured from the start of `run`.
    pub timeout: Option<Duration>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            method: ScoreMethod::SumTable,
            parallel: true,
            max_workers: None,
            timeout: None,
        }
    }
}

impl DetectorConfig {
    /// Rejects thresholds outside `[-1, 1]`, an empty pool and a zero timeout.
    pub fn validate(&self) -> HudMatchResult<()> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(HudMatchError::config(
                "threshold",
                format!("must lie in [-1, 1], got {}", self.threshold),
            ));
        }
        if self.max_workers == Some(0) {
            return Err(HudMatchError::config(
                "max_workers",
                "worker pool needs at least one thread",
            ));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(HudMatchError::config("timeout", "timeout must be positive"));
        }
        Ok(())
    }
}

/// Result of one (image, template) pair.
enum PairOutcome {
    Done(Option<Detection>),
    Aborted,
}

/// Orchestrates canonicalization and matching over a shared template store.
pub struct Detector {
    store: Arc<TemplateStore>,
    canon: Canonicalizer,
    engine: MatchEngine,
    cfg: DetectorConfig,
    #[cfg(feature = "rayon")]
    pool: Option<rayon::ThreadPool>,
}

impl Detector {
    /// Validates both configurations and prepares the worker pool.
    pub fn new(
        store: Arc<TemplateStore>,
        canonical: CanonicalConfig,
        cfg: DetectorConfig,
    ) -> HudMatchResult<Self> {
        cfg.validate()?;
        let canon = Canonicalizer::new(canonical)?;
        let engine = MatchEngine::new(cfg.method).with_parallel(cfg.parallel);

        #[cfg(feature = "rayon")]
        let pool = match cfg.max_workers {
            Some(threads) if cfg.parallel => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|idx| format!("hudmatch-{idx}"))
                    .build()
                    .map_err(|err| HudMatchError::config("max_workers", err.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            store,
            canon,
            engine,
            cfg,
            #[cfg(feature = "rayon")]
            pool,
        })
    }

    /// Returns the shared template store.
    pub fn store(&self) -> &Arc<TemplateStore> {
        &self.store
    }

    /// Returns the canonicalizer applied by `process` and `run`.
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canon
    }

    /// Returns the detector configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Returns the deadline for a run starting now.
    pub fn deadline(&self) -> Option<Instant> {
        self.cfg.timeout.map(|t| Instant::now() + t)
    }

    /// Detects every template in an already canonical image.
    ///
    /// Detections are ordered by template name.
    pub fn detect(&self, image: ImageView<'_, u8>) -> Vec<Detection> {
        match self.detect_until(image, None) {
            ImageStatus::Processed { detections } => detections,
            ImageStatus::TimedOut { completed } => completed,
            ImageStatus::Failed { .. } => Vec::new(),
        }
    }

    /// Detects every template in a canonical image, stopping at `deadline`.
    ///
    /// Returns `Processed` when every pair completed and `TimedOut` with the
    /// completed pairs' detections otherwise.
    pub fn detect_until(
        &self,
        image: ImageView<'_, u8>,
        deadline: Option<Instant>,
    ) -> ImageStatus {
        let search = SearchImage::new(image);
        if self.engine.method() == ScoreMethod::SumTable {
            search.sums();
        }

        let outcomes = self.match_templates(&search, deadline);
        let mut detections = Vec::new();
        let mut aborted = false;
        for outcome in outcomes {
            match outcome {
                PairOutcome::Done(Some(detection)) => detections.push(detection),
                PairOutcome::Done(None) => {}
                PairOutcome::Aborted => aborted = true,
            }
        }

        if aborted {
            ImageStatus::TimedOut {
                completed: detections,
            }
        } else {
            ImageStatus::Processed { detections }
        }
    }

    /// Canonicalizes and matches one source; its failure is reported, never
    /// propagated.
    pub fn process(&self, source: ImageSource, deadline: Option<Instant>) -> ImageReport {
        let ImageSource { id, image } = source;
        let _span = trace_span!("detect_image", image = id.as_str()).entered();

        if deadline.is_some_and(|d| Instant::now() >= d) {
            trace_warn!("image_aborted", image = id.as_str());
            return ImageReport {
                id,
                status: ImageStatus::TimedOut {
                    completed: Vec::new(),
                },
            };
        }

        let canonical = image
            .map_err(|err| {
                if matches!(err, HudMatchError::Load { .. }) {
                    err
                } else {
                    HudMatchError::load(id.as_str(), err)
                }
            })
            .and_then(|img| self.canon.canonicalize_source(&id, &img));

        let status = match canonical {
            Ok(canonical) => self.detect_until(canonical.view(), deadline),
            Err(error) => {
                let reason = error.to_string();
                trace_warn!("image_failed", image = id.as_str(), reason = reason.as_str());
                ImageStatus::Failed { error }
            }
        };

        for detection in status.detections() {
            trace_event!(
                "detection",
                image = id.as_str(),
                template = detection.template.as_str(),
                confidence = detection.confidence,
                x = detection.x,
                y = detection.y,
                scale = detection.scale
            );
        }
        if let ImageStatus::TimedOut { .. } = status {
            trace_warn!("image_timed_out", image = id.as_str());
        }

        ImageReport { id, status }
    }

    /// Processes a batch; per-image failures are isolated in the report,
    /// which keeps input order.
    pub fn run(&self, sources: Vec<ImageSource>) -> DetectionReport {
        let deadline = self.deadline();
        let _span = trace_span!("detect_run", images = sources.len()).entered();

        #[cfg(feature = "rayon")]
        if self.cfg.parallel {
            let work = move || -> Vec<ImageReport> {
                sources
                    .into_par_iter()
                    .map(|source| self.process(source, deadline))
                    .collect()
            };
            let reports = match &self.pool {
                Some(pool) => pool.install(work),
                None => work(),
            };
            return DetectionReport::new(reports);
        }

        let reports = sources
            .into_iter()
            .map(|source| self.process(source, deadline))
            .collect();
        DetectionReport::new(reports)
    }

    fn match_templates(
        &self,
        search: &SearchImage<'_>,
        deadline: Option<Instant>,
    ) -> Vec<PairOutcome> {
        let templates = self.store.templates();

        #[cfg(feature = "rayon")]
        if self.cfg.parallel {
            let work = || -> Vec<PairOutcome> {
                templates
                    .par_iter()
                    .map(|template| self.match_pair(search, template, deadline))
                    .collect()
            };
            return match &self.pool {
                Some(pool) => pool.install(work),
                None => work(),
            };
        }

        templates
            .iter()
            .map(|template| self.match_pair(search, template, deadline))
            .collect()
    }

    fn match_pair(
        &self,
        search: &SearchImage<'_>,
        template: &Template,
        deadline: Option<Instant>,
    ) -> PairOutcome {
        let mut best: Option<(Peak, usize)> = None;
        for (idx, variant) in template.variants().iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return PairOutcome::Aborted;
            }
            // Variants larger than the canonical image have no placement.
            let Ok(peak) = self.engine.best(search, variant.plan()) else {
                continue;
            };
            if best.map_or(true, |(current, _)| peak.score > current.score) {
                best = Some((peak, idx));
            }
        }

        let detection = best
            .filter(|(peak, _)| peak.score >= self.cfg.threshold)
            .map(|(peak, idx)| {
                let variant = &template.variants()[idx];
                Detection {
                    template: template.name().to_string(),
                    confidence: peak.score,
                    x: peak.x,
                    y: peak.y,
                    scale: variant.scale(),
                    width: variant.image().width(),
                    height: variant.image().height(),
                }
            });
        PairOutcome::Done(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::{Detector, DetectorConfig, ImageSource, ImageStatus};
    use crate::image::canon::CanonicalConfig;
    use crate::image::resize::Interpolation;
    use crate::image::OwnedImage;
    use crate::template::{StoreConfig, TemplateSource, TemplateStore};
    use crate::util::HudMatchError;
    use std::sync::Arc;
    use std::time::Duration;

    fn texture(width: usize, height: usize, seed: u32) -> OwnedImage {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        let data = (0..width * height)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        OwnedImage::new(data, width, height).unwrap()
    }

    fn small_canon() -> CanonicalConfig {
        CanonicalConfig {
            width: 96,
            height: 64,
            interpolation: Interpolation::Bilinear,
        }
    }

    fn detector(cfg: DetectorConfig) -> Detector {
        let store = TemplateStore::load(
            vec![TemplateSource::new("star", texture(12, 10, 7))],
            StoreConfig::default(),
        )
        .unwrap();
        Detector::new(Arc::new(store), small_canon(), cfg).unwrap()
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        for threshold in [1.5, f32::NAN, -2.0] {
            let cfg = DetectorConfig {
                threshold,
                ..DetectorConfig::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(HudMatchError::InvalidConfig {
                    field: "threshold",
                    ..
                })
            ));
        }
        let cfg = DetectorConfig {
            max_workers: Some(0),
            ..DetectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn failed_source_does_not_block_others() {
        let det = detector(DetectorConfig::default());
        let mut canvas = OwnedImage::filled(96, 64, 0).unwrap();
        canvas
            .paste(det.store().get("star").unwrap().base().image().view(), 30, 20)
            .unwrap();

        let report = det.run(vec![
            ImageSource::failed("broken.png", HudMatchError::load("broken.png", "truncated")),
            ImageSource::new("good.png", canvas),
        ]);

        assert_eq!(report.images()[0].id, "broken.png");
        assert!(matches!(
            report.images()[0].status,
            ImageStatus::Failed { .. }
        ));
        let good = report.get("good.png").unwrap().status.detections();
        assert_eq!(good.len(), 1);
        assert_eq!((good[0].x, good[0].y), (30, 20));

        let summary = report.summary();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.with_detections, 1);
    }

    #[test]
    fn expired_deadline_publishes_nothing() {
        let det = detector(DetectorConfig {
            timeout: Some(Duration::from_nanos(1)),
            ..DetectorConfig::default()
        });
        let img = texture(96, 64, 3);
        let deadline = Some(std::time::Instant::now());
        let report = det.process(ImageSource::new("late.png", img), deadline);
        assert_eq!(
            report.status,
            ImageStatus::TimedOut {
                completed: Vec::new()
            }
        );
    }

    #[test]
    fn variants_larger_than_image_are_skipped() {
        let store = TemplateStore::load(
            vec![TemplateSource::new("wide", texture(40, 8, 5))],
            StoreConfig::default(),
        )
        .unwrap();
        let det = Detector::new(
            Arc::new(store),
            CanonicalConfig {
                width: 32,
                height: 16,
                interpolation: Interpolation::Bilinear,
            },
            DetectorConfig::default(),
        )
        .unwrap();

        let small = det.store().get("wide").unwrap().variants()[1].image().clone();
        let mut canvas = OwnedImage::filled(32, 16, 0).unwrap();
        canvas.paste(small.view(), 1, 4).unwrap();

        let found = det.detect(canvas.view());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].scale, 0.75);
        assert_eq!((found[0].x, found[0].y), (1, 4));
    }
}
