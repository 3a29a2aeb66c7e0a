//! Match engine: one image against one template variant.
//!
//! The engine scans every valid placement exhaustively and reports the full
//! score map together with its maximum. Scale is handled upstream by the
//! pre-generated template variants, never by the engine.

use crate::kernel::scalar::DirectKernel;
use crate::kernel::sum_table::SumTableKernel;
use crate::kernel::{Kernel, Peak, ScoreMap, SearchImage};
use crate::template::TemplatePlan;
use crate::util::HudMatchResult;

/// How score maps are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreMethod {
    /// Literal per-window evaluation of the coefficient formula.
    Direct,
    /// Summed-area tables for window statistics (same results within 1e-6).
    #[default]
    SumTable,
}

/// Result of matching one template variant against one image.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    /// Score for every valid placement.
    pub score_map: ScoreMap,
    /// Maximum of `score_map`.
    pub best: Peak,
}

/// Stateless scorer for (image, template variant) pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchEngine {
    method: ScoreMethod,
    parallel: bool,
}

impl MatchEngine {
    /// Creates an engine using `method`.
    pub fn new(method: ScoreMethod) -> Self {
        Self {
            method,
            parallel: false,
        }
    }

    /// Enables row-parallel score maps (requires the `rayon` feature; ignored
    /// otherwise and for the direct method).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns the scoring method.
    pub fn method(&self) -> ScoreMethod {
        self.method
    }

    /// Returns true when row-parallel score maps were requested.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Computes the full score map.
    ///
    /// Fails with `TemplateTooLarge` when the variant is larger than the image
    /// in either dimension; well-formed inputs never fail otherwise.
    pub fn score_map(
        &self,
        image: &SearchImage<'_>,
        plan: &TemplatePlan,
    ) -> HudMatchResult<ScoreMap> {
        match self.method {
            ScoreMethod::Direct => <DirectKernel as Kernel>::score_map(image, plan),
            ScoreMethod::SumTable => {
                #[cfg(feature = "rayon")]
                if self.parallel {
                    return crate::kernel::rayon::sum_table_score_map_par(image, plan);
                }
                <SumTableKernel as Kernel>::score_map(image, plan)
            }
        }
    }

    /// Computes the score map and locates its maximum.
    pub fn match_template(
        &self,
        image: &SearchImage<'_>,
        plan: &TemplatePlan,
    ) -> HudMatchResult<MatchOutcome> {
        let score_map = self.score_map(image, plan)?;
        let best = score_map.best();
        Ok(MatchOutcome { score_map, best })
    }

    /// Returns only the best placement; the score map is dropped immediately.
    pub fn best(&self, image: &SearchImage<'_>, plan: &TemplatePlan) -> HudMatchResult<Peak> {
        Ok(self.score_map(image, plan)?.best())
    }

    /// Scores a single placement, or `None` when the variant does not fit
    /// there.
    pub fn score_at(
        &self,
        image: &SearchImage<'_>,
        plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> Option<f32> {
        match self.method {
            ScoreMethod::Direct => <DirectKernel as Kernel>::score_at(image, plan, x, y),
            ScoreMethod::SumTable => <SumTableKernel as Kernel>::score_at(image, plan, x, y),
        }
    }
}
