//! Rayon-parallel score maps (feature-gated).
//!
//! Rows of the placement grid are distributed across the current rayon pool.
//! Each row runs the same per-placement code as the sequential sum-table
//! kernel, so the resulting maps are bit-identical.

use crate::kernel::sum_table::score_row;
use crate::kernel::{placement_grid, ScoreMap, SearchImage};
use crate::template::TemplatePlan;
use crate::util::HudMatchResult;
use rayon::prelude::*;

/// Row-parallel full score map for the sum-table kernel.
pub fn sum_table_score_map_par(
    image: &SearchImage<'_>,
    plan: &TemplatePlan,
) -> HudMatchResult<ScoreMap> {
    let (cols, rows) = placement_grid(image.view(), plan)?;
    // Build the tables once before fanning out.
    image.sums();

    let mut scores = vec![0.0f32; cols * rows];
    scores
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(y, row)| score_row(image, plan, y, row));

    Ok(ScoreMap::from_vec(scores, cols, rows))
}
