//! Template plan precomputation for normalized cross-correlation.

use crate::image::ImageView;
use crate::util::{HudMatchError, HudMatchResult};

/// Sums of squared deviations at or below this value count as zero variance.
pub(crate) const FLAT_EPS: f64 = 1e-8;

/// Precomputed statistics and zero-mean buffer for one template variant.
///
/// The mean is fixed per template, so the numerator of the correlation
/// coefficient reduces to `Σ t'[i] * I[i]` with `t' = T - mean(T)`.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    var_t: f64,
    sum_sq: f64,
    zero_mean: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    ///
    /// Flat templates are accepted; the kernels only match them against
    /// uniform windows of the same intensity.
    pub fn from_view(tpl: ImageView<'_, u8>) -> HudMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(HudMatchError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut values = Vec::with_capacity(count);
        for y in 0..height {
            let row = tpl
                .row(y)
                .ok_or(HudMatchError::InvalidDimensions { width, height })?;
            for &value in row {
                let v = value as f64;
                sum += v;
                sum_sq += v * v;
                values.push(v);
            }
        }

        let mean = sum / count as f64;
        let zero_mean: Vec<f64> = values.into_iter().map(|v| v - mean).collect();
        let var_t = zero_mean.iter().map(|d| d * d).sum();

        Ok(Self {
            width,
            height,
            mean,
            var_t,
            sum_sq,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of template pixels.
    pub fn len(&self) -> usize {
        self.zero_mean.len()
    }

    /// Always false; plans are built from non-empty views.
    pub fn is_empty(&self) -> bool {
        self.zero_mean.is_empty()
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns `Σ (T - mean(T))²`.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns `Σ T²`.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Returns true when the template has no intensity variation.
    pub fn is_flat(&self) -> bool {
        self.var_t <= FLAT_EPS
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::image::OwnedImage;

    #[test]
    fn plan_matches_known_stats() {
        let tpl = OwnedImage::new(vec![0u8, 1, 2, 3], 2, 2).unwrap();
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();

        assert_eq!((plan.width(), plan.height()), (2, 2));
        assert!((plan.mean() - 1.5).abs() < 1e-12);
        assert!((plan.var_t() - 5.0).abs() < 1e-12);
        assert!((plan.sum_sq() - 14.0).abs() < 1e-12);
        assert_eq!(plan.zero_mean(), &[-1.5, -0.5, 0.5, 1.5]);
        assert!(!plan.is_flat());
    }

    #[test]
    fn uniform_template_is_flat() {
        let tpl = OwnedImage::filled(3, 3, 128).unwrap();
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();
        assert!(plan.is_flat());
        assert!((plan.sum_sq() - 9.0 * 128.0 * 128.0).abs() < 1e-9);
    }
}
