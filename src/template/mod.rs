//! Reference templates and their scale variants.

use crate::image::resize::{resize_u8, scaled_size, Interpolation};
use crate::image::OwnedImage;
use crate::trace::trace_warn;
use crate::util::HudMatchResult;

mod plan;
mod store;

pub use plan::TemplatePlan;
pub(crate) use plan::FLAT_EPS;
pub use store::{StoreConfig, TemplateSource, TemplateStore};

/// A scaled copy of a template with its precomputed plan.
#[derive(Clone, Debug)]
pub struct Variant {
    scale: f32,
    img: OwnedImage,
    plan: TemplatePlan,
}

impl Variant {
    fn new(scale: f32, img: OwnedImage) -> HudMatchResult<Self> {
        let plan = TemplatePlan::from_view(img.view())?;
        Ok(Self { scale, img, plan })
    }

    /// Returns the scale factor relative to the base template.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the variant pixels.
    pub fn image(&self) -> &OwnedImage {
        &self.img
    }

    /// Returns the correlation plan for this variant.
    pub fn plan(&self) -> &TemplatePlan {
        &self.plan
    }
}

/// Named reference pattern with an ordered set of scale variants.
///
/// The first variant is always the base image at scale 1.0.
#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    variants: Vec<Variant>,
}

impl Template {
    /// Builds a template and one variant per shrink factor.
    ///
    /// Factors equal to 1.0 are skipped because they duplicate the base, as are
    /// repeated factors and factors that round a dimension down to zero.
    pub fn with_factors(
        name: impl Into<String>,
        base: OwnedImage,
        factors: &[f32],
        interpolation: Interpolation,
    ) -> HudMatchResult<Self> {
        let name = name.into();
        let mut variants = Vec::with_capacity(factors.len() + 1);
        let base_view = base.view();
        let (base_w, base_h) = (base.width(), base.height());

        for &factor in factors {
            if factor == 1.0 || variants.iter().any(|v: &Variant| v.scale == factor) {
                continue;
            }
            let (w, h) = scaled_size(base_w, base_h, factor);
            if w == 0 || h == 0 {
                trace_warn!(
                    "variant_skipped",
                    template = name.as_str(),
                    factor = factor
                );
                continue;
            }
            let img = resize_u8(base_view, w, h, interpolation)?;
            variants.push(Variant::new(factor, img)?);
        }
        variants.insert(0, Variant::new(1.0, base)?);

        Ok(Self { name, variants })
    }

    /// Returns the unique template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base (scale 1.0) variant.
    pub fn base(&self) -> &Variant {
        &self.variants[0]
    }

    /// Returns all variants, base first.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
}
