//! Canonicalization of screenshots to the fixed working resolution.
//!
//! Template matching is scale sensitive, so every screenshot is resized to
//! one resolution before matching; template variants cover the remaining
//! scale drift of UI elements at that resolution.

use crate::image::resize::{resize_u8, Interpolation};
use crate::image::{ImageView, OwnedImage};
use crate::util::{HudMatchError, HudMatchResult};

/// Working resolution and filter for canonicalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanonicalConfig {
    /// Target width in pixels.
    pub width: usize,
    /// Target height in pixels.
    pub height: usize,
    /// Resampling filter.
    pub interpolation: Interpolation,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            interpolation: Interpolation::Bilinear,
        }
    }
}

impl CanonicalConfig {
    /// Rejects a zero target resolution.
    pub fn validate(&self) -> HudMatchResult<()> {
        if self.width == 0 {
            return Err(HudMatchError::config("width", "target width must be positive"));
        }
        if self.height == 0 {
            return Err(HudMatchError::config(
                "height",
                "target height must be positive",
            ));
        }
        Ok(())
    }
}

/// Stateless resize of arbitrary screenshots to the working resolution.
#[derive(Clone, Debug)]
pub struct Canonicalizer {
    cfg: CanonicalConfig,
}

impl Canonicalizer {
    /// Creates a canonicalizer after validating `cfg`.
    pub fn new(cfg: CanonicalConfig) -> HudMatchResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CanonicalConfig {
        &self.cfg
    }

    /// Resizes `image` to the target resolution.
    ///
    /// The output depends only on the input pixels and the configuration; an
    /// image already at the target resolution is returned pixel-identical.
    pub fn canonicalize(&self, image: ImageView<'_, u8>) -> HudMatchResult<OwnedImage> {
        resize_u8(image, self.cfg.width, self.cfg.height, self.cfg.interpolation)
    }

    /// Canonicalizes a decoded source, reporting degenerate input as a `Load`
    /// error for `id`.
    pub fn canonicalize_source(&self, id: &str, image: &OwnedImage) -> HudMatchResult<OwnedImage> {
        self.canonicalize(image.view())
            .map_err(|err| HudMatchError::load(id, err))
    }
}

#[cfg(test)]
mod tests {
    use super::{CanonicalConfig, Canonicalizer};
    use crate::image::resize::Interpolation;
    use crate::image::OwnedImage;
    use crate::util::HudMatchError;

    fn small_cfg() -> CanonicalConfig {
        CanonicalConfig {
            width: 16,
            height: 9,
            interpolation: Interpolation::Bilinear,
        }
    }

    #[test]
    fn output_has_target_resolution() {
        let canon = Canonicalizer::new(small_cfg()).unwrap();
        let img = OwnedImage::filled(40, 30, 17).unwrap();
        let out = canon.canonicalize(img.view()).unwrap();
        assert_eq!((out.width(), out.height()), (16, 9));
    }

    #[test]
    fn target_resolution_input_is_returned_unchanged() {
        let canon = Canonicalizer::new(small_cfg()).unwrap();
        let data: Vec<u8> = (0..16 * 9).map(|v| (v * 7 % 256) as u8).collect();
        let img = OwnedImage::new(data, 16, 9).unwrap();
        let out = canon.canonicalize(img.view()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn canonicalization_is_deterministic() {
        let canon = Canonicalizer::new(small_cfg()).unwrap();
        let data: Vec<u8> = (0..33 * 21).map(|v| (v * 31 % 251) as u8).collect();
        let img = OwnedImage::new(data, 33, 21).unwrap();
        let a = canon.canonicalize(img.view()).unwrap();
        let b = canon.canonicalize(img.view()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_resolution_is_a_config_error() {
        let err = Canonicalizer::new(CanonicalConfig {
            height: 0,
            ..CanonicalConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            HudMatchError::InvalidConfig {
                field: "height",
                ..
            }
        ));
    }
}
