//! Error types for hudmatch.

use thiserror::Error;

/// Result alias for hudmatch operations.
pub type HudMatchResult<T> = std::result::Result<T, HudMatchError>;

/// Errors that can occur while loading, canonicalizing, or matching images.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HudMatchError {
    /// A template or example source could not be decoded or was empty.
    #[error("failed to load {id:?}: {reason}")]
    Load { id: String, reason: String },
    /// A configuration value was rejected before matching started.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    /// Width or height is zero or the pixel count overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is shorter than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer does not hold the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A template variant has no valid placement inside the image.
    #[error(
        "template {tpl_width}x{tpl_height} does not fit inside image {img_width}x{img_height}"
    )]
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
}

impl HudMatchError {
    /// Builds a `Load` error for the source identified by `id`.
    pub fn load(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds an `InvalidConfig` error for `field`.
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
