//! Immutable template library loaded once at startup.

use crate::image::resize::Interpolation;
use crate::image::OwnedImage;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::{HudMatchError, HudMatchResult};

/// Configuration for deriving template variants.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Extra scale factors applied to every template (base 1.0 is implicit).
    pub shrink_factors: Vec<f32>,
    /// Resampling filter used to build the variants.
    pub interpolation: Interpolation,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shrink_factors: vec![0.75],
            interpolation: Interpolation::Bilinear,
        }
    }
}

impl StoreConfig {
    /// Rejects non-finite or non-positive scale factors.
    pub fn validate(&self) -> HudMatchResult<()> {
        for &factor in &self.shrink_factors {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(HudMatchError::config(
                    "shrink_factors",
                    format!("scale factor must be positive, got {factor}"),
                ));
            }
        }
        Ok(())
    }
}

/// One named template input as delivered by the discovery layer.
///
/// Decoding happens outside the core; a failed decode travels here as an
/// error so the store can report it against the template name.
#[derive(Debug)]
pub struct TemplateSource {
    /// Unique template name.
    pub name: String,
    /// Decoded grayscale pixels, or the decode failure.
    pub image: HudMatchResult<OwnedImage>,
}

impl TemplateSource {
    /// Wraps successfully decoded pixels.
    pub fn new(name: impl Into<String>, image: OwnedImage) -> Self {
        Self {
            name: name.into(),
            image: Ok(image),
        }
    }

    /// Wraps a decode failure.
    pub fn failed(name: impl Into<String>, error: HudMatchError) -> Self {
        Self {
            name: name.into(),
            image: Err(error),
        }
    }
}

/// Read-only set of templates, sorted by name.
///
/// Built once and then shared (typically behind an `Arc`) by every detector
/// worker; nothing mutates it after `load` returns.
#[derive(Debug)]
pub struct TemplateStore {
    templates: Vec<Template>,
    cfg: StoreConfig,
}

impl TemplateStore {
    /// Loads every source and derives its variants.
    ///
    /// Any failed, empty or duplicate-named source aborts the load, as does an
    /// empty source list: a store without templates cannot detect anything.
    pub fn load<I>(sources: I, cfg: StoreConfig) -> HudMatchResult<Self>
    where
        I: IntoIterator<Item = TemplateSource>,
    {
        cfg.validate()?;
        let _span = trace_span!("template_store_load").entered();

        let mut templates: Vec<Template> = Vec::new();
        for source in sources {
            let TemplateSource { name, image } = source;
            if name.is_empty() {
                return Err(HudMatchError::load(name, "template name is empty"));
            }
            let image = image.map_err(|err| {
                if matches!(err, HudMatchError::Load { .. }) {
                    err
                } else {
                    HudMatchError::load(name.as_str(), err)
                }
            })?;
            let template = Template::with_factors(
                name.as_str(),
                image,
                &cfg.shrink_factors,
                cfg.interpolation,
            )
            .map_err(|err| HudMatchError::load(name.as_str(), err))?;
            templates.push(template);
        }

        if templates.is_empty() {
            return Err(HudMatchError::load("templates", "no templates to load"));
        }

        templates.sort_by(|a, b| a.name().cmp(b.name()));
        if let Some(dup) = templates.windows(2).find(|w| w[0].name() == w[1].name()) {
            return Err(HudMatchError::load(
                dup[0].name(),
                "duplicate template name",
            ));
        }

        trace_event!("templates_loaded", count = templates.len());
        Ok(Self { templates, cfg })
    }

    /// Returns all templates sorted by name.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Looks up a template by name.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates
            .binary_search_by(|t| t.name().cmp(name))
            .ok()
            .map(|idx| &self.templates[idx])
    }

    /// Returns the number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false for a successfully loaded store.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Returns the configuration the variants were built with.
    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, TemplateSource, TemplateStore};
    use crate::image::OwnedImage;
    use crate::util::HudMatchError;

    fn texture(width: usize, height: usize, seed: usize) -> OwnedImage {
        let data = (0..width * height)
            .map(|i| ((i * 37 + seed * 11) ^ (i / width * 5)) as u8)
            .collect();
        OwnedImage::new(data, width, height).unwrap()
    }

    #[test]
    fn templates_are_sorted_and_searchable() {
        let store = TemplateStore::load(
            vec![
                TemplateSource::new("wifi", texture(8, 8, 1)),
                TemplateSource::new("battery", texture(8, 4, 2)),
            ],
            StoreConfig::default(),
        )
        .unwrap();

        let names: Vec<&str> = store.templates().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["battery", "wifi"]);
        assert_eq!(store.get("wifi").unwrap().variants().len(), 2);
        assert!(store.get("signal").is_none());
    }

    #[test]
    fn failed_source_aborts_the_load() {
        let err = TemplateStore::load(
            vec![
                TemplateSource::new("ok", texture(4, 4, 0)),
                TemplateSource::failed(
                    "broken",
                    HudMatchError::InvalidDimensions {
                        width: 0,
                        height: 0,
                    },
                ),
            ],
            StoreConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HudMatchError::Load { ref id, .. } if id == "broken"));
    }

    #[test]
    fn empty_source_list_is_a_load_error() {
        let err = TemplateStore::load(Vec::new(), StoreConfig::default()).unwrap_err();
        assert!(matches!(err, HudMatchError::Load { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = TemplateStore::load(
            vec![
                TemplateSource::new("x", texture(4, 4, 0)),
                TemplateSource::new("x", texture(4, 4, 1)),
            ],
            StoreConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, HudMatchError::load("x", "duplicate template name"));
    }

    #[test]
    fn non_positive_factor_is_a_config_error() {
        let cfg = StoreConfig {
            shrink_factors: vec![0.75, 0.0],
            ..StoreConfig::default()
        };
        let err =
            TemplateStore::load(vec![TemplateSource::new("x", texture(4, 4, 0))], cfg).unwrap_err();
        assert!(matches!(
            err,
            HudMatchError::InvalidConfig {
                field: "shrink_factors",
                ..
            }
        ));
    }

    #[test]
    fn repeated_factors_are_loaded_once() {
        let cfg = StoreConfig {
            shrink_factors: vec![0.75, 0.75],
            ..StoreConfig::default()
        };
        let store =
            TemplateStore::load(vec![TemplateSource::new("x", texture(16, 16, 3))], cfg).unwrap();
        assert_eq!(store.get("x").unwrap().variants().len(), 2);
    }
}
