//! JSON configuration model.

use std::path::PathBuf;
use std::time::Duration;

use hudmatch::{CanonicalConfig, DetectorConfig, Interpolation, ScoreMethod, StoreConfig};
use serde::Deserialize;

use crate::text::cloud::CloudConfig;
use crate::text::tesseract::TesseractConfig;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationConfig {
    Nearest,
    #[default]
    Bilinear,
}

impl From<InterpolationConfig> for Interpolation {
    fn from(value: InterpolationConfig) -> Self {
        match value {
            InterpolationConfig::Nearest => Interpolation::Nearest,
            InterpolationConfig::Bilinear => Interpolation::Bilinear,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MethodConfig {
    Direct,
    #[default]
    SumTable,
}

impl From<MethodConfig> for ScoreMethod {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::Direct => ScoreMethod::Direct,
            MethodConfig::SumTable => ScoreMethod::SumTable,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanonicalConfigJson {
    pub width: usize,
    pub height: usize,
    pub interpolation: InterpolationConfig,
}

impl Default for CanonicalConfigJson {
    fn default() -> Self {
        let cfg = CanonicalConfig::default();
        Self {
            width: cfg.width,
            height: cfg.height,
            interpolation: InterpolationConfig::Bilinear,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfigJson {
    pub shrink_factors: Vec<f32>,
    pub interpolation: InterpolationConfig,
}

impl Default for StoreConfigJson {
    fn default() -> Self {
        Self {
            shrink_factors: StoreConfig::default().shrink_factors,
            interpolation: InterpolationConfig::Bilinear,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfigJson {
    pub threshold: f32,
    pub method: MethodConfig,
    pub parallel: bool,
    pub max_workers: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl Default for DetectorConfigJson {
    fn default() -> Self {
        let cfg = DetectorConfig::default();
        Self {
            threshold: cfg.threshold,
            method: MethodConfig::SumTable,
            parallel: cfg.parallel,
            max_workers: cfg.max_workers,
            timeout_ms: None,
        }
    }
}

/// Which text recognizer, if any, annotates each canonical image.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextConfig {
    #[default]
    None,
    Tesseract(TesseractConfig),
    Cloud(CloudConfig),
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub templates_dir: PathBuf,
    pub template_extension: String,
    pub examples_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Write an annotated PNG per example into `output_dir`.
    pub annotate: bool,
    pub canonical: CanonicalConfigJson,
    pub store: StoreConfigJson,
    pub detector: DetectorConfigJson,
    pub text: TextConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            template_extension: "png".to_string(),
            examples_dir: PathBuf::from("examples"),
            output_dir: PathBuf::from("/tmp"),
            annotate: true,
            canonical: CanonicalConfigJson::default(),
            store: StoreConfigJson::default(),
            detector: DetectorConfigJson::default(),
            text: TextConfig::None,
        }
    }
}

impl Config {
    pub fn canonical_config(&self) -> CanonicalConfig {
        CanonicalConfig {
            width: self.canonical.width,
            height: self.canonical.height,
            interpolation: self.canonical.interpolation.into(),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            shrink_factors: self.store.shrink_factors.clone(),
            interpolation: self.store.interpolation.into(),
        }
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            threshold: self.detector.threshold,
            method: self.detector.method.into(),
            parallel: self.detector.parallel,
            max_workers: self.detector.max_workers,
            timeout: self.detector.timeout_ms.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, TextConfig};
    use hudmatch::{CanonicalConfig, DetectorConfig, StoreConfig};
    use std::time::Duration;

    #[test]
    fn empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.canonical_config(), CanonicalConfig::default());
        assert_eq!(config.store_config(), StoreConfig::default());
        assert_eq!(config.detector_config(), DetectorConfig::default());
        assert_eq!(config.text, TextConfig::None);
    }

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(crate::EXAMPLE_JSON).unwrap();
        assert_eq!(config.template_extension, "png");
        assert!(matches!(config.text, TextConfig::Tesseract(_)));
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "detector": { "threshold": 0.9, "timeout_ms": 1500 },
                "text": { "kind": "cloud", "max_results": 10 }
            }"#,
        )
        .unwrap();
        let detector = config.detector_config();
        assert_eq!(detector.threshold, 0.9);
        assert_eq!(detector.timeout, Some(Duration::from_millis(1500)));
        assert!(detector.parallel);
        match config.text {
            TextConfig::Cloud(cloud) => {
                assert_eq!(cloud.max_results, 10);
                assert!(cloud.api_key.is_none());
            }
            other => panic!("unexpected text config {other:?}"),
        }
    }

    #[test]
    fn unknown_text_kind_is_rejected() {
        let err = serde_json::from_str::<Config>(r#"{ "text": { "kind": "magic" } }"#);
        assert!(err.is_err());
    }
}
