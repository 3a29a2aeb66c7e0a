//! Google Cloud Vision text detection over REST.

use base64::{engine::general_purpose, Engine as _};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{RecognizeError, TextAnnotation, TextRecognizer};

const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudConfig {
    pub endpoint: String,
    /// Falls back to the `GOOGLE_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub max_results: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: None,
            max_results: 1000,
        }
    }
}

pub struct CloudTextAnnotator {
    client: Client,
    config: CloudConfig,
    api_key: String,
}

impl CloudTextAnnotator {
    pub fn new(config: CloudConfig) -> Result<Self, RecognizeError> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var(API_KEY_ENV)
                .map_err(|_| RecognizeError::MissingKey { env: API_KEY_ENV })?,
        };
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
        })
    }

    fn request_body(&self, png: &[u8]) -> Value {
        json!({
            "requests": [{
                "image": { "content": general_purpose::STANDARD.encode(png) },
                "features": [{
                    "type": "TEXT_DETECTION",
                    "maxResults": self.config.max_results
                }]
            }]
        })
    }
}

impl TextRecognizer for CloudTextAnnotator {
    fn recognize(&self, png: &[u8]) -> Result<Vec<TextAnnotation>, RecognizeError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(png))
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RecognizeError::Api { status, message });
        }

        let body: Value = response.json()?;
        parse_response(&body)
    }
}

fn parse_response(body: &Value) -> Result<Vec<TextAnnotation>, RecognizeError> {
    let first = body
        .get("responses")
        .and_then(|r| r.get(0))
        .ok_or_else(|| RecognizeError::Response("no responses in Vision reply".to_string()))?;

    if let Some(error) = first.get("error") {
        let status = error.get("code").and_then(Value::as_u64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(RecognizeError::Api {
            status: u16::try_from(status).unwrap_or(u16::MAX),
            message: message.to_string(),
        });
    }

    let Some(annotations) = first.get("textAnnotations").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(annotations
        .iter()
        .filter_map(|a| {
            let text = a.get("description")?.as_str()?.to_string();
            let bounds = a
                .get("boundingPoly")
                .and_then(|p| p.get("vertices"))
                .and_then(Value::as_array)
                .map(|vertices| vertices.iter().map(vertex).collect());
            Some(TextAnnotation { text, bounds })
        })
        .collect())
}

/// Vision omits zero coordinates from vertices.
fn vertex(v: &Value) -> (i32, i32) {
    let coord = |key: &str| {
        v.get(key)
            .and_then(Value::as_i64)
            .and_then(|c| i32::try_from(c).ok())
            .unwrap_or(0)
    };
    (coord("x"), coord("y"))
}

#[cfg(test)]
mod tests {
    use super::{parse_response, CloudConfig, CloudTextAnnotator};
    use crate::text::RecognizeError;
    use serde_json::json;

    #[test]
    fn annotations_keep_bounds() {
        let body = json!({
            "responses": [{
                "textAnnotations": [
                    {
                        "description": "100%",
                        "boundingPoly": { "vertices": [
                            { "x": 10, "y": 4 }, { "x": 52 }, { "x": 52, "y": 20 }, { "y": 20 }
                        ]}
                    },
                    { "description": "AMMO" }
                ]
            }]
        });
        let found = parse_response(&body).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "100%");
        assert_eq!(
            found[0].bounds,
            Some(vec![(10, 4), (52, 0), (52, 20), (0, 20)])
        );
        assert_eq!(found[1].bounds, None);
    }

    #[test]
    fn empty_response_has_no_text() {
        let found = parse_response(&json!({ "responses": [{}] })).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn embedded_error_is_reported() {
        let body = json!({
            "responses": [{ "error": { "code": 429, "message": "quota exceeded" } }]
        });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, RecognizeError::Api { status: 429, .. }));
    }

    #[test]
    fn request_carries_feature_and_limit() {
        let annotator = CloudTextAnnotator::new(CloudConfig {
            api_key: Some("test-key".to_string()),
            max_results: 5,
            ..CloudConfig::default()
        })
        .unwrap();
        let body = annotator.request_body(&[1, 2, 3]);
        let request = &body["requests"][0];
        assert_eq!(request["image"]["content"], "AQID");
        assert_eq!(request["features"][0]["type"], "TEXT_DETECTION");
        assert_eq!(request["features"][0]["maxResults"], 5);
    }
}
