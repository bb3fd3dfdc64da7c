// OCR API client for image attachments.

pub mod segmenter;

pub use segmenter::{LINE_SENTINEL, ParsedItem, SegmentError, segment};

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Could not reach the OCR service: {0}")]
    Request(#[from] reqwest::Error),
    #[error("The OCR service answered with HTTP {0}.")]
    Status(u16),
    #[error("The OCR service could not process the image: {0}")]
    Processing(String),
    #[error("No text was found in the image.")]
    NoText,
    #[error(transparent)]
    Segment(#[from] SegmentError),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    // A string or a list of strings, depending on the failure.
    #[serde(default)]
    error_message: Value,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

fn error_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct OcrClient {
    http: Client,
    endpoint: url::Url,
    api_key: String,
}

impl OcrClient {
    pub fn new(http: Client, endpoint: url::Url, api_key: String) -> Self {
        OcrClient {
            http,
            endpoint,
            api_key,
        }
    }

    /// Run OCR on a publicly reachable image and return the raw text blob.
    pub async fn extract_text(&self, image_url: &str) -> Result<String, OcrError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .header("apikey", self.api_key.as_str())
            .form(&[
                ("url", image_url),
                ("OCREngine", "2"),
                ("scale", "true"),
                ("isOverlayRequired", "false"),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            error!("OCR request failed: HTTP {}", status.as_u16());
            return Err(OcrError::Status(status.as_u16()));
        }

        let body: OcrResponse = res.json().await?;
        if body.is_errored_on_processing {
            return Err(OcrError::Processing(error_text(&body.error_message)));
        }

        let text = body
            .parsed_results
            .into_iter()
            .map(|r| r.parsed_text)
            .collect::<Vec<_>>()
            .join(LINE_SENTINEL);
        if text.trim().is_empty() {
            return Err(OcrError::NoText);
        }
        Ok(text)
    }

    /// OCR the image and segment it into an item description.
    pub async fn read_item(&self, image_url: &str) -> Result<ParsedItem, OcrError> {
        let text = self.extract_text(image_url).await?;
        info!("OCR returned {} lines", text.split(LINE_SENTINEL).count());
        Ok(segment(&text)?)
    }
}
