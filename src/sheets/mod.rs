// Spreadsheet values API and the rupture calculator built on it.

pub mod calculator;

pub use calculator::{RuptureEstimate, SpreadsheetRow, estimate, find_row};

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

pub const RUPTURE_RANGE: &str = "Rupture Boss Chest Calculated Data!A1:H";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SheetError {
    #[error("Rupture level {0} not found in the spreadsheet.")]
    LevelNotFound(i64),
    #[error("Rupture level {level} has an unreadable {column} value in the spreadsheet.")]
    BadRow { level: i64, column: &'static str },
    #[error("The spreadsheet returned no data.")]
    Empty,
    #[error("Could not read the spreadsheet: {0}")]
    Unavailable(String),
}

#[derive(Deserialize, Debug, Default)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

// Cells come back as strings unless the caller asks otherwise; keep it tolerant.
fn cell_text(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: url::Url,
    spreadsheet_id: String,
    api_key: String,
}

impl SheetsClient {
    pub fn new(http: Client, base_url: url::Url, spreadsheet_id: String, api_key: String) -> Self {
        SheetsClient {
            http,
            base_url,
            spreadsheet_id,
            api_key,
        }
    }

    /// Read a range; no caching, every call hits the API.
    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetError::Unavailable("invalid spreadsheet base URL".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);

        let res = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SheetError::Unavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            error!("Spreadsheet read failed: HTTP {}", status.as_u16());
            return Err(SheetError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body: ValueRange = res
            .json()
            .await
            .map_err(|e| SheetError::Unavailable(e.to_string()))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    pub async fn rupture_calc(&self, level: i64, reroll_cost: i64) -> Result<String, SheetError> {
        let values = self.read_range(RUPTURE_RANGE).await?;
        if values.is_empty() {
            warn!("No data found.");
            return Err(SheetError::Empty);
        }

        let row = find_row(&values, level).inspect_err(|e| warn!("{e}"))?;
        let est = estimate(&row, reroll_cost);
        info!(
            "Rupture level {} estimate: {} runs per reroll",
            level, est.runs_per_reroll.rounded
        );
        Ok(est.render())
    }
}
