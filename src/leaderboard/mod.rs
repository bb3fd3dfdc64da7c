// Leaderboard lookups against the external ranking service.

pub mod format;
pub mod offhand;
pub mod ranker;

pub use format::{format_entry, format_set};
pub use offhand::detect_offhand;
pub use ranker::RankedCharacterSet;

use reqwest::Client;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("Failed to retrieve leaderboard data.")]
    Unavailable {
        board: LeaderboardType,
        reason: String,
    },
    #[error("No characters found for user '{0}' in leaderboards.")]
    NoCharacters(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardType {
    Softcore,
    Hardcore,
}

impl LeaderboardType {
    /// Value of the `type` query parameter on the scores endpoint.
    pub fn query_value(self) -> &'static str {
        match self {
            LeaderboardType::Softcore => "normal",
            LeaderboardType::Hardcore => "hardcore",
        }
    }
}

impl fmt::Display for LeaderboardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderboardType::Softcore => f.write_str("Softcore"),
            LeaderboardType::Hardcore => f.write_str("Hardcore"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMods {
    #[serde(default, alias = "Trinket")]
    pub trinket: String,
    #[serde(default, alias = "Goblet")]
    pub goblet: String,
    #[serde(default, alias = "Horn")]
    pub horn: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub rapture_level: i64,
    pub level: i64,
    pub deaths: i64,
    pub rating: i64,
    pub id: String,
    pub build: BuildMods,
    pub zone: String,
    pub stance: String,
    pub leaderboard_type: LeaderboardType,
    /// 1-based position in the source list.
    pub rank: usize,
}

impl LeaderboardEntry {
    pub fn is_alive(&self) -> bool {
        self.deaths == 0
    }
}

// The ranking service is loose with types: numbers sometimes arrive as
// strings, and ids as either.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

fn loose_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Option::<Loose>::deserialize(d)? {
        None => Ok(0),
        Some(Loose::Int(n)) => Ok(n),
        Some(Loose::Float(f)) => Ok(f as i64),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Loose::Text(s)) => s.trim().parse::<i64>().map_err(de::Error::custom),
    }
}

fn loose_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        None => String::new(),
        Some(Loose::Int(n)) => n.to_string(),
        Some(Loose::Float(f)) => f.to_string(),
        Some(Loose::Text(s)) => s,
    })
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ScoreRecord {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "loose_i64")]
    rapture_level: i64,
    #[serde(default, deserialize_with = "loose_i64")]
    level: i64,
    #[serde(default, deserialize_with = "loose_i64")]
    deaths: i64,
    #[serde(default, deserialize_with = "loose_i64")]
    rating: i64,
    #[serde(default, deserialize_with = "loose_string")]
    id: String,
    #[serde(default)]
    build: BuildMods,
    #[serde(default)]
    zone: String,
    #[serde(default)]
    stance: String,
}

#[derive(Deserialize, Debug)]
struct ScoresResponse {
    #[serde(default)]
    leaderboards: Vec<ScoreRecord>,
}

impl ScoreRecord {
    fn into_entry(self, leaderboard_type: LeaderboardType, rank: usize) -> LeaderboardEntry {
        LeaderboardEntry {
            name: self.name,
            rapture_level: self.rapture_level,
            level: self.level,
            deaths: self.deaths,
            rating: self.rating,
            id: self.id,
            build: self.build,
            zone: self.zone,
            stance: self.stance,
            leaderboard_type,
            rank,
        }
    }
}

#[derive(Clone)]
pub struct LeaderboardClient {
    http: Client,
    base_url: url::Url,
}

impl LeaderboardClient {
    pub fn new(http: Client, base_url: url::Url) -> Self {
        LeaderboardClient { http, base_url }
    }

    /// Fetch one board; entries carry their 1-based position.
    pub async fn fetch(
        &self,
        board: LeaderboardType,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let url = format!(
            "{}/leaderboards/scores",
            self.base_url.as_str().trim_end_matches('/')
        );
        let unavailable = |reason: String| LeaderboardError::Unavailable { board, reason };

        let res = self
            .http
            .get(url)
            .query(&[("type", board.query_value())])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = res.status();
        if status != reqwest::StatusCode::OK {
            return Err(unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body: ScoresResponse = res.json().await.map_err(|e| unavailable(e.to_string()))?;

        Ok(body
            .leaderboards
            .into_iter()
            .enumerate()
            .map(|(i, rec)| rec.into_entry(board, i + 1))
            .collect())
    }

    /// Fetch both boards and render the user's best characters.
    pub async fn lookup(&self, username: &str, detailed: bool) -> Result<String, LeaderboardError> {
        let (softcore, hardcore) = tokio::join!(
            self.fetch(LeaderboardType::Softcore),
            self.fetch(LeaderboardType::Hardcore)
        );
        let (softcore, hardcore) = match (softcore, hardcore) {
            (Ok(s), Ok(h)) => (s, h),
            (Err(e), _) | (_, Err(e)) => {
                if let LeaderboardError::Unavailable { board, reason } = &e {
                    error!("Leaderboard fetch failed ({board}): {reason}");
                }
                return Err(e);
            }
        };

        let set = RankedCharacterSet::resolve(username, &softcore, &hardcore);
        if set.is_empty() {
            return Err(LeaderboardError::NoCharacters(username.to_string()));
        }

        info!(
            "Leaderboard lookup for '{}' selected {} entries",
            username,
            set.selected().len()
        );
        Ok(format_set(&set, detailed))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_board(server: &MockServer, kind: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/leaderboards/scores"))
            .and(query_param("type", kind))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> LeaderboardClient {
        LeaderboardClient::new(Client::new(), url::Url::parse(&server.uri()).unwrap())
    }

    #[test]
    fn decodes_loose_numbers() {
        let rec: ScoreRecord = serde_json::from_value(json!({
            "name": "Magy",
            "raptureLevel": "42",
            "level": 90,
            "deaths": "0",
            "rating": 1234.0,
            "id": 77,
            "build": {"Trinket": "a", "goblet": "b"}
        }))
        .unwrap();
        assert_eq!(rec.rapture_level, 42);
        assert_eq!(rec.deaths, 0);
        assert_eq!(rec.rating, 1234);
        assert_eq!(rec.id, "77");
        assert_eq!(rec.build.trinket, "a");
        assert_eq!(rec.build.horn, "");
    }

    #[tokio::test]
    async fn fetch_assigns_positional_rank() {
        let server = MockServer::start().await;
        mount_board(
            &server,
            "normal",
            200,
            json!({"leaderboards": [
                {"name": "A", "raptureLevel": 3, "id": "a"},
                {"name": "B", "raptureLevel": 2, "id": "b"}
            ]}),
        )
        .await;

        let entries = client(&server).fetch(LeaderboardType::Softcore).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].leaderboard_type, LeaderboardType::Softcore);
    }

    #[tokio::test]
    async fn lookup_reports_upstream_failure() {
        let server = MockServer::start().await;
        mount_board(&server, "normal", 200, json!({"leaderboards": []})).await;
        mount_board(&server, "hardcore", 503, json!({})).await;

        let err = client(&server).lookup("Magy", false).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to retrieve leaderboard data.");
    }

    #[tokio::test]
    async fn lookup_reports_missing_user() {
        let server = MockServer::start().await;
        mount_board(
            &server,
            "normal",
            200,
            json!({"leaderboards": [{"name": "Other", "raptureLevel": 3, "id": "a"}]}),
        )
        .await;
        mount_board(&server, "hardcore", 200, json!({"leaderboards": []})).await;

        let err = client(&server).lookup("Magy", false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No characters found for user 'Magy' in leaderboards."
        );
    }

    #[tokio::test]
    async fn lookup_consolidates_alive_hardcore() {
        let server = MockServer::start().await;
        mount_board(&server, "normal", 200, json!({"leaderboards": []})).await;
        mount_board(
            &server,
            "hardcore",
            200,
            json!({"leaderboards": [
                {"name": "Someone", "raptureLevel": 99, "id": "x", "deaths": 0},
                {"name": "Magy Hc", "raptureLevel": 50, "id": "m1", "deaths": "0", "rating": 700},
                {"name": "Magy Old", "raptureLevel": 20, "id": "m2", "deaths": "4", "rating": 900}
            ]}),
        )
        .await;

        let text = client(&server).lookup("magy", false).await.unwrap();
        assert_eq!(text.matches("Leaderboard: Hardcore").count(), 1);
        assert!(text.contains("Name: Magy Hc"));
        assert!(text.contains("Rank: 2"));
        assert!(text.contains("Status: Alive"));
    }

    #[tokio::test]
    async fn consolidated_survivor_is_reported_alone() {
        let server = MockServer::start().await;
        mount_board(
            &server,
            "normal",
            200,
            json!({"leaderboards": [{"name": "Magy", "raptureLevel": 60, "id": "s1"}]}),
        )
        .await;
        mount_board(
            &server,
            "hardcore",
            200,
            json!({"leaderboards": [
                {"name": "Magy", "raptureLevel": 70, "id": "h1", "deaths": 0, "rating": 500}
            ]}),
        )
        .await;

        let text = client(&server).lookup("magy", false).await.unwrap();
        assert_eq!(text.matches("Name: ").count(), 1);
        assert!(text.contains("Leaderboard: Hardcore"));
        assert!(!text.contains("Leaderboard: Softcore"));
    }
}
