// Slash-command registration against the platform's application commands API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("could not read command definitions: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid command definitions: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid commands URL: {0}")]
    Url(#[from] url::ParseError),
}

/// One command as stored in the definitions file. Fields we do not model
/// (`type`, permissions, localizations) pass through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A command currently registered for the application.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ActiveCommand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub fn load_definitions(path: &Path) -> Result<Vec<CommandDefinition>, RegistrationError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub deleted: Vec<String>,
    pub created: Vec<String>,
    /// `(command name, reason)` for every call that did not succeed.
    pub failed: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct RegistrationClient {
    http: Client,
    commands_url: url::Url,
    auth: String,
}

impl RegistrationClient {
    pub fn new(
        http: Client,
        api_base: &url::Url,
        application_id: &str,
        bot_token: &str,
    ) -> Result<Self, RegistrationError> {
        let mut commands_url = api_base.clone();
        commands_url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["applications", application_id, "commands"]);

        Ok(RegistrationClient {
            http,
            commands_url,
            auth: format!("Bot {bot_token}"),
        })
    }

    pub async fn list(&self) -> Result<Vec<ActiveCommand>, RegistrationError> {
        let res = self
            .http
            .get(self.commands_url.clone())
            .header("Authorization", &self.auth)
            .send()
            .await?;
        let res = check(res).await?;
        Ok(res.json().await?)
    }

    pub async fn create(&self, def: &CommandDefinition) -> Result<(), RegistrationError> {
        let res = self
            .http
            .post(self.commands_url.clone())
            .header("Authorization", &self.auth)
            .json(def)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), RegistrationError> {
        let mut url = self.commands_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id);
        let res = self
            .http
            .delete(url)
            .header("Authorization", &self.auth)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    /// Remove active commands missing from `defs`, then create the defined
    /// ones (only those named in `only`, when it is non-empty). Each call is
    /// tried once; failures are collected rather than aborting the run.
    pub async fn sync(
        &self,
        defs: &[CommandDefinition],
        only: &[String],
    ) -> Result<SyncReport, RegistrationError> {
        let mut report = SyncReport::default();

        let active = self.list().await?;
        for cmd in active
            .iter()
            .filter(|c| !defs.iter().any(|d| d.name == c.name))
        {
            match self.delete(&cmd.id).await {
                Ok(()) => {
                    info!("Command {} ({}) deleted", cmd.name, cmd.id);
                    report.deleted.push(cmd.name.clone());
                }
                Err(e) => {
                    warn!("Deleting command {} failed: {e}", cmd.name);
                    report.failed.push((cmd.name.clone(), e.to_string()));
                }
            }
        }

        for def in defs
            .iter()
            .filter(|d| only.is_empty() || only.contains(&d.name))
        {
            match self.create(def).await {
                Ok(()) => {
                    info!("Command {} created", def.name);
                    report.created.push(def.name.clone());
                }
                Err(e) => {
                    warn!("Creating command {} failed: {e}", def.name);
                    report.failed.push((def.name.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

async fn check(res: reqwest::Response) -> Result<reqwest::Response, RegistrationError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(RegistrationError::Status {
        status: status.as_u16(),
        body,
    })
}
