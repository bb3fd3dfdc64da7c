// Command dispatcher: event in, chat text out.

pub mod replies;

use crate::commands::{Command, CommandError};
use crate::config::AppConfig;
use crate::interaction::InteractionEvent;
use crate::leaderboard::{LeaderboardClient, LeaderboardError};
use crate::ocr::{OcrClient, OcrError};
use crate::sheets::{SheetError, SheetsClient};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Upstream clients the handlers need, built once from the configuration.
#[derive(Clone)]
pub struct Services {
    pub leaderboard: LeaderboardClient,
    pub sheets: SheetsClient,
    pub ocr: OcrClient,
}

impl Services {
    pub fn from_config(http: Client, cfg: &AppConfig) -> Self {
        Services {
            leaderboard: LeaderboardClient::new(http.clone(), cfg.leaderboard_api_base.clone()),
            sheets: SheetsClient::new(
                http.clone(),
                cfg.sheets_api_base.clone(),
                cfg.spreadsheet_id.clone(),
                cfg.sheets_api_key.clone(),
            ),
            ocr: OcrClient::new(http, cfg.ocr_api_url.clone(), cfg.ocr_api_key.clone()),
        }
    }
}

pub async fn run_command(cmd: &Command, services: &Services) -> Result<String, HandlerError> {
    let text = match cmd {
        Command::Hello => replies::GREETING.to_string(),
        Command::Echo(text) => replies::echo(text),
        Command::Spreadsheet => replies::SPREADSHEET_LINK.to_string(),
        Command::Help(topic) => replies::help(topic),
        Command::Github => replies::github(),
        Command::RuptureCalc { level, reroll_cost } => {
            services.sheets.rupture_calc(*level, *reroll_cost).await?
        }
        Command::Leaderboard { username, detailed } => {
            services.leaderboard.lookup(username, *detailed).await?
        }
        Command::ImageTest { image_url } => services.ocr.read_item(image_url).await?.render(),
        Command::Unknown(_) => replies::UNKNOWN_COMMAND.to_string(),
    };
    Ok(text)
}

/// Always yields text: failures become their user-facing message.
pub async fn dispatch(event: &InteractionEvent, services: &Services) -> String {
    let result = match Command::from_event(event) {
        Ok(cmd) => run_command(&cmd, services).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(text) => {
            info!("Command '{}' handled", event.command_name);
            text
        }
        Err(e) => {
            error!("Command '{}' failed: {}", event.command_name, e);
            e.to_string()
        }
    }
}
