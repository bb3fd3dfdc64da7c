use crate::interaction::InteractionEvent;
use thiserror::Error;

pub const DEFAULT_REROLL_COST: i64 = 1500;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Missing required option '{0}'.")]
    MissingArgument(&'static str),
    #[error("Option '{name}' must be a whole number, got '{value}'.")]
    InvalidNumber { name: &'static str, value: String },
    #[error("No image attachment found for this command.")]
    MissingAttachment,
}

/// Topics `/help` can be asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTopic {
    General,
    RuptureCalc,
    Leaderboard,
    ImageTest,
    Unknown(String),
}

impl HelpTopic {
    fn parse(raw: Option<String>) -> Self {
        match raw.map(|s| s.trim().trim_start_matches('/').to_lowercase()) {
            None => HelpTopic::General,
            Some(s) => match s.as_str() {
                "" => HelpTopic::General,
                "rupturecalc" => HelpTopic::RuptureCalc,
                "leaderboard" => HelpTopic::Leaderboard,
                "imagetest" => HelpTopic::ImageTest,
                _ => HelpTopic::Unknown(s),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hello,
    Echo(String),
    Spreadsheet,
    Help(HelpTopic),
    Github,
    RuptureCalc { level: i64, reroll_cost: i64 },
    Leaderboard { username: String, detailed: bool },
    ImageTest { image_url: String },
    Unknown(String),
}

impl Command {
    /// Pick the command for an event by exact match on its name.
    pub fn from_event(event: &InteractionEvent) -> Result<Command, CommandError> {
        let cmd = match event.command_name.as_str() {
            "hello" => Command::Hello,
            "echo" => Command::Echo(
                event
                    .argument(0)
                    .and_then(|a| a.as_text())
                    .unwrap_or_default(),
            ),
            "spreadsheet" => Command::Spreadsheet,
            "help" => Command::Help(HelpTopic::parse(
                event.argument(0).and_then(|a| a.as_text()),
            )),
            "github" => Command::Github,
            "rupturecalc" => {
                let arg = event
                    .argument(0)
                    .ok_or(CommandError::MissingArgument("rupturelevel"))?;
                let level = arg.as_i64().ok_or_else(|| CommandError::InvalidNumber {
                    name: "rupturelevel",
                    value: arg.as_text().unwrap_or_default(),
                })?;
                // Reroll cost falls back to the default when absent or malformed.
                let reroll_cost = event
                    .argument(1)
                    .and_then(|a| a.as_i64())
                    .unwrap_or(DEFAULT_REROLL_COST);
                Command::RuptureCalc { level, reroll_cost }
            }
            "leaderboard" => {
                let username = event
                    .argument(0)
                    .and_then(|a| a.as_text())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or(CommandError::MissingArgument("username"))?;
                let detailed = event
                    .argument(1)
                    .and_then(|a| a.as_bool())
                    .unwrap_or(false);
                Command::Leaderboard { username, detailed }
            }
            "imagetest" => {
                let id = event
                    .argument(0)
                    .and_then(|a| a.as_text())
                    .ok_or(CommandError::MissingArgument("image"))?;
                let image_url = event
                    .attachment_url(&id)
                    .ok_or(CommandError::MissingAttachment)?
                    .to_string();
                Command::ImageTest { image_url }
            }
            other => Command::Unknown(other.to_string()),
        };
        Ok(cmd)
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Hello => "hello",
            Command::Echo(_) => "echo",
            Command::Spreadsheet => "spreadsheet",
            Command::Help(_) => "help",
            Command::Github => "github",
            Command::RuptureCalc { .. } => "rupturecalc",
            Command::Leaderboard { .. } => "leaderboard",
            Command::ImageTest { .. } => "imagetest",
            Command::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{CommandArgument, InteractionKind};
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn event(name: &str, args: &[Value]) -> InteractionEvent {
        InteractionEvent {
            kind: InteractionKind::Command,
            command_name: name.to_string(),
            arguments: args
                .iter()
                .enumerate()
                .map(|(i, v)| CommandArgument {
                    name: format!("arg{i}"),
                    value: v.clone(),
                })
                .collect(),
            resolved_attachments: BTreeMap::new(),
            origin_token: "tok".into(),
            application_id: "app".into(),
        }
    }

    #[test]
    fn simple_commands() {
        assert_eq!(Command::from_event(&event("hello", &[])), Ok(Command::Hello));
        assert_eq!(
            Command::from_event(&event("echo", &[json!("hi there")])),
            Ok(Command::Echo("hi there".into()))
        );
        assert_eq!(
            Command::from_event(&event("github", &[])),
            Ok(Command::Github)
        );
    }

    #[test]
    fn unknown_name_is_kept() {
        assert_eq!(
            Command::from_event(&event("doesnotexist", &[])),
            Ok(Command::Unknown("doesnotexist".into()))
        );
        // Exact match only.
        assert_eq!(
            Command::from_event(&event("Hello", &[])),
            Ok(Command::Unknown("Hello".into()))
        );
    }

    #[test]
    fn rupturecalc_defaults_reroll_cost() {
        assert_eq!(
            Command::from_event(&event("rupturecalc", &[json!(5)])),
            Ok(Command::RuptureCalc {
                level: 5,
                reroll_cost: 1500
            })
        );
        assert_eq!(
            Command::from_event(&event("rupturecalc", &[json!(5), json!("lots")])),
            Ok(Command::RuptureCalc {
                level: 5,
                reroll_cost: 1500
            })
        );
        assert_eq!(
            Command::from_event(&event("rupturecalc", &[json!("7"), json!(2000)])),
            Ok(Command::RuptureCalc {
                level: 7,
                reroll_cost: 2000
            })
        );
    }

    #[test]
    fn rupturecalc_requires_level() {
        assert_eq!(
            Command::from_event(&event("rupturecalc", &[])),
            Err(CommandError::MissingArgument("rupturelevel"))
        );
        assert!(matches!(
            Command::from_event(&event("rupturecalc", &[json!("high")])),
            Err(CommandError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn leaderboard_arguments() {
        assert_eq!(
            Command::from_event(&event("leaderboard", &[json!("Magy")])),
            Ok(Command::Leaderboard {
                username: "Magy".into(),
                detailed: false
            })
        );
        assert_eq!(
            Command::from_event(&event("leaderboard", &[json!("Magy"), json!(true)])),
            Ok(Command::Leaderboard {
                username: "Magy".into(),
                detailed: true
            })
        );
        assert_eq!(
            Command::from_event(&event("leaderboard", &[])),
            Err(CommandError::MissingArgument("username"))
        );
    }

    #[test]
    fn imagetest_resolves_attachment() {
        let mut ev = event("imagetest", &[json!("42")]);
        assert_eq!(
            Command::from_event(&ev),
            Err(CommandError::MissingAttachment)
        );

        ev.resolved_attachments
            .insert("42".into(), "https://cdn.example/x.png".into());
        assert_eq!(
            Command::from_event(&ev),
            Ok(Command::ImageTest {
                image_url: "https://cdn.example/x.png".into()
            })
        );
    }

    #[test]
    fn help_topics() {
        assert_eq!(
            Command::from_event(&event("help", &[])),
            Ok(Command::Help(HelpTopic::General))
        );
        assert_eq!(
            Command::from_event(&event("help", &[json!("Leaderboard")])),
            Ok(Command::Help(HelpTopic::Leaderboard))
        );
        assert_eq!(
            Command::from_event(&event("help", &[json!("nope")])),
            Ok(Command::Help(HelpTopic::Unknown("nope".into())))
        );
    }
}
