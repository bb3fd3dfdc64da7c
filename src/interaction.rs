// Interaction payloads: what the platform sends us and what we answer with.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const WARMUP_MARKER: &str = "warmup";

const TYPE_PING: u64 = 1;
const TYPE_APPLICATION_COMMAND: u64 = 2;
const TYPE_PONG: u64 = 1;
const TYPE_DEFERRED_CHANNEL_MESSAGE: u64 = 5;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Ping,
    Command,
    Other,
}

impl From<u64> for InteractionKind {
    fn from(code: u64) -> Self {
        match code {
            TYPE_PING => InteractionKind::Ping,
            TYPE_APPLICATION_COMMAND => InteractionKind::Command,
            _ => InteractionKind::Other,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandArgument {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl CommandArgument {
    /// The value as text; numbers and booleans are rendered, null is `None`.
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// The value as an integer, accepting numeric strings.
    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// An inbound interaction, reduced to the fields the bot acts on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub command_name: String,
    pub arguments: Vec<CommandArgument>,
    pub resolved_attachments: BTreeMap<String, String>,
    pub origin_token: String,
    pub application_id: String,
}

impl InteractionEvent {
    pub fn argument(&self, index: usize) -> Option<&CommandArgument> {
        self.arguments.get(index)
    }

    pub fn attachment_url(&self, id: &str) -> Option<&str> {
        self.resolved_attachments.get(id).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Default)]
struct RawInteraction {
    #[serde(rename = "type")]
    kind: u64,
    #[serde(default)]
    application_id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    data: Option<RawCommandData>,
}

#[derive(Deserialize, Debug, Default)]
struct RawCommandData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    options: Vec<CommandArgument>,
    #[serde(default)]
    resolved: Option<RawResolved>,
}

#[derive(Deserialize, Debug, Default)]
struct RawResolved {
    #[serde(default)]
    attachments: BTreeMap<String, RawAttachment>,
}

#[derive(Deserialize, Debug)]
struct RawAttachment {
    url: String,
}

impl From<RawInteraction> for InteractionEvent {
    fn from(raw: RawInteraction) -> Self {
        let data = raw.data.unwrap_or_default();
        let resolved_attachments = data
            .resolved
            .map(|r| {
                r.attachments
                    .into_iter()
                    .map(|(id, a)| (id, a.url))
                    .collect()
            })
            .unwrap_or_default();

        InteractionEvent {
            kind: InteractionKind::from(raw.kind),
            command_name: data.name,
            arguments: data.options,
            resolved_attachments,
            origin_token: raw.token,
            application_id: raw.application_id,
        }
    }
}

/// What an inbound body turned out to be.
#[derive(Debug)]
pub enum Inbound {
    Warmup,
    Event(InteractionEvent),
}

/// Decode a raw request body. The keep-alive marker is recognised before
/// anything else so it never reaches command handling.
pub fn decode_inbound(body: &[u8]) -> Result<Inbound, serde_json::Error> {
    let value: Value = serde_json::from_slice(body)?;
    if value.get("type").and_then(Value::as_str) == Some(WARMUP_MARKER) {
        return Ok(Inbound::Warmup);
    }
    let raw: RawInteraction = serde_json::from_value(value)?;
    Ok(Inbound::Event(raw.into()))
}

pub fn pong() -> Value {
    json!({ "type": TYPE_PONG })
}

pub fn deferred_ack() -> Value {
    json!({ "type": TYPE_DEFERRED_CHANNEL_MESSAGE })
}
