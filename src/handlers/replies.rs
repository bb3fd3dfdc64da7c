// Fixed replies that need no upstream call.

use crate::commands::HelpTopic;

pub const GREETING: &str = "Hello there!";
pub const SPREADSHEET_LINK: &str = "[Rupture Spreadsheet](https://docs.google.com/spreadsheets/d/1rRO1LMt1NgykrdEfoZdEwhp4c9TRHTexYLuk6mgxLa0/edit#gid=0)";
pub const UNKNOWN_COMMAND: &str = "Unknown command";

pub fn echo(text: &str) -> String {
    format!("Echoing: {text}")
}

pub fn github() -> String {
    format!("[Source code]({})", env!("CARGO_PKG_REPOSITORY"))
}

pub fn help(topic: &HelpTopic) -> String {
    match topic {
        HelpTopic::General => [
            "Available commands:",
            "/hello - say hello",
            "/echo <text> - repeat text back to you",
            "/spreadsheet - link to the rupture spreadsheet",
            "/rupturecalc <rupturelevel> [rerollcost] - runs needed per beetle and per reroll",
            "/leaderboard <username> [details] - best characters on the leaderboards",
            "/imagetest <image> - read an item tooltip from a screenshot",
            "/github - link to the source code",
            "/help [command] - show this text, or help for one command",
        ]
        .join("\n"),
        HelpTopic::RuptureCalc => [
            "/rupturecalc <rupturelevel> [rerollcost]",
            "Looks up the rupture level in the spreadsheet and reports how many runs you need for one beetle (100 time essence) and for one reroll.",
            "rerollcost defaults to 1500.",
        ]
        .join("\n"),
        HelpTopic::Leaderboard => [
            "/leaderboard <username> [details]",
            "Finds characters whose name starts with <username> (case-insensitive) on the softcore and hardcore leaderboards.",
            "Reports the best softcore character, the best hardcore character and the best hardcore character that is still alive.",
            "Set details to true for deaths, rating, zone, stance and build mods.",
        ]
        .join("\n"),
        HelpTopic::ImageTest => [
            "/imagetest <image>",
            "Attach a screenshot of an item tooltip; the bot reads its name, level, equipment type, stats and mod.",
        ]
        .join("\n"),
        HelpTopic::Unknown(name) => {
            format!("No help available for '{name}'. Use /help to list the commands.")
        }
    }
}
