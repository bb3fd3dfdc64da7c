// Turns OCR output of an item tooltip into a structured item.
//
// One forward pass over the lines. Everything before the "Item Level" line is
// the name; the "Equipment" line opens the stat section, where lines without
// a '+' declare stat names and '+' lines fill them in declaration order. Once
// every declared stat has a value, the rest is the item mod text.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Line separator in the OCR engine's text output.
pub const LINE_SENTINEL: &str = "\r\n";

const ITEM_LEVEL_MARKER: &str = "Item Level";
const EQUIPMENT_MARKER: &str = "Equipment";

// Last run of digits on the line.
static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\D*$").expect("static regex"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Could not find an item level in the image.")]
    MissingItemLevel,
    #[error("Could not read the item level from '{0}'.")]
    InvalidItemLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub item_name: String,
    pub item_level: i64,
    pub equipment_type: String,
    /// Stat name and value, in detection order.
    pub stats: Vec<(String, String)>,
    pub item_mod: String,
}

impl ParsedItem {
    /// Name, level and equipment type first, then each stat, then the mod.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.stats.len() + 4);
        out.push(("Item Name".to_string(), self.item_name.clone()));
        out.push(("Item Level".to_string(), self.item_level.to_string()));
        out.push(("Equipment Type".to_string(), self.equipment_type.clone()));
        out.extend(self.stats.iter().cloned());
        out.push(("Item Mod".to_string(), self.item_mod.clone()));
        out
    }

    pub fn render(&self) -> String {
        self.fields()
            .into_iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Capitalise letters that follow a non-letter, lowercase the rest.
pub fn title_case(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_is_letter = false;
    for c in line.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    AwaitingEquipment,
    Stats,
}

#[derive(Debug)]
struct Segmenter {
    state: State,
    name_parts: Vec<String>,
    item_level: i64,
    equipment_type: String,
    stats: Vec<(String, String)>,
    stat_count: usize,
    match_count: usize,
    mod_parts: Vec<String>,
}

impl Segmenter {
    fn new() -> Self {
        Segmenter {
            state: State::Name,
            name_parts: Vec::new(),
            item_level: 0,
            equipment_type: String::new(),
            stats: Vec::new(),
            stat_count: 0,
            match_count: 0,
            mod_parts: Vec::new(),
        }
    }

    fn feed(&mut self, line: String) -> Result<(), SegmentError> {
        match self.state {
            State::Name => {
                if line.contains(ITEM_LEVEL_MARKER) {
                    self.item_level = TRAILING_NUMBER
                        .captures(&line)
                        .and_then(|c| c[1].parse().ok())
                        .ok_or_else(|| SegmentError::InvalidItemLevel(line.clone()))?;
                    self.state = State::AwaitingEquipment;
                } else {
                    self.name_parts.push(line);
                }
            }
            State::AwaitingEquipment => {
                if line.contains(EQUIPMENT_MARKER) {
                    // Trailing token; "Equipment:Goblet" has no space to split on.
                    let token = line.split_whitespace().last().unwrap_or_default();
                    self.equipment_type = token.rsplit(':').next().unwrap_or_default().to_string();
                    self.state = State::Stats;
                }
            }
            State::Stats => {
                let all_filled = self.match_count > 0 && self.match_count == self.stat_count;
                if all_filled {
                    self.mod_parts.push(line);
                } else if line.contains('+') {
                    if self.match_count < self.stat_count {
                        self.stats[self.match_count].1 = line;
                        self.match_count += 1;
                    } else {
                        self.mod_parts.push(line);
                    }
                } else {
                    self.stats.push((line, String::new()));
                    self.stat_count += 1;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<ParsedItem, SegmentError> {
        if self.state == State::Name {
            return Err(SegmentError::MissingItemLevel);
        }
        Ok(ParsedItem {
            item_name: self.name_parts.join(" "),
            item_level: self.item_level,
            equipment_type: self.equipment_type,
            stats: self.stats,
            item_mod: self.mod_parts.join(" "),
        })
    }
}

/// Segment a raw OCR text blob whose lines are separated by [`LINE_SENTINEL`].
pub fn segment(text: &str) -> Result<ParsedItem, SegmentError> {
    let mut seg = Segmenter::new();
    for raw in text.split(LINE_SENTINEL) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        seg.feed(title_case(line))?;
    }
    seg.finish()
}
