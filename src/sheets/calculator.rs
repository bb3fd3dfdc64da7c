// Run counts for a rupture level, derived from the reference table.

use super::SheetError;

const KEY_COLUMN: usize = 0;
const CRAFT_MATERIAL_COLUMN: usize = 3;
const ESSENCE_COLUMN: usize = 5;
/// Time essence needed for one beetle.
pub const ESSENCE_PER_BEETLE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRow {
    pub rupture_level: i64,
    pub craft_material_average: i64,
    pub essence_per_run: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunCount {
    pub rounded: i64,
    pub raw: f64,
}

impl RunCount {
    fn of(needed: i64, per_run: i64) -> Self {
        let raw = needed as f64 / per_run as f64;
        RunCount {
            rounded: raw.ceil() as i64,
            raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuptureEstimate {
    pub level: i64,
    pub reroll_cost: i64,
    pub runs_per_reroll: RunCount,
    pub runs_per_beetle: RunCount,
}

impl RuptureEstimate {
    pub fn render(&self) -> String {
        format!(
            "Rupture Level {}\nRuns per Beetle: {} ({:.2}).\nRuns per reroll given cost {}: {} ({:.2})",
            self.level,
            self.runs_per_beetle.rounded,
            self.runs_per_beetle.raw,
            self.reroll_cost,
            self.runs_per_reroll.rounded,
            self.runs_per_reroll.raw,
        )
    }
}

fn cell_i64(row: &[String], col: usize) -> Option<i64> {
    row.get(col).and_then(|c| c.trim().replace(',', "").parse::<i64>().ok())
}

/// First row (after the header) whose key column equals `level`.
/// Rows with an unreadable key are skipped.
pub fn find_row(values: &[Vec<String>], level: i64) -> Result<SpreadsheetRow, SheetError> {
    let row = values
        .iter()
        .skip(1)
        .find(|row| cell_i64(row, KEY_COLUMN) == Some(level))
        .ok_or(SheetError::LevelNotFound(level))?;

    let craft_material_average = cell_i64(row, CRAFT_MATERIAL_COLUMN)
        .filter(|v| *v > 0)
        .ok_or(SheetError::BadRow {
            level,
            column: "craft material average",
        })?;
    let essence_per_run = cell_i64(row, ESSENCE_COLUMN)
        .filter(|v| *v > 0)
        .ok_or(SheetError::BadRow {
            level,
            column: "essence per run",
        })?;

    Ok(SpreadsheetRow {
        rupture_level: level,
        craft_material_average,
        essence_per_run,
    })
}

pub fn estimate(row: &SpreadsheetRow, reroll_cost: i64) -> RuptureEstimate {
    RuptureEstimate {
        level: row.rupture_level,
        reroll_cost,
        runs_per_reroll: RunCount::of(reroll_cost, row.craft_material_average),
        runs_per_beetle: RunCount::of(ESSENCE_PER_BEETLE, row.essence_per_run),
    }
}
