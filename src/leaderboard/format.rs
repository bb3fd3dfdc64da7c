// Chat text for leaderboard results.

use super::offhand::detect_offhand;
use super::ranker::RankedCharacterSet;
use super::{LeaderboardEntry, LeaderboardType};
use std::fmt::Write as _;

pub fn format_entry(entry: &LeaderboardEntry, detailed: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name: {}", entry.name);
    let _ = writeln!(out, "Level: {}", entry.level);
    let _ = writeln!(out, "Offhand: {}", detect_offhand(&entry.build));
    let _ = writeln!(out, "Rupture Level: {}", entry.rapture_level);
    let _ = writeln!(out, "Rank: {}", entry.rank);
    let _ = write!(out, "Leaderboard: {}", entry.leaderboard_type);
    if entry.leaderboard_type == LeaderboardType::Hardcore {
        let status = if entry.is_alive() { "Alive" } else { "Dead" };
        let _ = write!(out, "\nStatus: {status}");
    }

    if detailed {
        let _ = write!(out, "\nDeaths: {}", entry.deaths);
        let _ = write!(out, "\nRating: {}", entry.rating);
        if !entry.zone.is_empty() {
            let _ = write!(out, "\nZone: {}", entry.zone);
        }
        if !entry.stance.is_empty() {
            let _ = write!(out, "\nStance: {}", entry.stance);
        }
        let _ = write!(out, "\nTrinket Mod: {}", entry.build.trinket);
        let _ = write!(out, "\nGoblet Mod: {}", entry.build.goblet);
        let _ = write!(out, "\nHorn Mod: {}", entry.build.horn);
    }
    out
}

/// One block per selected entry, separated by a blank line.
pub fn format_set(set: &RankedCharacterSet, detailed: bool) -> String {
    set.selected()
        .into_iter()
        .map(|e| format_entry(e, detailed))
        .collect::<Vec<_>>()
        .join("\n\n")
}
