// Offhand detection from the three build-modifier strings.

use super::BuildMods;

pub const UNKNOWN_OFFHAND: &str = "Unknown";

/// Known offhand items, most specific names first: on a tie the earlier
/// entry wins.
pub const OFFHAND_CATALOG: &[&str] = &[
    "Parrying Dagger",
    "Tower Shield",
    "Spiked Shield",
    "Crystal Ball",
    "War Banner",
    "Bone Totem",
    "Aegis",
    "Bulwark",
    "Buckler",
    "Shield",
    "Grimoire",
    "Codex",
    "Tome",
    "Orb",
    "Lantern",
    "Censer",
    "Totem",
    "Idol",
    "Relic",
    "Talisman",
    "Quiver",
    "Dagger",
    "Skull",
    "Scepter",
    "Chalice",
];

/// Returns the first catalog item named by at least two of the three
/// modifiers, or [`UNKNOWN_OFFHAND`].
pub fn detect_offhand(mods: &BuildMods) -> &'static str {
    let folded = [
        mods.trinket.to_lowercase(),
        mods.goblet.to_lowercase(),
        mods.horn.to_lowercase(),
    ];

    OFFHAND_CATALOG
        .iter()
        .find(|item| {
            let needle = item.to_lowercase();
            folded.iter().filter(|m| m.contains(&needle)).count() >= 2
        })
        .copied()
        .unwrap_or(UNKNOWN_OFFHAND)
}
