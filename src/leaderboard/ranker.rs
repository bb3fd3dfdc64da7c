// Picks the characters to report for a username.

use super::LeaderboardEntry;

/// The entries reported for one lookup.
///
/// Built only through [`RankedCharacterSet::resolve`], which applies the
/// tie-break: when the best hardcore character by rupture level is also the
/// best surviving one, only the surviving slot is filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedCharacterSet {
    softcore_best: Option<LeaderboardEntry>,
    hardcore_best: Option<LeaderboardEntry>,
    hardcore_alive_best: Option<LeaderboardEntry>,
}

/// First whitespace-delimited token of the character name, compared
/// case-insensitively.
pub fn matches_username(entry: &LeaderboardEntry, username: &str) -> bool {
    entry
        .name
        .split_whitespace()
        .next()
        .is_some_and(|first| first.to_lowercase() == username.trim().to_lowercase())
}

// Highest key wins; the earliest entry wins a tie.
fn best_by<'a>(
    entries: impl Iterator<Item = &'a LeaderboardEntry>,
    key: impl Fn(&LeaderboardEntry) -> i64,
) -> Option<&'a LeaderboardEntry> {
    entries.fold(None, |best, e| match best {
        Some(b) if key(b) >= key(e) => Some(b),
        _ => Some(e),
    })
}

impl RankedCharacterSet {
    pub fn resolve(
        username: &str,
        softcore: &[LeaderboardEntry],
        hardcore: &[LeaderboardEntry],
    ) -> Self {
        let sc = softcore.iter().filter(|e| matches_username(e, username));
        let hc: Vec<&LeaderboardEntry> = hardcore
            .iter()
            .filter(|e| matches_username(e, username))
            .collect();

        let hardcore_best = best_by(hc.iter().copied(), |e| e.rapture_level);
        let hardcore_alive_best =
            best_by(hc.iter().copied().filter(|e| e.is_alive()), |e| e.rating);

        // Best hardcore is also the best survivor: report that one entry alone.
        if let (Some(best), Some(alive)) = (hardcore_best, hardcore_alive_best) {
            if best.id == alive.id {
                return RankedCharacterSet {
                    softcore_best: None,
                    hardcore_best: None,
                    hardcore_alive_best: Some(alive.clone()),
                };
            }
        }

        RankedCharacterSet {
            softcore_best: best_by(sc, |e| e.rapture_level).cloned(),
            hardcore_best: hardcore_best.cloned(),
            hardcore_alive_best: hardcore_alive_best.cloned(),
        }
    }

    pub fn softcore_best(&self) -> Option<&LeaderboardEntry> {
        self.softcore_best.as_ref()
    }

    pub fn hardcore_best(&self) -> Option<&LeaderboardEntry> {
        self.hardcore_best.as_ref()
    }

    pub fn hardcore_alive_best(&self) -> Option<&LeaderboardEntry> {
        self.hardcore_alive_best.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.softcore_best.is_none()
            && self.hardcore_best.is_none()
            && self.hardcore_alive_best.is_none()
    }

    /// Selected entries, highest rupture level first. Equal levels keep
    /// softcore, hardcore, surviving-hardcore order.
    pub fn selected(&self) -> Vec<&LeaderboardEntry> {
        let mut out: Vec<&LeaderboardEntry> = [
            self.softcore_best.as_ref(),
            self.hardcore_best.as_ref(),
            self.hardcore_alive_best.as_ref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        out.sort_by(|a, b| b.rapture_level.cmp(&a.rapture_level));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::test_support::entry;
    use crate::leaderboard::LeaderboardType::{Hardcore, Softcore};

    #[test]
    fn username_matches_first_token_case_insensitively() {
        let e = entry("Magy the Brave", "1", Softcore, 10, 0, 0, 1);
        assert!(matches_username(&e, "magy"));
        assert!(matches_username(&e, "MAGY"));
        assert!(!matches_username(&e, "Mag"));
        assert!(!matches_username(&e, "Brave"));
    }

    #[test]
    fn softcore_only_user() {
        let soft = vec![
            entry("Other", "a", Softcore, 90, 0, 0, 1),
            entry("Magy", "b", Softcore, 40, 0, 0, 2),
            entry("magy alt", "c", Softcore, 55, 0, 0, 3),
        ];
        let set = RankedCharacterSet::resolve("Magy", &soft, &[]);
        let sel = set.selected();
        assert_eq!(sel.len(), 1);
        assert_eq!(sel[0].id, "c");
        assert_eq!(sel[0].rank, 3);
    }

    #[test]
    fn alive_best_supersedes_identical_hardcore_best() {
        let hard = vec![
            entry("Magy", "h1", Hardcore, 70, 0, 500, 1),
            entry("Magy", "h2", Hardcore, 30, 2, 900, 2),
        ];
        let set = RankedCharacterSet::resolve("magy", &[], &hard);
        assert!(set.hardcore_best().is_none());
        assert_eq!(set.hardcore_alive_best().unwrap().id, "h1");
        assert_eq!(set.selected().len(), 1);
    }

    #[test]
    fn consolidated_survivor_drops_softcore_best() {
        let soft = vec![entry("Magy", "s1", Softcore, 60, 0, 0, 3)];
        let hard = vec![entry("Magy", "h1", Hardcore, 70, 0, 500, 1)];
        let set = RankedCharacterSet::resolve("Magy", &soft, &hard);

        assert!(set.softcore_best().is_none());
        assert!(set.hardcore_best().is_none());
        let ids: Vec<&str> = set.selected().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["h1"]);
    }

    #[test]
    fn dead_best_and_alive_best_both_reported() {
        let hard = vec![
            entry("Magy", "dead", Hardcore, 80, 1, 900, 1),
            entry("Magy", "alive", Hardcore, 50, 0, 400, 7),
        ];
        let soft = vec![entry("Magy", "soft", Softcore, 60, 3, 0, 4)];
        let set = RankedCharacterSet::resolve("Magy", &soft, &hard);
        let ids: Vec<&str> = set.selected().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["dead", "soft", "alive"]);
    }

    #[test]
    fn alive_best_is_chosen_by_rating_not_level() {
        let hard = vec![
            entry("Magy", "high-level", Hardcore, 90, 0, 100, 1),
            entry("Magy", "high-rating", Hardcore, 40, 0, 800, 2),
        ];
        let set = RankedCharacterSet::resolve("Magy", &[], &hard);
        assert_eq!(set.hardcore_best().unwrap().id, "high-level");
        assert_eq!(set.hardcore_alive_best().unwrap().id, "high-rating");
    }

    #[test]
    fn ties_keep_the_earlier_entry() {
        let soft = vec![
            entry("Magy", "first", Softcore, 50, 0, 0, 1),
            entry("Magy", "second", Softcore, 50, 0, 0, 2),
        ];
        let set = RankedCharacterSet::resolve("Magy", &soft, &[]);
        assert_eq!(set.softcore_best().unwrap().id, "first");
    }

    #[test]
    fn no_match_is_empty() {
        let soft = vec![entry("Other", "a", Softcore, 90, 0, 0, 1)];
        let set = RankedCharacterSet::resolve("Magy", &soft, &[]);
        assert!(set.is_empty());
        assert!(set.selected().is_empty());
    }
}
