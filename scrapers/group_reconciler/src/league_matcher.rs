use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::matching::{rank, MatchOutcome};
use crate::normalize::normalize_category;
use crate::similarity::similarity;

pub const LEAGUE_THRESHOLD: f64 = 0.80;

const GROUP_WEIGHT: f64 = 0.15;
const CATEGORY_WEIGHT: f64 = 0.10;
const CLASS_MISMATCH_PENALTY: f64 = 0.30;

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\.\s*([\p{L}-]*liga)\b").unwrap());
static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bGr(?:uppe|p)?\.?\s*(\d{1,4})\b").unwrap());

/// A stored (league, group, category) triple, as found on memberships.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueCandidate {
    pub league: String,
    pub group_name: String,
    pub category: String,
}

/// Structured reading of a free-text league label such as
/// "Herren 40 2. Bezirksliga Gr. 042".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueLabel {
    pub class_number: Option<u32>,
    pub tier_word: Option<String>,
    pub group_number: Option<u32>,
    /// Label with the group designation removed.
    pub league_text: String,
}

pub fn parse_league_label(label: &str) -> LeagueLabel {
    let (class_number, tier_word) = CLASS_RE
        .captures(label)
        .map(|caps| {
            (
                caps.get(1).and_then(|m| m.as_str().parse().ok()),
                caps.get(2).map(|m| m.as_str().to_lowercase()),
            )
        })
        .unwrap_or((None, None));
    let group_number = GROUP_RE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let league_text = GROUP_RE.replace_all(label, "").trim().to_string();

    LeagueLabel {
        class_number,
        tier_word,
        group_number,
        league_text,
    }
}

pub fn match_league<'a>(
    label: &str,
    category: Option<&str>,
    candidates: &'a [LeagueCandidate],
) -> MatchOutcome<&'a LeagueCandidate> {
    let parsed = parse_league_label(label);
    let wanted_category = category.map(normalize_category);
    let ranked = rank(candidates, |candidate| {
        score_candidate(&parsed, wanted_category.as_deref(), candidate)
    });
    MatchOutcome::from_ranked(ranked, LEAGUE_THRESHOLD)
}

/// Blends text similarity with group and category agreement. A side that
/// carries no group number (or no category context) counts as neutral.
/// A different class number or tier word costs one fixed penalty.
fn score_candidate(parsed: &LeagueLabel, category: Option<&str>, candidate: &LeagueCandidate) -> f64 {
    let stored = parse_league_label(&format!("{} {}", candidate.league, candidate.group_name));
    let text = similarity(&parsed.league_text, &candidate.league);

    let group_agreement = match (parsed.group_number, stored.group_number) {
        (Some(a), Some(b)) => agreement(a == b),
        _ => text,
    };
    let category_agreement = match category {
        Some(wanted) => agreement(normalize_category(&candidate.category) == wanted),
        None => text,
    };

    let mut score = (1.0 - GROUP_WEIGHT - CATEGORY_WEIGHT) * text
        + GROUP_WEIGHT * group_agreement
        + CATEGORY_WEIGHT * category_agreement;
    let class_differs = matches!((parsed.class_number, stored.class_number), (Some(a), Some(b)) if a != b);
    let tier_differs = matches!((&parsed.tier_word, &stored.tier_word), (Some(a), Some(b)) if a != b);
    if class_differs || tier_differs {
        score -= CLASS_MISMATCH_PENALTY;
    }
    score.clamp(0.0, 1.0)
}

fn agreement(equal: bool) -> f64 {
    if equal {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchTier;

    fn candidate(league: &str, group: &str, category: &str) -> LeagueCandidate {
        LeagueCandidate {
            league: league.to_string(),
            group_name: group.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_parse_league_label() {
        let parsed = parse_league_label("Herren 40 2. Bezirksliga Gr. 042");
        assert_eq!(parsed.class_number, Some(2));
        assert_eq!(parsed.tier_word.as_deref(), Some("bezirksliga"));
        assert_eq!(parsed.group_number, Some(42));
        assert_eq!(parsed.league_text, "Herren 40 2. Bezirksliga");

        let bare = parse_league_label("Verbandsliga");
        assert_eq!(bare, LeagueLabel { league_text: "Verbandsliga".to_string(), ..Default::default() });
    }

    #[test]
    fn test_group_number_disambiguates() {
        let candidates = vec![
            candidate("2. Bezirksliga", "Gr. 041", "Men 40"),
            candidate("2. Bezirksliga", "Gr. 042", "Men 40"),
            candidate("1. Bezirksliga", "Gr. 042", "Men 40"),
        ];
        let outcome = match_league("2. Bezirksliga Gr. 42", Some("Herren 40"), &candidates);
        assert!(outcome.tier.is_match());
        assert_eq!(outcome.matched, Some(&candidates[1]));
    }

    #[test]
    fn test_category_bonus_prefers_matching_category() {
        let candidates = vec![
            candidate("Kreisliga", "Gr. 7", "Women"),
            candidate("Kreisliga", "Gr. 7", "Men 50"),
        ];
        let outcome = match_league("Kreisliga Gr. 7", Some("Herren 50"), &candidates);
        assert_eq!(outcome.matched, Some(&candidates[1]));
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn test_tier_word_must_agree() {
        let candidates = vec![candidate("2. Bezirksliga", "Gr. 042", "Men 40")];
        let outcome = match_league("2. Kreisliga Gr. 042", Some("Herren 40"), &candidates);
        assert!(outcome.score < LEAGUE_THRESHOLD, "{}", outcome.score);
        assert!(outcome.matched.is_none());

        let candidates = vec![
            candidate("2. Bezirksliga", "Gr. 042", "Men 40"),
            candidate("2. Kreisliga", "Gr. 042", "Men 40"),
        ];
        let outcome = match_league("2. Kreisliga Gr. 042", Some("Herren 40"), &candidates);
        assert_eq!(outcome.matched, Some(&candidates[1]));
        assert!(outcome.alternatives.iter().all(|alt| alt.score < LEAGUE_THRESHOLD));
    }

    #[test]
    fn test_unrelated_league_is_none() {
        let candidates = vec![candidate("Regionalliga", "Gr. 1", "Men")];
        let outcome = match_league("3. Kreisklasse Gr. 9", None, &candidates);
        assert_eq!(outcome.tier, MatchTier::None);
        assert_eq!(outcome.alternatives.len(), 1);
    }
}
