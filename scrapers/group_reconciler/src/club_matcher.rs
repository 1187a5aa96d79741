use tracing::debug;

use crate::matching::{rank, MatchOutcome, Scored, MAX_ALTERNATIVES};
use crate::normalize::normalize;
use crate::similarity::similarity;
use crate::types::{CanonicalClub, ClubAlias};

pub const CLUB_THRESHOLD: f64 = 0.92;
const CITY_BONUS: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClubContext<'a> {
    pub city: Option<&'a str>,
    pub aliases: &'a [ClubAlias],
}

pub fn match_club<'a>(
    label: &str,
    candidates: &'a [CanonicalClub],
    context: &ClubContext<'_>,
) -> MatchOutcome<&'a CanonicalClub> {
    match_club_with_threshold(label, candidates, context, CLUB_THRESHOLD)
}

/// Alias lookup, then case-insensitive name equality, then fuzzy scoring of
/// every candidate (with a small bonus when the context city matches).
pub fn match_club_with_threshold<'a>(
    label: &str,
    candidates: &'a [CanonicalClub],
    context: &ClubContext<'_>,
    threshold: f64,
) -> MatchOutcome<&'a CanonicalClub> {
    let ranked = rank(candidates, |club| score_club(label, club, context.city));

    let normalized_label = normalize(label);
    let alias_hit = context
        .aliases
        .iter()
        .find(|alias| normalize(&alias.alias) == normalized_label)
        .and_then(|alias| candidates.iter().find(|club| club.id == alias.club_id));
    if let Some(club) = alias_hit {
        debug!("Club '{}' resolved by alias to {} ({})", label, club.name, club.id);
        return MatchOutcome::exact(club, alternatives_excluding(&ranked, club));
    }

    let folded_label = fold_case(label);
    if let Some(club) = candidates.iter().find(|club| fold_case(&club.name) == folded_label) {
        return MatchOutcome::exact(club, alternatives_excluding(&ranked, club));
    }

    let outcome = MatchOutcome::from_ranked(ranked, threshold);
    if let Some(club) = outcome.matched {
        debug!(
            "Club '{}' fuzzy matched to {} ({}) at {:.3}",
            label, club.name, club.id, outcome.score
        );
    }
    outcome
}

fn score_club(label: &str, club: &CanonicalClub, city: Option<&str>) -> f64 {
    let mut score = similarity(label, &club.name);
    let city_matches = match (city, club.city.as_deref()) {
        (Some(wanted), Some(actual)) => wanted.trim().eq_ignore_ascii_case(actual.trim()),
        _ => false,
    };
    if city_matches {
        score += CITY_BONUS;
    }
    score.min(1.0)
}

fn fold_case(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn alternatives_excluding<'a>(
    ranked: &[Scored<&'a CanonicalClub>],
    chosen: &CanonicalClub,
) -> Vec<Scored<&'a CanonicalClub>> {
    ranked
        .iter()
        .filter(|s| s.entity.id != chosen.id)
        .take(MAX_ALTERNATIVES)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchTier;
    use crate::similarity::similarity;
    use crate::types::ClubId;

    fn club(id: i64, name: &str, city: Option<&str>) -> CanonicalClub {
        CanonicalClub {
            id: ClubId(id),
            name: name.to_string(),
            normalized_name: normalize(name),
            city: city.map(String::from),
            is_verified: true,
        }
    }

    fn clubs() -> Vec<CanonicalClub> {
        vec![
            club(1, "TC Musterstadt", Some("Musterstadt")),
            club(2, "TC Blau-Weiß Musterstadt", Some("Musterstadt")),
            club(3, "SV Rot-Weiß Köln", Some("Köln")),
            club(4, "TuS Oberdorf", None),
            club(5, "TV Unterdorf", None),
            club(6, "Tennisclub Grün-Gold Bergheim", Some("Bergheim")),
        ]
    }

    #[test]
    fn test_exact_case_insensitive() {
        let clubs = clubs();
        let outcome = match_club("tc  MUSTERSTADT", &clubs, &ClubContext::default());
        assert_eq!(outcome.tier, MatchTier::Exact);
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.matched.map(|c| c.id), Some(ClubId(1)));
        assert!(outcome.alternatives.iter().all(|a| a.entity.id != ClubId(1)));
    }

    #[test]
    fn test_alias_lookup() {
        let clubs = clubs();
        let aliases = vec![ClubAlias {
            alias: "GG Bergheim".to_string(),
            club_id: ClubId(6),
        }];
        let context = ClubContext { city: None, aliases: &aliases };
        let outcome = match_club("gg bergheim", &clubs, &context);
        assert_eq!(outcome.tier, MatchTier::Exact);
        assert_eq!(outcome.matched.map(|c| c.id), Some(ClubId(6)));
    }

    #[test]
    fn test_fuzzy_umlaut_spelling_is_auto() {
        let clubs = clubs();
        let outcome = match_club("SV Rot-Weiss Koeln", &clubs, &ClubContext::default());
        assert_eq!(outcome.tier, MatchTier::Auto);
        assert_eq!(outcome.matched.map(|c| c.id), Some(ClubId(3)));
    }

    #[test]
    fn test_unknown_club_is_none_with_alternatives() {
        let clubs = clubs();
        let outcome = match_club("TC Irgendwo", &clubs, &ClubContext::default());
        assert_eq!(outcome.tier, MatchTier::None);
        assert!(outcome.matched.is_none());
        assert_eq!(outcome.alternatives.len(), MAX_ALTERNATIVES);
    }

    #[test]
    fn test_city_bonus() {
        let clubs = clubs();
        let label = "TC Musterstadt e.V.";
        let without = match_club_with_threshold(label, &clubs, &ClubContext::default(), 2.0);
        let context = ClubContext { city: Some("musterstadt"), aliases: &[] };
        let with = match_club_with_threshold(label, &clubs, &context, 2.0);
        assert_eq!(without.alternatives[0].entity.id, ClubId(1));
        assert_eq!(with.alternatives[0].entity.id, ClubId(1));
        assert!((with.score - without.score - CITY_BONUS).abs() < 1e-9);

        let context = ClubContext { city: Some("Köln"), aliases: &[] };
        let capped = match_club_with_threshold("SV Rot-Weiss Koeln", &clubs, &context, 0.92);
        assert_eq!(capped.score, 1.0);
    }

    #[test]
    fn test_ranking_follows_similarity() {
        let clubs = clubs();
        let label = "TC Blau Weiss Muster";
        let outcome = match_club_with_threshold(label, &clubs, &ClubContext::default(), 2.0);
        let scores: Vec<f64> = outcome.alternatives.iter().map(|a| a.score).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        for window in outcome.alternatives.windows(2) {
            let (b, c) = (window[0].entity, window[1].entity);
            assert!(similarity(label, &b.name) >= similarity(label, &c.name));
        }
    }
}
