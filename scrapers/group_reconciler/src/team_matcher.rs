use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::matching::{MatchOutcome, MatchTier, Scored, MAX_ALTERNATIVES};
use crate::normalize::{extract_team_suffix, normalize, normalize_category, normalize_suffix};
use crate::similarity::similarity;
use crate::types::{CanonicalTeam, ClubId, CompetitionGroup, TeamId};

pub const TEAM_THRESHOLD: f64 = 0.85;

const SUFFIX_AND_CATEGORY: f64 = 1.0;
const SUFFIX_ONLY: f64 = 0.95;
const FUZZY_CEILING: f64 = 0.90;
const FUZZY_TEXT_WEIGHT: f64 = 0.70;
const CATEGORY_BONUS: f64 = 0.15;
const CLUB_NAME_BONUS: f64 = 0.05;
const CLUB_NAME_HIGH: f64 = 0.92;

/// Everything the team matcher needs to know about one scraped team label.
/// The category always comes from `group`, never from the label text.
#[derive(Debug, Clone, Copy)]
pub struct TeamQuery<'a> {
    pub label: &'a str,
    pub suffix_hint: Option<&'a str>,
    pub club_id: ClubId,
    /// Canonical name of the resolved club.
    pub club_name: &'a str,
    /// Club name as scraped.
    pub label_club_name: &'a str,
    pub group: &'a CompetitionGroup,
}

impl TeamQuery<'_> {
    /// Canonical ordinal this label refers to.
    pub fn wanted_suffix(&self) -> String {
        let extracted = extract_team_suffix(self.label);
        let raw = self
            .suffix_hint
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or(extracted);
        normalize_suffix(raw.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSource {
    /// Already linked to the competition group.
    Group,
    /// Exists under the club but is not linked to the group.
    Club,
}

#[derive(Debug, Clone)]
pub struct TeamMatch<'a> {
    pub outcome: MatchOutcome<&'a CanonicalTeam>,
    pub source: Option<TeamSource>,
    /// A team linked to this group with the right ordinal but a stored
    /// category that disagrees with the group's category.
    pub category_conflict: Option<&'a CanonicalTeam>,
}

struct Candidate<'a> {
    team: &'a CanonicalTeam,
    source: TeamSource,
    score: f64,
    category_matches: bool,
}

/// Resolves a team label within an already resolved club.
///
/// Teams linked to the group are consulted first. Ranking is strict: same
/// ordinal and category (1.0, exact) beats same ordinal only (0.95) beats a
/// fuzzy descriptor comparison (at most 0.90). A team is only ever accepted
/// when its stored category equals the group's category.
pub fn match_team<'a>(
    query: &TeamQuery<'_>,
    group_teams: &'a [CanonicalTeam],
    club_teams: &'a [CanonicalTeam],
) -> TeamMatch<'a> {
    let wanted_suffix = query.wanted_suffix();
    let wanted_category = normalize_category(&query.group.category);
    let club_name_high = similarity(query.label_club_name, query.club_name) >= CLUB_NAME_HIGH;
    let label_text = strip_club_prefix(query.label, query.label_club_name);

    let score = |team: &'a CanonicalTeam, source: TeamSource| {
        let suffix = normalize_suffix(team.team_suffix.as_deref());
        let category_matches = normalize_category(&team.category) == wanted_category;
        let score = if suffix == wanted_suffix {
            if category_matches {
                SUFFIX_AND_CATEGORY
            } else {
                SUFFIX_ONLY
            }
        } else {
            fuzzy_score(&label_text, team, &suffix, &wanted_suffix, category_matches, club_name_high)
        };
        Candidate { team, source, score, category_matches }
    };

    let mut in_group: Vec<Candidate<'a>> = group_teams
        .iter()
        .filter(|team| team.club_id == query.club_id)
        .map(|team| score(team, TeamSource::Group))
        .collect();
    sort_candidates(&mut in_group);
    let group_ids: HashSet<TeamId> = in_group.iter().map(|c| c.team.id).collect();

    let mut on_club: Vec<Candidate<'a>> = club_teams
        .iter()
        .filter(|team| team.club_id == query.club_id && !group_ids.contains(&team.id))
        .map(|team| score(team, TeamSource::Club))
        .collect();
    sort_candidates(&mut on_club);

    let category_conflict = in_group
        .iter()
        .find(|c| c.score == SUFFIX_ONLY && !c.category_matches)
        .map(|c| c.team);

    let mut all: Vec<&Candidate<'a>> = in_group.iter().chain(on_club.iter()).collect();
    all.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let alternatives_without = |chosen: Option<TeamId>| -> Vec<Scored<&'a CanonicalTeam>> {
        all.iter()
            .filter(|c| Some(c.team.id) != chosen)
            .take(MAX_ALTERNATIVES)
            .map(|c| Scored { entity: c.team, score: c.score })
            .collect()
    };

    let accepted = in_group
        .iter()
        .chain(on_club.iter())
        .filter(|c| c.category_matches)
        .fold(None::<&Candidate<'a>>, |best, c| match best {
            Some(b) if b.score >= c.score => Some(b),
            _ => Some(c),
        });

    if let Some(best) = accepted {
        if best.score == SUFFIX_AND_CATEGORY {
            debug!(
                "Team '{}' resolved exactly to team {} via {:?}",
                query.label, best.team.id, best.source
            );
            return TeamMatch {
                outcome: MatchOutcome::exact(best.team, alternatives_without(Some(best.team.id))),
                source: Some(best.source),
                category_conflict,
            };
        }
    }

    if let Some(conflict) = category_conflict {
        debug!(
            "Team '{}' only found in group under category '{}' (team {}), expected '{}'",
            query.label, conflict.category, conflict.id, query.group.category
        );
        let best_score = all.first().map(|c| c.score).unwrap_or(0.0);
        return TeamMatch {
            outcome: MatchOutcome::unmatched(best_score, alternatives_without(None)),
            source: None,
            category_conflict,
        };
    }

    if let Some(best) = accepted {
        let tier = MatchTier::for_score(best.score, TEAM_THRESHOLD);
        if tier.is_match() {
            return TeamMatch {
                outcome: MatchOutcome {
                    matched: Some(best.team),
                    score: best.score,
                    tier,
                    alternatives: alternatives_without(Some(best.team.id)),
                },
                source: Some(best.source),
                category_conflict: None,
            };
        }
    }

    let best_score = all.first().map(|c| c.score).unwrap_or(0.0);
    TeamMatch {
        outcome: MatchOutcome::unmatched(best_score, alternatives_without(None)),
        source: None,
        category_conflict: None,
    }
}

fn sort_candidates(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Descriptor comparison used when the ordinals differ. Two different
/// numeric ordinals are different teams and stay well below threshold.
fn fuzzy_score(
    label_text: &str,
    team: &CanonicalTeam,
    team_suffix: &str,
    wanted_suffix: &str,
    category_matches: bool,
    club_name_high: bool,
) -> f64 {
    let descriptor = format!("{} {}", team.category, team_suffix);
    let mut score = FUZZY_TEXT_WEIGHT * similarity(label_text, &descriptor);
    let both_numeric = team_suffix.parse::<u32>().is_ok() && wanted_suffix.parse::<u32>().is_ok();
    if both_numeric {
        return score * 0.5;
    }
    if category_matches {
        score += CATEGORY_BONUS;
    }
    if club_name_high {
        score += CLUB_NAME_BONUS;
    }
    score.min(FUZZY_CEILING)
}

/// "TC Musterstadt Herren 40 2" with club "TC Musterstadt" -> "Herren 40 2".
fn strip_club_prefix(label: &str, club_name: &str) -> String {
    let normalized_label = normalize(label);
    let normalized_club = normalize(club_name);
    match normalized_label.strip_prefix(&normalized_club) {
        Some(rest) if !normalized_club.is_empty() => rest.trim().to_string(),
        _ => normalized_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(category: &str) -> CompetitionGroup {
        CompetitionGroup {
            category: category.to_string(),
            league: "2. Bezirksliga".to_string(),
            group_name: "Gr. 042".to_string(),
            season: "Sommer 2025".to_string(),
        }
    }

    fn team(id: i64, club: i64, suffix: Option<&str>, category: &str) -> CanonicalTeam {
        CanonicalTeam {
            id: TeamId(id),
            club_id: ClubId(club),
            team_suffix: suffix.map(String::from),
            category: category.to_string(),
        }
    }

    fn query<'a>(label: &'a str, group: &'a CompetitionGroup) -> TeamQuery<'a> {
        TeamQuery {
            label,
            suffix_hint: None,
            club_id: ClubId(1),
            club_name: "TC Musterstadt",
            label_club_name: "TC Musterstadt",
            group,
        }
    }

    #[test]
    fn test_suffix_and_category_beats_suffix_only() {
        let g = group("Men 40");
        let club_teams = vec![
            team(20, 1, Some("3"), "Men 50"),
            team(21, 1, Some("3"), "Men 40"),
            team(22, 1, Some("2"), "Men 40"),
        ];
        let result = match_team(&query("Herren 40 3", &g), &[], &club_teams);
        assert_eq!(result.outcome.tier, MatchTier::Exact);
        assert_eq!(result.outcome.score, 1.0);
        let matched = result.outcome.matched.unwrap();
        assert_eq!(matched.team_suffix.as_deref(), Some("3"));
        assert_eq!(matched.category, "Men 40");
        assert_eq!(result.source, Some(TeamSource::Club));
        assert!(result.category_conflict.is_none());
        assert_eq!(result.outcome.alternatives[0].entity.id, TeamId(20));
        assert_eq!(result.outcome.alternatives[0].score, SUFFIX_ONLY);
    }

    #[test]
    fn test_group_teams_take_precedence() {
        let g = group("Men 40");
        let group_teams = vec![team(21, 1, Some("3"), "Men 40")];
        let club_teams = vec![team(21, 1, Some("3"), "Men 40"), team(23, 1, Some("3"), "Herren 40")];
        let result = match_team(&query("TC Musterstadt 3", &g), &group_teams, &club_teams);
        assert_eq!(result.source, Some(TeamSource::Group));
        assert_eq!(result.outcome.matched.map(|t| t.id), Some(TeamId(21)));
    }

    #[test]
    fn test_wrong_category_in_group_is_a_conflict() {
        let g = group("Men 40");
        let wrong = team(30, 1, Some("1"), "Men 50");
        let group_teams = vec![wrong.clone()];
        let club_teams = vec![wrong];
        let result = match_team(&query("TC Musterstadt", &g), &group_teams, &club_teams);
        assert!(result.outcome.matched.is_none());
        assert_eq!(result.outcome.tier, MatchTier::None);
        assert_eq!(result.category_conflict.map(|t| t.id), Some(TeamId(30)));
    }

    #[test]
    fn test_conflict_with_correct_sibling_on_club() {
        let g = group("Men 40");
        let group_teams = vec![team(30, 1, Some("1"), "Men 50")];
        let club_teams = vec![team(30, 1, Some("1"), "Men 50"), team(31, 1, None, "Men 40")];
        let result = match_team(&query("TC Musterstadt 1", &g), &group_teams, &club_teams);
        assert_eq!(result.outcome.tier, MatchTier::Exact);
        assert_eq!(result.outcome.matched.map(|t| t.id), Some(TeamId(31)));
        assert_eq!(result.source, Some(TeamSource::Club));
        assert_eq!(result.category_conflict.map(|t| t.id), Some(TeamId(30)));
    }

    #[test]
    fn test_suffix_only_is_never_accepted() {
        let g = group("Men 40");
        let club_teams = vec![team(40, 1, Some("2"), "Men 50")];
        let result = match_team(&query("TC Musterstadt 2", &g), &[], &club_teams);
        assert!(result.outcome.matched.is_none());
        assert!(result.category_conflict.is_none());
        assert_eq!(result.outcome.alternatives.len(), 1);
    }

    #[test]
    fn test_different_ordinal_does_not_fuzzy_match() {
        let g = group("Men 40");
        let club_teams = vec![team(50, 1, Some("2"), "Men 40")];
        let result = match_team(&query("Herren 40 3", &g), &[], &club_teams);
        assert!(result.outcome.matched.is_none());
        assert!(result.outcome.score < TEAM_THRESHOLD);
    }

    #[test]
    fn test_non_numeric_suffix_fuzzy_match() {
        let g = group("Men 40");
        let club_teams = vec![team(60, 1, Some("A"), "Men 40")];
        let mut q = query("TC Musterstadt Men 40 A", &g);
        q.suffix_hint = Some("A-Team");
        let result = match_team(&q, &[], &club_teams);
        assert_eq!(result.outcome.tier, MatchTier::Fuzzy);
        assert_eq!(result.outcome.matched.map(|t| t.id), Some(TeamId(60)));
        assert!(result.outcome.score <= FUZZY_CEILING);
    }

    #[test]
    fn test_other_clubs_are_ignored() {
        let g = group("Men 40");
        let club_teams = vec![team(70, 2, Some("3"), "Men 40")];
        let result = match_team(&query("Herren 40 3", &g), &[], &club_teams);
        assert!(result.outcome.matched.is_none());
        assert!(result.outcome.alternatives.is_empty());
    }

    #[test]
    fn test_sort_candidates_orders_best_first() {
        let teams = vec![
            team(1, 1, None, "Men"),
            team(2, 1, None, "Men"),
            team(3, 1, None, "Men"),
            team(4, 1, None, "Men"),
        ];
        let scores = [0.2, 0.9, 0.5, 0.9];
        let mut candidates: Vec<Candidate<'_>> = teams
            .iter()
            .zip(scores)
            .map(|(team, score)| Candidate { team, source: TeamSource::Club, score, category_matches: true })
            .collect();
        sort_candidates(&mut candidates);
        let ids: Vec<i64> = candidates.iter().map(|c| c.team.id.0).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }
}
