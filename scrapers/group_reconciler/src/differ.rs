use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::club_matcher::{match_club, ClubContext};
use crate::error::{IssueKind, StoreError};
use crate::matching::{MatchTier, Scored, AUTO_THRESHOLD};
use crate::normalize::{extract_team_suffix, normalize, normalize_suffix};
use crate::similarity::similarity;
use crate::snapshot::{ExternalSnapshot, FixtureLabel, TeamLabel};
use crate::store::Store;
use crate::team_matcher::{match_team, TeamMatch, TeamQuery, TeamSource};
use crate::types::{
    CanonicalClub, CanonicalTeam, ClubAlias, ClubId, CompetitionGroup, Fixture, FixtureId, FixturePatch,
    FixtureStatus, TeamId, TeamSeasonMembership,
};

/// Everything stored locally that a group diff compares against.
#[derive(Debug, Clone, Default)]
pub struct LocalState {
    pub clubs: Vec<CanonicalClub>,
    pub aliases: Vec<ClubAlias>,
    /// Every team of every known club.
    pub club_teams: Vec<CanonicalTeam>,
    /// Memberships of the group, inactive ones included.
    pub memberships: Vec<TeamSeasonMembership>,
    pub fixtures: Vec<Fixture>,
    pub fixtures_with_results: HashSet<FixtureId>,
}

impl LocalState {
    pub async fn load(store: &dyn Store, group: &CompetitionGroup) -> Result<Self, StoreError> {
        let (clubs, aliases, memberships, fixtures) = futures::try_join!(
            store.clubs(),
            store.club_aliases(),
            store.memberships(group),
            store.fixtures(group),
        )?;
        let club_ids: Vec<ClubId> = clubs.iter().map(|c| c.id).collect();
        let fixture_ids: Vec<FixtureId> = fixtures.iter().map(|f| f.id).collect();
        let (club_teams, fixtures_with_results) = futures::try_join!(
            store.teams_by_clubs(&club_ids),
            store.fixture_ids_with_results(&fixture_ids),
        )?;
        Ok(Self {
            clubs,
            aliases,
            club_teams,
            memberships,
            fixtures,
            fixtures_with_results,
        })
    }

    /// Teams with an active membership in the group.
    pub fn group_teams(&self) -> Vec<CanonicalTeam> {
        active_group_teams(&self.memberships, &self.club_teams)
    }
}

pub fn active_group_teams(memberships: &[TeamSeasonMembership], teams: &[CanonicalTeam]) -> Vec<CanonicalTeam> {
    let active: HashSet<TeamId> = memberships.iter().filter(|m| m.is_active).map(|m| m.team_id).collect();
    teams.iter().filter(|t| active.contains(&t.id)).cloned().collect()
}

/// Club names implied by the snapshot's team labels, first spelling wins.
pub fn distinct_clubs(snapshot: &ExternalSnapshot) -> Vec<&str> {
    let mut seen = HashSet::new();
    snapshot
        .teams
        .iter()
        .filter(|team| seen.insert(normalize(&team.club_name)))
        .map(|team| team.club_name.as_str())
        .collect()
}

pub fn team_query<'a>(
    label: &'a TeamLabel,
    club: &'a CanonicalClub,
    group: &'a CompetitionGroup,
) -> TeamQuery<'a> {
    TeamQuery {
        label: &label.label,
        suffix_hint: label.team_suffix.as_deref(),
        club_id: club.id,
        club_name: &club.name,
        label_club_name: &label.club_name,
        group,
    }
}

struct IndexedLabel {
    key: String,
    label: String,
    suffix: String,
    team_id: Option<TeamId>,
}

/// Maps scraped team labels to local team ids so fixture labels can be
/// resolved. Lookups are by normalized label, falling back to a close
/// spelling with the same ordinal.
#[derive(Default)]
pub struct TeamLabelIndex {
    entries: Vec<IndexedLabel>,
}

impl TeamLabelIndex {
    pub fn insert(&mut self, label: &str, team_id: Option<TeamId>) {
        self.entries.push(IndexedLabel {
            key: normalize(label),
            label: label.to_string(),
            suffix: normalize_suffix(extract_team_suffix(label).as_deref()),
            team_id,
        });
    }

    /// Distinct resolved team ids, in label order.
    pub fn team_ids(&self) -> Vec<TeamId> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter_map(|e| e.team_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn resolve(&self, label: &str) -> Option<TeamId> {
        let key = normalize(label);
        if let Some(entry) = self.entries.iter().find(|e| e.key == key) {
            return entry.team_id;
        }
        let suffix = normalize_suffix(extract_team_suffix(label).as_deref());
        self.entries
            .iter()
            .filter(|e| e.suffix == suffix)
            .map(|e| (e, similarity(label, &e.label)))
            .filter(|(_, score)| *score >= AUTO_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .and_then(|(e, _)| e.team_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixtureResolution<'a> {
    Found(&'a Fixture),
    NotFound,
    /// More than one fixture on the label's date and nothing else to go by.
    Ambiguous(usize),
}

/// Finds the stored fixture a label describes: by match number, then by
/// date and both teams, then by date alone when exactly one fixture of the
/// group is stored on that day. Fixtures carrying a different match number
/// and fixtures in `claimed` (already taken by another label of the same
/// snapshot) are never picked by the fallbacks.
pub fn resolve_fixture<'a>(
    label: &FixtureLabel,
    home: Option<TeamId>,
    away: Option<TeamId>,
    fixtures: &'a [Fixture],
    claimed: &HashSet<FixtureId>,
) -> FixtureResolution<'a> {
    if let Some(number) = &label.match_number {
        if let Some(fixture) = fixtures.iter().find(|f| f.match_number.as_deref() == Some(number.as_str())) {
            return FixtureResolution::Found(fixture);
        }
    }
    let Some(date) = label.date else {
        return FixtureResolution::NotFound;
    };

    let same_day: Vec<&Fixture> = fixtures.iter().filter(|f| f.match_date == date).collect();
    let candidates: Vec<&Fixture> = same_day
        .iter()
        .copied()
        .filter(|f| !claimed.contains(&f.id))
        .filter(|f| match (&label.match_number, &f.match_number) {
            (Some(wanted), Some(stored)) => wanted == stored,
            _ => true,
        })
        .collect();

    if let (Some(home), Some(away)) = (home, away) {
        if let Some(fixture) = candidates
            .iter()
            .find(|f| f.home_team_id == home && f.away_team_id == away)
        {
            return FixtureResolution::Found(*fixture);
        }
    }

    match (same_day.len(), candidates.as_slice()) {
        (_, []) => FixtureResolution::NotFound,
        (1, [only]) => FixtureResolution::Found(*only),
        (count, _) => FixtureResolution::Ambiguous(count),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffField {
    Name,
    TeamSuffix,
    Date,
    StartTime,
    MatchNumber,
    HomeTeam,
    AwayTeam,
    Status,
    Score,
    Results,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub field: DiffField,
    pub local: Option<String>,
    pub external: Option<String>,
}

impl FieldDiff {
    fn new(field: DiffField, local: Option<impl ToString>, external: Option<impl ToString>) -> Self {
        Self {
            field,
            local: local.map(|v| v.to_string()),
            external: external.map(|v| v.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureComparison {
    pub patch: FixturePatch,
    pub fields: Vec<FieldDiff>,
}

/// Fields where the label disagrees with the stored fixture. Only fields
/// the label actually carries are compared.
pub fn compare_fixture(
    label: &FixtureLabel,
    home: Option<TeamId>,
    away: Option<TeamId>,
    fixture: &Fixture,
    has_results: bool,
) -> FixtureComparison {
    let mut out = FixtureComparison::default();

    if let Some(date) = label.date.filter(|d| *d != fixture.match_date) {
        out.patch.match_date = Some(date);
        out.fields.push(FieldDiff::new(DiffField::Date, Some(fixture.match_date), Some(date)));
    }
    if let Some(time) = label.start_time.filter(|t| Some(*t) != fixture.start_time) {
        out.patch.start_time = Some(time);
        out.fields.push(FieldDiff::new(DiffField::StartTime, fixture.start_time, Some(time)));
    }
    if let Some(number) = label
        .match_number
        .as_ref()
        .filter(|n| fixture.match_number.as_ref() != Some(*n))
    {
        out.patch.match_number = Some(number.clone());
        out.fields.push(FieldDiff::new(
            DiffField::MatchNumber,
            fixture.match_number.as_ref(),
            Some(number),
        ));
    }
    if let Some(id) = home.filter(|id| *id != fixture.home_team_id) {
        out.patch.home_team_id = Some(id);
        out.fields.push(FieldDiff::new(DiffField::HomeTeam, Some(fixture.home_team_id), Some(id)));
    }
    if let Some(id) = away.filter(|id| *id != fixture.away_team_id) {
        out.patch.away_team_id = Some(id);
        out.fields.push(FieldDiff::new(DiffField::AwayTeam, Some(fixture.away_team_id), Some(id)));
    }
    if let Some(status) = label.status.filter(|s| *s != fixture.status) {
        out.patch.status = Some(status);
        out.fields.push(FieldDiff::new(DiffField::Status, Some(fixture.status), Some(status)));
    }

    let home_differs = label.score_home_points.is_some() && label.score_home_points != fixture.home_score;
    let away_differs = label.score_away_points.is_some() && label.score_away_points != fixture.away_score;
    if home_differs || away_differs {
        out.patch.home_score = label.score_home_points.filter(|_| home_differs);
        out.patch.away_score = label.score_away_points.filter(|_| away_differs);
        out.fields.push(FieldDiff::new(
            DiffField::Score,
            Some(score_text(fixture.home_score, fixture.away_score)),
            Some(score_text(label.score_home_points, label.score_away_points)),
        ));
    }

    let status = label.status.unwrap_or(fixture.status);
    if status == FixtureStatus::Completed && !has_results {
        out.fields.push(FieldDiff::new(
            DiffField::Results,
            Some("none imported"),
            label.result_report_id.as_ref(),
        ));
    }

    out
}

fn score_text(home: Option<i32>, away: Option<i32>) -> String {
    let side = |s: Option<i32>| s.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!("{}:{}", side(home), side(away))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    CreateClub,
    CreateTeam,
    AddTeamSeason,
    CreateMatchday,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub id: i64,
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingItem {
    pub label: String,
    pub action: DiffAction,
    pub reason: IssueKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchItem {
    pub label: String,
    pub local_id: i64,
    pub fields: Vec<FieldDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDiff {
    pub total: usize,
    pub matched_count: usize,
    pub missing_items: Vec<MissingItem>,
    pub mismatch_items: Vec<MismatchItem>,
}

/// A team linked to the group whose stored category disagrees with the
/// group's category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFix {
    pub label: String,
    pub wrong_team_id: TeamId,
    pub wrong_category: String,
    pub expected_category: String,
    /// Correctly categorized sibling under the same club, if one exists.
    pub correct_team_id: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiff {
    pub group: CompetitionGroup,
    pub clubs: EntityDiff,
    pub teams: EntityDiff,
    pub fixtures: EntityDiff,
    pub fix_actions: Vec<CategoryFix>,
    pub overall_percent: f64,
}

/// Compares one scraped snapshot of a group against the locally stored
/// records. Pure: all local data comes in through `local`.
pub fn diff(group: &CompetitionGroup, snapshot: &ExternalSnapshot, local: &LocalState) -> GroupDiff {
    let context = ClubContext {
        city: None,
        aliases: &local.aliases,
    };

    let mut clubs = EntityDiff::default();
    let mut resolved_clubs: HashMap<String, &CanonicalClub> = HashMap::new();
    for club_name in distinct_clubs(snapshot) {
        clubs.total += 1;
        let outcome = match_club(club_name, &local.clubs, &context);
        match (outcome.matched, outcome.tier) {
            (Some(club), MatchTier::Exact | MatchTier::Auto) => {
                clubs.matched_count += 1;
                resolved_clubs.insert(normalize(club_name), club);
            }
            (Some(club), _) => {
                clubs.mismatch_items.push(MismatchItem {
                    label: club_name.to_string(),
                    local_id: club.id.0,
                    fields: vec![FieldDiff::new(DiffField::Name, Some(&club.name), Some(club_name))],
                });
                resolved_clubs.insert(normalize(club_name), club);
            }
            (None, _) => clubs.missing_items.push(MissingItem {
                label: club_name.to_string(),
                action: DiffAction::CreateClub,
                reason: IssueKind::NotFound,
                alternatives: club_alternatives(&outcome.alternatives),
            }),
        }
    }

    let group_teams = local.group_teams();
    let mut teams = EntityDiff::default();
    let mut fix_actions = Vec::new();
    let mut index = TeamLabelIndex::default();
    for label in &snapshot.teams {
        teams.total += 1;
        let Some(club) = resolved_clubs.get(&normalize(&label.club_name)).copied() else {
            teams.missing_items.push(MissingItem {
                label: label.label.clone(),
                action: DiffAction::CreateTeam,
                reason: IssueKind::NotFound,
                alternatives: Vec::new(),
            });
            index.insert(&label.label, None);
            continue;
        };

        let query = team_query(label, club, group);
        let TeamMatch {
            outcome,
            source,
            category_conflict,
        } = match_team(&query, &group_teams, &local.club_teams);

        if let Some(wrong) = category_conflict {
            debug!("Category conflict for '{}': team {} is '{}'", label.label, wrong.id, wrong.category);
            fix_actions.push(CategoryFix {
                label: label.label.clone(),
                wrong_team_id: wrong.id,
                wrong_category: wrong.category.clone(),
                expected_category: group.category.clone(),
                correct_team_id: outcome.matched.map(|t| t.id),
            });
            index.insert(&label.label, Some(outcome.matched.map_or(wrong.id, |t| t.id)));
            continue;
        }

        match (outcome.matched, source) {
            (Some(team), Some(TeamSource::Group)) => {
                if outcome.tier == MatchTier::Fuzzy {
                    teams.mismatch_items.push(MismatchItem {
                        label: label.label.clone(),
                        local_id: team.id.0,
                        fields: vec![FieldDiff::new(
                            DiffField::TeamSuffix,
                            Some(normalize_suffix(team.team_suffix.as_deref())),
                            Some(query.wanted_suffix()),
                        )],
                    });
                } else {
                    teams.matched_count += 1;
                }
                index.insert(&label.label, Some(team.id));
            }
            (Some(team), _) => {
                teams.missing_items.push(MissingItem {
                    label: label.label.clone(),
                    action: DiffAction::AddTeamSeason,
                    reason: IssueKind::NotFound,
                    alternatives: vec![Alternative {
                        id: team.id.0,
                        label: format!("{} {}", team.category, normalize_suffix(team.team_suffix.as_deref())),
                        score: outcome.score,
                    }],
                });
                index.insert(&label.label, Some(team.id));
            }
            (None, _) => {
                teams.missing_items.push(MissingItem {
                    label: label.label.clone(),
                    action: DiffAction::CreateTeam,
                    reason: IssueKind::NotFound,
                    alternatives: team_alternatives(&outcome.alternatives),
                });
                index.insert(&label.label, None);
            }
        }
    }

    let mut fixtures = EntityDiff::default();
    let mut claimed = HashSet::new();
    for label in &snapshot.fixtures {
        fixtures.total += 1;
        let home = index.resolve(&label.home_label);
        let away = index.resolve(&label.away_label);
        let missing = |reason| MissingItem {
            label: label.describe(),
            action: DiffAction::CreateMatchday,
            reason,
            alternatives: Vec::new(),
        };
        match resolve_fixture(label, home, away, &local.fixtures, &claimed) {
            FixtureResolution::Found(fixture) => {
                claimed.insert(fixture.id);
                let has_results = local.fixtures_with_results.contains(&fixture.id);
                let comparison = compare_fixture(label, home, away, fixture, has_results);
                if comparison.fields.is_empty() {
                    fixtures.matched_count += 1;
                } else {
                    fixtures.mismatch_items.push(MismatchItem {
                        label: label.describe(),
                        local_id: fixture.id.0,
                        fields: comparison.fields,
                    });
                }
            }
            FixtureResolution::Ambiguous(count) => {
                debug!("{} candidates on {:?} for {}", count, label.date, label.describe());
                fixtures.missing_items.push(missing(IssueKind::AmbiguousMatch));
            }
            FixtureResolution::NotFound if label.date.is_none() => {
                fixtures.missing_items.push(missing(IssueKind::IncompleteLabel));
            }
            FixtureResolution::NotFound => fixtures.missing_items.push(missing(IssueKind::NotFound)),
        }
    }

    let matched = clubs.matched_count + teams.matched_count + fixtures.matched_count;
    let total = clubs.total + teams.total + fixtures.total;
    let overall_percent = if total == 0 {
        100.0
    } else {
        matched as f64 / total as f64 * 100.0
    };

    info!(
        "Diff for {}: clubs {}/{}, teams {}/{}, fixtures {}/{}, {} category fixes, {:.1}% in sync",
        group,
        clubs.matched_count,
        clubs.total,
        teams.matched_count,
        teams.total,
        fixtures.matched_count,
        fixtures.total,
        fix_actions.len(),
        overall_percent
    );

    GroupDiff {
        group: group.clone(),
        clubs,
        teams,
        fixtures,
        fix_actions,
        overall_percent,
    }
}

fn club_alternatives(alternatives: &[Scored<&CanonicalClub>]) -> Vec<Alternative> {
    alternatives
        .iter()
        .map(|a| Alternative {
            id: a.entity.id.0,
            label: a.entity.name.clone(),
            score: a.score,
        })
        .collect()
}

fn team_alternatives(alternatives: &[Scored<&CanonicalTeam>]) -> Vec<Alternative> {
    alternatives
        .iter()
        .map(|a| Alternative {
            id: a.entity.id.0,
            label: format!("{} {}", a.entity.category, normalize_suffix(a.entity.team_suffix.as_deref())),
            score: a.score,
        })
        .collect()
}
