use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

use crate::club_matcher::{match_club, ClubContext};
use crate::differ::{
    active_group_teams, compare_fixture, distinct_clubs, resolve_fixture, team_query, FixtureResolution,
    TeamLabelIndex,
};
use crate::error::{IssueKind, ReconcileIssue, StoreError};
use crate::normalize::{normalize, normalize_category, normalize_suffix};
use crate::results::{ResultImportRequest, ResultImporter};
use crate::snapshot::{ExternalSnapshot, FixtureLabel, TeamLabel};
use crate::store::Store;
use crate::team_matcher::match_team;
use crate::types::{
    CanonicalClub, CanonicalTeam, ClubId, CompetitionGroup, Fixture, FixtureId, FixturePatch, FixtureStatus,
    NewClub, NewFixture, NewMembership, NewTeam, TeamId, TeamSeasonMembership,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRepair {
    pub wrong_team_id: TeamId,
    pub correct_team_id: TeamId,
    pub label: String,
    pub fixtures_rewritten: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub clubs_created: usize,
    pub teams_created: usize,
    pub team_seasons_created: usize,
    pub team_seasons_reactivated: usize,
    pub fixtures_created: usize,
    pub fixtures_updated: usize,
    pub results_imported: u32,
    pub repairs: Vec<CategoryRepair>,
    pub errors: Vec<ReconcileIssue>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn issue(&mut self, kind: IssueKind, context: impl Into<String>, message: impl Into<String>) {
        let issue = ReconcileIssue::new(kind, context, message);
        warn!("{}: {} ({})", issue.kind, issue.message, issue.context);
        self.errors.push(issue);
    }
}

/// Brings the store in line with one scraped group snapshot.
///
/// Runs five phases in order (clubs, teams, memberships, fixtures, results).
/// Every phase re-reads what it needs from the store, so an interrupted run
/// can simply be repeated. A store failure aborts the remaining phases and
/// is reported as an `UpstreamUnavailable` issue.
pub struct Reconciler<'a> {
    store: &'a dyn Store,
    importer: Option<&'a dyn ResultImporter>,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store, importer: None }
    }

    pub fn with_importer(mut self, importer: &'a dyn ResultImporter) -> Self {
        self.importer = Some(importer);
        self
    }

    pub async fn reconcile(&self, group: &CompetitionGroup, snapshot: &ExternalSnapshot) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        info!(
            "Reconciling {} with {} team labels and {} fixture labels",
            group,
            snapshot.teams.len(),
            snapshot.fixtures.len()
        );

        if let Err(err) = self.run(group, snapshot, &mut report).await {
            error!("Reconcile of {} aborted: {}", group, err);
            report
                .errors
                .push(ReconcileIssue::new(IssueKind::UpstreamUnavailable, group.to_string(), err.to_string()));
        }

        info!(
            "Reconciled {}: {} clubs, {} teams, {} memberships (+{} reactivated), {} fixtures created, \
             {} fixtures updated, {} rubbers imported, {} repairs, {} issues",
            group,
            report.clubs_created,
            report.teams_created,
            report.team_seasons_created,
            report.team_seasons_reactivated,
            report.fixtures_created,
            report.fixtures_updated,
            report.results_imported,
            report.repairs.len(),
            report.errors.len()
        );
        report
    }

    async fn run(
        &self,
        group: &CompetitionGroup,
        snapshot: &ExternalSnapshot,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let clubs = self.ensure_clubs(snapshot, report).await?;
        info!("Clubs phase: {} resolved, {} created", clubs.len(), report.clubs_created);

        let index = self.ensure_teams(group, snapshot, &clubs, report).await?;
        info!(
            "Teams phase: {} created, {} category repairs",
            report.teams_created,
            report.repairs.len()
        );

        self.ensure_memberships(group, &index, report).await?;
        info!(
            "Memberships phase: {} created, {} reactivated",
            report.team_seasons_created, report.team_seasons_reactivated
        );

        self.upsert_fixtures(group, snapshot, &index, report).await?;
        info!(
            "Fixtures phase: {} created, {} updated",
            report.fixtures_created, report.fixtures_updated
        );

        self.import_results(group, snapshot, &index, report).await?;
        info!("Results phase: {} rubbers imported", report.results_imported);
        Ok(())
    }

    /// Phase 1: every club named by a team label, keyed by normalized name.
    async fn ensure_clubs(
        &self,
        snapshot: &ExternalSnapshot,
        report: &mut ReconcileReport,
    ) -> Result<HashMap<String, CanonicalClub>, StoreError> {
        let (mut clubs, aliases) = futures::try_join!(self.store.clubs(), self.store.club_aliases())?;
        let mut resolved = HashMap::new();

        for club_name in distinct_clubs(snapshot) {
            let context = ClubContext {
                city: None,
                aliases: &aliases,
            };
            let matched = match_club(club_name, &clubs, &context).matched.cloned();
            let club = match matched {
                Some(club) => club,
                None => match self.create_club(club_name, &mut clubs, report).await? {
                    Some(club) => club,
                    None => {
                        report.issue(
                            IssueKind::ConstraintRace,
                            club_name,
                            "club row not visible after a concurrent insert",
                        );
                        continue;
                    }
                },
            };
            resolved.insert(normalize(club_name), club);
        }
        Ok(resolved)
    }

    async fn create_club(
        &self,
        name: &str,
        clubs: &mut Vec<CanonicalClub>,
        report: &mut ReconcileReport,
    ) -> Result<Option<CanonicalClub>, StoreError> {
        let normalized_name = normalize(name);
        let new_club = NewClub {
            name: name.trim().to_string(),
            normalized_name: normalized_name.clone(),
            city: None,
        };
        match self.store.insert_club(new_club).await {
            Ok(club) => {
                info!("Created club '{}' ({})", club.name, club.id);
                report.clubs_created += 1;
                clubs.push(club.clone());
                Ok(Some(club))
            }
            Err(StoreError::UniqueViolation { constraint }) => {
                warn!("Club '{}' was inserted concurrently ({}), re-reading", name, constraint);
                *clubs = self.store.clubs().await?;
                Ok(clubs.iter().find(|c| c.normalized_name == normalized_name).cloned())
            }
            Err(err) => Err(err),
        }
    }

    /// Phase 2: resolves every team label to a team of the right category,
    /// creating teams and repairing wrong-category links as needed.
    async fn ensure_teams(
        &self,
        group: &CompetitionGroup,
        snapshot: &ExternalSnapshot,
        clubs: &HashMap<String, CanonicalClub>,
        report: &mut ReconcileReport,
    ) -> Result<TeamLabelIndex, StoreError> {
        let club_ids: Vec<ClubId> = clubs.values().map(|c| c.id).collect::<HashSet<_>>().into_iter().collect();
        let (mut club_teams, mut memberships) =
            futures::try_join!(self.store.teams_by_clubs(&club_ids), self.store.memberships(group))?;
        let mut index = TeamLabelIndex::default();

        for label in &snapshot.teams {
            let Some(club) = clubs.get(&normalize(&label.club_name)) else {
                index.insert(&label.label, None);
                continue;
            };

            let group_teams = active_group_teams(&memberships, &club_teams);
            let query = team_query(label, club, group);
            let wanted_suffix = query.wanted_suffix();
            let (matched, conflict) = {
                let result = match_team(&query, &group_teams, &club_teams);
                (result.outcome.matched.cloned(), result.category_conflict.cloned())
            };

            let team = match (conflict, matched) {
                (Some(wrong), sibling) => {
                    let repaired = self
                        .repair_category(group, label, club.id, &wrong, sibling, &mut club_teams, &mut memberships, report)
                        .await?;
                    if repaired.is_none() {
                        report.issue(
                            IssueKind::CategoryConflict,
                            &label.label,
                            format!("team {} is '{}' but could not be repaired", wrong.id, wrong.category),
                        );
                    }
                    repaired
                }
                (None, Some(team)) => Some(team),
                (None, None) => {
                    let created = self
                        .create_team(club.id, &wanted_suffix, group, &mut club_teams, report)
                        .await?;
                    if created.is_none() {
                        report.issue(
                            IssueKind::ConstraintRace,
                            &label.label,
                            "team row not visible after a concurrent insert",
                        );
                    }
                    created
                }
            };
            if let Some(team) = &team {
                debug!("Team label '{}' -> team {}", label.label, team.id);
            }
            index.insert(&label.label, team.map(|t| t.id));
        }
        Ok(index)
    }

    /// The category always comes from the group.
    async fn create_team(
        &self,
        club_id: ClubId,
        suffix: &str,
        group: &CompetitionGroup,
        club_teams: &mut Vec<CanonicalTeam>,
        report: &mut ReconcileReport,
    ) -> Result<Option<CanonicalTeam>, StoreError> {
        let new_team = NewTeam {
            club_id,
            team_suffix: Some(suffix.to_string()),
            category: group.category.clone(),
        };
        match self.store.insert_team(new_team).await {
            Ok(team) => {
                info!(
                    "Created team {} (club {}, suffix {}, category '{}')",
                    team.id, club_id, suffix, team.category
                );
                report.teams_created += 1;
                club_teams.push(team.clone());
                Ok(Some(team))
            }
            Err(StoreError::UniqueViolation { constraint }) => {
                warn!("Team {} of club {} was inserted concurrently ({}), re-reading", suffix, club_id, constraint);
                let fresh = self.store.teams_by_clubs(&[club_id]).await?;
                club_teams.retain(|t| t.club_id != club_id);
                club_teams.extend(fresh);
                let category = normalize_category(&group.category);
                Ok(club_teams
                    .iter()
                    .find(|t| {
                        t.club_id == club_id
                            && normalize_suffix(t.team_suffix.as_deref()) == suffix
                            && normalize_category(&t.category) == category
                    })
                    .cloned())
            }
            Err(err) => Err(err),
        }
    }

    /// Moves a wrong-category team out of the group: finds or creates the
    /// correctly categorized sibling, rewrites the group's fixtures and then
    /// swaps the memberships. Every step checks current state first, so a
    /// repeated or interrupted repair converges.
    #[allow(clippy::too_many_arguments)]
    async fn repair_category(
        &self,
        group: &CompetitionGroup,
        label: &TeamLabel,
        club_id: ClubId,
        wrong: &CanonicalTeam,
        sibling: Option<CanonicalTeam>,
        club_teams: &mut Vec<CanonicalTeam>,
        memberships: &mut Vec<TeamSeasonMembership>,
        report: &mut ReconcileReport,
    ) -> Result<Option<CanonicalTeam>, StoreError> {
        warn!(
            "Team {} is linked to {} with category '{}', repairing",
            wrong.id, group, wrong.category
        );

        let correct = match sibling {
            Some(team) => team,
            None => {
                let suffix = normalize_suffix(wrong.team_suffix.as_deref());
                match self.create_team(club_id, &suffix, group, club_teams, report).await? {
                    Some(team) => team,
                    None => return Ok(None),
                }
            }
        };

        // Fixtures first and the wrong membership last: until it is
        // deactivated, a rerun still sees the conflict and resumes here.
        let fixtures = self.store.fixtures(group).await?;
        let mut rewritten = 0;
        for fixture in fixtures.iter().filter(|f| f.involves(wrong.id)) {
            let patch = FixturePatch {
                home_team_id: (fixture.home_team_id == wrong.id).then_some(correct.id),
                away_team_id: (fixture.away_team_id == wrong.id).then_some(correct.id),
                ..Default::default()
            };
            self.store.update_fixture(fixture.id, patch).await?;
            rewritten += 1;
        }

        if !self.ensure_membership(group, correct.id, memberships, report).await? {
            return Ok(None);
        }

        if let Some(membership) = memberships.iter_mut().find(|m| m.team_id == wrong.id && m.is_active) {
            self.store.set_membership_active(membership.id, false).await?;
            membership.is_active = false;
            info!("Deactivated membership {} of team {}", membership.id, wrong.id);
        }

        warn!(
            "Repaired '{}': team {} -> {}, {} fixtures rewritten",
            label.label, wrong.id, correct.id, rewritten
        );
        report.repairs.push(CategoryRepair {
            wrong_team_id: wrong.id,
            correct_team_id: correct.id,
            label: label.label.clone(),
            fixtures_rewritten: rewritten,
        });
        Ok(Some(correct))
    }

    /// Phase 3.
    async fn ensure_memberships(
        &self,
        group: &CompetitionGroup,
        index: &TeamLabelIndex,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let mut memberships = self.store.memberships(group).await?;
        for team_id in index.team_ids() {
            if !self.ensure_membership(group, team_id, &mut memberships, report).await? {
                report.issue(
                    IssueKind::ConstraintRace,
                    format!("team {}", team_id),
                    "membership row not visible after a concurrent insert",
                );
            }
        }
        Ok(())
    }

    /// Makes sure `team_id` has an active membership in the group. Returns
    /// false only when a racing insert left no row to be found.
    async fn ensure_membership(
        &self,
        group: &CompetitionGroup,
        team_id: TeamId,
        memberships: &mut Vec<TeamSeasonMembership>,
        report: &mut ReconcileReport,
    ) -> Result<bool, StoreError> {
        if memberships.iter().all(|m| m.team_id != team_id) {
            let new_membership = NewMembership {
                team_id,
                group: group.clone(),
            };
            match self.store.insert_membership(new_membership).await {
                Ok(membership) => {
                    debug!("Linked team {} to {}", team_id, group);
                    report.team_seasons_created += 1;
                    memberships.push(membership);
                    return Ok(true);
                }
                Err(StoreError::UniqueViolation { constraint }) => {
                    warn!("Membership of team {} was inserted concurrently ({}), re-reading", team_id, constraint);
                    *memberships = self.store.memberships(group).await?;
                }
                Err(err) => return Err(err),
            }
        }

        let Some(membership) = memberships.iter_mut().find(|m| m.team_id == team_id) else {
            return Ok(false);
        };
        if !membership.is_active {
            self.store.set_membership_active(membership.id, true).await?;
            membership.is_active = true;
            info!("Reactivated membership {} of team {}", membership.id, team_id);
            report.team_seasons_reactivated += 1;
        }
        Ok(true)
    }

    /// Phase 4: match-number keyed upsert with the date and team fallbacks.
    async fn upsert_fixtures(
        &self,
        group: &CompetitionGroup,
        snapshot: &ExternalSnapshot,
        index: &TeamLabelIndex,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let mut fixtures = self.store.fixtures(group).await?;
        let mut claimed = HashSet::new();

        for label in &snapshot.fixtures {
            let home = index.resolve(&label.home_label);
            let away = index.resolve(&label.away_label);

            match locate(label, home, away, &fixtures, &claimed) {
                Located::Found(pos) => {
                    claimed.insert(fixtures[pos].id);
                    self.patch_fixture(label, home, away, &mut fixtures, pos, report).await?
                }
                Located::Ambiguous(count) => report.issue(
                    IssueKind::AmbiguousMatch,
                    label.describe(),
                    format!("{} fixtures on that date, none identified", count),
                ),
                Located::NotFound => {
                    let (Some(home), Some(away)) = (home, away) else {
                        report.issue(IssueKind::NotFound, label.describe(), "team label not resolved");
                        continue;
                    };
                    let Some(match_date) = label.date else {
                        report.issue(IssueKind::IncompleteLabel, label.describe(), "fixture has no date");
                        continue;
                    };
                    let new_fixture = NewFixture {
                        home_team_id: home,
                        away_team_id: away,
                        match_date,
                        start_time: label.start_time,
                        match_number: label.match_number.clone(),
                        group: group.clone(),
                        status: label.status.unwrap_or(FixtureStatus::Scheduled),
                        home_score: label.score_home_points,
                        away_score: label.score_away_points,
                    };
                    match self.store.insert_fixture(new_fixture).await {
                        Ok(fixture) => {
                            debug!("Created fixture {} for {}", fixture.id, label.describe());
                            report.fixtures_created += 1;
                            claimed.insert(fixture.id);
                            fixtures.push(fixture);
                        }
                        Err(StoreError::UniqueViolation { constraint }) => {
                            warn!("Fixture {} was inserted concurrently ({}), re-reading", label.describe(), constraint);
                            fixtures = self.store.fixtures(group).await?;
                            match locate(label, Some(home), Some(away), &fixtures, &claimed) {
                                Located::Found(pos) => {
                                    claimed.insert(fixtures[pos].id);
                                    self.patch_fixture(label, Some(home), Some(away), &mut fixtures, pos, report)
                                        .await?
                                }
                                _ => report.issue(
                                    IssueKind::ConstraintRace,
                                    label.describe(),
                                    "match number already taken outside this group",
                                ),
                            }
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
        Ok(())
    }

    async fn patch_fixture(
        &self,
        label: &FixtureLabel,
        home: Option<TeamId>,
        away: Option<TeamId>,
        fixtures: &mut [Fixture],
        pos: usize,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let fixture = &mut fixtures[pos];
        let patch = compare_fixture(label, home, away, fixture, true).patch;
        if patch.is_empty() {
            return Ok(());
        }
        match self.store.update_fixture(fixture.id, patch.clone()).await {
            Ok(()) => {
                debug!("Updated fixture {} with {:?}", fixture.id, patch);
                patch.apply(fixture);
                report.fixtures_updated += 1;
            }
            Err(StoreError::UniqueViolation { constraint }) => report.issue(
                IssueKind::ConstraintRace,
                label.describe(),
                format!("update of fixture {} rejected by {}", fixture.id, constraint),
            ),
            Err(err) => return Err(err),
        }
        Ok(())
    }

    /// Phase 5: completed fixtures that expose a result report and have no
    /// results stored yet.
    async fn import_results(
        &self,
        group: &CompetitionGroup,
        snapshot: &ExternalSnapshot,
        index: &TeamLabelIndex,
        report: &mut ReconcileReport,
    ) -> Result<(), StoreError> {
        let Some(importer) = self.importer else {
            debug!("No result importer configured, skipping results");
            return Ok(());
        };

        let fixtures = self.store.fixtures(group).await?;
        let fixture_ids: Vec<FixtureId> = fixtures.iter().map(|f| f.id).collect();
        let with_results = self.store.fixture_ids_with_results(&fixture_ids).await?;
        let mut requested = HashSet::new();
        let mut claimed = HashSet::new();

        for label in &snapshot.fixtures {
            let home = index.resolve(&label.home_label);
            let away = index.resolve(&label.away_label);
            let FixtureResolution::Found(fixture) = resolve_fixture(label, home, away, &fixtures, &claimed) else {
                continue;
            };
            claimed.insert(fixture.id);
            let Some(result_id) = &label.result_report_id else {
                continue;
            };
            let status = label.status.unwrap_or(fixture.status);
            if status != FixtureStatus::Completed
                || with_results.contains(&fixture.id)
                || !requested.insert(fixture.id)
            {
                continue;
            }

            let request = ResultImportRequest {
                fixture_id: fixture.id,
                result_id: result_id.clone(),
                home_label: label.home_label.clone(),
                away_label: label.away_label.clone(),
            };
            match importer.import(&request).await {
                Ok(count) => {
                    debug!("Imported {} rubbers for fixture {}", count, fixture.id);
                    report.results_imported += count;
                }
                Err(err) => report.issue(IssueKind::UpstreamUnavailable, label.describe(), err.to_string()),
            }
        }
        Ok(())
    }
}

enum Located {
    Found(usize),
    NotFound,
    Ambiguous(usize),
}

fn locate(
    label: &FixtureLabel,
    home: Option<TeamId>,
    away: Option<TeamId>,
    fixtures: &[Fixture],
    claimed: &HashSet<FixtureId>,
) -> Located {
    match resolve_fixture(label, home, away, fixtures, claimed) {
        FixtureResolution::Found(found) => fixtures
            .iter()
            .position(|f| f.id == found.id)
            .map_or(Located::NotFound, Located::Found),
        FixtureResolution::NotFound => Located::NotFound,
        FixtureResolution::Ambiguous(count) => Located::Ambiguous(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use crate::memory_store::MemoryStore;

    fn group() -> CompetitionGroup {
        CompetitionGroup {
            category: "Men 40".to_string(),
            league: "2. Bezirksliga".to_string(),
            group_name: "Gr. 042".to_string(),
            season: "Sommer 2025".to_string(),
        }
    }

    fn team_label(club: &str, label: &str) -> TeamLabel {
        TeamLabel {
            club_name: club.to_string(),
            label: label.to_string(),
            team_suffix: None,
            category: None,
        }
    }

    fn fixture_label(number: &str, home: &str, away: &str, day: u32) -> FixtureLabel {
        FixtureLabel {
            match_number: Some(number.to_string()),
            home_label: home.to_string(),
            away_label: away.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, day),
            start_time: None,
            status: None,
            score_home_points: None,
            score_away_points: None,
            result_report_id: None,
        }
    }

    fn snapshot() -> ExternalSnapshot {
        ExternalSnapshot {
            group: group(),
            teams: vec![
                team_label("TC Musterstadt", "TC Musterstadt 3"),
                team_label("SV Oberdorf", "SV Oberdorf"),
            ],
            fixtures: vec![fixture_label("428", "TC Musterstadt 3", "SV Oberdorf", 10)],
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_creates_everything_from_empty_store() {
        let store = MemoryStore::new();
        let report = Reconciler::new(&store).reconcile(&group(), &snapshot()).await;

        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(report.clubs_created, 2);
        assert_eq!(report.teams_created, 2);
        assert_eq!(report.team_seasons_created, 2);
        assert_eq!(report.fixtures_created, 1);

        let teams = store.all_teams().unwrap();
        assert!(teams.iter().all(|t| t.category == "Men 40"));
        let suffixes: Vec<Option<&str>> = teams.iter().map(|t| t.team_suffix.as_deref()).collect();
        assert_eq!(suffixes, vec![Some("3"), Some("1")]);
    }

    #[tokio::test]
    async fn test_second_run_writes_nothing() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);
        reconciler.reconcile(&group(), &snapshot()).await;
        let writes = store.write_count();

        let second = reconciler.reconcile(&group(), &snapshot()).await;
        assert_eq!(second, ReconcileReport::default());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_reactivates_inactive_membership() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);
        reconciler.reconcile(&group(), &snapshot()).await;

        let memberships = store.memberships(&group()).await.unwrap();
        store.set_membership_active(memberships[0].id, false).await.unwrap();

        let report = reconciler.reconcile(&group(), &snapshot()).await;
        assert_eq!(report.team_seasons_reactivated, 1);
        assert_eq!(report.team_seasons_created, 0);
        assert!(store.memberships(&group()).await.unwrap().iter().all(|m| m.is_active));
    }

    #[tokio::test]
    async fn test_fixture_without_date_is_reported() {
        let store = MemoryStore::new();
        let mut snapshot = snapshot();
        snapshot.fixtures[0].date = None;

        let report = Reconciler::new(&store).reconcile(&group(), &snapshot).await;
        assert_eq!(report.fixtures_created, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, IssueKind::IncompleteLabel);
        assert!(store.all_fixtures().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_fixture_team_is_not_found() {
        let store = MemoryStore::new();
        let mut snapshot = snapshot();
        snapshot.fixtures[0].away_label = "FC Nirgendwo".to_string();

        let report = Reconciler::new(&store).reconcile(&group(), &snapshot).await;
        assert_eq!(report.errors[0].kind, IssueKind::NotFound);
        assert_eq!(report.fixtures_created, 0);
    }
}
