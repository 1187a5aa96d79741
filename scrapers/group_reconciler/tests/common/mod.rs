#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use group_reconciler::error::{ImportError, StoreError};
use group_reconciler::memory_store::MemoryStore;
use group_reconciler::results::{ResultImportRequest, ResultImporter};
use group_reconciler::snapshot::{ExternalSnapshot, FixtureLabel, TeamLabel};
use group_reconciler::store::Store;
use group_reconciler::types::{
    CanonicalClub, CanonicalTeam, ClubAlias, ClubId, CompetitionGroup, Fixture, FixtureId, FixturePatch,
    FixtureStatus, MembershipId, NewClub, NewFixture, NewMembership, NewTeam, TeamId, TeamSeasonMembership,
};

pub fn group() -> CompetitionGroup {
    CompetitionGroup {
        category: "Men 40".to_string(),
        league: "2. Bezirksliga".to_string(),
        group_name: "Gr. 042".to_string(),
        season: "Sommer 2025".to_string(),
    }
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
}

pub fn team_label(club: &str, label: &str) -> TeamLabel {
    TeamLabel {
        club_name: club.to_string(),
        label: label.to_string(),
        team_suffix: None,
        category: None,
    }
}

pub fn fixture_label(number: Option<&str>, home: &str, away: &str, day: Option<u32>) -> FixtureLabel {
    FixtureLabel {
        match_number: number.map(String::from),
        home_label: home.to_string(),
        away_label: away.to_string(),
        date: day.map(date),
        start_time: None,
        status: None,
        score_home_points: None,
        score_away_points: None,
        result_report_id: None,
    }
}

/// Two clubs, one fixture.
pub fn basic_snapshot() -> ExternalSnapshot {
    ExternalSnapshot {
        group: group(),
        teams: vec![
            team_label("TC Musterstadt", "TC Musterstadt 3"),
            team_label("SV Oberdorf", "SV Oberdorf"),
        ],
        fixtures: vec![fixture_label(Some("428"), "TC Musterstadt 3", "SV Oberdorf", Some(10))],
    }
}

pub async fn seed_club(store: &MemoryStore, name: &str) -> CanonicalClub {
    store
        .insert_club(NewClub {
            name: name.to_string(),
            normalized_name: group_reconciler::normalize::normalize(name),
            city: None,
        })
        .await
        .unwrap()
}

pub async fn seed_team(store: &MemoryStore, club: ClubId, suffix: Option<&str>, category: &str) -> CanonicalTeam {
    store
        .insert_team(NewTeam {
            club_id: club,
            team_suffix: suffix.map(String::from),
            category: category.to_string(),
        })
        .await
        .unwrap()
}

pub async fn seed_membership(store: &MemoryStore, team: TeamId) -> TeamSeasonMembership {
    store
        .insert_membership(NewMembership { team_id: team, group: group() })
        .await
        .unwrap()
}

pub async fn seed_fixture(store: &MemoryStore, home: TeamId, away: TeamId, day: u32, number: Option<&str>) -> Fixture {
    store
        .insert_fixture(NewFixture {
            home_team_id: home,
            away_team_id: away,
            match_date: date(day),
            start_time: None,
            match_number: number.map(String::from),
            group: group(),
            status: FixtureStatus::Scheduled,
            home_score: None,
            away_score: None,
        })
        .await
        .unwrap()
}

/// Wraps a [`MemoryStore`] to simulate a concurrent importer and outages.
///
/// With `race_inserts` set, every insert is first applied to the inner store
/// and then reported as a unique violation, as if another importer had
/// written the row a moment earlier. With `fail_fixture_reads` or
/// `fail_fixture_updates` set, those calls fail as unavailable.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub race_inserts: AtomicBool,
    pub fail_fixture_reads: AtomicBool,
    pub fail_fixture_updates: AtomicBool,
}

impl FlakyStore {
    fn racing(&self) -> bool {
        self.race_inserts.load(Ordering::SeqCst)
    }

    fn raced<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Ok(_) if self.racing() => Err(StoreError::UniqueViolation {
                constraint: "raced".to_string(),
            }),
            other => other,
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn clubs(&self) -> Result<Vec<CanonicalClub>, StoreError> {
        self.inner.clubs().await
    }

    async fn club_aliases(&self) -> Result<Vec<ClubAlias>, StoreError> {
        self.inner.club_aliases().await
    }

    async fn teams_by_clubs(&self, club_ids: &[ClubId]) -> Result<Vec<CanonicalTeam>, StoreError> {
        self.inner.teams_by_clubs(club_ids).await
    }

    async fn memberships(&self, group: &CompetitionGroup) -> Result<Vec<TeamSeasonMembership>, StoreError> {
        self.inner.memberships(group).await
    }

    async fn fixtures(&self, group: &CompetitionGroup) -> Result<Vec<Fixture>, StoreError> {
        if self.fail_fixture_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.fixtures(group).await
    }

    async fn fixture_ids_with_results(&self, fixture_ids: &[FixtureId]) -> Result<HashSet<FixtureId>, StoreError> {
        self.inner.fixture_ids_with_results(fixture_ids).await
    }

    async fn insert_club(&self, club: NewClub) -> Result<CanonicalClub, StoreError> {
        let result = self.inner.insert_club(club).await;
        self.raced(result)
    }

    async fn insert_team(&self, team: NewTeam) -> Result<CanonicalTeam, StoreError> {
        let result = self.inner.insert_team(team).await;
        self.raced(result)
    }

    async fn insert_membership(&self, membership: NewMembership) -> Result<TeamSeasonMembership, StoreError> {
        let result = self.inner.insert_membership(membership).await;
        self.raced(result)
    }

    async fn set_membership_active(&self, id: MembershipId, active: bool) -> Result<(), StoreError> {
        self.inner.set_membership_active(id, active).await
    }

    async fn insert_fixture(&self, fixture: NewFixture) -> Result<Fixture, StoreError> {
        let result = self.inner.insert_fixture(fixture).await;
        self.raced(result)
    }

    async fn update_fixture(&self, id: FixtureId, patch: FixturePatch) -> Result<(), StoreError> {
        if self.fail_fixture_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.update_fixture(id, patch).await
    }
}

/// Importer that records requests and marks the fixture as having results.
pub struct RecordingImporter {
    pub store: Arc<MemoryStore>,
    pub rubbers_per_fixture: u32,
    pub requests: Mutex<Vec<ResultImportRequest>>,
}

impl RecordingImporter {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            rubbers_per_fixture: 9,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ResultImporter for RecordingImporter {
    async fn import(&self, request: &ResultImportRequest) -> Result<u32, ImportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.store.mark_results_imported(request.fixture_id)?;
        Ok(self.rubbers_per_fixture)
    }
}
