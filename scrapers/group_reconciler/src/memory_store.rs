use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::normalize::{normalize, normalize_category, normalize_suffix};
use crate::store::Store;
use crate::types::{
    CanonicalClub, CanonicalTeam, ClubAlias, ClubId, CompetitionGroup, Fixture, FixtureId, FixturePatch,
    MembershipId, NewClub, NewFixture, NewMembership, NewTeam, TeamId, TeamSeasonMembership,
};

#[derive(Default)]
struct Tables {
    clubs: Vec<CanonicalClub>,
    aliases: Vec<ClubAlias>,
    teams: Vec<CanonicalTeam>,
    memberships: Vec<TeamSeasonMembership>,
    fixtures: Vec<Fixture>,
    fixtures_with_results: HashSet<FixtureId>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store kept in process memory. Enforces the same unique constraints as
/// the PostgreSQL schema and counts every write it accepts.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful write calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn add_alias(&self, alias: &str, club_id: ClubId) -> Result<(), StoreError> {
        self.tables()?.aliases.push(ClubAlias {
            alias: alias.to_string(),
            club_id,
        });
        Ok(())
    }

    /// Records that match results exist for a fixture.
    pub fn mark_results_imported(&self, fixture_id: FixtureId) -> Result<(), StoreError> {
        self.tables()?.fixtures_with_results.insert(fixture_id);
        Ok(())
    }

    pub fn all_teams(&self) -> Result<Vec<CanonicalTeam>, StoreError> {
        Ok(self.tables()?.teams.clone())
    }

    pub fn all_fixtures(&self) -> Result<Vec<Fixture>, StoreError> {
        Ok(self.tables()?.fixtures.clone())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn team_key(club_id: ClubId, suffix: Option<&str>, category: &str) -> (ClubId, String, String) {
    (club_id, normalize_suffix(suffix), normalize_category(category))
}

fn violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn clubs(&self) -> Result<Vec<CanonicalClub>, StoreError> {
        Ok(self.tables()?.clubs.clone())
    }

    async fn club_aliases(&self) -> Result<Vec<ClubAlias>, StoreError> {
        Ok(self.tables()?.aliases.clone())
    }

    async fn teams_by_clubs(&self, club_ids: &[ClubId]) -> Result<Vec<CanonicalTeam>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .teams
            .iter()
            .filter(|team| club_ids.contains(&team.club_id))
            .cloned()
            .collect())
    }

    async fn memberships(&self, group: &CompetitionGroup) -> Result<Vec<TeamSeasonMembership>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.belongs_to(group))
            .cloned()
            .collect())
    }

    async fn fixtures(&self, group: &CompetitionGroup) -> Result<Vec<Fixture>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.fixtures.iter().filter(|f| f.belongs_to(group)).cloned().collect())
    }

    async fn fixture_ids_with_results(&self, fixture_ids: &[FixtureId]) -> Result<HashSet<FixtureId>, StoreError> {
        let tables = self.tables()?;
        Ok(fixture_ids
            .iter()
            .filter(|id| tables.fixtures_with_results.contains(id))
            .copied()
            .collect())
    }

    async fn insert_club(&self, club: NewClub) -> Result<CanonicalClub, StoreError> {
        let mut tables = self.tables()?;
        let normalized = normalize(&club.normalized_name);
        if tables.clubs.iter().any(|c| c.normalized_name == normalized) {
            return Err(violation("club_normalized_name_key"));
        }
        let row = CanonicalClub {
            id: ClubId(tables.next_id()),
            name: club.name,
            normalized_name: normalized,
            city: club.city,
            is_verified: false,
        };
        tables.clubs.push(row.clone());
        self.wrote();
        Ok(row)
    }

    async fn insert_team(&self, team: NewTeam) -> Result<CanonicalTeam, StoreError> {
        let mut tables = self.tables()?;
        let key = team_key(team.club_id, team.team_suffix.as_deref(), &team.category);
        if tables
            .teams
            .iter()
            .any(|t| team_key(t.club_id, t.team_suffix.as_deref(), &t.category) == key)
        {
            return Err(violation("team_club_suffix_category_key"));
        }
        let row = CanonicalTeam {
            id: TeamId(tables.next_id()),
            club_id: team.club_id,
            team_suffix: team.team_suffix,
            category: team.category,
        };
        tables.teams.push(row.clone());
        self.wrote();
        Ok(row)
    }

    async fn insert_membership(&self, membership: NewMembership) -> Result<TeamSeasonMembership, StoreError> {
        let mut tables = self.tables()?;
        let group = &membership.group;
        if tables
            .memberships
            .iter()
            .any(|m| m.team_id == membership.team_id && m.belongs_to(group))
        {
            return Err(violation("membership_team_group_key"));
        }
        let row = TeamSeasonMembership {
            id: MembershipId(tables.next_id()),
            team_id: membership.team_id,
            category: group.category.clone(),
            league: group.league.clone(),
            group_name: group.group_name.clone(),
            season: group.season.clone(),
            is_active: true,
        };
        tables.memberships.push(row.clone());
        self.wrote();
        Ok(row)
    }

    async fn set_membership_active(&self, id: MembershipId, active: bool) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let membership = tables
            .memberships
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("membership {}", id)))?;
        membership.is_active = active;
        self.wrote();
        Ok(())
    }

    async fn insert_fixture(&self, fixture: NewFixture) -> Result<Fixture, StoreError> {
        let mut tables = self.tables()?;
        if let Some(number) = &fixture.match_number {
            if tables.fixtures.iter().any(|f| f.match_number.as_ref() == Some(number)) {
                return Err(violation("fixture_match_number_key"));
            }
        }
        let row = Fixture {
            id: FixtureId(tables.next_id()),
            home_team_id: fixture.home_team_id,
            away_team_id: fixture.away_team_id,
            match_date: fixture.match_date,
            start_time: fixture.start_time,
            match_number: fixture.match_number,
            season: fixture.group.season,
            league: fixture.group.league,
            group_name: fixture.group.group_name,
            status: fixture.status,
            home_score: fixture.home_score,
            away_score: fixture.away_score,
        };
        tables.fixtures.push(row.clone());
        self.wrote();
        Ok(row)
    }

    async fn update_fixture(&self, id: FixtureId, patch: FixturePatch) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if let Some(number) = &patch.match_number {
            if tables
                .fixtures
                .iter()
                .any(|f| f.id != id && f.match_number.as_ref() == Some(number))
            {
                return Err(violation("fixture_match_number_key"));
            }
        }
        let fixture = tables
            .fixtures
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("fixture {}", id)))?;
        patch.apply(fixture);
        self.wrote();
        Ok(())
    }
}
