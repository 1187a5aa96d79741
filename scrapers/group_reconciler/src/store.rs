use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::StoreError;
use crate::types::{
    CanonicalClub, CanonicalTeam, ClubAlias, ClubId, CompetitionGroup, Fixture, FixtureId, FixturePatch,
    MembershipId, NewClub, NewFixture, NewMembership, NewTeam, TeamSeasonMembership,
};

/// Persistence collaborator over the canonical collections.
///
/// Inserts never upsert: a row that collides with one of the unique
/// constraints (club normalized name, team club+suffix+category, membership
/// team+season+league+group, fixture match number) fails with
/// [`StoreError::UniqueViolation`] so the caller can re-read and carry on.
#[async_trait]
pub trait Store: Send + Sync {
    async fn clubs(&self) -> Result<Vec<CanonicalClub>, StoreError>;

    async fn club_aliases(&self) -> Result<Vec<ClubAlias>, StoreError>;

    async fn teams_by_clubs(&self, club_ids: &[ClubId]) -> Result<Vec<CanonicalTeam>, StoreError>;

    /// All memberships of the group, inactive ones included.
    async fn memberships(&self, group: &CompetitionGroup) -> Result<Vec<TeamSeasonMembership>, StoreError>;

    async fn fixtures(&self, group: &CompetitionGroup) -> Result<Vec<Fixture>, StoreError>;

    /// Subset of `fixture_ids` that already have imported match results.
    async fn fixture_ids_with_results(&self, fixture_ids: &[FixtureId]) -> Result<HashSet<FixtureId>, StoreError>;

    async fn insert_club(&self, club: NewClub) -> Result<CanonicalClub, StoreError>;

    async fn insert_team(&self, team: NewTeam) -> Result<CanonicalTeam, StoreError>;

    async fn insert_membership(&self, membership: NewMembership) -> Result<TeamSeasonMembership, StoreError>;

    async fn set_membership_active(&self, id: MembershipId, active: bool) -> Result<(), StoreError>;

    async fn insert_fixture(&self, fixture: NewFixture) -> Result<Fixture, StoreError>;

    async fn update_fixture(&self, id: FixtureId, patch: FixturePatch) -> Result<(), StoreError>;
}
