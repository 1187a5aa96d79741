use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashSet;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::store::Store;
use crate::types::{
    CanonicalClub, CanonicalTeam, ClubAlias, ClubId, CompetitionGroup, Fixture, FixtureId, FixturePatch,
    MembershipId, NewClub, NewFixture, NewMembership, NewTeam, TeamSeasonMembership,
};

pub const SCHEMA: &str = include_str!("../schema.sql");

const FIXTURE_COLUMNS: &str = "id, home_team_id, away_team_id, match_date, start_time, match_number, \
     season, league, group_name, status, home_score, away_score";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the tables and constraints if they do not exist yet.
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("Database schema applied");
        Ok(())
    }
}

fn raw_ids<T, F: Fn(&T) -> i64>(ids: &[T], f: F) -> Vec<i64> {
    ids.iter().map(f).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn clubs(&self) -> Result<Vec<CanonicalClub>, StoreError> {
        let clubs = sqlx::query_as::<_, CanonicalClub>(
            "SELECT id, name, normalized_name, city, is_verified FROM club ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(clubs)
    }

    async fn club_aliases(&self) -> Result<Vec<ClubAlias>, StoreError> {
        let aliases = sqlx::query_as::<_, ClubAlias>("SELECT alias, club_id FROM club_alias")
            .fetch_all(&self.pool)
            .await?;
        Ok(aliases)
    }

    async fn teams_by_clubs(&self, club_ids: &[ClubId]) -> Result<Vec<CanonicalTeam>, StoreError> {
        let teams = sqlx::query_as::<_, CanonicalTeam>(
            "SELECT id, club_id, team_suffix, category FROM team WHERE club_id = ANY($1) ORDER BY id",
        )
        .bind(raw_ids(club_ids, |id| id.0))
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    async fn memberships(&self, group: &CompetitionGroup) -> Result<Vec<TeamSeasonMembership>, StoreError> {
        let memberships = sqlx::query_as::<_, TeamSeasonMembership>(
            r#"
            SELECT id, team_id, category, league, group_name, season, is_active
            FROM team_season_membership
            WHERE season = $1 AND league = $2 AND group_name = $3
            ORDER BY id
            "#,
        )
        .bind(&group.season)
        .bind(&group.league)
        .bind(&group.group_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    async fn fixtures(&self, group: &CompetitionGroup) -> Result<Vec<Fixture>, StoreError> {
        let sql = format!(
            "SELECT {} FROM fixture WHERE season = $1 AND league = $2 AND group_name = $3 ORDER BY id",
            FIXTURE_COLUMNS
        );
        let fixtures = sqlx::query_as::<_, Fixture>(&sql)
            .bind(&group.season)
            .bind(&group.league)
            .bind(&group.group_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(fixtures)
    }

    async fn fixture_ids_with_results(&self, fixture_ids: &[FixtureId]) -> Result<HashSet<FixtureId>, StoreError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT fixture_id FROM match_result WHERE fixture_id = ANY($1)")
                .bind(raw_ids(fixture_ids, |id| id.0))
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(FixtureId).collect())
    }

    async fn insert_club(&self, club: NewClub) -> Result<CanonicalClub, StoreError> {
        let row = sqlx::query_as::<_, CanonicalClub>(
            r#"
            INSERT INTO club (name, normalized_name, city)
            VALUES ($1, $2, $3)
            RETURNING id, name, normalized_name, city, is_verified
            "#,
        )
        .bind(&club.name)
        .bind(&club.normalized_name)
        .bind(&club.city)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_team(&self, team: NewTeam) -> Result<CanonicalTeam, StoreError> {
        let row = sqlx::query_as::<_, CanonicalTeam>(
            r#"
            INSERT INTO team (club_id, team_suffix, category)
            VALUES ($1, $2, $3)
            RETURNING id, club_id, team_suffix, category
            "#,
        )
        .bind(team.club_id)
        .bind(&team.team_suffix)
        .bind(&team.category)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_membership(&self, membership: NewMembership) -> Result<TeamSeasonMembership, StoreError> {
        let group = &membership.group;
        let row = sqlx::query_as::<_, TeamSeasonMembership>(
            r#"
            INSERT INTO team_season_membership (team_id, category, league, group_name, season, is_active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, team_id, category, league, group_name, season, is_active
            "#,
        )
        .bind(membership.team_id)
        .bind(&group.category)
        .bind(&group.league)
        .bind(&group.group_name)
        .bind(&group.season)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_membership_active(&self, id: MembershipId, active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE team_season_membership SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("membership {}", id)));
        }
        Ok(())
    }

    async fn insert_fixture(&self, fixture: NewFixture) -> Result<Fixture, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO fixture (home_team_id, away_team_id, match_date, start_time, match_number,
                                 season, league, group_name, status, home_score, away_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            FIXTURE_COLUMNS
        );
        let row = sqlx::query_as::<_, Fixture>(&sql)
            .bind(fixture.home_team_id)
            .bind(fixture.away_team_id)
            .bind(fixture.match_date)
            .bind(fixture.start_time)
            .bind(&fixture.match_number)
            .bind(&fixture.group.season)
            .bind(&fixture.group.league)
            .bind(&fixture.group.group_name)
            .bind(fixture.status)
            .bind(fixture.home_score)
            .bind(fixture.away_score)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_fixture(&self, id: FixtureId, patch: FixturePatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE fixture SET
                home_team_id = COALESCE($2, home_team_id),
                away_team_id = COALESCE($3, away_team_id),
                match_date = COALESCE($4, match_date),
                start_time = COALESCE($5, start_time),
                match_number = COALESCE($6, match_number),
                status = COALESCE($7, status),
                home_score = COALESCE($8, home_score),
                away_score = COALESCE($9, away_score)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.home_team_id)
        .bind(patch.away_team_id)
        .bind(patch.match_date)
        .bind(patch.start_time)
        .bind(&patch.match_number)
        .bind(patch.status)
        .bind(patch.home_score)
        .bind(patch.away_score)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("fixture {}", id)));
        }
        Ok(())
    }
}
