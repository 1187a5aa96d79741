use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ClubId);
id_type!(TeamId);
id_type!(MembershipId);
id_type!(FixtureId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalClub {
    pub id: ClubId,
    pub name: String,
    pub normalized_name: String,
    pub city: Option<String>,
    pub is_verified: bool,
}

/// Alternative spelling of a club name, keyed by its normalized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClubAlias {
    pub alias: String,
    pub club_id: ClubId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTeam {
    pub id: TeamId,
    pub club_id: ClubId,
    pub team_suffix: Option<String>,
    pub category: String,
}

/// One scheduling division. This is a key, never a stored row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionGroup {
    pub category: String,
    pub league: String,
    pub group_name: String,
    pub season: String,
}

impl fmt::Display for CompetitionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} ({})",
            self.category, self.league, self.group_name, self.season
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamSeasonMembership {
    pub id: MembershipId,
    pub team_id: TeamId,
    pub category: String,
    pub league: String,
    pub group_name: String,
    pub season: String,
    pub is_active: bool,
}

impl TeamSeasonMembership {
    pub fn belongs_to(&self, group: &CompetitionGroup) -> bool {
        self.season == group.season && self.league == group.league && self.group_name == group.group_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "fixture_status", rename_all = "snake_case")]
pub enum FixtureStatus {
    Scheduled,
    Completed,
    Cancelled,
    Postponed,
    Retired,
}

impl FixtureStatus {
    /// Parses English and German status spellings used by results pages.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "scheduled" | "geplant" | "offen" | "open" | "" => Some(Self::Scheduled),
            "completed" | "played" | "gespielt" | "beendet" | "finished" => Some(Self::Completed),
            "cancelled" | "canceled" | "abgesagt" => Some(Self::Cancelled),
            "postponed" | "verlegt" | "verschoben" => Some(Self::Postponed),
            "retired" | "zurückgezogen" | "zurueckgezogen" => Some(Self::Retired),
            _ => None,
        }
    }
}

impl fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Postponed => "postponed",
            Self::Retired => "retired",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: FixtureId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub match_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub match_number: Option<String>,
    pub season: String,
    pub league: String,
    pub group_name: String,
    pub status: FixtureStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl Fixture {
    pub fn belongs_to(&self, group: &CompetitionGroup) -> bool {
        self.season == group.season && self.league == group.league && self.group_name == group.group_name
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClub {
    pub name: String,
    pub normalized_name: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub club_id: ClubId,
    pub team_suffix: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMembership {
    pub team_id: TeamId,
    pub group: CompetitionGroup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFixture {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub match_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub match_number: Option<String>,
    pub group: CompetitionGroup,
    pub status: FixtureStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

/// Targeted fixture update. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_team_id: Option<TeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_team_id: Option<TeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FixtureStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<i32>,
}

impl FixturePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, fixture: &mut Fixture) {
        if let Some(id) = self.home_team_id {
            fixture.home_team_id = id;
        }
        if let Some(id) = self.away_team_id {
            fixture.away_team_id = id;
        }
        if let Some(date) = self.match_date {
            fixture.match_date = date;
        }
        if let Some(time) = self.start_time {
            fixture.start_time = Some(time);
        }
        if let Some(number) = &self.match_number {
            fixture.match_number = Some(number.clone());
        }
        if let Some(status) = self.status {
            fixture.status = status;
        }
        if let Some(score) = self.home_score {
            fixture.home_score = Some(score);
        }
        if let Some(score) = self.away_score {
            fixture.away_score = Some(score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_status_parse() {
        assert_eq!(FixtureStatus::parse("Completed"), Some(FixtureStatus::Completed));
        assert_eq!(FixtureStatus::parse("abgesagt"), Some(FixtureStatus::Cancelled));
        assert_eq!(FixtureStatus::parse(" verlegt "), Some(FixtureStatus::Postponed));
        assert_eq!(FixtureStatus::parse("walkover?"), None);
    }

    #[test]
    fn test_patch_apply_only_touches_set_fields() {
        let mut fixture = Fixture {
            id: FixtureId(1),
            home_team_id: TeamId(10),
            away_team_id: TeamId(11),
            match_date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            match_number: Some("428".to_string()),
            season: "2025".to_string(),
            league: "2. Bezirksliga".to_string(),
            group_name: "Gr. 042".to_string(),
            status: FixtureStatus::Scheduled,
            home_score: None,
            away_score: None,
        };
        let patch = FixturePatch {
            away_team_id: Some(TeamId(12)),
            status: Some(FixtureStatus::Completed),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut fixture);
        assert_eq!(fixture.home_team_id, TeamId(10));
        assert_eq!(fixture.away_team_id, TeamId(12));
        assert_eq!(fixture.status, FixtureStatus::Completed);
        assert_eq!(fixture.start_time, NaiveTime::from_hms_opt(10, 0, 0));
        assert!(FixturePatch::default().is_empty());
    }
}
