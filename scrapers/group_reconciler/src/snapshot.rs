use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SnapshotError;
use crate::types::{CompetitionGroup, FixtureStatus};

/// Scraped scalars arrive as JSON numbers or strings depending on the page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    fn text(&self) -> Option<String> {
        let s = match self {
            Loose::Int(n) => n.to_string(),
            Loose::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
            Loose::Float(f) => f.to_string(),
            Loose::Text(s) => s.trim().to_string(),
        };
        (!s.is_empty()).then_some(s)
    }

    fn int(&self) -> Option<i32> {
        match self {
            Loose::Int(n) => i32::try_from(*n).ok(),
            Loose::Float(f) if f.fract() == 0.0 => Some(*f as i32),
            Loose::Float(_) => None,
            Loose::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroup {
    pub category: Option<String>,
    pub league: Option<String>,
    pub group_name: Option<String>,
    pub season: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeam {
    pub club_name: Option<String>,
    pub label: Option<String>,
    pub team_suffix: Option<Loose>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFixture {
    pub match_number: Option<Loose>,
    pub home_label: Option<String>,
    pub away_label: Option<String>,
    #[serde(alias = "date")]
    pub date_iso: Option<String>,
    pub start_time: Option<String>,
    pub status: Option<String>,
    pub score_home_points: Option<Loose>,
    pub score_away_points: Option<Loose>,
    pub result_report_id: Option<Loose>,
}

/// The scraped payload exactly as the scraping collaborator hands it over.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub group: RawGroup,
    #[serde(default)]
    pub teams: Vec<RawTeam>,
    #[serde(default)]
    pub fixtures: Vec<RawFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLabel {
    pub club_name: String,
    pub label: String,
    pub team_suffix: Option<String>,
    /// Informational only; the group decides a team's category.
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureLabel {
    pub match_number: Option<String>,
    pub home_label: String,
    pub away_label: String,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub status: Option<FixtureStatus>,
    pub score_home_points: Option<i32>,
    pub score_away_points: Option<i32>,
    pub result_report_id: Option<String>,
}

impl FixtureLabel {
    pub fn describe(&self) -> String {
        match &self.match_number {
            Some(number) => format!("#{} {} vs {}", number, self.home_label, self.away_label),
            None => format!("{} vs {}", self.home_label, self.away_label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSnapshot {
    pub group: CompetitionGroup,
    pub teams: Vec<TeamLabel>,
    pub fixtures: Vec<FixtureLabel>,
}

impl TryFrom<RawSnapshot> for ExternalSnapshot {
    type Error = SnapshotError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let group = CompetitionGroup {
            category: required(raw.group.category, "category")?,
            league: required(raw.group.league, "league")?,
            group_name: required(raw.group.group_name, "groupName")?,
            season: required(raw.group.season, "season")?,
        };

        let teams = raw
            .teams
            .into_iter()
            .filter_map(|team| {
                let label = non_empty(team.label);
                let club_name = non_empty(team.club_name);
                match (club_name, label) {
                    (Some(club_name), Some(label)) => Some(TeamLabel {
                        club_name,
                        label,
                        team_suffix: team.team_suffix.as_ref().and_then(Loose::text),
                        category: non_empty(team.category),
                    }),
                    (club_name, label) => {
                        warn!("Dropping team entry without club or label: {:?} / {:?}", club_name, label);
                        None
                    }
                }
            })
            .collect();

        let fixtures = raw.fixtures.into_iter().filter_map(fixture_label).collect();

        Ok(ExternalSnapshot { group, teams, fixtures })
    }
}

fn fixture_label(raw: RawFixture) -> Option<FixtureLabel> {
    let (Some(home_label), Some(away_label)) = (non_empty(raw.home_label), non_empty(raw.away_label)) else {
        warn!(
            "Dropping fixture entry without both team labels (match number {:?})",
            raw.match_number
        );
        return None;
    };

    let (date, embedded_time) = raw.date_iso.as_deref().map(parse_date_time).unwrap_or((None, None));
    let start_time = raw.start_time.as_deref().and_then(parse_time).or(embedded_time);
    let status = raw.status.as_deref().and_then(|s| {
        let parsed = FixtureStatus::parse(s);
        if parsed.is_none() {
            warn!("Unknown fixture status '{}' for {} vs {}", s, home_label, away_label);
        }
        parsed
    });

    Some(FixtureLabel {
        match_number: raw.match_number.as_ref().and_then(Loose::text),
        home_label,
        away_label,
        date,
        start_time,
        status,
        score_home_points: raw.score_home_points.as_ref().and_then(Loose::int),
        score_away_points: raw.score_away_points.as_ref().and_then(Loose::int),
        result_report_id: raw.result_report_id.as_ref().and_then(Loose::text),
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SnapshotError> {
    non_empty(value).ok_or(SnapshotError::MissingGroupField(field))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Accepts "2025-05-10", "10.05.2025" and "2025-05-10T10:00:00". The time
/// part of a combined value is returned separately.
pub fn parse_date_time(raw: &str) -> (Option<NaiveDate>, Option<NaiveTime>) {
    let raw = raw.trim();
    let (date_part, time_part) = match raw.split_once(['T', ' ']) {
        Some((date, time)) => (date, Some(time)),
        None => (raw, None),
    };
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d.%m.%Y"))
        .ok();
    (date, time_part.and_then(parse_time))
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    let raw = raw.strip_suffix("Uhr").unwrap_or(raw).trim();
    let raw = raw.trim_end_matches('Z');
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RAW: &str = r#"{
        "group": {"category": "Herren 40", "league": "2. Bezirksliga", "groupName": "Gr. 042", "season": "Sommer 2025"},
        "teams": [
            {"clubName": "TC Musterstadt", "label": "TC Musterstadt 3", "teamSuffix": 3},
            {"clubName": "", "label": "Orphan"}
        ],
        "fixtures": [
            {"matchNumber": 428, "homeLabel": "TC Musterstadt 3", "awayLabel": "SV Oberdorf",
             "date": "10.05.2025", "startTime": "10:00 Uhr", "status": "gespielt",
             "scoreHomePoints": "5", "scoreAwayPoints": 4, "resultReportId": "r-77"},
            {"matchNumber": "429", "homeLabel": "SV Oberdorf", "awayLabel": "TC Musterstadt 3",
             "dateIso": "not a date", "status": "???"},
            {"homeLabel": "SV Oberdorf"}
        ]
    }"#;

    #[test]
    fn test_maps_loose_payload() {
        let raw: RawSnapshot = serde_json::from_str(RAW).unwrap();
        let snapshot = ExternalSnapshot::try_from(raw).unwrap();

        assert_eq!(snapshot.group.group_name, "Gr. 042");
        assert_eq!(snapshot.teams.len(), 1);
        assert_eq!(snapshot.teams[0].team_suffix.as_deref(), Some("3"));
        assert_eq!(snapshot.fixtures.len(), 2);

        let first = &snapshot.fixtures[0];
        assert_eq!(first.match_number.as_deref(), Some("428"));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 5, 10));
        assert_eq!(first.start_time, NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(first.status, Some(FixtureStatus::Completed));
        assert_eq!((first.score_home_points, first.score_away_points), (Some(5), Some(4)));
        assert_eq!(first.result_report_id.as_deref(), Some("r-77"));

        let second = &snapshot.fixtures[1];
        assert_eq!(second.match_number.as_deref(), Some("429"));
        assert_eq!(second.date, None);
        assert_eq!(second.status, None);
    }

    #[test]
    fn test_missing_group_field_is_rejected() {
        let raw = RawSnapshot {
            group: RawGroup {
                category: Some("Herren 40".to_string()),
                league: Some("2. Bezirksliga".to_string()),
                group_name: Some("  ".to_string()),
                season: Some("Sommer 2025".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(
            ExternalSnapshot::try_from(raw).unwrap_err(),
            SnapshotError::MissingGroupField("groupName")
        );
    }

    #[test]
    fn test_parse_date_time_variants() {
        let may_10 = NaiveDate::from_ymd_opt(2025, 5, 10);
        assert_eq!(parse_date_time("2025-05-10"), (may_10, None));
        assert_eq!(parse_date_time("2025-05-10T14:30:00"), (may_10, NaiveTime::from_hms_opt(14, 30, 0)));
        assert_eq!(parse_date_time("32.13.2025"), (None, None));
        assert_eq!(parse_time("09:15"), NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(parse_time("soon"), None);
    }
}
