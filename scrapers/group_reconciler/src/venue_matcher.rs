use crate::club_matcher::{match_club_with_threshold, ClubContext};
use crate::matching::MatchOutcome;
use crate::types::CanonicalClub;

/// Venues are club grounds; there is no separate venue registry.
pub const VENUE_THRESHOLD: f64 = 0.90;

pub fn match_venue<'a>(
    label: &str,
    clubs: &'a [CanonicalClub],
    context: &ClubContext<'_>,
) -> MatchOutcome<&'a CanonicalClub> {
    match_club_with_threshold(label, clubs, context, VENUE_THRESHOLD)
}
