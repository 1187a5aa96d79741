use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// Scores at or above this are applied without review.
pub const AUTO_THRESHOLD: f64 = 0.92;

/// Number of runner-up candidates reported next to a match.
pub const MAX_ALTERNATIVES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Literal or alias lookup.
    Exact,
    Auto,
    Fuzzy,
    /// Below threshold; must be queued for review.
    None,
}

impl MatchTier {
    pub fn for_score(score: f64, threshold: f64) -> Self {
        if score < threshold {
            Self::None
        } else if score >= AUTO_THRESHOLD {
            Self::Auto
        } else {
            Self::Fuzzy
        }
    }

    pub fn is_match(self) -> bool {
        self != Self::None
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Scored<T> {
    pub entity: T,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome<T> {
    pub matched: Option<T>,
    pub score: f64,
    pub tier: MatchTier,
    pub alternatives: Vec<Scored<T>>,
}

impl<T> MatchOutcome<T> {
    pub fn exact(entity: T, alternatives: Vec<Scored<T>>) -> Self {
        Self {
            matched: Some(entity),
            score: 1.0,
            tier: MatchTier::Exact,
            alternatives,
        }
    }

    pub fn unmatched(score: f64, alternatives: Vec<Scored<T>>) -> Self {
        Self {
            matched: None,
            score,
            tier: MatchTier::None,
            alternatives,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}

impl<T: Copy> MatchOutcome<T> {
    /// Builds an outcome from candidates ranked best-first.
    pub fn from_ranked(ranked: Vec<Scored<T>>, threshold: f64) -> Self {
        let mut iter = ranked.into_iter();
        let Some(best) = iter.next() else {
            return Self::unmatched(0.0, Vec::new());
        };
        let tier = MatchTier::for_score(best.score, threshold);
        if tier.is_match() {
            Self {
                matched: Some(best.entity),
                score: best.score,
                tier,
                alternatives: iter.take(MAX_ALTERNATIVES).collect(),
            }
        } else {
            let alternatives = std::iter::once(best).chain(iter).take(MAX_ALTERNATIVES).collect();
            Self::unmatched(best.score, alternatives)
        }
    }
}

/// Scores every candidate in parallel and sorts best-first. Ties keep the
/// candidates' input order.
pub fn rank<'a, T, F>(candidates: &'a [T], score: F) -> Vec<Scored<&'a T>>
where
    T: Sync,
    F: Fn(&T) -> f64 + Sync,
{
    let mut ranked: Vec<Scored<&T>> = candidates
        .par_iter()
        .map(|candidate| Scored {
            entity: candidate,
            score: score(candidate),
        })
        .collect();
    sort_best_first(&mut ranked);
    ranked
}

pub fn sort_best_first<T>(ranked: &mut [Scored<T>]) {
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_for_score() {
        assert_eq!(MatchTier::for_score(0.95, 0.85), MatchTier::Auto);
        assert_eq!(MatchTier::for_score(0.92, 0.92), MatchTier::Auto);
        assert_eq!(MatchTier::for_score(0.86, 0.85), MatchTier::Fuzzy);
        assert_eq!(MatchTier::for_score(0.84, 0.85), MatchTier::None);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let values = [0.5, 0.9, 0.5, 0.1];
        let ranked = rank(&values, |v| *v);
        let order: Vec<f64> = ranked.iter().map(|s| *s.entity).collect();
        assert_eq!(order, vec![0.9, 0.5, 0.5, 0.1]);
        assert!(std::ptr::eq(ranked[1].entity, &values[0]));
        assert!(std::ptr::eq(ranked[2].entity, &values[2]));
    }

    #[test]
    fn test_from_ranked_below_threshold_keeps_best_as_alternative() {
        let values = [1u8, 2, 3, 4, 5, 6];
        let ranked: Vec<Scored<&u8>> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Scored { entity: v, score: 0.5 - i as f64 * 0.01 })
            .collect();
        let outcome = MatchOutcome::from_ranked(ranked, 0.85);
        assert_eq!(outcome.tier, MatchTier::None);
        assert!(outcome.matched.is_none());
        assert_eq!(outcome.alternatives.len(), MAX_ALTERNATIVES);
        assert_eq!(*outcome.alternatives[0].entity, 1);
    }

    #[test]
    fn test_from_ranked_empty() {
        let outcome: MatchOutcome<&u8> = MatchOutcome::from_ranked(Vec::new(), 0.85);
        assert_eq!(outcome.tier, MatchTier::None);
        assert_eq!(outcome.score, 0.0);
    }
}
