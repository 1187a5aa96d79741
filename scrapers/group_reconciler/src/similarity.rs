use strsim::jaro_winkler;

use crate::normalize::{normalize, strip_country_code, tokenize};

/// Normalized lengths further apart than this are tested as prefix/abbreviation pairs.
const PREFIX_LENGTH_GAP: usize = 3;
const JARO_WINKLER_WEIGHT: f64 = 0.6;
const TOKEN_SET_WEIGHT: f64 = 0.4;

/// Bounded [0, 1] similarity of two labels.
///
/// Identical normalized labels score exactly 1.0. Otherwise embedded country
/// codes are removed, a short label that is a whole-word prefix of a much
/// longer one scores between 0.75 and 0.95, and everything else blends
/// Jaro-Winkler (60%) with the token-set ratio (40%).
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    if na == nb {
        return 1.0;
    }

    let sa = normalize(&strip_country_code(a));
    let sb = normalize(&strip_country_code(b));
    if sa == sb {
        return 1.0;
    }
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }

    if let Some(score) = prefix_score(&sa, &sb) {
        return score;
    }

    // Greedy Jaro matching can depend on argument order; fix the order.
    let (first, second) = if sa <= sb { (&sa, &sb) } else { (&sb, &sa) };
    let jw = jaro_winkler(first, second);
    let tsr = token_set_ratio(first, second);
    (JARO_WINKLER_WEIGHT * jw + TOKEN_SET_WEIGHT * tsr).clamp(0.0, 1.0)
}

/// Abbreviation branch: "sv blau" against "sv blau weiss rot".
fn prefix_score(a: &str, b: &str) -> Option<f64> {
    let (la, lb) = (a.chars().count(), b.chars().count());
    if la.abs_diff(lb) <= PREFIX_LENGTH_GAP {
        return None;
    }
    let (shorter, longer, ls, ll) = if la < lb { (a, b, la, lb) } else { (b, a, lb, la) };
    let remainder = longer.strip_prefix(shorter)?;
    if !remainder.is_empty() && !remainder.starts_with(' ') {
        return None;
    }
    let ratio = ls as f64 / ll as f64 * 1.1;
    Some(ratio.min(0.95).max(0.75))
}

/// |intersection| / |union| of the stopword-free token sets.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokenize(a);
    let tb = tokenize(b);
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / union as f64
}
