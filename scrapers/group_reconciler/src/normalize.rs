use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Tokens that carry no identifying information in club and team labels:
/// legal forms, generic sport words and the bare ordinals 1-3.
const STOPWORDS: &[&str] = &[
    // legal forms
    "e", "v", "ev", "ggmbh", "gmbh", "mbh", "ag", "ug", "kg", "ltd",
    // generic sport words
    "tc", "tv", "sv", "tsv", "tus", "sc", "sg", "fc", "vfl", "vfb", "tk", "thc", "ltc", "ttc",
    "club", "verein", "tennis", "tennisclub", "tennisverein", "tennisabteilung", "abteilung",
    "sportverein", "turnverein", "sportclub",
    // bare ordinals
    "1", "2", "3",
];

/// Fixed set of three-letter country codes that scraped labels embed in
/// front of a single-letter region token, e.g. "NED N Amsterdam". Matched
/// case-insensitively.
const COUNTRY_CODES: &[&str] = &[
    "GER", "NED", "AUT", "SUI", "BEL", "LUX", "FRA", "ITA", "ESP", "POL", "CZE", "DEN",
];

static COUNTRY_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\s+[a-z]\b\s*", COUNTRY_CODES.join("|"))).unwrap()
});

static SIZE_ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:\(\s*\d+\s*(?:er)?\s*\)|\b\d+er)\s*$").unwrap());

/// Words after which a trailing number is an age class, not a team ordinal.
const CATEGORY_WORDS: &[&str] = &[
    "herren", "damen", "men", "women", "senioren", "seniorinnen", "mixed", "junioren",
    "juniorinnen", "knaben", "maedchen", "u", "m", "w", "h", "d",
];

/// Canonical form of a free-text label: lower-case, German umlauts folded to
/// ASCII digraphs, remaining diacritics dropped, every non-alphanumeric run
/// replaced by a single space, trimmed.
pub fn normalize(label: &str) -> String {
    let mut folded = String::with_capacity(label.len());
    for c in label.chars().flat_map(char::to_lowercase) {
        match c {
            'ä' => folded.push_str("ae"),
            'ö' => folded.push_str("oe"),
            'ü' => folded.push_str("ue"),
            'ß' => folded.push_str("ss"),
            _ => folded.push(c),
        }
    }

    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for c in folded.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Set of identifying tokens of a label, stopwords removed.
pub fn tokenize(label: &str) -> BTreeSet<String> {
    normalize(label)
        .split_whitespace()
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

pub fn strip_country_code(label: &str) -> String {
    COUNTRY_CODE_RE.replace_all(label, "").trim().to_string()
}

/// Canonical team ordinal. An absent or empty suffix is team "1".
pub fn normalize_suffix(suffix: Option<&str>) -> String {
    let trimmed = suffix.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return "1".to_string();
    }
    if let Some(n) = roman_to_number(trimmed) {
        return n.to_string();
    }
    match trimmed.parse::<u32>() {
        Ok(0) | Err(_) => normalize(trimmed),
        Ok(n) => n.to_string(),
    }
}

/// Extracts a team's trailing ordinal ("TC Musterstadt 3", "Herren 40 II").
/// A trailing size annotation such as "(4er)" is discarded first.
pub fn extract_team_suffix(label: &str) -> Option<String> {
    let stripped = SIZE_ANNOTATION_RE.replace(label, "");
    let tokens: Vec<String> = stripped
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let last = tokens.last()?;

    if let Some(n) = roman_to_number(last) {
        if tokens.len() > 1 {
            return Some(n.to_string());
        }
    }

    let number = last.parse::<u32>().ok()?;
    if tokens.len() >= 2 {
        let previous = normalize(&tokens[tokens.len() - 2]);
        if CATEGORY_WORDS.contains(&previous.as_str()) {
            return None;
        }
    }
    (number > 0).then(|| number.to_string())
}

fn roman_to_number(token: &str) -> Option<u32> {
    match token {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        "IV" => Some(4),
        "V" => Some(5),
        "VI" => Some(6),
        "VII" => Some(7),
        "VIII" => Some(8),
        "IX" => Some(9),
        "X" => Some(10),
        _ => None,
    }
}

/// Canonical category key. German and English spellings of the same
/// category fold to one key ("Herren 40" and "Men 40" -> "men 40").
pub fn normalize_category(category: &str) -> String {
    normalize(category)
        .split_whitespace()
        .map(|token| match token {
            "herren" | "maenner" | "man" => "men",
            "damen" | "frauen" | "woman" => "women",
            "senioren" => "men",
            "seniorinnen" => "women",
            "junioren" | "knaben" => "boys",
            "juniorinnen" | "maedchen" => "girls",
            "gemischt" => "mixed",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}
