//! Folding free-text offer locations into the sixteen Polish voivodeships.

use std::sync::LazyLock;

use listing_structs::NO_DATA;
use regex::Regex;

/// Canonical voivodeship names with their accepted spellings.
///
/// Matching is substring based and scans this table top to bottom, so the
/// first entry whose variant occurs in the text wins. Order matters: for
/// example `"zachodniopomorskie"` folds into `"pomorskie"` and
/// `"wielkopolskie"` into `"opolskie"` because those entries come first.
pub static VOIVODESHIPS: &[(&str, &[&str])] = &[
    (
        "dolnośląskie",
        &["dolnośląskie", "dolnoslaskie", "dolno slaskie", "dolno-slaskie", "dolnoślaskie"],
    ),
    (
        "kujawsko-pomorskie",
        &["kujawsko-pomorskie", "kujawsko pomorskie", "kuj pom", "kujawsko-pom"],
    ),
    ("lubelskie", &["lubelskie"]),
    ("lubuskie", &["lubuskie"]),
    ("łódzkie", &["łódzkie", "lodzkie", "łodzkie"]),
    (
        "małopolskie",
        &["małopolskie", "malopolskie", "małopolska", "malopolska", "mało polskie"],
    ),
    ("mazowieckie", &["mazowieckie", "mazowsze"]),
    ("opolskie", &["opolskie"]),
    ("podkarpackie", &["podkarpackie"]),
    ("podlaskie", &["podlaskie"]),
    ("pomorskie", &["pomorskie", "pomorze"]),
    ("śląskie", &["śląskie", "slaskie", "ślaskie"]),
    (
        "świętokrzyskie",
        &["świętokrzyskie", "swietokrzyskie", "św tok", "św-krzyskie"],
    ),
    (
        "warmińsko-mazurskie",
        &[
            "warmińsko-mazurskie",
            "warminsko-mazurskie",
            "warminsko mazurskie",
            "warmińsko mazurskie",
        ],
    ),
    ("wielkopolskie", &["wielkopolskie", "wielkopolska"]),
    (
        "zachodniopomorskie",
        &["zachodniopomorskie", "zachodnio pomorskie", "zachodnio-pomorskie"],
    ),
];

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[()\-_/]").expect("valid separator pattern"));

static COUNTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(polska|poland)\b").expect("valid country pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Lowercases, turns brackets/hyphens/underscores/slashes into spaces,
/// removes the country name and collapses whitespace.
#[must_use]
pub fn normalize_location(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced = SEPARATORS.replace_all(&lowered, " ");
    let without_country = COUNTRY.replace_all(&spaced, "");
    WHITESPACE
        .replace_all(&without_country, " ")
        .trim()
        .to_string()
}

/// Maps a free-text location onto a canonical voivodeship name.
///
/// Returns [`NO_DATA`] for missing input or when no variant matches.
#[must_use]
pub fn extract_region(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return NO_DATA.to_string();
    };

    let text = normalize_location(raw);
    VOIVODESHIPS
        .iter()
        .find(|(_, variants)| variants.iter().any(|v| text.contains(v)))
        .map_or_else(|| NO_DATA.to_string(), |(name, _)| (*name).to_string())
}
