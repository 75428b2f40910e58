//! Best-effort field extractors
//!
//! Every extractor maps free text to `Option`: `None` means the value could not be read, never
//! an error.

use crate::models::FuelType;
use regex::Regex;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("hardcoded regex pattern is valid"));

static YEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("hardcoded regex pattern is valid")
});

static POWER_KW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*kw").expect("hardcoded regex pattern is valid"));

/// Returns the first digit run after stripping `,` and `.` thousands separators
pub fn first_number(text: &str) -> Option<u64> {
    let stripped: String = text.chars().filter(|c| *c != ',' && *c != '.').collect();
    DIGIT_RUN
        .find(&stripped)
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses a price such as `€ 3,950`
pub fn extract_price(text: &str) -> Option<u64> {
    first_number(text)
}

/// Parses a mileage such as `239,000 km`
///
/// Values below `scale_below` are shown abbreviated in thousands and are multiplied by
/// `scale_factor`.
pub fn extract_mileage(text: &str, scale_below: u64, scale_factor: u64) -> Option<u64> {
    let km = first_number(text)?;
    if km < scale_below {
        return km.checked_mul(scale_factor);
    }
    Some(km)
}

/// Returns the first standalone 19xx/20xx token, e.g. `2015` from `11/2015`
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_TOKEN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Returns the digit run immediately before a `kW` marker, e.g. `55` from `55 kW (75 hp)`
pub fn extract_power_kw(text: &str) -> Option<u32> {
    POWER_KW
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Returns the first digit run as a small count, for seats and doors
pub fn extract_count(text: &str) -> Option<u8> {
    DIGIT_RUN
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Fuel keywords in priority order; the first class with a matching keyword wins
pub const FUEL_KEYWORDS: &[(FuelType, &[&str])] = &[
    (FuelType::Diesel, &["diesel"]),
    (FuelType::Petrol, &["gasoline", "benzine", "petrol"]),
    (FuelType::Electric, &["electric", "elektrisch"]),
    (FuelType::Hybrid, &["hybrid"]),
];

/// Classifies a fuel description by keyword, or `None` when no keyword matches
pub fn classify_fuel(text: &str) -> Option<FuelType> {
    let lower = text.to_lowercase();
    FUEL_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(fuel, _)| *fuel)
}

/// Finds the longest brand token occurring as a whole word in `title`
///
/// Matching is case-insensitive. On equal length the earlier table entry wins.
pub fn extract_brand<'a>(title: &str, brands: &'a [(String, String)]) -> Option<&'a str> {
    let lower = title.to_lowercase();

    brands
        .iter()
        .filter(|(token, _)| contains_word(&lower, token))
        .fold(None::<&(String, String)>, |best, entry| match best {
            Some(b) if b.0.len() >= entry.0.len() => Some(b),
            _ => Some(entry),
        })
        .map(|(_, name)| name.as_str())
}

fn contains_word(haystack: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }

    haystack.match_indices(token).any(|(start, _)| {
        let end = start + token.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
