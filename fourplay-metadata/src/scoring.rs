//! Heuristic scores derived from normalized provider records
//!
//! Every function here is pure and bounded to [0, 1]. Raw upstream
//! similarity values (`score`, `match`) are deliberately not touched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Year gap at which the era score reaches zero
pub const ERA_WINDOW_YEARS: f64 = 10.0;

/// Similar-artist count at which the listener weight saturates
pub const LISTENER_SATURATION: usize = 10;

/// Release count at which the style score saturates
pub const STYLE_SATURATION: usize = 50;

/// Top-track count at which popularity saturates
pub const POPULARITY_SATURATION: usize = 5;

/// Continuity score awarded to any artist with a non-empty catalog
pub const CONTINUITY_STEP: f64 = 0.6;

/// Relation score awarded when the registry reports relation data
pub const RELATION_PRESENT: f64 = 0.5;

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(19|20)\d{2}").expect("year pattern is valid"));

/// Closeness of a track's year to the content year
///
/// Zero in either argument means "unknown" and yields 0. Otherwise decays
/// linearly from 1.0 (same year) to 0.0 at a ten-year gap.
pub fn era_score(track_year: i32, content_year: i32) -> f64 {
    if track_year == 0 || content_year == 0 {
        return 0.0;
    }
    let diff = f64::from((track_year - content_year).abs());
    (1.0 - diff / ERA_WINDOW_YEARS).max(0.0)
}

/// First 4-digit 19xx/20xx year in free text, 0 if none
pub fn extract_year(text: &str) -> i32 {
    YEAR_PATTERN
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

pub fn relation_score(has_relations: bool) -> f64 {
    if has_relations {
        RELATION_PRESENT
    } else {
        0.0
    }
}

fn saturating_ratio(count: usize, saturation: usize) -> f64 {
    (count as f64 / saturation as f64).min(1.0)
}

pub fn listener_weight(similar_count: usize) -> f64 {
    saturating_ratio(similar_count, LISTENER_SATURATION)
}

pub fn overlap(similar_count: usize) -> u8 {
    u8::from(similar_count > 0)
}

pub fn style_score(release_count: usize) -> f64 {
    saturating_ratio(release_count, STYLE_SATURATION)
}

/// Step function over the style score: no intermediate values
pub fn continuity_score(style_score: f64) -> f64 {
    if style_score > 0.0 {
        CONTINUITY_STEP
    } else {
        0.0
    }
}

pub fn popularity(top_track_count: usize) -> f64 {
    saturating_ratio(top_track_count, POPULARITY_SATURATION)
}
