//! Wellness score aggregation.
//!
//! Pure computation over whichever analysis snapshots are currently
//! available. Nothing here caches or mutates; callers recompute on each
//! input change.

use crate::models::{ContentAnalysis, MusicAnalysis};
use std::fmt;

/// Qualitative band for a 0-100 wellness score.
///
/// Boundaries are strict: 65 is Moderate, 66 is Good; 40 is NeedsAttention,
/// 41 is Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Good,
    Moderate,
    NeedsAttention,
}

impl Band {
    pub fn of(score: i64) -> Self {
        if score > 65 {
            Band::Good
        } else if score > 40 {
            Band::Moderate
        } else {
            Band::NeedsAttention
        }
    }

    /// Dashboard-style headline for the overall score.
    pub fn headline(&self) -> &'static str {
        match self {
            Band::Good => "Good Mental Wellness",
            Band::Moderate => "Moderate - Worth Monitoring",
            Band::NeedsAttention => "Needs Attention",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Good => write!(f, "good"),
            Band::Moderate => write!(f, "moderate"),
            Band::NeedsAttention => write!(f, "needs attention"),
        }
    }
}

/// Music contribution to the overall score: valence scaled to 0-100.
pub fn music_contribution(analysis: &MusicAnalysis) -> f64 {
    analysis.avg_valence * 100.0
}

/// Content contribution to the overall score (already 0-100).
pub fn content_contribution(analysis: &ContentAnalysis) -> f64 {
    analysis.emotional_diet_score
}

/// Overall wellness score: mean of the available contributions, rounded to
/// the nearest integer.
///
/// Returns `None` when no source has produced an analysis yet. An absent
/// score is not a zero score and must never be rendered as one.
pub fn overall_score(
    music: Option<&MusicAnalysis>,
    content: Option<&ContentAnalysis>,
) -> Option<i64> {
    let mut contributions = Vec::with_capacity(2);
    if let Some(m) = music {
        contributions.push(music_contribution(m));
    }
    if let Some(c) = content {
        contributions.push(content_contribution(c));
    }

    if contributions.is_empty() {
        return None;
    }

    let mean = contributions.iter().sum::<f64>() / contributions.len() as f64;
    Some(mean.round() as i64)
}

/// Band for a valence-derived per-source display (valence scaled to 0-100
/// and rounded, then banded identically to the overall score).
pub fn valence_band(avg_valence: f64) -> Band {
    Band::of((avg_valence * 100.0).round() as i64)
}
