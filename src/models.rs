//! Data models for the MindWatch client.
//!
//! This module contains the payload types exchanged with the MindWatch
//! backend: the user identity with its per-source connection flags, and
//! the analysis snapshots produced by each connector.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Authenticated user identity, including per-source connection flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: String,
    /// Whether the Spotify connector has been linked.
    #[serde(default)]
    pub spotify_connected: bool,
    #[serde(default)]
    pub google_fit_connected: bool,
    #[serde(default)]
    pub notion_connected: bool,
}

impl UserProfile {
    /// First name, for greeting displays.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Music-listening analysis returned by the Spotify connector.
///
/// Valence, energy and danceability are fractional (0..1); they are
/// stored exactly as received and only scaled or clamped at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicAnalysis {
    pub total_tracks_analyzed: usize,
    pub avg_valence: f64,
    pub avg_energy: f64,
    pub avg_tempo: f64,
    pub avg_danceability: f64,
    pub late_night_listening_ratio: f64,
    pub emotional_tone: String,
    /// Raw recently-played items, passed through untouched to displays.
    #[serde(default)]
    pub recently_played: Vec<serde_json::Value>,
}

/// Tag on a content insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Positive,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Warning => write!(f, "warning"),
            InsightKind::Positive => write!(f, "positive"),
        }
    }
}

/// One insight line attached to a content analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub message: String,
}

/// Watch-history analysis returned by the YouTube connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// 0..100 aggregate of the emotional quality of consumed content.
    pub emotional_diet_score: f64,
    pub dark_content_percentage: f64,
    pub total_videos_analyzed: usize,
    pub recovery_score: f64,
    pub rumination_score: f64,
    /// Category name to percentage of watched videos.
    #[serde(default)]
    pub category_breakdown: HashMap<String, f64>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    pub content_mood: String,
}

/// Clamp a stored value into 0..=100 for percentage displays.
///
/// Stored analysis values are never clamped; this is for presentation only.
pub fn display_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
