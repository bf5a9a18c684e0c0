//! Feature set definition and vector extraction.
//!
//! A feature set is an ordered list of metric names. Every vector compared in
//! one run is extracted against the same set, so positions line up across the
//! whole catalog.

use super::Track;
use serde::{Deserialize, Serialize};

/// Popularity metrics used for similarity math, in canonical order.
pub const DEFAULT_FEATURES: [&str; 23] = [
    "all_time_rank",
    "track_score",
    "spotify_streams",
    "spotify_playlist_count",
    "spotify_playlist_reach",
    "spotify_popularity",
    "youtube_views",
    "youtube_likes",
    "tiktok_posts",
    "tiktok_likes",
    "tiktok_views",
    "youtube_playlist_reach",
    "apple_music_playlist_count",
    "airplay_spins",
    "siriusxm_spins",
    "deezer_playlist_count",
    "deezer_playlist_reach",
    "amazon_playlist_count",
    "pandora_streams",
    "pandora_track_stations",
    "soundcloud_streams",
    "shazam_counts",
    "tidal_popularity",
];

/// Ordered, fixed list of metric names. Order is significant: it defines the
/// layout of every extracted vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureSet {
    names: Vec<String>,
}

impl Default for FeatureSet {
    fn default() -> Self {
        FeatureSet {
            names: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FeatureSet {
    pub fn new(names: Vec<String>) -> Self {
        FeatureSet { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Extract a track's feature vector, one entry per feature in set order.
    /// Total: metrics the track does not carry extract as 0.0.
    pub fn extract(&self, track: &Track) -> Vec<f64> {
        self.names.iter().map(|name| track.metric(name)).collect()
    }
}
