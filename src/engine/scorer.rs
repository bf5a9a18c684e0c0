//! Within-cluster similarity ranking.

use super::metrics::cosine_similarity;
use crate::catalog::Track;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NEIGHBORS_PER_TRACK: usize = 10;

/// A ranked "songs like this one" edge. Not symmetric: A keeping B among its
/// top-K does not imply B keeps A.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimilarityEdge {
    pub isrc: String,
    pub score: f64,
}

/// A track annotated with its ranked neighbor list, at most K edges,
/// descending by score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotatedTrack {
    #[serde(flatten)]
    pub track: Track,
    pub similarities: Vec<SimilarityEdge>,
}

pub struct SimilarityScorer {
    neighbors_per_track: usize,
}

impl SimilarityScorer {
    pub fn new(neighbors_per_track: usize) -> Self {
        SimilarityScorer { neighbors_per_track }
    }

    /// Annotate every track of one cluster with its top-K neighbors from the
    /// same cluster.
    ///
    /// `members` are catalog indices in cluster order; `tracks` and `vectors`
    /// are catalog-aligned. O(m²) in the cluster size — clustering exists
    /// precisely to keep m small.
    ///
    /// Ties in score keep the earlier cluster position first (stable sort).
    /// A cluster with fewer than K+1 members yields however many neighbors
    /// exist; a singleton yields an empty list.
    pub fn score_cluster(
        &self,
        members: &[usize],
        tracks: &[Track],
        vectors: &[Vec<f64>],
    ) -> Vec<AnnotatedTrack> {
        members
            .iter()
            .map(|&subject| {
                let mut edges: Vec<SimilarityEdge> = members
                    .iter()
                    .filter(|&&other| other != subject)
                    .map(|&other| SimilarityEdge {
                        isrc: tracks[other].isrc.clone(),
                        score: cosine_similarity(&vectors[subject], &vectors[other]),
                    })
                    .collect();

                edges.sort_by(|a, b| b.score.total_cmp(&a.score));
                edges.truncate(self.neighbors_per_track);

                AnnotatedTrack {
                    track: tracks[subject].clone(),
                    similarities: edges,
                }
            })
            .collect()
    }
}
