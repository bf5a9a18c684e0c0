//! End-to-end similarity pipeline: validate, extract, cluster, score.

use super::error::EngineError;
use super::kmeans::{KMeansClusterer, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS};
use super::scorer::{AnnotatedTrack, SimilarityScorer, DEFAULT_NEIGHBORS_PER_TRACK};
use crate::catalog::{FeatureSet, Track};
use rayon::prelude::*;
use tracing::{debug, info};

/// How the cluster count is chosen for a run. The clusterer itself is
/// policy-free; the pipeline resolves this against the catalog size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCountPolicy {
    /// k = floor(sqrt(n)), at least 1. The domain default.
    SqrtOfCatalog,
    /// A caller-chosen fixed k, validated against the catalog size.
    Fixed(usize),
}

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub feature_set: FeatureSet,
    pub cluster_count: ClusterCountPolicy,
    /// Neighbors kept per track (K).
    pub neighbors_per_track: usize,
    pub max_iterations: usize,
    pub convergence_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            feature_set: FeatureSet::default(),
            cluster_count: ClusterCountPolicy::SqrtOfCatalog,
            neighbors_per_track: DEFAULT_NEIGHBORS_PER_TRACK,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

impl EngineSettings {
    fn resolve_cluster_count(&self, track_count: usize) -> usize {
        match self.cluster_count {
            ClusterCountPolicy::SqrtOfCatalog => ((track_count as f64).sqrt() as usize).max(1),
            ClusterCountPolicy::Fixed(k) => k,
        }
    }
}

/// Run the full pipeline over a catalog snapshot.
///
/// An empty catalog is a valid degenerate case and yields an empty result.
/// Invalid parameters are rejected before any computation starts. Output is
/// deterministic for a fixed input order: clusters in index order, members in
/// cluster order, so repeated runs produce identical results whether clusters
/// are scored sequentially or in parallel.
pub fn run_pipeline(
    tracks: &[Track],
    settings: &EngineSettings,
) -> Result<Vec<AnnotatedTrack>, EngineError> {
    if tracks.is_empty() {
        debug!("Empty catalog submitted, returning empty result");
        return Ok(Vec::new());
    }

    let k = settings.resolve_cluster_count(tracks.len());
    let vectors: Vec<Vec<f64>> = tracks
        .iter()
        .map(|track| settings.feature_set.extract(track))
        .collect();

    let clusterer = KMeansClusterer::new(k, settings.max_iterations, settings.convergence_threshold);
    let clusters = clusterer.cluster(&vectors)?;

    info!(
        "Clustered {} tracks into {} clusters (largest: {})",
        tracks.len(),
        clusters.iter().filter(|c| !c.is_empty()).count(),
        clusters.iter().map(|c| c.len()).max().unwrap_or(0)
    );

    // Clusters are independent after partitioning; scoring them in parallel
    // and collecting in cluster order keeps the output identical to a
    // sequential pass.
    let scorer = SimilarityScorer::new(settings.neighbors_per_track);
    let annotated: Vec<AnnotatedTrack> = clusters
        .par_iter()
        .map(|members| scorer.score_cluster(members, tracks, &vectors))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    Ok(annotated)
}
