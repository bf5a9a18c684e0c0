//! K-means clustering over feature vectors.
//!
//! Seeding is deterministic: the first k input vectors become the initial
//! centroids. That makes every run reproducible for a fixed input order, at
//! the cost of poor cluster quality for adversarial orderings — a known,
//! accepted limitation. Each iteration derives a fresh snapshot of
//! assignments and centroids from the previous one; nothing is mutated in
//! place across iterations.

use super::error::EngineError;
use super::metrics::euclidean_distance;
use tracing::debug;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.001;

pub struct KMeansClusterer {
    k: usize,
    max_iterations: usize,
    convergence_threshold: f64,
}

/// One iteration's view of the clustering: member indices per cluster plus
/// the centroids those members were assigned against.
struct Snapshot {
    clusters: Vec<Vec<usize>>,
    centroids: Vec<Vec<f64>>,
}

impl KMeansClusterer {
    pub fn new(k: usize, max_iterations: usize, convergence_threshold: f64) -> Self {
        KMeansClusterer {
            k,
            max_iterations,
            convergence_threshold,
        }
    }

    /// Partition `vectors` into k ordered, non-overlapping groups of indices.
    /// Some groups may be empty if their centroid never won an assignment.
    ///
    /// Fails with `InvalidParameter` when k is zero or exceeds the number of
    /// vectors; never fails otherwise.
    pub fn cluster(&self, vectors: &[Vec<f64>]) -> Result<Vec<Vec<usize>>, EngineError> {
        if self.k == 0 {
            return Err(EngineError::InvalidParameter(
                "cluster count must be at least 1".to_string(),
            ));
        }
        if self.k > vectors.len() {
            return Err(EngineError::InvalidParameter(format!(
                "cluster count {} exceeds track count {}",
                self.k,
                vectors.len()
            )));
        }

        let mut centroids: Vec<Vec<f64>> = vectors[..self.k].to_vec();
        let mut clusters = assign(vectors, &centroids);

        for iteration in 0..self.max_iterations {
            let snapshot = self.step(vectors, &clusters, &centroids);

            let max_movement = centroids
                .iter()
                .zip(snapshot.centroids.iter())
                .map(|(old, new)| euclidean_distance(old, new))
                .fold(0.0_f64, f64::max);

            clusters = snapshot.clusters;
            centroids = snapshot.centroids;

            if max_movement < self.convergence_threshold {
                debug!(
                    "K-means converged after {} iterations (max centroid movement {:.6})",
                    iteration + 1,
                    max_movement
                );
                break;
            }
        }

        Ok(clusters)
    }

    /// Derive the next snapshot: recompute centroids from the previous
    /// assignments, then reassign every vector against them.
    fn step(&self, vectors: &[Vec<f64>], clusters: &[Vec<usize>], centroids: &[Vec<f64>]) -> Snapshot {
        let new_centroids: Vec<Vec<f64>> = clusters
            .iter()
            .zip(centroids.iter())
            .map(|(members, previous)| {
                if members.is_empty() {
                    // An empty cluster keeps its previous centroid rather
                    // than collapsing to NaN.
                    previous.clone()
                } else {
                    mean_vector(vectors, members)
                }
            })
            .collect();

        let new_clusters = assign(vectors, &new_centroids);

        Snapshot {
            clusters: new_clusters,
            centroids: new_centroids,
        }
    }
}

/// Assign every vector to its nearest centroid. Centroids are scanned in
/// index order and only a strictly smaller distance replaces the current
/// winner, so ties resolve to the lowest centroid index.
fn assign(vectors: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
    for (index, vector) in vectors.iter().enumerate() {
        let mut best = 0;
        let mut best_distance = euclidean_distance(vector, &centroids[0]);
        for (candidate, centroid) in centroids.iter().enumerate().skip(1) {
            let distance = euclidean_distance(vector, centroid);
            if distance < best_distance {
                best = candidate;
                best_distance = distance;
            }
        }
        clusters[best].push(index);
    }
    clusters
}

fn mean_vector(vectors: &[Vec<f64>], members: &[usize]) -> Vec<f64> {
    let dimensions = vectors[members[0]].len();
    let mut mean = vec![0.0; dimensions];
    for &member in members {
        for (slot, value) in mean.iter_mut().zip(vectors[member].iter()) {
            *slot += value;
        }
    }
    for slot in mean.iter_mut() {
        *slot /= members.len() as f64;
    }
    mean
}
