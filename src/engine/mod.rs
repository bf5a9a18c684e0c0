//! Similarity computation engine.
//!
//! Pipeline: extract feature vectors, partition the catalog with k-means,
//! then rank within-cluster cosine similarity and keep the top-K neighbors
//! per track. Clustering exists to bound the O(m²) scoring step well below
//! the full catalog size.

mod error;
mod kmeans;
mod metrics;
mod pipeline;
mod scorer;

pub use error::EngineError;
pub use kmeans::KMeansClusterer;
pub use metrics::{cosine_similarity, euclidean_distance};
pub use pipeline::{run_pipeline, ClusterCountPolicy, EngineSettings};
pub use scorer::{AnnotatedTrack, SimilarityEdge, SimilarityScorer};
