//! End-to-end tests for the similarity pipeline and its task bridge.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

use songmap_engine::catalog::Track;
use songmap_engine::engine::{
    run_pipeline, ClusterCountPolicy, EngineError, EngineSettings,
};
use songmap_engine::task::ComputationTask;

fn track(isrc: &str, metrics: &[(&str, f64)]) -> Track {
    Track {
        isrc: isrc.to_string(),
        title: format!("title {}", isrc),
        artist: "artist".to_string(),
        album: "album".to_string(),
        release_date: Some("2024-06-01".to_string()),
        is_explicit: false,
        metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

fn synthetic_catalog(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            track(
                &format!("ISRC{:04}", i),
                &[
                    ("spotify_streams", (i * 31 % 101) as f64 * 1_000.0),
                    ("youtube_views", (i * 17 % 59) as f64 * 500.0),
                    ("tiktok_views", (i * 7 % 23) as f64 * 2_000.0),
                    ("shazam_counts", (i % 13) as f64 * 40.0),
                ],
            )
        })
        .collect()
}

fn settings_with_k(k: usize) -> EngineSettings {
    EngineSettings {
        cluster_count: ClusterCountPolicy::Fixed(k),
        ..EngineSettings::default()
    }
}

// ============================================================================
// Pipeline scenarios
// ============================================================================

#[test]
fn identical_tracks_score_a_perfect_one() {
    // A and B carry identical metrics; C sits at the origin. With k=1 all
    // three land in a single cluster, B's best neighbor is A at 1.0 and C's
    // edges score 0.0 under the zero-norm policy.
    let tracks = vec![
        track("AAA", &[("spotify_streams", 100.0), ("youtube_views", 50.0)]),
        track("BBB", &[("spotify_streams", 100.0), ("youtube_views", 50.0)]),
        track("CCC", &[("spotify_streams", 0.0), ("youtube_views", 0.0)]),
    ];

    let result = run_pipeline(&tracks, &settings_with_k(1)).unwrap();
    assert_eq!(result.len(), 3);

    let b = result.iter().find(|a| a.track.isrc == "BBB").unwrap();
    assert_eq!(b.similarities[0].isrc, "AAA");
    assert!((b.similarities[0].score - 1.0).abs() < 1e-12);

    let c = result.iter().find(|a| a.track.isrc == "CCC").unwrap();
    assert!(c.similarities.iter().all(|e| e.score == 0.0));
    assert!(c.similarities.iter().all(|e| e.score < b.similarities[0].score));
}

#[test]
fn k_greater_than_track_count_is_invalid() {
    let tracks = synthetic_catalog(4);
    let result = run_pipeline(&tracks, &settings_with_k(10));
    assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
}

#[test]
fn empty_catalog_returns_empty_result_without_error() {
    let result = run_pipeline(&[], &EngineSettings::default()).unwrap();
    assert!(result.is_empty());
}

#[test]
fn singleton_catalog_yields_empty_neighbor_list() {
    let tracks = vec![track("SOLO", &[("spotify_streams", 42.0)])];
    let result = run_pipeline(&tracks, &settings_with_k(1)).unwrap();
    assert_eq!(result.len(), 1);
    assert!(result[0].similarities.is_empty());
}

#[test]
fn every_track_appears_exactly_once_and_never_as_its_own_neighbor() {
    let tracks = synthetic_catalog(60);
    let result = run_pipeline(&tracks, &EngineSettings::default()).unwrap();

    assert_eq!(result.len(), tracks.len());
    let mut seen: Vec<&str> = result.iter().map(|a| a.track.isrc.as_str()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), tracks.len());

    for annotated in &result {
        assert!(annotated
            .similarities
            .iter()
            .all(|e| e.isrc != annotated.track.isrc));
    }
}

#[test]
fn neighbor_lists_are_capped_sorted_and_within_unit_interval() {
    let tracks = synthetic_catalog(80);
    let result = run_pipeline(&tracks, &EngineSettings::default()).unwrap();

    for annotated in &result {
        assert!(annotated.similarities.len() <= 10);
        for edge in &annotated.similarities {
            assert!(edge.score >= 0.0 && edge.score <= 1.0);
        }
        for pair in annotated.similarities.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn pipeline_output_is_byte_identical_across_runs() {
    let tracks = synthetic_catalog(100);
    let settings = EngineSettings::default();

    let first = serde_json::to_vec(&run_pipeline(&tracks, &settings).unwrap()).unwrap();
    let second = serde_json::to_vec(&run_pipeline(&tracks, &settings).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_metrics_are_treated_as_zero() {
    // One track carries no metrics at all; it must still cluster and score.
    let tracks = vec![
        track("FULL", &[("spotify_streams", 10.0)]),
        track("EMPTY", &[]),
        track("ALSO", &[("spotify_streams", 20.0)]),
    ];
    let result = run_pipeline(&tracks, &settings_with_k(1)).unwrap();

    let empty = result.iter().find(|a| a.track.isrc == "EMPTY").unwrap();
    assert_eq!(empty.similarities.len(), 2);
    assert!(empty.similarities.iter().all(|e| e.score == 0.0));
}

// ============================================================================
// Computation task contract
// ============================================================================

#[tokio::test]
async fn task_delivers_single_complete_result() {
    let task = ComputationTask::new(EngineSettings::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    task.on_result(move |outcome| {
        let _ = tx.send(outcome);
    });

    task.submit(synthetic_catalog(25));

    let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no result delivered")
        .expect("channel closed");
    assert_eq!(outcome.unwrap().len(), 25);
}

#[tokio::test]
async fn rapid_resubmits_deliver_only_the_final_run() {
    let task = ComputationTask::new(EngineSettings::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    task.on_result(move |outcome| {
        let _ = tx.send(outcome.map(|a| a.len()));
    });

    // Large catalogs keep the early runs in flight long enough for the later
    // submits to supersede them.
    task.submit(synthetic_catalog(2000));
    task.submit(synthetic_catalog(2500));
    task.submit(synthetic_catalog(9));

    let delivered = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no result delivered")
        .expect("channel closed");
    assert_eq!(delivered.unwrap(), 9);

    let extra = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(extra.is_err(), "a superseded run leaked its result");
}

#[test]
fn annotated_output_round_trips_through_serde() {
    let tracks = vec![
        track("AAA", &[("spotify_streams", 5.0)]),
        track("BBB", &[("spotify_streams", 7.0)]),
    ];
    let result = run_pipeline(&tracks, &settings_with_k(1)).unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let parsed: Vec<HashMap<String, serde_json::Value>> = serde_json::from_str(&json).unwrap();
    // Track fields are flattened next to the similarity list, matching what
    // the visualization boundary consumes.
    assert!(parsed[0].contains_key("isrc"));
    assert!(parsed[0].contains_key("similarities"));
}
