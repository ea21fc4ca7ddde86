use std::sync::Arc;

use pvseries::installation::NewInstallation;
use pvseries::store::MemoryStore;
use pvseries::value::{Bucket, NewReport};
use pvseries::{QueryEngine, QueryError};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

fn report(produced: f32) -> NewReport {
    NewReport {
        produced_wattage: produced,
        household_wattage: 0.0,
        battery_wattage: 0.0,
        grid_wattage: 0.0,
    }
}

async fn seeded_store(reports: &[(OffsetDateTime, f32)]) -> (Arc<MemoryStore>, u64) {
    let store = Arc::new(MemoryStore::new());
    let installation = store
        .create_installation(
            NewInstallation {
                longitude: 15.4,
                latitude: 47.1,
                address: "Hauptplatz 1".to_owned(),
                owner_name: "Anna Gruber".to_owned(),
                comments: None,
            },
            datetime!(2024-01-01 00:00 UTC),
        )
        .await;
    for &(timestamp, produced) in reports {
        store
            .append_report(installation.id, report(produced), timestamp)
            .await
            .unwrap();
    }
    (store, installation.id)
}

#[tokio::test]
async fn timeline_pages_over_a_90_minute_window() {
    let window_start = datetime!(2024-01-01 00:00 UTC);
    let (store, id) = seeded_store(&[
        (datetime!(2024-01-01 00:05:00 UTC), 10.0),
        (datetime!(2024-01-01 00:05:30 UTC), 5.0),
    ])
    .await;
    let engine = QueryEngine::new(store);

    let page1 = engine.timeline(id, window_start, 90, 1).await.unwrap();
    assert_eq!(page1.len(), 60);
    assert_eq!(page1[5].produced_wattage, 15.0);
    assert_eq!(
        page1.iter().filter(|b| **b != Bucket::default()).count(),
        1
    );

    // The second page starts a full hour after the window start, past both
    // samples, and covers the 30-minute remainder.
    let page2 = engine.timeline(id, window_start, 90, 2).await.unwrap();
    assert_eq!(page2.len(), 30);
    assert!(page2.iter().all(|b| *b == Bucket::default()));

    let err = engine.timeline(id, window_start, 90, 3).await.unwrap_err();
    assert!(matches!(err, QueryError::OutOfRange(_)));
    assert_eq!(err.to_string(), "this page contains no elements");
}

#[tokio::test]
async fn timeline_rejects_malformed_arguments() {
    let window_start = datetime!(2024-01-01 00:00 UTC);
    let (store, id) = seeded_store(&[]).await;
    let engine = QueryEngine::new(store);

    let err = engine.timeline(id, window_start, 90, 0).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "`page` number must be greater than 0");

    let err = engine.timeline(id, window_start, 0, 1).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "`duration` must be greater than 0");
}

#[tokio::test]
async fn timeline_page_starts_advance_by_whole_hours() {
    let window_start = datetime!(2024-01-01 00:00 UTC);
    // One sample 30 minutes into the second hour.
    let (store, id) = seeded_store(&[(datetime!(2024-01-01 01:30:00 UTC), 7.0)]).await;
    let engine = QueryEngine::new(store);

    let page1 = engine.timeline(id, window_start, 120, 1).await.unwrap();
    assert!(page1.iter().all(|b| *b == Bucket::default()));

    // page_start(2) = window_start + 1 hour, so the sample lands in slot 30.
    let page2 = engine.timeline(id, window_start, 120, 2).await.unwrap();
    assert_eq!(page2.len(), 60);
    assert_eq!(page2[30].produced_wattage, 7.0);
}

#[tokio::test]
async fn timeline_boundary_sample_belongs_to_one_page_only() {
    let window_start = datetime!(2024-01-01 00:00 UTC);
    // Exactly on the boundary between page 1 and page 2.
    let (store, id) = seeded_store(&[(datetime!(2024-01-01 01:00:00 UTC), 3.0)]).await;
    let engine = QueryEngine::new(store);

    let page1 = engine.timeline(id, window_start, 120, 1).await.unwrap();
    assert!(page1.iter().all(|b| *b == Bucket::default()));

    let page2 = engine.timeline(id, window_start, 120, 2).await.unwrap();
    assert_eq!(page2[0].produced_wattage, 3.0);
}

#[tokio::test]
async fn timeline_short_single_page_window() {
    let window_start = datetime!(2024-01-01 00:00 UTC);
    let (store, id) = seeded_store(&[(datetime!(2024-01-01 00:14:59 UTC), 2.0)]).await;
    let engine = QueryEngine::new(store);

    let page = engine.timeline(id, window_start, 15, 1).await.unwrap();
    assert_eq!(page.len(), 15);
    assert_eq!(page[14].produced_wattage, 2.0);

    let err = engine.timeline(id, window_start, 15, 2).await.unwrap_err();
    assert!(matches!(err, QueryError::OutOfRange(_)));
}

#[tokio::test]
async fn produced_sum_is_inclusive_on_both_ends() {
    let from = datetime!(2024-01-01 00:00 UTC);
    let (store, id) = seeded_store(&[
        (from, 1.0),
        (from + Duration::minutes(30), 2.0),
        (from + Duration::minutes(60), 4.0),
        (from + Duration::minutes(60) + Duration::seconds(1), 8.0),
    ])
    .await;
    let engine = QueryEngine::new(store);

    // The sample sitting exactly on `from + 60min` is included.
    assert_eq!(engine.produced_sum(id, from, 60).await.unwrap(), 7.0);
    assert_eq!(engine.produced_sum(id, from, 61).await.unwrap(), 15.0);
}

#[tokio::test]
async fn produced_sum_of_empty_range_is_zero() {
    let from = datetime!(2024-01-01 00:00 UTC);
    let (store, id) = seeded_store(&[]).await;
    let engine = QueryEngine::new(store);

    assert_eq!(engine.produced_sum(id, from, 90).await.unwrap(), 0.0);
    // A negative duration yields an empty interval, not an error.
    assert_eq!(engine.produced_sum(id, from, -5).await.unwrap(), 0.0);
}

#[tokio::test]
async fn produced_sum_matches_manual_enumeration() {
    let from = datetime!(2024-01-01 00:00 UTC);
    let reports: Vec<(OffsetDateTime, f32)> = (0..200)
        .map(|i| (from + Duration::seconds(i * 37), (i % 13) as f32))
        .collect();
    let (store, id) = seeded_store(&reports).await;
    let engine = QueryEngine::new(store);

    let to = from + Duration::minutes(90);
    let expected: f32 = reports
        .iter()
        .filter(|(t, _)| *t >= from && *t <= to)
        .map(|(_, w)| w)
        .sum();
    assert_eq!(engine.produced_sum(id, from, 90).await.unwrap(), expected);
}

#[tokio::test]
async fn produced_sum_of_unknown_installation_is_not_found() {
    let from = datetime!(2024-01-01 00:00 UTC);
    let (store, _) = seeded_store(&[]).await;
    let engine = QueryEngine::new(store);

    let err = engine.produced_sum(99, from, 90).await.unwrap_err();
    assert!(matches!(err, QueryError::NotFound(99)));
}

#[tokio::test]
async fn timeline_of_unknown_installation_is_all_zero() {
    // The timeline endpoint never looks up the installation; an unknown id
    // behaves like one without samples.
    let window_start = datetime!(2024-01-01 00:00 UTC);
    let (store, _) = seeded_store(&[]).await;
    let engine = QueryEngine::new(store);

    let page = engine.timeline(99, window_start, 60, 1).await.unwrap();
    assert_eq!(page, vec![Bucket::default(); 60]);
}
