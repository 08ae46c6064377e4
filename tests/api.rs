use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use festival_manager::{
    error::{AppError, EntityKind},
    models::{EventPatch, FestivalPatch, NewEvent, NewFestival},
    seed::seed_demo_data,
    service::{validate_event_window, FestivalService},
    store::SqliteStore,
};

async fn service() -> FestivalService {
    let store = SqliteStore::in_memory().await.unwrap();
    FestivalService::new(Arc::new(store))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ts(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

fn summer_festival() -> NewFestival {
    NewFestival {
        name: "Summer Music Festival".into(),
        kind: "Music".into(),
        description: Some("Annual summer music festival".into()),
        start_date: date(2023, 7, 15),
        end_date: date(2023, 7, 17),
        location: "Central Park, New York".into(),
        is_active: true,
    }
}

fn opening_concert(festival_id: i64) -> NewEvent {
    NewEvent {
        name: "Opening Concert".into(),
        description: None,
        start_time: ts("2023-07-15T18:00:00Z"),
        end_time: ts("2023-07-15T23:00:00Z"),
        location: "Main Stage".into(),
        capacity: 10_000,
        festival_id,
    }
}

#[tokio::test]
async fn create_then_get_festival_round_trips() {
    let service = service().await;
    let input = summer_festival();
    let created = service.create_festival(input.clone()).await.unwrap();
    assert!(created.id > 0);

    let fetched = service.get_festival(created.id, Utc::now()).await.unwrap();
    assert_eq!(fetched.festival.name, input.name);
    assert_eq!(fetched.festival.kind, input.kind);
    assert_eq!(fetched.festival.description, input.description);
    assert_eq!(fetched.festival.start_date, input.start_date);
    assert_eq!(fetched.festival.end_date, input.end_date);
    assert_eq!(fetched.festival.location, input.location);
    assert!(fetched.festival.is_active);
    assert!(fetched.events.is_empty());
}

#[tokio::test]
async fn festival_with_inverted_dates_is_rejected() {
    let service = service().await;
    let mut input = summer_festival();
    input.start_date = date(2023, 7, 18);
    let err = service.create_festival(input).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInterval(_)), "got {err}");
}

#[tokio::test]
async fn festival_with_empty_name_is_rejected() {
    let service = service().await;
    let mut input = summer_festival();
    input.name = "  ".into();
    let err = service.create_festival(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation("name", _)), "got {err}");
}

#[tokio::test]
async fn failed_festival_update_leaves_record_unchanged() {
    let service = service().await;
    let created = service.create_festival(summer_festival()).await.unwrap();

    let patch = FestivalPatch {
        end_date: Some(date(2023, 7, 10)),
        ..Default::default()
    };
    let err = service.update_festival(created.id, patch).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInterval(_)), "got {err}");

    let stored = service.get_festival(created.id, Utc::now()).await.unwrap();
    assert_eq!(stored.festival, created);
}

#[tokio::test]
async fn festival_update_merges_absent_fields() {
    let service = service().await;
    let created = service.create_festival(summer_festival()).await.unwrap();

    let patch = FestivalPatch {
        location: Some("Prospect Park, Brooklyn".into()),
        ..Default::default()
    };
    let updated = service.update_festival(created.id, patch).await.unwrap();
    assert_eq!(updated.location, "Prospect Park, Brooklyn");
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.start_date, created.start_date);
}

#[tokio::test]
async fn event_inside_festival_window_is_created() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();

    let event = service.create_event(opening_concert(festival.id)).await.unwrap();
    assert!(event.id > 0);
    assert_eq!(event.festival_id, festival.id);

    let detail = service.get_event(event.id, Utc::now()).await.unwrap();
    assert_eq!(detail.festival.id, festival.id);
    assert_eq!(detail.festival.name, festival.name);
}

#[tokio::test]
async fn event_before_festival_window_fails_out_of_range() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();

    let mut input = opening_concert(festival.id);
    input.start_time = ts("2023-07-14T10:00:00Z");
    input.end_time = ts("2023-07-14T12:00:00Z");
    let err = service.create_event(input).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfRange(_)), "got {err}");

    // No record was created.
    let events = service.list_events(Some(festival.id), Utc::now()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn event_for_unknown_festival_fails_not_found() {
    let service = service().await;
    let err = service.create_event(opening_concert(999)).await.unwrap_err();
    assert!(
        matches!(err, AppError::NotFound(EntityKind::Festival, 999)),
        "got {err}"
    );
    let events = service.list_events(None, Utc::now()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn event_with_inverted_times_fails_invalid_interval() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();

    let mut input = opening_concert(festival.id);
    input.start_time = ts("2023-07-15T23:00:00Z");
    input.end_time = ts("2023-07-15T18:00:00Z");
    let err = service.create_event(input).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInterval(_)), "got {err}");
}

#[tokio::test]
async fn negative_capacity_is_rejected() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();

    let mut input = opening_concert(festival.id);
    input.capacity = -1;
    let err = service.create_event(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation("capacity", _)), "got {err}");
}

#[tokio::test]
async fn end_time_only_patch_is_validated_against_merged_window() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();
    let event = service.create_event(opening_concert(festival.id)).await.unwrap();

    // The patch omits startTime; the merged candidate must still be checked.
    let patch = EventPatch {
        end_time: Some(ts("2023-07-18T01:00:00Z")),
        ..Default::default()
    };
    let err = service.update_event(event.id, patch).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfRange(_)), "got {err}");

    let stored = service.get_event(event.id, Utc::now()).await.unwrap();
    assert_eq!(stored.event.end_time, event.end_time);
}

#[tokio::test]
async fn moving_event_to_another_festival_revalidates_window() {
    let service = service().await;
    let summer = service.create_festival(summer_festival()).await.unwrap();
    let mut autumn = summer_festival();
    autumn.name = "Autumn Jazz Days".into();
    autumn.start_date = date(2023, 10, 1);
    autumn.end_date = date(2023, 10, 3);
    let autumn = service.create_festival(autumn).await.unwrap();

    let event = service.create_event(opening_concert(summer.id)).await.unwrap();

    // The July time window does not fit the October festival.
    let patch = EventPatch {
        festival_id: Some(autumn.id),
        ..Default::default()
    };
    let err = service.update_event(event.id, patch).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfRange(_)), "got {err}");

    // Moving the times along with the festival succeeds.
    let patch = EventPatch {
        festival_id: Some(autumn.id),
        start_time: Some(ts("2023-10-01T18:00:00Z")),
        end_time: Some(ts("2023-10-01T21:00:00Z")),
        ..Default::default()
    };
    let moved = service.update_event(event.id, patch).await.unwrap();
    assert_eq!(moved.festival_id, autumn.id);
}

#[tokio::test]
async fn list_events_filters_and_orders_by_start_time() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();
    let mut other = summer_festival();
    other.name = "Tech Conference".into();
    other.kind = "Technology".into();
    other.start_date = date(2023, 9, 20);
    other.end_date = date(2023, 9, 22);
    let other = service.create_festival(other).await.unwrap();

    // Inserted out of chronological order.
    let mut late = opening_concert(festival.id);
    late.name = "Closing Set".into();
    late.start_time = ts("2023-07-17T18:00:00Z");
    late.end_time = ts("2023-07-17T22:00:00Z");
    service.create_event(late).await.unwrap();

    service.create_event(opening_concert(festival.id)).await.unwrap();

    let mut keynote = opening_concert(other.id);
    keynote.name = "Keynote".into();
    keynote.start_time = ts("2023-09-20T09:00:00Z");
    keynote.end_time = ts("2023-09-20T10:30:00Z");
    service.create_event(keynote).await.unwrap();

    let filtered = service.list_events(Some(festival.id), Utc::now()).await.unwrap();
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].event.name, "Opening Concert");
    assert_eq!(filtered[1].event.name, "Closing Set");
    assert!(filtered.iter().all(|detail| detail.event.festival_id == festival.id));
    assert_eq!(filtered[0].festival.name, "Summer Music Festival");

    let all = service.list_events(None, Utc::now()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].event.start_time <= pair[1].event.start_time));
}

#[tokio::test]
async fn festivals_list_in_date_order_with_id_tiebreak() {
    let service = service().await;

    // Created out of chronological order; the expo gets the lowest id.
    let mut expo = summer_festival();
    expo.name = "Food & Wine Expo".into();
    expo.kind = "Food & Drink".into();
    expo.start_date = date(2023, 10, 10);
    expo.end_date = date(2023, 10, 12);
    let expo = service.create_festival(expo).await.unwrap();

    let summer_a = service.create_festival(summer_festival()).await.unwrap();

    // Same start date as summer_a; the id breaks the tie.
    let mut summer_b = summer_festival();
    summer_b.name = "Street Food Weekend".into();
    let summer_b = service.create_festival(summer_b).await.unwrap();

    let listed = service.list_festivals(Utc::now()).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|detail| detail.festival.id).collect();
    assert_eq!(ids, vec![summer_a.id, summer_b.id, expo.id]);
}

#[tokio::test]
async fn seeding_twice_does_not_duplicate_demo_data() {
    let service = service().await;
    seed_demo_data(&service).await.unwrap();
    seed_demo_data(&service).await.unwrap();

    let festivals = service.list_festivals(Utc::now()).await.unwrap();
    assert_eq!(festivals.len(), 3);
    let events = service.list_events(None, Utc::now()).await.unwrap();
    assert_eq!(events.len(), 6);
}

#[tokio::test]
async fn festival_listing_attaches_event_summaries() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();
    service.create_event(opening_concert(festival.id)).await.unwrap();

    let festivals = service.list_festivals(Utc::now()).await.unwrap();
    assert_eq!(festivals.len(), 1);
    assert_eq!(festivals[0].events.len(), 1);
    assert_eq!(festivals[0].events[0].name, "Opening Concert");
}

#[tokio::test]
async fn deleting_festival_with_events_is_rejected() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();
    let event = service.create_event(opening_concert(festival.id)).await.unwrap();

    let err = service.delete_festival(festival.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation("festivalId", _)), "got {err}");

    // Still present.
    assert!(service.get_festival(festival.id, Utc::now()).await.is_ok());

    // After the event is gone the delete goes through.
    service.delete_event(event.id).await.unwrap();
    service.delete_festival(festival.id).await.unwrap();
    let err = service.get_festival(festival.id, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(EntityKind::Festival, _)), "got {err}");
}

#[tokio::test]
async fn deleting_event_leaves_festival_alone() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();
    let event = service.create_event(opening_concert(festival.id)).await.unwrap();

    service.delete_event(event.id).await.unwrap();
    let err = service.get_event(event.id, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(EntityKind::Event, _)), "got {err}");
    assert!(service.get_festival(festival.id, Utc::now()).await.is_ok());
}

#[tokio::test]
async fn event_may_run_until_end_of_last_festival_day() {
    let service = service().await;
    let festival = service.create_festival(summer_festival()).await.unwrap();

    // endDate is inclusive for its whole day.
    assert!(validate_event_window(
        ts("2023-07-17T20:00:00Z"),
        ts("2023-07-17T23:00:00Z"),
        &festival
    )
    .is_ok());
    assert!(validate_event_window(
        ts("2023-07-17T20:00:00Z"),
        ts("2023-07-18T00:30:00Z"),
        &festival
    )
    .is_err());
}

#[tokio::test]
async fn store_persists_across_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("festivals.db").display());

    let store = SqliteStore::connect(&url).await.unwrap();
    store.init().await.unwrap();
    let service = FestivalService::new(Arc::new(store));
    let created = service.create_festival(summer_festival()).await.unwrap();
    drop(service);

    let store = SqliteStore::connect(&url).await.unwrap();
    let service = FestivalService::new(Arc::new(store));
    let fetched = service.get_festival(created.id, Utc::now()).await.unwrap();
    assert_eq!(fetched.festival, created);
}
