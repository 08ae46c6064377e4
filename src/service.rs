// Consistency & query service - the one place festival/event rules live.
//
// Loads referenced records through the injected store, validates candidate
// records (always fully merged, never raw patches), derives time status, and
// exposes the HTTP handlers and router for the REST surface.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, EntityKind},
    models::{
        derive_status, Event, EventPatch, EventSummary, Festival, FestivalPatch, FestivalSummary,
        NewEvent, NewFestival, Status,
    },
    store::{FestivalDelete, RecordStore},
};

/// A festival with its derived status and the summaries of its events.
#[derive(Debug, Serialize)]
pub struct FestivalDetail {
    #[serde(flatten)]
    pub festival: Festival,
    pub status: Status,
    pub events: Vec<EventSummary>,
}

/// An event with its derived status and its parent festival's summary.
#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub status: Status,
    pub festival: FestivalSummary,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub count: usize,
    pub data: Vec<T>,
}

/// Rejects event windows that are inverted or fall outside the festival's
/// date range. Festival dates bound whole UTC calendar days: an event may
/// start at 00:00 on `start_date` and end at any instant up to the last
/// moment of `end_date`; an `end_time` on the following day is out of
/// range. Callers must pass the final effective festival and the final
/// merged start/end.
pub fn validate_event_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    festival: &Festival,
) -> AppResult<()> {
    if start > end {
        return Err(AppError::InvalidInterval(format!(
            "startTime {} is after endTime {}",
            start, end
        )));
    }
    if start.date_naive() < festival.start_date || end.date_naive() > festival.end_date {
        return Err(AppError::OutOfRange(format!(
            "event window {} to {} falls outside festival '{}' ({} to {})",
            start, end, festival.name, festival.start_date, festival.end_date
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FestivalService {
    store: Arc<dyn RecordStore>,
}

impl FestivalService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_festivals(&self, now: DateTime<Utc>) -> AppResult<Vec<FestivalDetail>> {
        let festivals = self.store.list_festivals().await?;
        let events = self.store.list_events(None).await?;

        let mut by_festival: HashMap<i64, Vec<EventSummary>> = HashMap::new();
        for event in &events {
            by_festival
                .entry(event.festival_id)
                .or_default()
                .push(EventSummary::from(event));
        }

        let today = now.date_naive();
        Ok(festivals
            .into_iter()
            .map(|festival| FestivalDetail {
                status: derive_status(today, festival.start_date, festival.end_date),
                events: by_festival.remove(&festival.id).unwrap_or_default(),
                festival,
            })
            .collect())
    }

    pub async fn get_festival(&self, id: i64, now: DateTime<Utc>) -> AppResult<FestivalDetail> {
        let festival = self
            .store
            .get_festival(id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Festival, id))?;
        let events = self.store.list_events(Some(id)).await?;
        Ok(FestivalDetail {
            status: derive_status(now.date_naive(), festival.start_date, festival.end_date),
            events: events.iter().map(EventSummary::from).collect(),
            festival,
        })
    }

    pub async fn create_festival(&self, input: NewFestival) -> AppResult<Festival> {
        validate_festival_fields(&input.name, &input.kind, &input.location)?;
        validate_festival_dates(input.start_date, input.end_date)?;
        let festival = self.store.insert_festival(&input).await?;
        tracing::info!(id = festival.id, name = %festival.name, "created festival");
        Ok(festival)
    }

    pub async fn update_festival(&self, id: i64, patch: FestivalPatch) -> AppResult<Festival> {
        let existing = self
            .store
            .get_festival(id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Festival, id))?;

        let candidate = patch.apply_to(&existing);
        validate_festival_fields(&candidate.name, &candidate.kind, &candidate.location)?;
        validate_festival_dates(candidate.start_date, candidate.end_date)?;

        if !self.store.replace_festival(&candidate).await? {
            return Err(AppError::NotFound(EntityKind::Festival, id));
        }
        Ok(candidate)
    }

    pub async fn delete_festival(&self, id: i64) -> AppResult<()> {
        match self.store.delete_festival(id).await? {
            FestivalDelete::Deleted => {
                tracing::info!(id, "deleted festival");
                Ok(())
            }
            FestivalDelete::Missing => Err(AppError::NotFound(EntityKind::Festival, id)),
            FestivalDelete::HasEvents(count) => Err(AppError::Validation(
                "festivalId",
                format!("{} events still reference this festival; delete them first", count),
            )),
        }
    }

    pub async fn list_events(
        &self,
        festival_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<EventDetail>> {
        let events = self.store.list_events(festival_id).await?;
        let festivals = self.store.list_festivals().await?;
        let summaries: HashMap<i64, FestivalSummary> = festivals
            .iter()
            .map(|festival| (festival.id, FestivalSummary::from(festival)))
            .collect();

        events
            .into_iter()
            .map(|event| {
                let festival = summaries
                    .get(&event.festival_id)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "event {} references missing festival {}",
                            event.id, event.festival_id
                        ))
                    })?;
                Ok(EventDetail {
                    status: derive_status(now, event.start_time, event.end_time),
                    festival,
                    event,
                })
            })
            .collect()
    }

    pub async fn get_event(&self, id: i64, now: DateTime<Utc>) -> AppResult<EventDetail> {
        let event = self
            .store
            .get_event(id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Event, id))?;
        let festival = self
            .store
            .get_festival(event.festival_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "event {} references missing festival {}",
                    event.id, event.festival_id
                ))
            })?;
        Ok(EventDetail {
            status: derive_status(now, event.start_time, event.end_time),
            festival: FestivalSummary::from(&festival),
            event,
        })
    }

    pub async fn create_event(&self, input: NewEvent) -> AppResult<Event> {
        validate_event_fields(&input.name, input.capacity)?;
        let festival = self
            .store
            .get_festival(input.festival_id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Festival, input.festival_id))?;
        validate_event_window(input.start_time, input.end_time, &festival)?;
        let event = self.store.insert_event(&input).await?;
        tracing::info!(id = event.id, festival_id = event.festival_id, "created event");
        Ok(event)
    }

    pub async fn update_event(&self, id: i64, patch: EventPatch) -> AppResult<Event> {
        let existing = self
            .store
            .get_event(id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Event, id))?;

        let candidate = patch.apply_to(&existing);
        validate_event_fields(&candidate.name, candidate.capacity)?;

        // Re-resolve the effective festival and re-check the window whenever
        // the patch touches festivalId/startTime/endTime; the merged
        // candidate closes the omitted-field loophole.
        if patch.touches_window() {
            let festival = self
                .store
                .get_festival(candidate.festival_id)
                .await?
                .ok_or(AppError::NotFound(EntityKind::Festival, candidate.festival_id))?;
            validate_event_window(candidate.start_time, candidate.end_time, &festival)?;
        }

        if !self.store.replace_event(&candidate).await? {
            return Err(AppError::NotFound(EntityKind::Event, id));
        }
        Ok(candidate)
    }

    pub async fn delete_event(&self, id: i64) -> AppResult<()> {
        if !self.store.delete_event(id).await? {
            return Err(AppError::NotFound(EntityKind::Event, id));
        }
        tracing::info!(id, "deleted event");
        Ok(())
    }
}

fn validate_festival_fields(name: &str, kind: &str, location: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name", "must not be empty".into()));
    }
    if kind.trim().is_empty() {
        return Err(AppError::Validation("type", "must not be empty".into()));
    }
    if location.trim().is_empty() {
        return Err(AppError::Validation("location", "must not be empty".into()));
    }
    Ok(())
}

fn validate_festival_dates(
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
) -> AppResult<()> {
    if start_date > end_date {
        return Err(AppError::InvalidInterval(format!(
            "startDate {} is after endDate {}",
            start_date, end_date
        )));
    }
    Ok(())
}

fn validate_event_fields(name: &str, capacity: i64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name", "must not be empty".into()));
    }
    if capacity < 0 {
        return Err(AppError::Validation("capacity", "must not be negative".into()));
    }
    Ok(())
}

// HTTP request/query types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub festival_id: Option<i64>,
}

// HTTP handlers. Each reads "now" exactly once so a listing is internally
// consistent even when items straddle a status boundary.

pub async fn list_festivals_handler(
    State(service): State<FestivalService>,
) -> Result<Json<ListResponse<FestivalDetail>>, AppError> {
    let data = service.list_festivals(Utc::now()).await?;
    Ok(Json(ListResponse {
        count: data.len(),
        data,
    }))
}

pub async fn get_festival_handler(
    State(service): State<FestivalService>,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<FestivalDetail>, AppError> {
    Ok(Json(service.get_festival(id, Utc::now()).await?))
}

pub async fn create_festival_handler(
    State(service): State<FestivalService>,
    Json(input): Json<NewFestival>,
) -> Result<(StatusCode, Json<Festival>), AppError> {
    let festival = service.create_festival(input).await?;
    Ok((StatusCode::CREATED, Json(festival)))
}

pub async fn update_festival_handler(
    State(service): State<FestivalService>,
    AxumPath(id): AxumPath<i64>,
    Json(patch): Json<FestivalPatch>,
) -> Result<Json<Festival>, AppError> {
    Ok(Json(service.update_festival(id, patch).await?))
}

pub async fn delete_festival_handler(
    State(service): State<FestivalService>,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<Value>, AppError> {
    service.delete_festival(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

pub async fn list_events_handler(
    State(service): State<FestivalService>,
    Query(params): Query<ListEventsQuery>,
) -> Result<Json<ListResponse<EventDetail>>, AppError> {
    let data = service.list_events(params.festival_id, Utc::now()).await?;
    Ok(Json(ListResponse {
        count: data.len(),
        data,
    }))
}

pub async fn get_event_handler(
    State(service): State<FestivalService>,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<EventDetail>, AppError> {
    Ok(Json(service.get_event(id, Utc::now()).await?))
}

pub async fn create_event_handler(
    State(service): State<FestivalService>,
    Json(input): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = service.create_event(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event_handler(
    State(service): State<FestivalService>,
    AxumPath(id): AxumPath<i64>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(service.update_event(id, patch).await?))
}

pub async fn delete_event_handler(
    State(service): State<FestivalService>,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<Value>, AppError> {
    service.delete_event(id).await?;
    Ok(Json(json!({"id": id, "deleted": true})))
}

// Create the REST router
pub fn create_router(service: FestivalService) -> Router {
    Router::new()
        // Festival operations
        .route(
            "/festivals",
            get(list_festivals_handler).post(create_festival_handler),
        )
        .route(
            "/festivals/{id}",
            get(get_festival_handler)
                .put(update_festival_handler)
                .delete(delete_festival_handler),
        )
        // Event operations
        .route("/events", get(list_events_handler).post(create_event_handler))
        .route(
            "/events/{id}",
            get(get_event_handler)
                .put(update_event_handler)
                .delete(delete_event_handler),
        )
        .with_state(service)
}
