//! Day view and event endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use eventboard_core::day_window::{offset_for_page, parse_day};
use eventboard_core::{Event, EventError, EventInput, EventPage};
use serde::{Deserialize, Serialize};

use crate::render;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(day_view))
        .route("/events", get(day_view))
        .route("/api/events", get(day_events).post(create_event))
        .route("/api/events/all", get(all_events))
        .route("/api/events/by-title/{title}", get(event_by_title))
}

/// `?date=YYYY-MM-DD&page=N`, both optional
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
    pub page: Option<String>,
}

impl DayQuery {
    /// Resolve to a day and a 1-based page. Missing values default to today and 1.
    fn resolve(&self) -> Result<(NaiveDate, i64), AppError> {
        let day = match self.date.as_deref().map(str::trim) {
            None | Some("") => Utc::now().date_naive(),
            Some(raw) => parse_day(raw).map_err(AppError::BadRequest)?,
        };

        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("Invalid page '{raw}'")))?
                .max(1),
        };

        Ok((day, page))
    }
}

/// One day's page of events plus navigation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPage {
    pub date: NaiveDate,
    pub page: i64,
    pub page_size: u32,
    pub events: Vec<Event>,
    pub has_more: bool,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
    pub next_day: Option<NaiveDate>,
}

async fn load_day(state: &AppState, query: &DayQuery) -> Result<DayPage, AppError> {
    let (date, page) = query.resolve()?;
    let offset = offset_for_page(page, state.page_size);

    let EventPage { events, has_more } = state
        .store
        .events_by_day(date, offset, state.page_size)
        .await?;

    Ok(DayPage {
        date,
        page,
        page_size: state.page_size,
        events,
        has_more,
        next_page: has_more.then(|| page.saturating_add(1)),
        previous_page: (page > 1).then(|| page - 1),
        next_day: date.succ_opt(),
    })
}

/// GET / and GET /events - HTML day view
async fn day_view(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Html<String>, AppError> {
    let page = load_day(&state, &query).await?;
    Ok(Html(render::day_page(&page)))
}

/// GET /api/events - JSON day view
async fn day_events(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayPage>, AppError> {
    Ok(Json(load_day(&state, &query).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<u32>,
}

/// GET /api/events/all - every event, ordered by date, paged
async fn all_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let page_size = query.page_size.unwrap_or(state.page_size).max(1);
    let events = state
        .store
        .list_paged(query.page.unwrap_or(1), page_size)
        .await?;
    Ok(Json(events))
}

/// GET /api/events/by-title/{title}
async fn event_by_title(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .store
        .find_by_title(&title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event not found: {}", title)))?;
    Ok(Json(event))
}

/// POST /api/events - validate and store a new event
async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = input.validate().map_err(EventError::from)?;
    let stored = state.store.insert(&event).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
