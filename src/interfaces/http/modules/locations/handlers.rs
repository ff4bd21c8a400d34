//! Public location catalog handlers

use axum::extract::{Path, State};

use crate::domain::location::weekday_name;
use crate::domain::SharedLocationCatalog;
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult};
use crate::shared::time::SharedClock;

use super::dto::*;

#[derive(Clone)]
pub struct LocationsAppState {
    pub catalog: SharedLocationCatalog,
    pub clock: SharedClock,
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    tag = "Locations",
    responses(
        (status = 200, description = "Active locations sorted by name", body = ApiResponse<Vec<LocationDto>>)
    )
)]
pub async fn list_locations(State(state): State<LocationsAppState>) -> ApiResult<Vec<LocationDto>> {
    ok(state.catalog.active().into_iter().map(LocationDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/today",
    tag = "Locations",
    responses(
        (status = 200, description = "Locations open today", body = ApiResponse<Vec<LocationDto>>)
    )
)]
pub async fn list_locations_today(
    State(state): State<LocationsAppState>,
) -> ApiResult<Vec<LocationDto>> {
    let today = state.clock.today();
    ok(state
        .catalog
        .open_on(today)
        .into_iter()
        .map(LocationDto::from)
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    tag = "Locations",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = ApiResponse<LocationDto>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_location(
    State(state): State<LocationsAppState>,
    Path(id): Path<String>,
) -> ApiResult<LocationDto> {
    ok(LocationDto::from(state.catalog.get(&id)?))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}/schedule",
    tag = "Locations",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Active opening hours, Monday first", body = ApiResponse<Vec<OpeningHoursDto>>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_location_schedule(
    State(state): State<LocationsAppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<OpeningHoursDto>> {
    ok(LocationDto::from(state.catalog.get(&id)?).schedule)
}

#[utoipa::path(
    get,
    path = "/api/v1/schedule/weekly",
    tag = "Locations",
    responses(
        (status = 200, description = "Active locations grouped by weekday", body = ApiResponse<Vec<WeeklyScheduleDayDto>>)
    )
)]
pub async fn weekly_schedule(
    State(state): State<LocationsAppState>,
) -> ApiResult<Vec<WeeklyScheduleDayDto>> {
    let days = state
        .catalog
        .weekly()
        .into_iter()
        .map(|(day, entries)| WeeklyScheduleDayDto {
            day_of_week: day,
            day_name: weekday_name(day).to_string(),
            stops: entries
                .into_iter()
                .map(|(location, hours)| ScheduledStopDto::new(location, hours))
                .collect(),
        })
        .collect();
    ok(days)
}
