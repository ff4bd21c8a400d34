//! Public availability endpoint

use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::application::{AvailabilityView, SharedAvailabilityProjector};
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct AvailabilityAppState {
    pub projector: SharedAvailabilityProjector,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Day to inspect (defaults to today)
    pub date: Option<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/api/v1/availability/{location_id}",
    tag = "Availability",
    params(
        ("location_id" = String, Path, description = "Location id"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability for the day", body = ApiResponse<AvailabilityView>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_availability(
    State(state): State<AvailabilityAppState>,
    Path(location_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<AvailabilityView> {
    ok(state.projector.get_availability(&location_id, query.date).await?)
}
