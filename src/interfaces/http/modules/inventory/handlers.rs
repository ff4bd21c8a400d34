//! Staff inventory handlers

use axum::extract::{Query, State};
use axum::Extension;

use crate::application::{InventoryView, SharedAllocationEngine, SharedAvailabilityProjector};
use crate::domain::Actor;
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct InventoryAppState {
    pub engine: SharedAllocationEngine,
    pub projector: SharedAvailabilityProjector,
}

#[utoipa::path(
    get,
    path = "/api/v1/staff/inventory",
    tag = "Staff",
    security(("api_key" = [])),
    params(InventoryQuery),
    responses(
        (status = 200, description = "Ledger state for the day", body = ApiResponse<InventoryView>),
        (status = 401, description = "Missing or invalid API key"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_inventory(
    State(state): State<InventoryAppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<InventoryView> {
    ok(state
        .projector
        .inventory(&query.location_id, query.date, &actor)
        .await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/staff/inventory",
    tag = "Staff",
    security(("api_key" = [])),
    request_body = SetInventoryRequest,
    responses(
        (status = 200, description = "Stock updated", body = ApiResponse<InventoryView>),
        (status = 422, description = "Invalid request body"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 404, description = "Unknown location"),
        (status = 503, description = "Busy, retry later")
    )
)]
pub async fn set_inventory(
    State(state): State<InventoryAppState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(request): ValidatedJson<SetInventoryRequest>,
) -> ApiResult<InventoryView> {
    let snapshot = state
        .engine
        .set_inventory(&request.location_id, request.date, request.total_units, &actor)
        .await?;
    ok(state
        .projector
        .inventory(&request.location_id, Some(snapshot.date), &actor)
        .await?)
}
