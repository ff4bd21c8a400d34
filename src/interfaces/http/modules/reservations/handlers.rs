//! Reservation HTTP handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::application::{ReservationView, SharedAllocationEngine};
use crate::domain::Actor;
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::shared::retry::{retry_with_backoff, RetryConfig};

use super::dto::*;

/// Application state for reservation handlers.
#[derive(Clone)]
pub struct ReservationAppState {
    pub engine: SharedAllocationEngine,
    pub retry: RetryConfig,
}

// ── Public ──────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation confirmed", body = ApiResponse<ReservationView>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Unknown location"),
        (status = 409, description = "Not enough stock"),
        (status = 422, description = "Field validation failed"),
        (status = 503, description = "Busy, retry later")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationAppState>,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationView>>), ApiError> {
    let command = request.into_command()?;
    let view = retry_with_backoff(
        state.retry.clone(),
        || state.engine.create_reservation(command.clone()),
        |e| e.is_transient(),
        "create_reservation",
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{code}",
    tag = "Reservations",
    params(("code" = String, Path, description = "Confirmation code (case-insensitive)")),
    responses(
        (status = 200, description = "Reservation", body = ApiResponse<ReservationView>),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn get_reservation_by_code(
    State(state): State<ReservationAppState>,
    Path(code): Path<String>,
) -> ApiResult<ReservationView> {
    ok(state.engine.find_by_code(&code).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{code}",
    tag = "Reservations",
    params(("code" = String, Path, description = "Confirmation code (case-insensitive)")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ApiResponse<ReservationView>),
        (status = 404, description = "Unknown code"),
        (status = 409, description = "Reservation can no longer be cancelled")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationAppState>,
    Path(code): Path<String>,
) -> ApiResult<ReservationView> {
    let view = retry_with_backoff(
        state.retry.clone(),
        || state.engine.cancel_by_code(&code),
        |e| e.is_transient(),
        "cancel_reservation",
    )
    .await?;
    ok(view)
}

// ── Staff ───────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/staff/reservations",
    tag = "Staff",
    security(("api_key" = [])),
    params(StaffReservationQuery),
    responses(
        (status = 200, description = "Reservations, oldest first", body = ApiResponse<Vec<ReservationView>>),
        (status = 401, description = "Missing or invalid API key"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn list_location_reservations(
    State(state): State<ReservationAppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<StaffReservationQuery>,
) -> ApiResult<Vec<ReservationView>> {
    ok(state
        .engine
        .list_for_location(&query.location_id, query.date, &actor)
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/staff/reservations/{id}",
    tag = "Staff",
    security(("api_key" = [])),
    params(("id" = String, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation", body = ApiResponse<ReservationView>),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn get_reservation(
    State(state): State<ReservationAppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<ReservationView> {
    ok(state.engine.find_by_id(&id, &actor).await?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/staff/reservations/{id}/status",
    tag = "Staff",
    security(("api_key" = [])),
    params(("id" = String, Path, description = "Reservation id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ReservationView>),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_reservation_status(
    State(state): State<ReservationAppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<ReservationView> {
    let view = retry_with_backoff(
        state.retry.clone(),
        || {
            state
                .engine
                .update_status(&id, request.status, request.notes.clone(), &actor)
        },
        |e| e.is_transient(),
        "update_reservation_status",
    )
    .await?;
    ok(view)
}

// ── Admin ───────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/admin/reservations",
    tag = "Admin",
    security(("api_key" = [])),
    params(AdminReservationQuery),
    responses(
        (status = 200, description = "Reservations for the day", body = ApiResponse<Vec<ReservationView>>),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_all_reservations(
    State(state): State<ReservationAppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AdminReservationQuery>,
) -> ApiResult<Vec<ReservationView>> {
    ok(state
        .engine
        .list_for_date(query.date, query.location_id.as_deref(), &actor)
        .await?)
}
