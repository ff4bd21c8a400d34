//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    AvailabilityView, InventoryView, ReservationView, ReservedBreakdown, SharedAllocationEngine,
    SharedAvailabilityProjector,
};
use crate::domain::{AvailabilityStatus, RepositoryProvider, ReservationStatus, SharedLocationCatalog};
use crate::infrastructure::crypto::ApiKeyRegistry;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{api_key_middleware, AuthState};
use crate::interfaces::http::modules::{
    availability, health, inventory, locations, metrics as metrics_module, reservations,
};
use crate::shared::retry::RetryConfig;
use crate::shared::time::SharedClock;

/// Everything the HTTP surface needs from the running service.
#[derive(Clone)]
pub struct ApiDeps {
    pub engine: SharedAllocationEngine,
    pub projector: SharedAvailabilityProjector,
    pub catalog: SharedLocationCatalog,
    pub clock: SharedClock,
    pub repos: Arc<dyn RepositoryProvider>,
    pub api_keys: Arc<ApiKeyRegistry>,
    pub prometheus: PrometheusHandle,
    /// "sqlite" or "memory", reported by `/health`
    pub backend: &'static str,
    pub retry: RetryConfig,
}

/// Unified state for every route. Axum extracts the specific handler state
/// via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    deps: ApiDeps,
    started_at: Arc<Instant>,
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<ApiState> for reservations::ReservationAppState {
    fn from_ref(s: &ApiState) -> Self {
        reservations::ReservationAppState {
            engine: Arc::clone(&s.deps.engine),
            retry: s.deps.retry.clone(),
        }
    }
}

impl FromRef<ApiState> for inventory::InventoryAppState {
    fn from_ref(s: &ApiState) -> Self {
        inventory::InventoryAppState {
            engine: Arc::clone(&s.deps.engine),
            projector: Arc::clone(&s.deps.projector),
        }
    }
}

impl FromRef<ApiState> for availability::AvailabilityAppState {
    fn from_ref(s: &ApiState) -> Self {
        availability::AvailabilityAppState {
            projector: Arc::clone(&s.deps.projector),
        }
    }
}

impl FromRef<ApiState> for locations::LocationsAppState {
    fn from_ref(s: &ApiState) -> Self {
        locations::LocationsAppState {
            catalog: Arc::clone(&s.deps.catalog),
            clock: Arc::clone(&s.deps.clock),
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            repos: Arc::clone(&s.deps.repos),
            backend: s.deps.backend,
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for metrics_module::MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        metrics_module::MetricsState {
            handle: s.deps.prometheus.clone(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Locations
        locations::list_locations,
        locations::list_locations_today,
        locations::get_location,
        locations::get_location_schedule,
        locations::weekly_schedule,
        // Availability
        availability::get_availability,
        // Reservations
        reservations::create_reservation,
        reservations::get_reservation_by_code,
        reservations::cancel_reservation,
        // Staff
        inventory::get_inventory,
        inventory::set_inventory,
        reservations::list_location_reservations,
        reservations::get_reservation,
        reservations::update_reservation_status,
        // Admin
        reservations::list_all_reservations,
    ),
    components(
        schemas(
            ApiResponse<String>,
            ReservationView,
            AvailabilityView,
            InventoryView,
            ReservedBreakdown,
            ReservationStatus,
            AvailabilityStatus,
            reservations::CreateReservationRequest,
            reservations::UpdateStatusRequest,
            inventory::SetInventoryRequest,
            locations::LocationDto,
            locations::OpeningHoursDto,
            locations::ScheduledStopDto,
            locations::WeeklyScheduleDayDto,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Locations", description = "Where and when the truck stops"),
        (name = "Availability", description = "Remaining stock per location and day"),
        (name = "Reservations", description = "Book, look up and cancel pickups by confirmation code"),
        (name = "Staff", description = "Daily stock entry and reservation handling (API key)"),
        (name = "Admin", description = "Cross-location overview (admin API key)"),
    ),
    info(
        title = "Foodtruck Booking API",
        version = "1.0.0",
        description = "Same-day reservation of grilled chicken and fries with per-location daily stock",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(deps: ApiDeps) -> Router {
    let auth_state = AuthState {
        registry: Arc::clone(&deps.api_keys),
    };
    let state = ApiState {
        deps,
        started_at: Arc::new(Instant::now()),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let location_routes = Router::new()
        .route("/", get(locations::list_locations))
        .route("/today", get(locations::list_locations_today))
        .route("/{id}", get(locations::get_location))
        .route("/{id}/schedule", get(locations::get_location_schedule));

    let reservation_routes = Router::new()
        .route("/", post(reservations::create_reservation))
        .route(
            "/{code}",
            get(reservations::get_reservation_by_code).delete(reservations::cancel_reservation),
        );

    // Staff routes (API key; role checked by the engine)
    let staff_routes = Router::new()
        .route(
            "/inventory",
            get(inventory::get_inventory).post(inventory::set_inventory),
        )
        .route("/reservations", get(reservations::list_location_reservations))
        .route("/reservations/{id}", get(reservations::get_reservation))
        .route(
            "/reservations/{id}/status",
            patch(reservations::update_reservation_status),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            api_key_middleware,
        ));

    let admin_routes = Router::new()
        .route("/reservations", get(reservations::list_all_reservations))
        .route_layer(middleware::from_fn_with_state(auth_state, api_key_middleware));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics_module::prometheus_metrics))
        .nest("/api/v1/locations", location_routes)
        .route("/api/v1/schedule/weekly", get(locations::weekly_schedule))
        .route(
            "/api/v1/availability/{location_id}",
            get(availability::get_availability),
        )
        .nest("/api/v1/reservations", reservation_routes)
        .nest("/api/v1/staff", staff_routes)
        .nest("/api/v1/admin", admin_routes)
        .layer(middleware::from_fn(metrics_module::http_metrics_middleware))
        .with_state(state)
        // Swagger UI
        .merge(swagger_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
