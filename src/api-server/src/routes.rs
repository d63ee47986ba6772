//! Route definitions for the API server
//!
//! Health and metrics at the root, scope checks under `/api/v1/scope`, and
//! the OpenAPI document with Swagger UI under `/api-docs`.

use crate::{handlers, middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rota Scope API",
        version = "1.0.0",
        description = "Department and employee scope checks for scheduling routes"
    ),
    paths(
        handlers::health_check,
        handlers::prometheus_metrics,
        handlers::accessible_departments,
        handlers::check_department,
        handlers::check_employee,
    ),
    components(
        schemas(
            crate::HealthResponse,
            crate::models::AssignmentDto,
            crate::models::UserContextDto,
            crate::models::DepartmentsRequest,
            crate::models::DepartmentsResponse,
            crate::models::DepartmentCheckRequest,
            crate::models::EmployeeCheckRequest,
            crate::models::AccessCheckResponse,
            crate::models::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health and monitoring endpoints"),
        (name = "scope", description = "Scheduling scope checks"),
    )
)]
pub struct ApiDoc;

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let scope_routes = Router::new()
        .route("/departments", post(handlers::accessible_departments))
        .route("/departments/check", post(handlers::check_department))
        .route("/employees/check", post(handlers::check_employee));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .nest("/api/v1/scope", scope_routes)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        // Executed bottom to top
        .layer(axum_middleware::from_fn(middleware::server_error_middleware))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}
