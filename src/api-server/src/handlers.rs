use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use rota_authz::{AccessDecision, ResolvedScope, UserContext};
use std::time::Instant;

use crate::{
    error::{ApiError, Result},
    extract::ValidatedJson,
    metrics::Outcome,
    models::*,
    state::AppState,
    HealthResponse,
};

const DEPARTMENTS: &str = "departments";
const DEPARTMENT_CHECK: &str = "department_check";
const EMPLOYEE_CHECK: &str = "employee_check";

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        directory: state.resolver.hierarchy().name().to_string(),
    })
}

/// Get metrics (Prometheus format)
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus metrics", body = String)
    ),
    tag = "health"
)]
pub async fn prometheus_metrics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state
        .metrics
        .export()
        .map_err(|e| ApiError::InternalError(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Accessible departments endpoint
#[utoipa::path(
    post,
    path = "/api/v1/scope/departments",
    request_body = DepartmentsRequest,
    responses(
        (status = 200, description = "Resolved scope", body = DepartmentsResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Organization directory unavailable", body = ErrorResponse)
    ),
    tag = "scope"
)]
pub async fn accessible_departments(
    State(state): State<AppState>,
    payload: std::result::Result<ValidatedJson<DepartmentsRequest>, ApiError>,
) -> Result<Json<DepartmentsResponse>> {
    let start = Instant::now();
    let result = match payload {
        Ok(ValidatedJson(req)) => resolve_departments(&state, req).await,
        Err(rejected) => Err(rejected),
    };

    let outcome = match &result {
        Ok(_) => Outcome::Resolved,
        Err(e) => error_outcome(e),
    };
    state.metrics.record(DEPARTMENTS, outcome, start.elapsed());

    let scope = result?;
    Ok(Json(DepartmentsResponse::new(scope, start.elapsed().as_millis() as u64)))
}

/// Department access check endpoint
#[utoipa::path(
    post,
    path = "/api/v1/scope/departments/check",
    request_body = DepartmentCheckRequest,
    responses(
        (status = 200, description = "Access decision", body = AccessCheckResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Organization directory unavailable", body = ErrorResponse)
    ),
    tag = "scope"
)]
pub async fn check_department(
    State(state): State<AppState>,
    payload: std::result::Result<ValidatedJson<DepartmentCheckRequest>, ApiError>,
) -> Result<Json<AccessCheckResponse>> {
    let start = Instant::now();
    let result = match payload {
        Ok(ValidatedJson(req)) => decide_department(&state, req).await,
        Err(rejected) => Err(rejected),
    };
    state
        .metrics
        .record(DEPARTMENT_CHECK, decision_outcome(&result), start.elapsed());

    let decision = result?;
    Ok(Json(AccessCheckResponse::new(
        decision,
        start.elapsed().as_millis() as u64,
    )))
}

/// Employee access check endpoint
#[utoipa::path(
    post,
    path = "/api/v1/scope/employees/check",
    request_body = EmployeeCheckRequest,
    responses(
        (status = 200, description = "Access decision", body = AccessCheckResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Organization directory unavailable", body = ErrorResponse)
    ),
    tag = "scope"
)]
pub async fn check_employee(
    State(state): State<AppState>,
    payload: std::result::Result<ValidatedJson<EmployeeCheckRequest>, ApiError>,
) -> Result<Json<AccessCheckResponse>> {
    let start = Instant::now();
    let result = match payload {
        Ok(ValidatedJson(req)) => decide_employee(&state, req).await,
        Err(rejected) => Err(rejected),
    };
    state
        .metrics
        .record(EMPLOYEE_CHECK, decision_outcome(&result), start.elapsed());

    let decision = result?;
    Ok(Json(AccessCheckResponse::new(
        decision,
        start.elapsed().as_millis() as u64,
    )))
}

async fn resolve_departments(state: &AppState, req: DepartmentsRequest) -> Result<ResolvedScope> {
    let user = UserContext::try_from(req.user)?;
    Ok(state.resolver.resolve(&user, &req.property_id).await?)
}

async fn decide_department(state: &AppState, req: DepartmentCheckRequest) -> Result<AccessDecision> {
    let user = UserContext::try_from(req.user)?;
    Ok(state
        .resolver
        .explain_department_access(&user, &req.property_id, &req.department_id)
        .await?)
}

async fn decide_employee(state: &AppState, req: EmployeeCheckRequest) -> Result<AccessDecision> {
    let user = UserContext::try_from(req.user)?;
    Ok(state
        .resolver
        .explain_employee_access(&user, &req.property_id, &req.employee_id)
        .await?)
}

fn decision_outcome(result: &Result<AccessDecision>) -> Outcome {
    match result {
        Ok(decision) if decision.allowed => Outcome::Allowed,
        Ok(_) => Outcome::Denied,
        Err(e) => error_outcome(e),
    }
}

fn error_outcome(error: &ApiError) -> Outcome {
    if error.is_indeterminate() {
        Outcome::Indeterminate
    } else if error.status() == StatusCode::BAD_REQUEST {
        Outcome::Invalid
    } else {
        Outcome::Error
    }
}
