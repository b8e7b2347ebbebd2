//! REST API handlers for staff rostering.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::config::RosterConfig;
use crate::demo_data::{self, DemoData};
use crate::dto::{
    AnalyzeResponse, ErrorResponse, HealthResponse, InfoResponse, ProblemDto, RosterDto,
    StatusResponse,
};
use crate::error::RosterError;
use crate::model::ModelBuilder;
use crate::planner;
use crate::solver::SolverService;

/// Application state shared across handlers.
pub struct AppState {
    pub solver: SolverService,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            solver: SolverService::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(error: RosterError) -> ApiError {
    let status = if error.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Router
// ============================================================================

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        // Rosters
        .route("/rosters", post(create_roster).get(list_rosters))
        .route("/rosters/analyze", put(analyze_roster))
        .route("/rosters/{id}", get(get_roster).delete(delete_roster))
        .route("/rosters/{id}/status", get(get_roster_status))
        .with_state(state)
}

// ============================================================================
// Health & Info
// ============================================================================

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Staff Rostering",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: "good_lp/microlp",
    })
}

// ============================================================================
// Demo data
// ============================================================================

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - Get a specific demo problem.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<ProblemDto>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => {
            let (staff, jobs) = demo_data::generate(demo);
            Ok(Json(ProblemDto::from_domain(
                &staff,
                &jobs,
                RosterConfig::default(),
            )))
        }
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Rosters
// ============================================================================

/// POST /rosters - Validate a problem and start solving it.
/// Returns the run ID as plain text.
async fn create_roster(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<ProblemDto>,
) -> Result<String, ApiError> {
    let (staff, jobs) = dto.to_domain();
    ModelBuilder::new(&staff, &jobs, &dto.config)
        .build()
        .map_err(reject)?;

    let id = uuid::Uuid::new_v4().to_string();
    info!(run_id = %id, staff = staff.len(), jobs = jobs.len(), "Roster submitted");
    let run = state.solver.create_run(id.clone(), staff, jobs, dto.config);
    state.solver.start_solving(run);
    Ok(id)
}

/// GET /rosters - List all run IDs.
async fn list_rosters(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.solver.list_runs())
}

/// GET /rosters/{id} - Get a run with its roster, once solved.
async fn get_roster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RosterDto>, StatusCode> {
    let run = state.solver.get_run(&id).ok_or(StatusCode::NOT_FOUND)?;
    let guard = run.read();
    Ok(Json(RosterDto::new(
        guard.id.clone(),
        guard.state,
        guard.config.granularity,
        guard.result.as_ref(),
        guard.error.clone(),
    )))
}

/// GET /rosters/{id}/status - Get a run's status.
async fn get_roster_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let run = state.solver.get_run(&id).ok_or(StatusCode::NOT_FOUND)?;
    let guard = run.read();
    Ok(Json(StatusResponse {
        solver_status: guard.state,
        status: guard.result.as_ref().map(|r| r.status),
        objective: guard.result.as_ref().and_then(|r| r.objective),
    }))
}

/// DELETE /rosters/{id} - Forget a run.
async fn delete_roster(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> StatusCode {
    match state.solver.remove_run(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// PUT /rosters/analyze - Build the model and report its size without solving.
async fn analyze_roster(Json(dto): Json<ProblemDto>) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (staff, jobs) = dto.to_domain();
    planner::analyze(&staff, &jobs, &dto.config)
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState::new()))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn tiny_problem() -> Value {
        json!({
            "staff": [
                { "id": "S1", "location": "North", "tools": ["drill"] },
                { "id": "S2", "location": "East", "tools": ["drill", "saw"] }
            ],
            "jobs": [
                { "id": "J1", "location": "North", "durationHours": 3.0, "requiredTools": ["drill"] },
                { "id": "J2", "location": "West", "durationHours": 2.0, "requiredTools": ["saw"] }
            ],
            "config": { "days": 2, "maxDaysPerWeek": 2, "granularity": "PARTIAL_HOURS" }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "UP");
    }

    #[tokio::test]
    async fn test_demo_data_routes() {
        let (status, body) = send(app(), get("/demo-data")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(ids, ["SMALL", "LARGE"]);

        let (status, body) = send(app(), get("/demo-data/small")).await;
        assert_eq!(status, StatusCode::OK);
        let problem: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem["staff"].as_array().unwrap().len(), 4);
        assert_eq!(problem["config"]["granularity"], "WHOLE_SLOT");

        let (status, _) = send(app(), get("/demo-data/HUGE")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analyze_reports_constraint_families() {
        let (status, body) =
            send(app(), json_request("PUT", "/rosters/analyze", tiny_problem())).await;
        assert_eq!(status, StatusCode::OK);

        let analysis: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(analysis["granularity"], "PARTIAL_HOURS");
        // S1 lacks the saw needed by J2
        assert_eq!(analysis["skillMismatches"], 1);
        let names: Vec<&str> = analysis["constraints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Job completion"));
    }

    #[tokio::test]
    async fn test_invalid_problem_is_bad_request() {
        let mut problem = tiny_problem();
        problem["config"]["days"] = json!(9);
        let (status, body) = send(app(), json_request("POST", "/rosters", problem)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("configuration"));

        let mut problem = tiny_problem();
        problem["jobs"][1]["id"] = json!("J1");
        let (status, _) = send(app(), json_request("PUT", "/rosters/analyze", problem)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_roster_lifecycle() {
        let app = app();

        let (status, body) =
            send(app.clone(), json_request("POST", "/rosters", tiny_problem())).await;
        assert_eq!(status, StatusCode::OK);
        let id = String::from_utf8(body).unwrap();

        let (status, body) = send(app.clone(), get("/rosters")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(ids, [id.clone()]);

        let (status, body) = send(app.clone(), get(&format!("/rosters/{id}/status"))).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["solverStatus"] == "SOLVING" || body["solverStatus"] == "NOT_SOLVING");

        let (status, body) = send(app.clone(), get(&format!("/rosters/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["granularity"], "PARTIAL_HOURS");

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/rosters/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(app, get(&format!("/rosters/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
