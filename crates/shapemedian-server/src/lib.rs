//! HTTP surface for the refresh pipeline.
//!
//! Serves the shape table as an HTML page with a refresh button, plus a small
//! JSON API for scripted clients.

pub mod html;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, Json, Redirect},
    routing::{get, post},
};
use serde::Serialize;

use shapemedian_core::{
    PipelineStatus, RefreshError, RefreshReport, Renderer, ShapeSummary, SharedPipeline,
};

use html::HtmlRenderer;

/// Shared server state.
struct AppState {
    pipeline: SharedPipeline,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    refreshing: bool,
    #[serde(flatten)]
    pipeline: PipelineStatus,
}

#[derive(Serialize)]
struct ShapesResponse {
    shapes: Vec<ShapeSummary>,
    total: usize,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn error_response(status: StatusCode, error: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error,
        }),
    )
}

/// HTTP status for a failed cycle.
fn refresh_error_status(err: &RefreshError) -> StatusCode {
    match err {
        RefreshError::InProgress => StatusCode::CONFLICT,
        RefreshError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        RefreshError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RefreshError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Html<String> {
    let refreshing = state.pipeline.is_refreshing();
    let snapshot = state.pipeline.snapshot();
    let mut page = HtmlRenderer::new();
    page.render(&snapshot.render_state(refreshing), snapshot.rows());
    Html(page.into_page())
}

/// Form target for the page's button: start a cycle in the background and
/// send the browser back to the page, which shows `Loading...` until done.
async fn handle_refresh_form(State(state): State<Arc<AppState>>) -> Redirect {
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        match pipeline.trigger_refresh().await {
            Ok(report) => log::debug!("form refresh completed cycle {}", report.cycle),
            Err(RefreshError::InProgress) => log::debug!("form refresh ignored: cycle in flight"),
            Err(e) => log::warn!("form refresh failed: {e}"),
        }
    });
    // Let the spawned cycle take the lock before the page is requested.
    tokio::task::yield_now().await;
    Redirect::to("/")
}

async fn handle_api_refresh(State(state): State<Arc<AppState>>) -> ApiResult<RefreshReport> {
    state
        .pipeline
        .trigger_refresh()
        .await
        .map(Json)
        .map_err(|e| error_response(refresh_error_status(&e), e.to_string()))
}

async fn handle_areas(State(state): State<Arc<AppState>>) -> ApiResult<RefreshReport> {
    state.pipeline.last_report().map(Json).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            "no refresh cycle has completed yet; POST /api/v1/refresh".to_string(),
        )
    })
}

async fn handle_shapes(State(state): State<Arc<AppState>>) -> Json<ShapesResponse> {
    let shapes = state.pipeline.snapshot().summary;
    let total = shapes.len();
    Json(ShapesResponse { shapes, total })
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.pipeline.snapshot().status;
    Json(HealthResponse {
        status: if status.last_error.is_none() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        refreshing: state.pipeline.is_refreshing(),
        pipeline: status,
    })
}

/// Build the axum router.
pub fn build_router(pipeline: SharedPipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/", get(handle_index))
        .route("/refresh", post(handle_refresh_form))
        .route("/api/v1/refresh", post(handle_api_refresh))
        .route("/api/v1/areas", get(handle_areas))
        .route("/api/v1/shapes", get(handle_shapes))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP server until the process exits.
pub async fn run_server(pipeline: SharedPipeline, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(pipeline);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapemedian_core::{FetchError, FixedSource, RefreshPipeline, ScriptedSource, ShapeKind};
    use std::time::Duration;

    fn state_with(source: impl shapemedian_core::DistanceSource + 'static) -> Arc<AppState> {
        Arc::new(AppState {
            pipeline: SharedPipeline::new(RefreshPipeline::new(Arc::new(source))),
        })
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            refresh_error_status(&RefreshError::InProgress),
            StatusCode::CONFLICT
        );
        assert_eq!(
            refresh_error_status(&RefreshError::Fetch {
                shape: ShapeKind::Square,
                source: FetchError::Exhausted,
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            refresh_error_status(&RefreshError::Timeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[tokio::test]
    async fn areas_missing_before_first_cycle() {
        let state = state_with(FixedSource::new(2.0));
        let err = handle_areas(State(state)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_refresh_then_areas() {
        let state = state_with(FixedSource::new(2.0));
        let Json(report) = handle_api_refresh(State(state.clone())).await.unwrap();
        assert_eq!(report.cycle, 1);

        let Json(areas) = handle_areas(State(state.clone())).await.unwrap();
        assert_eq!(areas, report);

        let Json(shapes) = handle_shapes(State(state.clone())).await;
        assert_eq!(shapes.total, 4);

        let Json(health) = handle_health(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.pipeline.cycles_completed, 1);
    }

    #[tokio::test]
    async fn api_refresh_failure_is_bad_gateway() {
        let state = state_with(ScriptedSource::new([]));
        let err = handle_api_refresh(State(state.clone())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert!(!err.1.success);

        let Json(health) = handle_health(State(state)).await;
        assert_eq!(health.status, "degraded");
    }

    #[tokio::test]
    async fn api_refresh_body_shape() {
        let state = state_with(ScriptedSource::new([3.0, 2.0, 5.0, 1.0, 1.0, 2.0]));
        let Json(report) = handle_api_refresh(State(state.clone())).await.unwrap();
        let body = serde_json::to_value(&report).unwrap();

        assert_eq!(body["cycle"], 1);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0]["shape"], "square");
        assert_eq!(results[0]["latest_area"], 9.0);
        assert_eq!(results[1]["distances"], serde_json::json!([2.0, 5.0]));
        assert_eq!(results[3]["shape"], "ellipse");
        assert_eq!(results[3]["refresh_count"], 1);

        let err = handle_api_refresh(State(state)).await.unwrap_err();
        let body = serde_json::to_value(&err.1.0).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("exhausted"));
    }

    #[tokio::test]
    async fn index_page_states() {
        let state = state_with(FixedSource::new(1.0));
        let Html(page) = handle_index(State(state.clone())).await;
        assert!(page.contains("Welcome!"));

        handle_api_refresh(State(state.clone())).await.unwrap();
        let Html(page) = handle_index(State(state)).await;
        assert!(page.contains("<table>"));
        assert!(page.contains("<td>square</td>"));
    }
}
