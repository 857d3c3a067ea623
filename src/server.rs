use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::data::model::{Feature, NutrientVector, parse_nutrient};
use crate::error::{Error, InputProblem};
use crate::state::Predictor;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON error response: `{"error": ..., "detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            error: "invalid input",
            detail: Some(detail.into()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, error) = match &err {
            Error::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "invalid input"),
            Error::ModelUnavailable | Error::MissingArtifact { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "model not loaded; run training first",
            ),
            Error::DatasetUnavailable | Error::MissingDataset { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "dataset not loaded")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        };
        ApiError {
            status,
            error,
            detail: Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::warn!("{} {}: {:?}", self.status, self.error, self.detail);
        }
        let body = ErrorBody {
            error: self.error,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub score: f64,
    pub category: String,
    pub matches: Vec<MatchBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchBody {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub sugar: f64,
    pub score: f64,
    pub distance: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    pub score: f64,
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Pull the four nutrients out of a JSON object. Missing or null fields are
/// 0; numbers and numeric strings are accepted; negatives are rejected.
pub fn nutrients_from_json(body: &Value) -> Result<NutrientVector, Error> {
    let Some(object) = body.as_object() else {
        return Err(Error::invalid_input("body", InputProblem::NotAnObject));
    };
    let mut values = [0.0; 4];
    for (slot, feature) in values.iter_mut().zip(Feature::ALL) {
        let key = feature.api_key();
        *slot = match object.get(key) {
            None | Some(Value::Null) => 0.0,
            Some(Value::Number(n)) => {
                let v = n
                    .as_f64()
                    .ok_or_else(|| Error::invalid_input(key, InputProblem::NotANumber))?;
                if v < 0.0 {
                    return Err(Error::invalid_input(key, InputProblem::Negative));
                }
                v
            }
            Some(Value::String(s)) => parse_nutrient(key, s)?,
            Some(_) => return Err(Error::invalid_input(key, InputProblem::NotANumber)),
        };
    }
    NutrientVector::try_from_array(values)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ApiState {
    pub predictor: Arc<Predictor>,
    pub match_count: usize,
    pub search_limit: usize,
}

async fn predict(State(state): State<ApiState>, body: Bytes) -> Result<Json<PredictResponse>, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("body is not valid JSON: {e}")))?;
    let nutrients = nutrients_from_json(&value)?;

    let prediction = state.predictor.predict(&nutrients)?;

    let matches = match state.predictor.nearest(&nutrients, state.match_count) {
        Ok(neighbors) => neighbors
            .into_iter()
            .map(|n| MatchBody {
                name: n.dish.name.clone(),
                calories: n.dish.nutrients.calories(),
                protein: n.dish.nutrients.protein(),
                carbs: n.dish.nutrients.carbohydrates(),
                sugar: n.dish.nutrients.free_sugar(),
                score: n.dish.score,
                distance: n.distance,
            })
            .collect(),
        Err(Error::DatasetUnavailable) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    log::info!(
        "POST /api/predict {:?} -> {:.4} ({})",
        nutrients.as_array(),
        prediction.score,
        prediction.category
    );
    Ok(Json(PredictResponse {
        score: round4(prediction.score),
        category: prediction.category.label().to_string(),
        matches,
    }))
}

async fn search(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let found = state.predictor.search(&params.q, state.search_limit)?;
    log::info!("GET /api/search q={:?} -> {} results", params.q, found.len());
    Ok(Json(SearchResponse {
        results: found
            .into_iter()
            .map(|d| SearchHit {
                name: d.name.clone(),
                score: d.score,
            })
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// Router and entry point
// ---------------------------------------------------------------------------

/// The API routes, with an optional static front end served for every other path.
pub fn router(state: ApiState, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/api/predict", post(predict))
        .route("/api/search", get(search))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(CorsLayer::permissive())
}

/// Load the predictor and serve until the process is stopped.
pub fn serve(config: &Config) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.bind))?;

    let predictor = Predictor::load(config);
    if !predictor.has_model() {
        log::warn!("Serving without a model; /api/predict will answer 503 until training is run");
    }

    let static_dir = config.static_dir.clone().filter(|d| d.is_dir());
    if let Some(dir) = &static_dir {
        log::info!("Serving front end from {}", dir.display());
    }

    let app = router(
        ApiState {
            predictor: Arc::new(predictor),
            match_count: config.match_count,
            search_limit: config.api_search_limit,
        },
        static_dir,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        log::info!("Listening on http://{addr}");
        axum::serve(listener, app).await.context("server error")
    })
}
