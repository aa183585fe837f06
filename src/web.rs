use crate::api_errors::AppError;
use crate::scoring_service::{Prediction, ScoringService};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Body of the prediction endpoints.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Success {
        status: &'static str,
        probability: f64,
    },
    Failure {
        error: String,
    },
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        match prediction {
            Prediction::Success { probability } => PredictionResponse::Success {
                status: "success",
                probability,
            },
            Prediction::Failure { error } => PredictionResponse::Failure { error },
        }
    }
}

/// Body of the Portuguese-keyed `/prever` endpoint kept for older clients.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LegacyPredictionResponse {
    Success {
        status: &'static str,
        probabilidade_aceitar: f64,
    },
    Failure {
        erro: String,
    },
}

impl From<Prediction> for LegacyPredictionResponse {
    fn from(prediction: Prediction) -> Self {
        match prediction {
            Prediction::Success { probability } => LegacyPredictionResponse::Success {
                status: "sucesso",
                probabilidade_aceitar: probability,
            },
            Prediction::Failure { error } => LegacyPredictionResponse::Failure { erro: error },
        }
    }
}

/// Build the HTTP surface: prediction, usage, health and model status.
pub fn build_router(service: Arc<ScoringService>, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(usage))
        // current endpoints
        .route("/v1/predict", post(predict))
        .route("/v1/model/status", get(model_status))
        // unversioned alias
        .route("/predict", post(predict))
        // legacy dialect
        .route("/prever", post(predict_legacy))
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .fallback(not_found)
        .layer(Extension(service));

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn predict(
    Extension(service): Extension<Arc<ScoringService>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(service.predict(payload).into()))
}

async fn predict_legacy(
    Extension(service): Extension<Arc<ScoringService>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LegacyPredictionResponse>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(service.predict(payload).into()))
}

async fn usage() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Use POST /predict with the customer record.",
    }))
}

async fn model_status(Extension(service): Extension<Arc<ScoringService>>) -> Json<Value> {
    Json(service.status())
}

async fn healthz() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(Extension(service): Extension<Arc<ScoringService>>) -> Json<Value> {
    Json(serde_json::json!({ "ready": !service.schema().is_empty() }))
}

async fn not_found() -> AppError {
    AppError::not_found("no such endpoint")
}
