//! Route handlers

use super::error::ApiError;
use super::AppState;
use crate::models::stock::{known_companies, Company, Comparison, DerivedRecord, Summary};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub symbol1: String,
    pub symbol2: String,
}

pub async fn home() -> Json<Value> {
    Json(json!({ "message": "API is running" }))
}

pub async fn list_companies() -> Json<Vec<Company>> {
    Json(known_companies())
}

pub async fn get_stock_data(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<DerivedRecord>>, ApiError> {
    Ok(Json(state.service.recent(&symbol).await?))
}

pub async fn get_stock_summary(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Summary>, ApiError> {
    Ok(Json(state.service.summary(&symbol).await?))
}

pub async fn compare(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CompareParams>, QueryRejection>,
) -> Result<Json<Comparison>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    Ok(Json(state.service.compare(&params.symbol1, &params.symbol2).await?))
}
