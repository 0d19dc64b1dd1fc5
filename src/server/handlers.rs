//! Request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{Result, ServerError};
use super::state::AppState;
use crate::data::{FeatureKind, InputRecord};
use crate::pipeline::InputExplanation;

/// Health check with a summary of the loaded artifacts
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let artifacts = &state.artifacts;
    Json(json!({
        "status": "ok",
        "trees": artifacts.forest.n_estimators,
        "eval_rows": artifacts.x_eval.nrows(),
        "encoded_columns": artifacts.feature_names.len(),
    }))
}

/// Widget schema: one entry per original feature column.
///
/// Numeric features carry the evaluation-partition mean as the widget
/// default; categorical features carry their observed choices.
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<Value> {
    let artifacts = &state.artifacts;
    let features: Vec<Value> = artifacts
        .schema
        .features
        .iter()
        .map(|spec| match &spec.kind {
            FeatureKind::Numeric => json!({
                "name": spec.name,
                "kind": "numeric",
                "default": artifacts.numeric_defaults.get(&spec.name),
            }),
            FeatureKind::Categorical { categories } => json!({
                "name": spec.name,
                "kind": "categorical",
                "choices": categories,
            }),
        })
        .collect();

    Json(json!({
        "target": artifacts.schema.target,
        "features": features,
        "encoded_columns": artifacts.feature_names,
    }))
}

/// Classification report over the evaluation partition
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "report": state.artifacts.report,
        "expected_value": state.artifacts.expected_value,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    /// "all" (default) or "negative"
    pub class: Option<String>,
}

/// Batch attribution summary chart
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Value>> {
    let artifacts = &state.artifacts;
    let chart = match params.class.as_deref() {
        None | Some("all") => &artifacts.summary_all,
        Some("negative") => &artifacts.summary_negative,
        Some(other) => {
            return Err(ServerError::BadRequest(format!(
                "unknown summary class '{}', expected 'all' or 'negative'",
                other
            )))
        }
    };
    Ok(Json(json!({ "summary": chart })))
}

/// Predict and explain one interactive input record
pub async fn explain(
    State(state): State<Arc<AppState>>,
    Json(record): Json<InputRecord>,
) -> Result<Json<InputExplanation>> {
    let explanation = state.artifacts.explain_input(&record)?;
    Ok(Json(explanation))
}

/// Explain one record of the evaluation partition by row index
pub async fn explain_eval_row(
    State(state): State<Arc<AppState>>,
    Path(row): Path<usize>,
) -> Result<Json<InputExplanation>> {
    let explanation = state.artifacts.explain_eval_record(row)?;
    Ok(Json(explanation))
}
