use crate::models::{ErrorResponse, EvaluateRequest, EvaluateResponse, MetricsResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use rageval::{
    evaluate as run_evaluation, EvalError, EvaluationConfig, MetricKind, ShortfallPolicy,
};
use std::sync::Arc;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

pub async fn list_metrics() -> Json<MetricsResponse> {
    Json(MetricsResponse {
        metrics: MetricKind::ALL.iter().map(|k| k.display_name()).collect(),
    })
}

pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let config = request_config(&state.defaults, &payload).map_err(reject)?;

    // Scoring runs on the blocking pool
    let result = tokio::task::spawn_blocking(move || {
        run_evaluation(&payload.solution, &payload.prediction, &config)
    })
    .await
    .map_err(|e| {
        tracing::error!("Evaluation task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "evaluation task failed".to_string(),
            }),
        )
    })?;

    match result {
        Ok(eval) => Ok(Json(EvaluateResponse {
            queries_evaluated: eval.report.queries_evaluated.clone(),
            scores: eval.report,
        })),
        Err(e) => {
            tracing::warn!("Evaluation rejected: {}", e);
            Err(reject(e))
        }
    }
}

fn request_config(
    defaults: &EvaluationConfig,
    payload: &EvaluateRequest,
) -> rageval::Result<EvaluationConfig> {
    let mut config = defaults.clone();
    if let Some(k) = &payload.k {
        config.cutoffs = k.clone();
    }
    if let Some(names) = &payload.metrics {
        config.metrics = names
            .iter()
            .map(|n| n.parse::<MetricKind>())
            .collect::<rageval::Result<Vec<_>>>()?;
    }
    if let Some(stop) = payload.stop_on_shortfall {
        config.shortfall = if stop {
            ShortfallPolicy::Stop
        } else {
            ShortfallPolicy::Skip
        };
    }
    config.validate()?;
    Ok(config)
}

fn reject(e: EvalError) -> ApiError {
    let status = match e {
        EvalError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            defaults: Arc::new(EvaluationConfig::default()),
        }))
    }

    fn request(k: serde_json::Value) -> EvaluateRequest {
        serde_json::from_value(json!({
            "solution": {"q1": {"evidence": [[[["d1"]]]]}},
            "prediction": {"q1": {"paragraphs": ["d0", "d1"]}},
            "k": k,
            "metrics": ["MRR", "Recall"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn evaluate_returns_scores() {
        let Json(response) = evaluate(state(), Json(request(json!([2])))).await.unwrap();
        assert_eq!(response.scores.get("MRR@2"), Some(0.5));
        assert_eq!(response.scores.get("Recall@2"), Some(1.0));
        assert_eq!(response.queries_evaluated.get(&2), Some(&1));
    }

    #[tokio::test]
    async fn zero_cutoff_is_unprocessable() {
        let (status, Json(body)) = evaluate(state(), Json(request(json!([0])))).await.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.error.contains("at least 1"));
    }

    #[tokio::test]
    async fn repeated_cutoff_is_unprocessable() {
        let (status, Json(body)) =
            evaluate(state(), Json(request(json!([2, 2])))).await.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.error.contains("more than once"));
    }

    #[tokio::test]
    async fn metrics_are_listed_in_report_order() {
        let Json(response) = list_metrics().await;
        assert_eq!(response.metrics.first(), Some(&"Precision"));
        assert!(response.metrics.contains(&"NDCG"));
    }
}
