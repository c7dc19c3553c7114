use rageval::{Prediction, ScoreReport, Solution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub solution: Solution,
    pub prediction: Prediction,
    pub k: Option<Vec<usize>>,
    pub metrics: Option<Vec<String>>,
    pub stop_on_shortfall: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub scores: ScoreReport,
    pub queries_evaluated: BTreeMap<usize, usize>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
