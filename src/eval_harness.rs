//! Evaluation harness: runs every metric over every query at every cutoff.
//!
//! Measures, per cutoff k:
//! - Precision, Recall, Hole, Top-k accuracy
//! - MAP and MRR
//! - CG, DCG, IDCG and their exponential-gain variants
//! - NDCG
//!
//! Each query contributes its best score across annotators; reported values
//! are means over the contributing queries.

use crate::aggregation::{aggregate_cutoff, summarize, QueryBreakdown, ShortfallPolicy};
use crate::error::{EvalError, Result};
use crate::evidence::{load_prediction, load_solution, Prediction, Solution};
use crate::metrics::MetricKind;
use crate::report::{ScoreReport, ScoreTable};
use crate::types::QueryRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Cutoffs evaluated when none are configured
pub const DEFAULT_CUTOFFS: [usize; 3] = [1, 5, 10];

/// Configuration for an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Cutoff values k; each produces its own `Metric@k` keys
    pub cutoffs: Vec<usize>,

    /// Metrics to compute, in report order
    pub metrics: Vec<MetricKind>,

    /// Handling of queries with fewer candidates than k
    pub shortfall: ShortfallPolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            cutoffs: DEFAULT_CUTOFFS.to_vec(),
            metrics: MetricKind::ALL.to_vec(),
            shortfall: ShortfallPolicy::Skip,
        }
    }
}

impl EvaluationConfig {
    /// Reject configurations that cannot produce a report
    pub fn validate(&self) -> Result<()> {
        if self.cutoffs.is_empty() {
            return Err(EvalError::Precondition("at least one cutoff is required".to_string()));
        }
        if let Some(k) = self.cutoffs.iter().find(|k| **k == 0) {
            return Err(EvalError::Precondition(format!("cutoff k must be at least 1, got {k}")));
        }
        let mut seen = HashSet::new();
        if let Some(k) = self.cutoffs.iter().find(|k| !seen.insert(**k)) {
            return Err(EvalError::Precondition(format!("cutoff {k} is listed more than once")));
        }
        if self.metrics.is_empty() {
            return Err(EvalError::Precondition("at least one metric is required".to_string()));
        }
        Ok(())
    }
}

/// Builder for evaluation config
pub struct EvaluationConfigBuilder {
    config: EvaluationConfig,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EvaluationConfig::default(),
        }
    }

    pub fn cutoffs(mut self, cutoffs: Vec<usize>) -> Self {
        self.config.cutoffs = cutoffs;
        self
    }

    pub fn metrics(mut self, metrics: Vec<MetricKind>) -> Self {
        self.config.metrics = metrics;
        self
    }

    pub fn shortfall(mut self, policy: ShortfallPolicy) -> Self {
        self.config.shortfall = policy;
        self
    }

    pub fn build(self) -> Result<EvaluationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for EvaluationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a full evaluation run
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// `Metric@k` → mean over contributing queries
    pub report: ScoreReport,
    /// Per-query lists behind every report entry
    pub table: ScoreTable,
    /// Per-query, per-cutoff scores
    pub breakdown: Vec<QueryBreakdown>,
}

/// Pair every solution query with its prediction, in ascending query-id order.
///
/// A solution query without a prediction is an error; predictions for queries
/// absent from the solution are ignored.
pub fn build_records(solution: &Solution, prediction: &Prediction) -> Result<Vec<QueryRecord>> {
    solution
        .iter()
        .map(|(query_id, entry)| -> Result<QueryRecord> {
            let predicted = prediction
                .get(query_id)
                .ok_or_else(|| EvalError::MissingPrediction(query_id.clone()))?;
            Ok(QueryRecord::new(
                query_id.clone(),
                entry.judgments(),
                predicted.ranked(),
            ))
        })
        .collect()
}

/// Evaluate prepared query records under `config`
pub fn evaluate_records(records: &[QueryRecord], config: &EvaluationConfig) -> Result<Evaluation> {
    config.validate()?;

    let mut table = ScoreTable::new();
    let mut breakdown = Vec::new();
    let mut evaluated = Vec::with_capacity(config.cutoffs.len());

    for &k in &config.cutoffs {
        let cutoff = aggregate_cutoff(records, &config.metrics, k, config.shortfall)?;
        tracing::debug!("k={}: {} queries evaluated", k, cutoff.evaluated);
        evaluated.push((k, cutoff.evaluated));
        table.merge(cutoff.table);
        breakdown.extend(cutoff.breakdown);
    }

    let mut report = summarize(&table)?;
    report.queries_evaluated = evaluated.into_iter().collect();

    tracing::info!(
        "Evaluated {} queries at cutoffs {:?} ({} scores)",
        records.len(),
        config.cutoffs,
        report.len()
    );

    Ok(Evaluation {
        report,
        table,
        breakdown,
    })
}

/// Evaluate parsed solution and prediction collections
pub fn evaluate(
    solution: &Solution,
    prediction: &Prediction,
    config: &EvaluationConfig,
) -> Result<Evaluation> {
    let records = build_records(solution, prediction)?;
    evaluate_records(&records, config)
}

/// Fail unless `path` has a `.json` extension
pub fn require_json_path(path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(())
    } else {
        Err(EvalError::InvalidInput(format!(
            "expected a .json file, got '{}'",
            path.display()
        )))
    }
}

/// Load prediction and solution files and evaluate them.
///
/// Both paths are checked for a `.json` extension before anything is read.
pub fn evaluate_files(
    prediction_path: impl AsRef<Path>,
    solution_path: impl AsRef<Path>,
    config: &EvaluationConfig,
) -> Result<Evaluation> {
    let prediction_path = prediction_path.as_ref();
    let solution_path = solution_path.as_ref();
    require_json_path(prediction_path)?;
    require_json_path(solution_path)?;
    config.validate()?;

    let prediction = load_prediction(prediction_path)?;
    let solution = load_solution(solution_path)?;
    tracing::debug!(
        "Loaded {} solution queries and {} predictions",
        solution.len(),
        prediction.len()
    );

    evaluate(&solution, &prediction, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{parse_prediction, parse_solution};
    use crate::types::{DocId, RankedPrediction, RelevanceJudgment};
    use std::collections::HashMap;

    const SOLUTION: &str = r#"{
        "q1": {"evidence": [[[["d1", "d3"]]], [[["d9"]], ["operation"]]]},
        "q2": {"evidence": [[[["d5"]]]]}
    }"#;

    const PREDICTION: &str = r#"{
        "q1": {"paragraphs": ["d2", "d1", "d3", "d4", "d6"]},
        "q2": {"paragraphs": ["d5", "d7", "d8", "d9", "d0"]}
    }"#;

    fn fixtures() -> (Solution, Prediction) {
        (parse_solution(SOLUTION).unwrap(), parse_prediction(PREDICTION).unwrap())
    }

    #[test]
    fn default_config_covers_every_metric_at_standard_cutoffs() {
        let config = EvaluationConfig::default();
        assert_eq!(config.cutoffs, vec![1, 5, 10]);
        assert_eq!(config.metrics.len(), MetricKind::ALL.len());
        assert_eq!(config.shortfall, ShortfallPolicy::Skip);
    }

    #[test]
    fn builder_rejects_zero_cutoff() {
        let err = EvaluationConfigBuilder::new().cutoffs(vec![0, 5]).build().unwrap_err();
        assert!(matches!(err, EvalError::Precondition(_)));
        assert!(EvaluationConfigBuilder::new().cutoffs(Vec::new()).build().is_err());
        assert!(EvaluationConfigBuilder::new().metrics(Vec::new()).build().is_err());
    }

    #[test]
    fn builder_rejects_repeated_cutoff() {
        let err = EvaluationConfigBuilder::new().cutoffs(vec![5, 1, 5]).build().unwrap_err();
        assert!(matches!(err, EvalError::Precondition(ref msg) if msg.contains("cutoff 5")));
    }

    #[test]
    fn records_with_graded_judgments_and_scores() {
        fn grades(pairs: &[(&str, u32)]) -> RelevanceJudgment {
            let grades: HashMap<DocId, u32> =
                pairs.iter().map(|(d, g)| (d.to_string(), *g)).collect();
            RelevanceJudgment::new(grades)
        }
        let scores: HashMap<DocId, f64> = [("p", 0.5), ("q", 0.5), ("r", 0.1)]
            .into_iter()
            .map(|(d, s)| (d.to_string(), s))
            .collect();
        let records = vec![
            // ranked p, q, r; the zero-grade annotator is skipped, not an error
            QueryRecord::new(
                "q1",
                vec![grades(&[("p", 0), ("q", 0)]), grades(&[("q", 2), ("r", 1)])],
                RankedPrediction::from_score_map(&scores),
            ),
            // ranked m, n
            QueryRecord::new(
                "q2",
                vec![grades(&[("m", 1), ("n", 0)])],
                RankedPrediction::from_scores([("n", 0.2), ("m", 0.8)]),
            ),
        ];
        let config = EvaluationConfigBuilder::new()
            .cutoffs(vec![2])
            .metrics(vec![MetricKind::Recall, MetricKind::ReciprocalRank, MetricKind::Ndcg])
            .build()
            .unwrap();
        let eval = evaluate_records(&records, &config).unwrap();

        // recall: q1 hits q of {q, r}, q2 hits m of {m}
        assert!((eval.report.get("Recall@2").unwrap() - 0.75).abs() < 1e-12);
        // reciprocal rank: q1 first hit at rank 2, q2 at rank 1
        assert!((eval.report.get("MRR@2").unwrap() - 0.75).abs() < 1e-12);
        // q1 top 2 is (0, 3) against the ideal (3, 0): 3/log2(3) / 3
        let q1_ndcg = 1.0 / 3f64.log2();
        assert!((eval.report.get("NDCG@2").unwrap() - (q1_ndcg + 1.0) / 2.0).abs() < 1e-12);
        assert_eq!(eval.report.queries_evaluated.get(&2), Some(&2));
    }

    #[test]
    fn evaluate_produces_renamed_keys_per_cutoff() {
        let (solution, prediction) = fixtures();
        let config = EvaluationConfigBuilder::new()
            .cutoffs(vec![1, 3])
            .metrics(vec![
                MetricKind::Precision,
                MetricKind::ReciprocalRank,
                MetricKind::AveragePrecision,
            ])
            .build()
            .unwrap();
        let eval = evaluate(&solution, &prediction, &config).unwrap();

        let keys: Vec<_> = eval.report.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["Precision@1", "MRR@1", "MAP@1", "Precision@3", "MRR@3", "MAP@3"]);

        // q1 first hit at rank 2, q2 at rank 1
        assert!((eval.report.get("MRR@3").unwrap() - 0.75).abs() < 1e-12);
        // precision@1: q1 misses, q2 hits
        assert!((eval.report.get("Precision@1").unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(eval.report.queries_evaluated.get(&3), Some(&2));
        assert_eq!(eval.breakdown.len(), 4);
    }

    #[test]
    fn cutoff_order_does_not_change_scores() {
        let (solution, prediction) = fixtures();
        let forward = EvaluationConfigBuilder::new().cutoffs(vec![1, 5]).build().unwrap();
        let backward = EvaluationConfigBuilder::new().cutoffs(vec![5, 1]).build().unwrap();
        let a = evaluate(&solution, &prediction, &forward).unwrap().report;
        let b = evaluate(&solution, &prediction, &backward).unwrap().report;
        for (key, score) in a.iter() {
            assert_eq!(b.get(key), Some(score), "{key}");
        }
    }

    #[test]
    fn cutoff_beyond_every_prediction_is_an_error() {
        let (solution, prediction) = fixtures();
        // both predictions have 5 paragraphs, so nothing contributes at k=10
        let err = evaluate(&solution, &prediction, &EvaluationConfig::default()).unwrap_err();
        assert!(matches!(err, EvalError::EmptyAggregate(_)));
    }

    #[test]
    fn missing_prediction_is_reported() {
        let solution =
            parse_solution(r#"{"q1": {"evidence": []}, "q2": {"evidence": []}}"#).unwrap();
        let prediction = parse_prediction(r#"{"q1": {"paragraphs": ["a"]}}"#).unwrap();
        let err = build_records(&solution, &prediction).unwrap_err();
        assert!(matches!(err, EvalError::MissingPrediction(ref q) if q == "q2"));
    }

    #[test]
    fn zero_cutoff_fails_before_scoring() {
        let (solution, prediction) = fixtures();
        let config = EvaluationConfig {
            cutoffs: vec![0],
            ..Default::default()
        };
        let err = evaluate(&solution, &prediction, &config).unwrap_err();
        assert!(matches!(err, EvalError::Precondition(_)));
    }

    #[test]
    fn json_extension_is_required() {
        assert!(require_json_path(Path::new("pred.json")).is_ok());
        assert!(require_json_path(Path::new("PRED.JSON")).is_ok());
        assert!(require_json_path(Path::new("pred.jsonl")).is_err());
        assert!(require_json_path(Path::new("pred")).is_err());
    }
}
