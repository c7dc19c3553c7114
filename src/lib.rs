//! # rageval - Retrieval evaluation for RAG pipelines
//!
//! Scores ranked retrieval output against multi-annotator relevance judgments
//! with the usual information-retrieval metrics (precision, recall, MAP, MRR,
//! hole rate, top-k accuracy, CG/DCG/IDCG and NDCG) at several cutoffs.
//!
//! ```no_run
//! use rageval::{evaluate_files, EvaluationConfig};
//!
//! let eval = evaluate_files("pred.json", "sol.json", &EvaluationConfig::default())?;
//! println!("{}", eval.report);
//! # Ok::<(), rageval::EvalError>(())
//! ```

pub mod aggregation;
pub mod error;
pub mod eval_harness;
pub mod evidence;
pub mod metrics;
pub mod report;
pub mod types;

pub use aggregation::{
    aggregate_cutoff, best_annotator_score, score_query, summarize, CutoffScores, QueryBreakdown,
    ShortfallPolicy,
};
pub use error::{EvalError, Result};
pub use eval_harness::{
    build_records, evaluate, evaluate_files, evaluate_records, require_json_path, Evaluation,
    EvaluationConfig, EvaluationConfigBuilder, DEFAULT_CUTOFFS,
};
pub use evidence::{
    flatten_annotation, load_prediction, load_solution, parse_prediction, parse_solution,
    Prediction, PredictionEntry, Solution, SolutionEntry,
};
pub use metrics::MetricKind;
pub use report::{mean, ScoreReport, ScoreTable};
pub use types::{DocId, QueryId, QueryRecord, RankedPrediction, RelevanceJudgment};

/// Parse a comma-separated cutoff list such as `1,5,10`
pub fn parse_cutoffs(text: &str) -> Result<Vec<usize>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|e| EvalError::InvalidInput(format!("bad cutoff '{part}': {e}")))
        })
        .collect()
}

/// Parse a comma-separated metric list such as `NDCG,MRR,Recall`
pub fn parse_metrics(text: &str) -> Result<Vec<MetricKind>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<MetricKind>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_lists_parse() {
        assert_eq!(parse_cutoffs("1,5,10").unwrap(), vec![1, 5, 10]);
        assert_eq!(parse_cutoffs(" 3 , 20 ").unwrap(), vec![3, 20]);
        assert!(matches!(parse_cutoffs("1,x"), Err(EvalError::InvalidInput(_))));
    }

    #[test]
    fn metric_lists_parse() {
        assert_eq!(
            parse_metrics("NDCG, mrr").unwrap(),
            vec![MetricKind::Ndcg, MetricKind::ReciprocalRank]
        );
        assert!(parse_metrics("NDCG,nope").is_err());
    }
}
