//! Per-query and cross-query aggregation.
//!
//! A query may carry several annotators, each with an independently valid
//! evidence set. A query's score for a metric is the best score over its
//! annotators, so a system matching any one valid annotation is not
//! penalized. Cross-query scores are plain means of those per-query maxima.

use crate::error::Result;
use crate::metrics::MetricKind;
use crate::report::{mean, ScoreReport, ScoreTable};
use crate::types::{QueryId, QueryRecord};
use serde::{Deserialize, Serialize};

/// What to do when a query has fewer candidates than the cutoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Leave that query out of this cutoff and keep going
    #[default]
    Skip,
    /// Stop evaluating the remaining queries at this cutoff
    Stop,
}

/// One query's best-annotator scores at one cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBreakdown {
    pub query_id: QueryId,
    pub k: usize,
    pub scores: Vec<(MetricKind, f64)>,
}

/// Everything gathered for one cutoff
#[derive(Debug, Clone, Default)]
pub struct CutoffScores {
    pub table: ScoreTable,
    pub evaluated: usize,
    pub skipped: Vec<QueryId>,
    pub breakdown: Vec<QueryBreakdown>,
}

/// Best score for `kind` across the record's annotators.
///
/// Annotators without a single relevant document (no evidence, or only
/// grade-0 entries) score 0 without being evaluated. A record with no
/// annotators scores 0.
pub fn best_annotator_score(kind: MetricKind, record: &QueryRecord, k: usize) -> Result<f64> {
    let mut best = 0.0_f64;
    for judgment in &record.annotators {
        if !judgment.has_relevant() {
            continue;
        }
        let score = kind.evaluate(judgment, &record.prediction, k)?;
        best = best.max(score);
    }
    Ok(best)
}

/// Score one query on every requested metric at cutoff `k`
pub fn score_query(
    record: &QueryRecord,
    metrics: &[MetricKind],
    k: usize,
) -> Result<QueryBreakdown> {
    let scores = metrics
        .iter()
        .map(|kind| -> Result<(MetricKind, f64)> {
            Ok((*kind, best_annotator_score(*kind, record, k)?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QueryBreakdown {
        query_id: record.query_id.clone(),
        k,
        scores,
    })
}

/// Score every record at cutoff `k`, collecting per-query lists under `Metric@k`.
///
/// Every `Metric@k` key is present in the table even when no query contributed,
/// so that the cross-query mean reports the gap instead of dropping the key.
pub fn aggregate_cutoff(
    records: &[QueryRecord],
    metrics: &[MetricKind],
    k: usize,
    policy: ShortfallPolicy,
) -> Result<CutoffScores> {
    let mut out = CutoffScores::default();
    for kind in metrics {
        out.table.ensure(&kind.report_key(k));
    }

    for record in records {
        if record.prediction.len() < k {
            match policy {
                ShortfallPolicy::Skip => {
                    tracing::debug!(
                        "Skipping query {} at k={}: {} candidates",
                        record.query_id,
                        k,
                        record.prediction.len()
                    );
                    out.skipped.push(record.query_id.clone());
                    continue;
                }
                ShortfallPolicy::Stop => {
                    tracing::warn!(
                        "Query {} has {} candidates, stopping k={} early",
                        record.query_id,
                        record.prediction.len(),
                        k
                    );
                    break;
                }
            }
        }

        let breakdown = score_query(record, metrics, k)?;
        for (kind, score) in &breakdown.scores {
            out.table.push(&kind.report_key(k), *score);
        }
        out.breakdown.push(breakdown);
        out.evaluated += 1;
    }

    if !out.skipped.is_empty() {
        tracing::warn!(
            "{} of {} queries skipped at k={} (fewer candidates than k)",
            out.skipped.len(),
            records.len(),
            k
        );
    }

    Ok(out)
}

/// Mean of every per-query list, keyed as in the table
pub fn summarize(table: &ScoreTable) -> Result<ScoreReport> {
    let mut report = ScoreReport::default();
    for (key, scores) in table.iter() {
        report.insert(key, mean(key, scores)?);
    }
    Ok(report)
}
