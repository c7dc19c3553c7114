//! Retrieval metrics over a ranked prediction and one relevance judgment.
//!
//! Every metric looks only at the first `k` predicted documents. The "ideal"
//! ordering used by IDCG and NDCG is the same top-k candidate set re-sorted by
//! grade, not the full judgment set, so normalized scores are only comparable
//! between systems evaluated over the same candidate pool.

use crate::error::{EvalError, Result};
use crate::types::{DocId, RankedPrediction, RelevanceJudgment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed catalogue of metric kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    Precision,
    Recall,
    AveragePrecision,
    ReciprocalRank,
    TopKAccuracy,
    Hole,
    CumulativeGain,
    Dcg,
    Idcg,
    IndicatorDcg,
    IndicatorIdcg,
    Ndcg,
}

impl MetricKind {
    /// Every metric, in report order
    pub const ALL: [MetricKind; 12] = [
        MetricKind::Precision,
        MetricKind::Recall,
        MetricKind::AveragePrecision,
        MetricKind::ReciprocalRank,
        MetricKind::TopKAccuracy,
        MetricKind::Hole,
        MetricKind::CumulativeGain,
        MetricKind::Dcg,
        MetricKind::Idcg,
        MetricKind::IndicatorDcg,
        MetricKind::IndicatorIdcg,
        MetricKind::Ndcg,
    ];

    /// Public report name (without the cutoff suffix)
    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::Precision => "Precision",
            MetricKind::Recall => "Recall",
            MetricKind::AveragePrecision => "MAP",
            MetricKind::ReciprocalRank => "MRR",
            MetricKind::TopKAccuracy => "TopKAccuracy",
            MetricKind::Hole => "Hole",
            MetricKind::CumulativeGain => "CG",
            MetricKind::Dcg => "DCG",
            MetricKind::Idcg => "IDCG",
            MetricKind::IndicatorDcg => "IndicatorDCG",
            MetricKind::IndicatorIdcg => "IndicatorIDCG",
            MetricKind::Ndcg => "NDCG",
        }
    }

    /// Report key, e.g. `MRR@10`
    pub fn report_key(self, k: usize) -> String {
        format!("{}@{}", self.display_name(), k)
    }

    /// Evaluate this metric at cutoff `k`
    pub fn evaluate(
        self,
        judgment: &RelevanceJudgment,
        prediction: &RankedPrediction,
        k: usize,
    ) -> Result<f64> {
        let top_k = &cutoff(prediction, k)?;
        let score = match self {
            MetricKind::Precision => precision(judgment, top_k),
            MetricKind::Recall => recall(judgment, top_k)?,
            MetricKind::AveragePrecision => average_precision(judgment, top_k),
            MetricKind::ReciprocalRank => reciprocal_rank(judgment, top_k),
            MetricKind::TopKAccuracy => top_k_accuracy(judgment, top_k),
            MetricKind::Hole => hole(judgment, top_k),
            MetricKind::CumulativeGain => cumulative_gain(judgment, top_k),
            MetricKind::Dcg => dcg(judgment, top_k, Gain::Raw),
            MetricKind::Idcg => idcg(judgment, top_k, Gain::Raw),
            MetricKind::IndicatorDcg => dcg(judgment, top_k, Gain::Exponential),
            MetricKind::IndicatorIdcg => idcg(judgment, top_k, Gain::Exponential),
            MetricKind::Ndcg => ndcg(judgment, top_k),
        };
        Ok(score)
    }

    /// True for metrics bounded to [0, 1]
    pub fn is_normalized(self) -> bool {
        !matches!(
            self,
            MetricKind::CumulativeGain
                | MetricKind::Dcg
                | MetricKind::Idcg
                | MetricKind::IndicatorDcg
                | MetricKind::IndicatorIdcg
        )
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for MetricKind {
    type Err = EvalError;

    /// Accepts public names case-insensitively, plus a few common aliases
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        if let Some(kind) = MetricKind::ALL
            .iter()
            .find(|k| k.display_name().eq_ignore_ascii_case(needle))
        {
            return Ok(*kind);
        }
        match needle.to_ascii_lowercase().as_str() {
            "ap" | "average_precision" => Ok(MetricKind::AveragePrecision),
            "rr" | "reciprocal_rank" => Ok(MetricKind::ReciprocalRank),
            "top_k_accuracy" | "accuracy" => Ok(MetricKind::TopKAccuracy),
            "indicator_dcg" => Ok(MetricKind::IndicatorDcg),
            "indicator_idcg" => Ok(MetricKind::IndicatorIdcg),
            _ => Err(EvalError::InvalidInput(format!("unknown metric '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Gain {
    /// grade
    Raw,
    /// 2^grade - 1
    Exponential,
}

impl Gain {
    fn of(self, grade: u32) -> f64 {
        let grade = f64::from(grade);
        match self {
            Gain::Raw => grade,
            Gain::Exponential => grade.exp2() - 1.0,
        }
    }
}

fn cutoff(prediction: &RankedPrediction, k: usize) -> Result<Vec<DocId>> {
    if k == 0 {
        return Err(EvalError::Precondition("cutoff k must be at least 1".to_string()));
    }
    Ok(prediction.top_k(k))
}

fn hits(judgment: &RelevanceJudgment, top_k: &[DocId]) -> usize {
    top_k.iter().filter(|d| judgment.is_relevant(d)).count()
}

fn precision(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    if top_k.is_empty() {
        return 0.0;
    }
    hits(judgment, top_k) as f64 / top_k.len() as f64
}

fn recall(judgment: &RelevanceJudgment, top_k: &[DocId]) -> Result<f64> {
    let relevant = judgment.relevant().len();
    if relevant == 0 {
        return Err(EvalError::Precondition(
            "recall needs at least one relevant document".to_string(),
        ));
    }
    Ok(hits(judgment, top_k) as f64 / relevant as f64)
}

/// Mean of precision at each relevant hit within the top k.
fn average_precision(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    let mut found = 0usize;
    let mut sum = 0.0;
    for (rank, doc) in top_k.iter().enumerate() {
        if judgment.is_relevant(doc) {
            found += 1;
            sum += found as f64 / (rank + 1) as f64;
        }
    }
    if found == 0 {
        0.0
    } else {
        sum / found as f64
    }
}

fn reciprocal_rank(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    top_k
        .iter()
        .position(|d| judgment.is_relevant(d))
        .map(|idx| 1.0 / (idx + 1) as f64)
        .unwrap_or(0.0)
}

fn top_k_accuracy(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    if top_k.iter().any(|d| judgment.is_relevant(d)) {
        1.0
    } else {
        0.0
    }
}

fn hole(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    if top_k.is_empty() {
        return 0.0;
    }
    (top_k.len() - hits(judgment, top_k)) as f64 / top_k.len() as f64
}

fn cumulative_gain(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    top_k.iter().map(|d| f64::from(judgment.grade(d))).sum()
}

fn discounted(grades: impl Iterator<Item = u32>, gain: Gain) -> f64 {
    grades
        .enumerate()
        .map(|(rank, grade)| gain.of(grade) / (rank as f64 + 2.0).log2())
        .sum()
}

fn dcg(judgment: &RelevanceJudgment, top_k: &[DocId], gain: Gain) -> f64 {
    discounted(top_k.iter().map(|d| judgment.grade(d)), gain)
}

fn idcg(judgment: &RelevanceJudgment, top_k: &[DocId], gain: Gain) -> f64 {
    let mut grades: Vec<u32> = top_k.iter().map(|d| judgment.grade(d)).collect();
    grades.sort_unstable_by(|a, b| b.cmp(a));
    discounted(grades.into_iter(), gain)
}

fn ndcg(judgment: &RelevanceJudgment, top_k: &[DocId]) -> f64 {
    let ideal = idcg(judgment, top_k, Gain::Exponential);
    if ideal <= 0.0 {
        return 0.0;
    }
    dcg(judgment, top_k, Gain::Exponential) / ideal
}
