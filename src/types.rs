//! Judgment, prediction and query record types

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Document identifier
pub type DocId = String;

/// Query identifier
pub type QueryId = String;

/// Ground-truth relevance grades for one (query, annotator) pair.
///
/// A document absent from the map has grade 0. Grades cannot be changed once
/// the judgment is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelevanceJudgment {
    grades: HashMap<DocId, u32>,
}

impl RelevanceJudgment {
    /// Build a judgment from explicit grades
    pub fn new(grades: HashMap<DocId, u32>) -> Self {
        Self { grades }
    }

    /// Build a binary judgment where every member of the evidence set has grade 1
    pub fn from_evidence<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<DocId>,
    {
        Self {
            grades: docs.into_iter().map(|d| (d.into(), 1)).collect(),
        }
    }

    /// Grade of a document, 0 when unjudged
    pub fn grade(&self, doc: &str) -> u32 {
        self.grades.get(doc).copied().unwrap_or(0)
    }

    pub fn is_relevant(&self, doc: &str) -> bool {
        self.grade(doc) > 0
    }

    /// Documents with a grade above zero
    pub fn relevant(&self) -> HashSet<&str> {
        self.grades
            .iter()
            .filter(|(_, grade)| **grade > 0)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// True when at least one document has a grade above zero
    pub fn has_relevant(&self) -> bool {
        self.grades.values().any(|grade| *grade > 0)
    }

    /// True when the annotator judged no documents at all, not even with grade 0
    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }
}

/// A ranked candidate list for one query, as submitted.
///
/// Only the first `k` entries take part in any metric at cutoff `k`; a
/// document repeated inside that slice counts once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedPrediction {
    ranking: Vec<DocId>,
}

impl RankedPrediction {
    /// Keep the given order, repeats included
    pub fn from_ordered<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<DocId>,
    {
        Self {
            ranking: docs.into_iter().map(Into::<DocId>::into).collect(),
        }
    }

    /// Order by descending score. Ties keep their input order; NaN scores sort last.
    pub fn from_scores<I, S>(scored: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<DocId>,
    {
        let mut scored: Vec<(DocId, f64)> =
            scored.into_iter().map(|(d, s)| (d.into(), s)).collect();
        scored.sort_by(|a, b| descending_score(a.1, b.1));
        Self::from_ordered(scored.into_iter().map(|(d, _)| d))
    }

    /// Order an unordered score map by descending score, breaking ties by document id.
    pub fn from_score_map(scores: &HashMap<DocId, f64>) -> Self {
        let mut scored: Vec<(&DocId, f64)> = scores.iter().map(|(d, s)| (d, *s)).collect();
        scored.sort_by(|a, b| descending_score(a.1, b.1).then_with(|| a.0.cmp(b.0)));
        Self {
            ranking: scored.into_iter().map(|(d, _)| d.clone()).collect(),
        }
    }

    /// Distinct documents among the first `k` entries, in first-seen order.
    ///
    /// The slice is taken before repeats are dropped, so a ranking with
    /// repeats can yield fewer than `k` documents.
    pub fn top_k(&self, k: usize) -> Vec<DocId> {
        let mut seen = HashSet::new();
        self.ranking
            .iter()
            .take(k)
            .filter(|doc| seen.insert(doc.as_str()))
            .cloned()
            .collect()
    }

    /// Number of submitted candidates, repeats included
    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.ranking
    }
}

fn descending_score(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// One query: a judgment per annotator plus the system's ranked prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query_id: QueryId,
    pub annotators: Vec<RelevanceJudgment>,
    pub prediction: RankedPrediction,
}

impl QueryRecord {
    pub fn new(
        query_id: impl Into<QueryId>,
        annotators: Vec<RelevanceJudgment>,
        prediction: RankedPrediction,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            annotators,
            prediction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_are_dropped_after_the_cutoff_slice() {
        let p = RankedPrediction::from_ordered(["a", "b", "a", "c"]);
        assert_eq!(p.len(), 4);
        assert_eq!(p.top_k(3), vec!["a", "b"]);
        assert_eq!(p.top_k(4), vec!["a", "b", "c"]);
    }

    #[test]
    fn scored_prediction_keeps_input_order_on_ties() {
        let p =
            RankedPrediction::from_scores([("z", 0.5), ("a", 0.9), ("m", 0.5), ("q", f64::NAN)]);
        assert_eq!(p.as_slice(), &["a", "z", "m", "q"]);
    }

    #[test]
    fn score_map_breaks_ties_by_doc_id() {
        let scores: HashMap<DocId, f64> = [("c", 1.0), ("a", 1.0), ("b", 2.0)]
            .into_iter()
            .map(|(d, s)| (d.to_string(), s))
            .collect();
        let p = RankedPrediction::from_score_map(&scores);
        assert_eq!(p.as_slice(), &["b", "a", "c"]);
    }

    #[test]
    fn top_k_is_clamped_to_ranking_length() {
        let p = RankedPrediction::from_ordered(["a", "b"]);
        assert_eq!(p.top_k(5).len(), 2);
        assert_eq!(p.top_k(1), vec!["a"]);
    }

    #[test]
    fn judgment_treats_absent_docs_as_irrelevant() {
        let j = RelevanceJudgment::from_evidence(["d1", "d3"]);
        assert_eq!(j.grade("d1"), 1);
        assert_eq!(j.grade("d2"), 0);
        assert!(!j.is_relevant("d2"));
        assert_eq!(j.relevant().len(), 2);
    }

    #[test]
    fn zero_grades_are_judged_but_not_relevant() {
        let grades: HashMap<DocId, u32> = [("d1".to_string(), 0)].into_iter().collect();
        let j = RelevanceJudgment::new(grades);
        assert!(!j.is_empty());
        assert!(!j.has_relevant());
        assert!(RelevanceJudgment::from_evidence(["d2"]).has_relevant());
        assert!(!RelevanceJudgment::default().has_relevant());
    }
}
