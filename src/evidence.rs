//! Solution and prediction file formats.
//!
//! A solution entry carries one evidence annotation per annotator. Each
//! annotation is a list of reasoning steps, and each step is a list whose
//! list-typed elements hold the supporting document ids:
//!
//! ```json
//! { "q1": { "evidence": [ [ [ ["d1", "d2"], "operation" ], [ "no_evidence" ] ] ] } }
//! ```
//!
//! Flattening walks every list-typed step element recursively and collects its
//! string leaves. Non-list step elements such as `"operation"` or
//! `"no_evidence"` are markers, not documents, and are ignored.

use crate::error::Result;
use crate::types::{DocId, QueryId, RankedPrediction, RelevanceJudgment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One query's ground truth, one annotation per annotator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionEntry {
    pub evidence: Vec<Value>,
}

impl SolutionEntry {
    /// Evidence set of every annotator, in annotator order
    pub fn evidence_sets(&self) -> Vec<BTreeSet<DocId>> {
        self.evidence.iter().map(flatten_annotation).collect()
    }

    /// Binary judgments built from the evidence sets
    pub fn judgments(&self) -> Vec<RelevanceJudgment> {
        self.evidence_sets()
            .into_iter()
            .map(RelevanceJudgment::from_evidence)
            .collect()
    }
}

/// One query's system output: candidate documents in ranked order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub paragraphs: Vec<DocId>,
}

impl PredictionEntry {
    /// All paragraphs as a ranked prediction, in submitted order
    pub fn ranked(&self) -> RankedPrediction {
        RankedPrediction::from_ordered(self.paragraphs.iter().cloned())
    }
}

/// Solution collection keyed by query id (iterated in ascending id order)
pub type Solution = BTreeMap<QueryId, SolutionEntry>;

/// Prediction collection keyed by query id
pub type Prediction = BTreeMap<QueryId, PredictionEntry>;

/// Collect the evidence set of one annotator's annotation.
///
/// The annotation is a list of steps. Within a step, list elements are walked
/// recursively and all their string leaves collected; any other sibling is
/// skipped. A non-list annotation yields an empty set.
pub fn flatten_annotation(annotation: &Value) -> BTreeSet<DocId> {
    let mut docs = BTreeSet::new();
    if let Value::Array(steps) = annotation {
        for step in steps {
            if let Value::Array(elements) = step {
                for element in elements {
                    if let Value::Array(_) = element {
                        collect_leaves(element, &mut docs);
                    }
                }
            }
        }
    }
    docs
}

fn collect_leaves(value: &Value, docs: &mut BTreeSet<DocId>) {
    match value {
        Value::String(id) => {
            docs.insert(id.clone());
        }
        Value::Array(items) => {
            for item in items {
                collect_leaves(item, docs);
            }
        }
        _ => {}
    }
}

/// Parse a solution collection from JSON text
pub fn parse_solution(json: &str) -> Result<Solution> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a prediction collection from JSON text
pub fn parse_prediction(json: &str) -> Result<Prediction> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a solution file
pub fn load_solution(path: impl AsRef<Path>) -> Result<Solution> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_solution(&text)
}

/// Read and parse a prediction file
pub fn load_prediction(path: impl AsRef<Path>) -> Result<Prediction> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_prediction(&text)
}
