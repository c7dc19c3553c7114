//! Score tables and the final flat report

use crate::error::{EvalError, Result};
use colored::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Per-query scores collected under `Metric@k` keys, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    entries: Vec<(String, Vec<f64>)>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `key` exists, even if no query ends up contributing to it
    pub fn ensure(&mut self, key: &str) {
        self.slot(key);
    }

    /// Append one query's score under `key`
    pub fn push(&mut self, key: &str, score: f64) {
        self.slot(key).push(score);
    }

    fn slot(&mut self, key: &str) -> &mut Vec<f64> {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Append every list of `other`, keeping first-seen key order
    pub fn merge(&mut self, other: ScoreTable) {
        for (key, scores) in other.entries {
            self.slot(&key).extend(scores);
        }
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final `Metric@k` → mean score mapping, in report order.
///
/// `Display` renders the mapping as a dictionary literal:
/// `{'Precision@1': 0.5, 'MRR@1': 1.0}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    scores: Vec<(String, f64)>,
    /// Number of queries that contributed at each cutoff
    pub queries_evaluated: BTreeMap<usize, usize>,
}

impl ScoreReport {
    pub fn insert(&mut self, key: impl Into<String>, score: f64) {
        let key = key.into();
        match self.scores.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = score,
            None => self.scores.push((key, score)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.scores.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Render as a colored two-column table for terminals
    pub fn to_table(&self) -> String {
        let width = self.scores.iter().map(|(k, _)| k.len()).max().unwrap_or(6).max(6);
        let mut out = String::new();
        let header = format!("{:<width$}", "Metric");
        out.push_str(&format!("{}  {}\n", header.bold(), "Score".bold()));
        for (key, score) in &self.scores {
            let key = format!("{key:<width$}");
            out.push_str(&format!("{}  {score:.4}\n", key.cyan()));
        }
        for (k, n) in &self.queries_evaluated {
            out.push_str(&format!("{}\n", format!("k={k}: {n} queries").dimmed()));
        }
        out
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, score)) in self.scores.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", key, float_literal(*score))?;
        }
        f.write_str("}")
    }
}

/// Floats always carry a decimal point (`1.0`, not `1`)
fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl Serialize for ScoreReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scores.len()))?;
        for (key, score) in &self.scores {
            map.serialize_entry(key, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScoreReport {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let scores: BTreeMap<String, f64> = BTreeMap::deserialize(deserializer)?;
        Ok(Self {
            scores: scores.into_iter().collect(),
            queries_evaluated: BTreeMap::new(),
        })
    }
}

/// Arithmetic mean; an empty list is an error naming `key`
pub fn mean(key: &str, scores: &[f64]) -> Result<f64> {
    if scores.is_empty() {
        return Err(EvalError::EmptyAggregate(key.to_string()));
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}
