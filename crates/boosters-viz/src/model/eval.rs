//! Per-iteration evaluation history.
//!
//! [`EvalResults`] maps a dataset name (`"train"`, `"valid"`, ...) to the
//! metrics recorded on it, and each metric to one value per boosting round.
//! Insertion order is kept for both levels, including when deserializing a
//! JSON object, because the trajectory renderer plots datasets in that order.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Ordered map helper
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Ordered<V>(Vec<(String, V)>);

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Ordered<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn get_or_insert_with(&mut self, key: &str, f: impl FnOnce() -> V) -> &mut V {
        let pos = match self.0.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.0.push((key.to_string(), f()));
                self.0.len() - 1
            }
        };
        &mut self.0[pos].1
    }

    fn insert(&mut self, key: String, value: V) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }
}

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
    type Value = Ordered<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = Ordered(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            out.insert(k, v);
        }
        Ok(out)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

// =============================================================================
// MetricHistory
// =============================================================================

/// Metrics recorded on one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricHistory(Ordered<Vec<f64>>);

impl MetricHistory {
    pub fn get(&self, metric: &str) -> Option<&[f64]> {
        self.0.get(metric).map(Vec::as_slice)
    }

    /// Metric names in recording order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0 .0.iter().map(|(k, _)| k.as_str())
    }

    /// Most recently added metric.
    pub fn last(&self) -> Option<(&str, &[f64])> {
        self.0 .0.last().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }
}

// =============================================================================
// EvalResults
// =============================================================================

/// Dataset name → metric name → one value per iteration.
///
/// # Example
///
/// ```
/// use boosters_viz::model::EvalResults;
///
/// let mut evals = EvalResults::new();
/// for v in [0.5, 0.3, 0.2] {
///     evals.record("train", "l2", v);
/// }
/// assert_eq!(evals.get("train").unwrap().get("l2"), Some(&[0.5, 0.3, 0.2][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvalResults(Ordered<MetricHistory>);

impl EvalResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one iteration's value of `metric` on `dataset`.
    pub fn record(&mut self, dataset: &str, metric: &str, value: f64) {
        let history = self.0.get_or_insert_with(dataset, MetricHistory::default);
        history.0.get_or_insert_with(metric, Vec::new).push(value);
    }

    /// Replace the full trajectory of `metric` on `dataset`.
    pub fn insert(&mut self, dataset: &str, metric: &str, values: Vec<f64>) {
        let history = self.0.get_or_insert_with(dataset, MetricHistory::default);
        history.0.insert(metric.to_string(), values);
    }

    pub fn get(&self, dataset: &str) -> Option<&MetricHistory> {
        self.0.get(dataset)
    }

    /// Dataset names in recording order.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.0 .0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_order_is_preserved() {
        let evals = EvalResults::from_json(
            r#"{"valid": {"l2": [1.0], "l1": [2.0]}, "train": {"l2": [0.5]}}"#,
        )
        .unwrap();

        let names: Vec<_> = evals.dataset_names().collect();
        assert_eq!(names, ["valid", "train"]);

        let metrics: Vec<_> = evals.get("valid").unwrap().names().collect();
        assert_eq!(metrics, ["l2", "l1"]);
        assert_eq!(evals.get("valid").unwrap().last().unwrap().0, "l1");
    }

    #[test]
    fn record_appends_per_iteration() {
        let mut evals = EvalResults::new();
        evals.record("train", "auc", 0.7);
        evals.record("valid", "auc", 0.6);
        evals.record("train", "auc", 0.8);

        assert_eq!(evals.len(), 2);
        assert_eq!(evals.get("train").unwrap().get("auc"), Some(&[0.7, 0.8][..]));
        assert_eq!(evals.get("valid").unwrap().get("auc"), Some(&[0.6][..]));
        assert!(evals.get("test").is_none());
    }

    #[test]
    fn serializes_back_in_order() {
        let mut evals = EvalResults::new();
        evals.insert("b", "m", vec![1.0]);
        evals.insert("a", "m", vec![2.0]);
        let json = serde_json::to_string(&evals).unwrap();
        assert_eq!(json, r#"{"b":{"m":[1.0]},"a":{"m":[2.0]}}"#);
    }
}
