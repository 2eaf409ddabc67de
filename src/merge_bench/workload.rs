//! Workload mixes and write strategies

use crate::common::{Error, Result};
use serde::Serialize;

/// A named read/write mix. The write ratio is `1 - read_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workload {
    pub name: String,
    /// Fraction of operations that are point reads, in [0, 1]
    pub read_ratio: f64,
}

impl Workload {
    pub fn new(name: impl Into<String>, read_ratio: f64) -> Self {
        Self {
            name: name.into(),
            read_ratio,
        }
    }

    pub fn write_ratio(&self) -> f64 {
        1.0 - self.read_ratio
    }
}

const CATALOG: [(&str, f64); 3] = [("10/90", 0.10), ("50/50", 0.50), ("90/10", 0.90)];

/// Every mix the benchmark knows, in run order.
pub fn catalog() -> Vec<Workload> {
    CATALOG
        .iter()
        .map(|&(name, read_ratio)| Workload::new(name, read_ratio))
        .collect()
}

/// Select mixes by exact name. An empty filter selects the whole catalog.
pub fn select_workloads(filter: &str) -> Result<Vec<Workload>> {
    if filter.is_empty() {
        return Ok(catalog());
    }
    let selected: Vec<Workload> = catalog()
        .into_iter()
        .filter(|w| w.name == filter)
        .collect();
    if selected.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "Unknown workload mix filter: {}",
            filter
        )));
    }
    Ok(selected)
}

/// How a benchmark run performs its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Get, increment, put. Not atomic across workers.
    ReadModifyWrite,
    /// Engine-native merge of a `+1` operand.
    Merge,
}

impl WriteStrategy {
    pub fn uses_merge(&self) -> bool {
        matches!(self, WriteStrategy::Merge)
    }

    /// Store directory name under the benchmark root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            WriteStrategy::ReadModifyWrite => "rmw",
            WriteStrategy::Merge => "merge",
        }
    }
}

impl std::fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteStrategy::ReadModifyWrite => write!(f, "Read-Modify-Write"),
            WriteStrategy::Merge => write!(f, "Merge"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_single_mix() {
        let selected = select_workloads("50/50").unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "50/50");
        assert_eq!(selected[0].read_ratio, 0.50);
        assert_eq!(selected[0].write_ratio(), 0.50);
    }

    #[test]
    fn test_empty_filter_selects_catalog() {
        let selected = select_workloads("").unwrap();
        let names: Vec<&str> = selected.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["10/90", "50/50", "90/10"]);
        assert_eq!(selected[0].read_ratio, 0.10);
        assert_eq!(selected[2].read_ratio, 0.90);
    }

    #[test]
    fn test_unknown_mix_is_config_error() {
        let err = select_workloads("not-a-mix").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        // Matching is exact
        assert!(select_workloads("50/50 ").is_err());
    }

    #[test]
    fn test_strategy_labels() {
        assert_eq!(WriteStrategy::Merge.to_string(), "Merge");
        assert_eq!(
            WriteStrategy::ReadModifyWrite.to_string(),
            "Read-Modify-Write"
        );
        assert_eq!(WriteStrategy::ReadModifyWrite.dir_name(), "rmw");
        assert!(WriteStrategy::Merge.uses_merge());
    }
}
