use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCountResult {
    pub status: String,
    pub count: u64,
}

/// Per-status counts in request order, plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectSummary {
    pub summary: IndexMap<String, u64>,
    pub total: u64,
}

impl DefectSummary {
    /// Folds settled results. A repeated status keeps its first position and
    /// its last count; `total` still adds every result, saturating at `u64::MAX`.
    pub fn from_results(results: Vec<StatusCountResult>) -> Self {
        let total = results
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.count));
        let mut summary = IndexMap::with_capacity(results.len());
        for result in results {
            summary.insert(result.status, result.count);
        }
        Self { summary, total }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub todo: u64,
    pub in_progress: u64,
    pub done: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendResponse {
    pub days: Vec<DaySummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueSummary {
    pub done_today_total: u64,
    pub empty_due_date_total: u64,
    pub today_due_date_total: u64,
    pub delayed_due_date_total: u64,
    pub assignee_empty_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
    pub status: String,
    pub amount: u64,
    pub fill: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub rows: Vec<ChartRow>,
    pub total: u64,
}
