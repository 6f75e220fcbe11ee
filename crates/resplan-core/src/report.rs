//! Computed planning report
//!
//! A `PlanReport` is the calculator's view of a workbook at one point in
//! time: one `PlanSummary` per plan row plus the project totals. Renderers
//! and the browser bindings consume it as plain data.

use serde::{Deserialize, Serialize};

use crate::{Allocation, Currency, PlanId, WeekNumber};

/// Derived metrics for one plan row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub plan_id: PlanId,
    pub role: String,
    pub client_role: Option<String>,
    pub name: Option<String>,
    /// USD per hour
    pub int_hourly_rate: f64,
    /// USD per 8-hour day
    pub int_daily_rate: f64,
    /// Client currency per hour
    pub client_hourly_rate: f64,
    /// Client currency per 8-hour day
    pub client_daily_rate: f64,
    /// Absent when the client rate is not positive
    pub margin_percent: Option<f64>,
    /// One entry per active week, in week order
    pub allocations: Vec<Allocation>,
    pub effort_hours: f64,
    /// USD
    pub internal_cost: f64,
    /// Client currency
    pub client_price: f64,
}

/// Sums across all plan rows
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTotals {
    /// USD
    pub internal_cost: f64,
    /// Client currency
    pub client_price: f64,
    pub effort_hours: f64,
    /// Project margin in client currency terms; 0 when nothing is priced
    pub margin_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub project_name: String,
    pub currency: Currency,
    pub exchange_rate: f64,
    pub weeks: Vec<WeekNumber>,
    pub plans: Vec<PlanSummary>,
    pub totals: ProjectTotals,
}

impl PlanReport {
    pub fn plan(&self, plan_id: &str) -> Option<&PlanSummary> {
        self.plans.iter().find(|p| p.plan_id == plan_id)
    }
}

/// Margin cell text: one decimal place, or `-` when undefined
pub fn format_margin(margin: Option<f64>) -> String {
    match margin {
        Some(m) => format!("{m:.1}%"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_text() {
        assert_eq!(format_margin(Some(25.0)), "25.0%");
        assert_eq!(format_margin(Some(-12.345)), "-12.3%");
        assert_eq!(format_margin(None), "-");
    }
}
