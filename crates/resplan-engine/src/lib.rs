//! # resplan-engine
//!
//! Calculation engine for resource plans.
//!
//! This crate provides:
//! - [`AllocationCalculator`]: effort, cost, price and margin per plan row and
//!   for the whole project
//! - [`WeekTimeline`]: the shared week sequence, with insert/remove/append
//!   edits that renumber every plan's allocations in one pass
//! - [`PlanningSheet`]: owned grid state exposing each user action as an
//!   explicit method
//!
//! ## Example
//!
//! ```rust
//! use resplan_core::{ExchangeRate, ResourcePlan};
//! use resplan_engine::{AllocationCalculator, WeekTimeline};
//!
//! let weeks = WeekTimeline::new(4);
//! let plan = ResourcePlan::new("dev")
//!     .rates(25.0, 40.0)
//!     .with_allocations([(1, 50), (2, 50), (3, 50), (4, 50)]);
//!
//! let calc = AllocationCalculator::new(&weeks, ExchangeRate::PARITY);
//! assert_eq!(calc.estimated_effort_hours(&plan), 80.0);
//! assert_eq!(calc.total_internal_cost(&plan).unwrap(), 2000.0);
//!
//! let edit = weeks.insert_week_at(2, &[plan]).unwrap();
//! assert_eq!(edit.timeline.to_vec(), vec![1, 2, 3, 4, 5]);
//! ```

pub mod calculator;
pub mod sheet;
pub mod timeline;

pub use calculator::{aggregate_margin, auto_price_from_margin, margin_percent, rate_margin, AllocationCalculator};
pub use sheet::PlanningSheet;
pub use timeline::{TimelineEdit, WeekTimeline};

use resplan_core::{CalcError, PlanReport, Workbook};

/// Load a workbook and compute its report in one step
pub fn build_report(workbook: Workbook) -> Result<PlanReport, CalcError> {
    PlanningSheet::from_workbook(workbook).report()
}
