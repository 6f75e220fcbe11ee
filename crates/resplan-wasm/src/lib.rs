//! WebAssembly bindings for the resplan planning grid
//!
//! The browser grid owns no planning state. It holds a [`Planner`] and calls
//! one method per user action (insert a week, set a cell, pick a role), then
//! re-reads the report to redraw.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use resplan_core::{
    Allocation, PlanId, Project, ResourceListEntry, SheetError, WeekNumber, Workbook,
};
use resplan_engine::{auto_price_from_margin, PlanningSheet, WeekTimeline};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Result of a week column edit as seen by the grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekEditResult {
    /// False when the edit was declined and nothing changed
    pub applied: bool,
    pub week_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Planning grid state for the browser
#[wasm_bindgen]
pub struct Planner {
    sheet: PlanningSheet,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Planner {
    /// Start from the default project with a single week
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            sheet: PlanningSheet::default(),
        }
    }

    /// Load a workbook serialized as JSON
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<Planner, JsValue> {
        Self::from_json_internal(json).map_err(js_error)
    }

    /// Current workbook as JSON, for saving
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.sheet.to_workbook()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = weekCount)]
    pub fn week_count(&self) -> u32 {
        self.sheet.timeline().week_count()
    }

    // ------------------------------------------------------------------
    // Week columns
    // ------------------------------------------------------------------

    /// Insert an empty week after `position` (0 = before week 1)
    #[wasm_bindgen(js_name = insertWeekAt)]
    pub fn insert_week_at(&mut self, position: u32) -> Result<JsValue, JsValue> {
        to_js(&self.insert_week_internal(position).map_err(js_error)?)
    }

    /// Remove a week. Removing the only week, or a week that does not
    /// exist, is declined rather than thrown.
    #[wasm_bindgen(js_name = removeWeek)]
    pub fn remove_week(&mut self, week: WeekNumber) -> Result<JsValue, JsValue> {
        to_js(&self.remove_week_internal(week).map_err(js_error)?)
    }

    #[wasm_bindgen(js_name = appendWeek)]
    pub fn append_week(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.append_week_internal().map_err(js_error)?)
    }

    // ------------------------------------------------------------------
    // Plan rows
    // ------------------------------------------------------------------

    /// Append an empty row; returns its id
    #[wasm_bindgen(js_name = addPlan)]
    pub fn add_plan(&mut self) -> String {
        self.sheet.add_plan()
    }

    #[wasm_bindgen(js_name = removePlan)]
    pub fn remove_plan(&mut self, plan_id: &str) -> Result<(), JsValue> {
        self.sheet.remove_plan(plan_id).map(|_| ()).map_err(js_error)
    }

    /// Set a week cell from the grid's text input; returns the stored percent
    #[wasm_bindgen(js_name = setAllocation)]
    pub fn set_allocation(&mut self, plan_id: &str, week: WeekNumber, input: &str) -> Result<u8, JsValue> {
        self.set_allocation_internal(plan_id, week, input).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setRates)]
    pub fn set_rates(&mut self, plan_id: &str, int_hourly_rate: f64, client_hourly_rate: f64) -> Result<(), JsValue> {
        self.sheet
            .set_rates(plan_id, int_hourly_rate, client_hourly_rate)
            .map_err(js_error)
    }

    /// Pick a role for a row; rates come from the resource list and the
    /// client rate is priced at the project's default margin
    #[wasm_bindgen(js_name = assignRole)]
    pub fn assign_role(&mut self, plan_id: &str, role: &str) -> Result<JsValue, JsValue> {
        let plan = self.sheet.assign_role(plan_id, role).map_err(js_error)?;
        to_js(plan)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    #[wasm_bindgen(js_name = setProject)]
    pub fn set_project(&mut self, project: JsValue) -> Result<(), JsValue> {
        let project: Project = serde_wasm_bindgen::from_value(project).map_err(js_error)?;
        self.sheet.set_project(project);
        Ok(())
    }

    #[wasm_bindgen(js_name = setResources)]
    pub fn set_resources(&mut self, resources: JsValue) -> Result<(), JsValue> {
        let resources: Vec<ResourceListEntry> = serde_wasm_bindgen::from_value(resources).map_err(js_error)?;
        self.sheet.set_resources(resources);
        Ok(())
    }

    /// Client hourly rate for an internal USD rate at the project's default
    /// margin and exchange rate
    #[wasm_bindgen(js_name = autoPrice)]
    pub fn auto_price(&self, int_hourly_rate: f64) -> Result<f64, JsValue> {
        let project = self.sheet.project();
        auto_price_from_margin(int_hourly_rate, project.default_margin, project.exchange_rate).map_err(js_error)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Per-row metrics and project totals
    pub fn report(&self) -> Result<JsValue, JsValue> {
        to_js(&self.sheet.report().map_err(js_error)?)
    }

    pub fn plans(&self) -> Result<JsValue, JsValue> {
        to_js(&self.sheet.plans())
    }
}

// Native-testable internals
impl Planner {
    fn from_json_internal(json: &str) -> Result<Self, serde_json::Error> {
        let workbook: Workbook = serde_json::from_str(json)?;
        Ok(Self {
            sheet: PlanningSheet::from_workbook(workbook),
        })
    }

    fn insert_week_internal(&mut self, position: u32) -> Result<WeekEditResult, SheetError> {
        let result = self.sheet.insert_week_at(position).map(WeekTimeline::week_count);
        self.week_edit(result)
    }

    fn remove_week_internal(&mut self, week: WeekNumber) -> Result<WeekEditResult, SheetError> {
        let result = self.sheet.remove_week(week).map(WeekTimeline::week_count);
        self.week_edit(result)
    }

    fn append_week_internal(&mut self) -> Result<WeekEditResult, SheetError> {
        let result = self.sheet.append_week().map(WeekTimeline::week_count);
        self.week_edit(result)
    }

    fn week_edit(&self, result: Result<u32, SheetError>) -> Result<WeekEditResult, SheetError> {
        match result {
            Ok(week_count) => Ok(WeekEditResult {
                applied: true,
                week_count,
                message: None,
            }),
            Err(SheetError::Timeline(err)) if err.is_declined() => Ok(WeekEditResult {
                applied: false,
                week_count: self.week_count(),
                message: Some(err.to_string()),
            }),
            Err(err) => Err(err),
        }
    }

    fn set_allocation_internal(&mut self, plan_id: &str, week: WeekNumber, input: &str) -> Result<u8, SheetError> {
        let parsed = Allocation::parse(input);
        self.sheet
            .set_allocation(plan_id, week, i64::from(parsed.percent()))
            .map(Allocation::percent)
    }

    pub fn sheet(&self) -> &PlanningSheet {
        &self.sheet
    }

    pub fn plan_ids(&self) -> Vec<PlanId> {
        self.sheet.plans().iter().map(|p| p.id.clone()).collect()
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WORKBOOK: &str = r#"{
        "project": {"name": "Grid", "clientCurrency": "USD", "exchangeRate": 1.0, "defaultMargin": 25},
        "resources": [{"role": "Backend Engineer", "intRate": 50}],
        "weeks": 3,
        "plans": [{
            "id": "1",
            "weeklyAllocations": [
                {"weekNumber": 1, "allocation": 10},
                {"weekNumber": 2, "allocation": 20},
                {"weekNumber": 3, "allocation": 30}
            ]
        }]
    }"#;

    fn planner() -> Planner {
        Planner::from_json_internal(WORKBOOK).unwrap()
    }

    #[test]
    fn loads_workbook_json() {
        let planner = planner();
        assert_eq!(planner.week_count(), 3);
        assert_eq!(planner.plan_ids(), vec!["1".to_string()]);
        assert_eq!(planner.sheet().project().name, "Grid");
    }

    #[test]
    fn insert_then_remove_week() {
        let mut planner = planner();

        let inserted = planner.insert_week_internal(2).unwrap();
        assert_eq!(
            inserted,
            WeekEditResult {
                applied: true,
                week_count: 4,
                message: None
            }
        );
        let plan = &planner.sheet().plans()[0];
        assert_eq!(plan.allocation(3).percent(), 0);
        assert_eq!(plan.allocation(4).percent(), 30);

        let removed = planner.remove_week_internal(3).unwrap();
        assert!(removed.applied);
        assert_eq!(planner.sheet().plans()[0].allocation(3).percent(), 30);
    }

    #[test]
    fn declined_removal_is_not_an_error() {
        let mut planner = Planner::new();

        let result = planner.remove_week_internal(1).unwrap();

        assert!(!result.applied);
        assert_eq!(result.week_count, 1);
        assert!(result.message.unwrap().contains("at least one week"));
        assert_eq!(planner.week_count(), 1);
    }

    #[test]
    fn out_of_range_insert_is_an_error() {
        let mut planner = planner();
        assert!(planner.insert_week_internal(9).is_err());
        assert_eq!(planner.week_count(), 3);
    }

    #[test]
    fn append_adds_zero_week() {
        let mut planner = planner();
        assert_eq!(planner.append_week_internal().unwrap().week_count, 4);
        assert_eq!(planner.sheet().plans()[0].weekly_allocations.len(), 4);
    }

    #[test]
    fn oversized_timeline_is_capped() {
        let mut planner = Planner::from_json_internal(r#"{"weeks": 4000000000}"#).unwrap();

        assert_eq!(planner.week_count(), resplan_core::MAX_WEEKS);
        assert!(planner.append_week_internal().is_err());
        assert_eq!(planner.week_count(), resplan_core::MAX_WEEKS);
    }

    #[test]
    fn cell_text_is_parsed_and_clamped() {
        let mut planner = planner();
        assert_eq!(planner.set_allocation_internal("1", 1, "75%").unwrap(), 75);
        assert_eq!(planner.set_allocation_internal("1", 2, "250").unwrap(), 100);
        assert_eq!(planner.set_allocation_internal("1", 3, "abc").unwrap(), 0);
        assert!(planner.set_allocation_internal("1", 4, "10").is_err());
    }

    #[test]
    fn assigning_role_prices_at_default_margin() {
        let mut planner = planner();
        let id = planner.sheet.add_plan();

        let plan = planner.sheet.assign_role(&id, "Backend Engineer").unwrap();

        assert_eq!(plan.int_hourly_rate, 50.0);
        assert!((plan.client_hourly_rate - 66.666_666).abs() < 1e-3);
        assert!((planner.auto_price(50.0).unwrap() - 66.666_666).abs() < 1e-3);
    }

    #[test]
    fn json_round_trip_keeps_edits() {
        let mut planner = planner();
        planner.append_week_internal().unwrap();
        let json = planner.to_json().unwrap();

        let reloaded = Planner::from_json_internal(&json).unwrap();

        assert_eq!(reloaded.week_count(), 4);
        assert_eq!(reloaded.sheet().plans(), planner.sheet().plans());
    }
}
