//! Planning sheet: the owned state behind the planning grid
//!
//! The grid never mutates plans or week columns directly. Every user action
//! is a method call here with explicit arguments; structural edits go
//! through [`WeekTimeline`] and the resulting replacement plan list is
//! committed only once the edit succeeds.

use resplan_core::{
    check_rate, Allocation, CalcError, PlanId, PlanReport, Project, RateCard, ResourceListEntry,
    ResourcePlan, SheetError, WeekNumber, Workbook, MAX_WEEKS,
};
use tracing::{debug, info, warn};

use crate::calculator::{auto_price_from_margin, AllocationCalculator};
use crate::timeline::{TimelineEdit, WeekTimeline};

#[derive(Clone, Debug, PartialEq)]
pub struct PlanningSheet {
    project: Project,
    rate_cards: Vec<RateCard>,
    resources: Vec<ResourceListEntry>,
    timeline: WeekTimeline,
    plans: Vec<ResourcePlan>,
    next_plan: u64,
}

impl PlanningSheet {
    /// Empty sheet with a single week
    pub fn new(project: Project) -> Self {
        Self::from_workbook(Workbook {
            project,
            ..Workbook::default()
        })
    }

    /// Load a workbook, normalizing anything that would break the shared
    /// week domain: week 0 and duplicate entries are dropped and every plan
    /// is fitted onto the workbook's timeline
    pub fn from_workbook(workbook: Workbook) -> Self {
        if workbook.weeks == 0 {
            warn!("workbook has no weeks, starting with one");
        } else if workbook.weeks > MAX_WEEKS {
            warn!(weeks = workbook.weeks, max = MAX_WEEKS, "workbook timeline too long, truncating");
        }
        let timeline = WeekTimeline::new(workbook.weeks);

        let plans: Vec<ResourcePlan> = workbook
            .plans
            .into_iter()
            .map(|mut plan| {
                let dropped = plan.normalize_allocations();
                if dropped > 0 {
                    warn!(plan = %plan.id, dropped, "discarded invalid or duplicate weekly allocations");
                }
                timeline.reconcile(&plan)
            })
            .collect();

        let rate_cards = workbook
            .rate_cards
            .into_iter()
            .map(RateCard::normalized)
            .collect();

        info!(
            project = %workbook.project.name,
            weeks = timeline.week_count(),
            plans = plans.len(),
            "loaded planning sheet"
        );

        let next_plan = plans.len() as u64 + 1;
        Self {
            project: workbook.project,
            rate_cards,
            resources: workbook.resources,
            timeline,
            plans,
            next_plan,
        }
    }

    pub fn to_workbook(&self) -> Workbook {
        Workbook {
            project: self.project.clone(),
            rate_cards: self.rate_cards.clone(),
            resources: self.resources.clone(),
            weeks: self.timeline.week_count(),
            plans: self.plans.clone(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace project settings. Plans are untouched; derived numbers follow
    /// on the next report.
    pub fn set_project(&mut self, project: Project) {
        self.project = project;
    }

    pub fn rate_cards(&self) -> &[RateCard] {
        &self.rate_cards
    }

    pub fn resources(&self) -> &[ResourceListEntry] {
        &self.resources
    }

    pub fn set_resources(&mut self, resources: Vec<ResourceListEntry>) {
        self.resources = resources;
    }

    pub fn timeline(&self) -> &WeekTimeline {
        &self.timeline
    }

    pub fn plans(&self) -> &[ResourcePlan] {
        &self.plans
    }

    pub fn plan(&self, plan_id: &str) -> Option<&ResourcePlan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    pub fn calculator(&self) -> AllocationCalculator<'_> {
        AllocationCalculator::new(&self.timeline, self.project.exchange_rate)
    }

    // ========================================================================
    // Week columns
    // ========================================================================

    pub fn insert_week_at(&mut self, position: u32) -> Result<&WeekTimeline, SheetError> {
        let edit = self.timeline.insert_week_at(position, &self.plans)?;
        Ok(self.commit(edit))
    }

    pub fn remove_week(&mut self, week: WeekNumber) -> Result<&WeekTimeline, SheetError> {
        let edit = self.timeline.remove_week(week, &self.plans)?;
        Ok(self.commit(edit))
    }

    pub fn append_week(&mut self) -> Result<&WeekTimeline, SheetError> {
        let edit = self.timeline.append_week(&self.plans)?;
        Ok(self.commit(edit))
    }

    fn commit(&mut self, edit: TimelineEdit) -> &WeekTimeline {
        self.timeline = edit.timeline;
        self.plans = edit.plans;
        &self.timeline
    }

    // ========================================================================
    // Plan rows
    // ========================================================================

    /// Append an empty row with a zero allocation in every active week
    pub fn add_plan(&mut self) -> PlanId {
        let id = self.fresh_plan_id();
        let plan = self.timeline.reconcile(&ResourcePlan::new(id.clone()));
        self.plans.push(plan);
        debug!(plan = %id, "added plan row");
        id
    }

    /// Remove a row together with its allocations
    pub fn remove_plan(&mut self, plan_id: &str) -> Result<ResourcePlan, SheetError> {
        let index = self.plan_index(plan_id)?;
        debug!(plan = plan_id, "removed plan row");
        Ok(self.plans.remove(index))
    }

    /// Set one week's allocation; the value is clamped to 0..=100
    pub fn set_allocation(
        &mut self,
        plan_id: &str,
        week: WeekNumber,
        percent: i64,
    ) -> Result<Allocation, SheetError> {
        if !self.timeline.contains(week) {
            return Err(SheetError::WeekOutOfRange {
                week,
                len: self.timeline.week_count(),
            });
        }
        let allocation = Allocation::new(percent);
        self.plan_mut(plan_id)?.set_allocation(week, allocation);
        Ok(allocation)
    }

    pub fn set_rates(
        &mut self,
        plan_id: &str,
        int_hourly_rate: f64,
        client_hourly_rate: f64,
    ) -> Result<(), SheetError> {
        check_rate("internal hourly rate", int_hourly_rate)?;
        check_rate("client hourly rate", client_hourly_rate)?;
        let plan = self.plan_mut(plan_id)?;
        plan.int_hourly_rate = int_hourly_rate;
        plan.client_hourly_rate = client_hourly_rate;
        Ok(())
    }

    /// Pick a role from the resource list for a row.
    ///
    /// Copies the entry's internal rate, name and client role, then prices
    /// the row at the project's default margin. Nothing changes on error.
    pub fn assign_role(&mut self, plan_id: &str, role: &str) -> Result<&ResourcePlan, SheetError> {
        let entry = self
            .resources
            .iter()
            .find(|r| r.role == role)
            .cloned()
            .ok_or_else(|| SheetError::RoleNotFound(role.to_string()))?;
        let client_rate = auto_price_from_margin(
            entry.int_rate,
            self.project.default_margin,
            self.project.exchange_rate,
        )?;

        let plan = self.plan_mut(plan_id)?;
        plan.role = entry.role;
        plan.client_role = entry.client_role;
        plan.name = entry.name;
        plan.int_hourly_rate = entry.int_rate;
        plan.client_hourly_rate = client_rate;
        debug!(plan = plan_id, role, client_rate, "assigned role");
        Ok(plan)
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    pub fn report(&self) -> Result<PlanReport, CalcError> {
        let calc = self.calculator();
        let plans = self
            .plans
            .iter()
            .map(|plan| calc.summarize(plan))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PlanReport {
            project_name: self.project.name.clone(),
            currency: self.project.client_currency,
            exchange_rate: self.project.exchange_rate.value(),
            weeks: self.timeline.to_vec(),
            plans,
            totals: calc.totals(&self.plans)?,
        })
    }

    fn plan_index(&self, plan_id: &str) -> Result<usize, SheetError> {
        self.plans
            .iter()
            .position(|p| p.id == plan_id)
            .ok_or_else(|| SheetError::PlanNotFound(plan_id.to_string()))
    }

    fn plan_mut(&mut self, plan_id: &str) -> Result<&mut ResourcePlan, SheetError> {
        let index = self.plan_index(plan_id)?;
        Ok(&mut self.plans[index])
    }

    fn fresh_plan_id(&mut self) -> PlanId {
        loop {
            let candidate = self.next_plan.to_string();
            self.next_plan += 1;
            if self.plan(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

impl Default for PlanningSheet {
    fn default() -> Self {
        Self::from_workbook(Workbook::default())
    }
}
