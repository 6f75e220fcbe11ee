//! Allocation, cost, price and margin formulas
//!
//! Internal rates are quoted in USD; client rates in the project's client
//! currency. The exchange rate is client currency per 1 USD, so converting a
//! cost into client terms is always a multiplication.
//!
//! | Metric         | Formula                                              |
//! |----------------|------------------------------------------------------|
//! | Effort (h)     | Σ_weeks allocation/100 × 40                          |
//! | Internal cost  | effort × int rate (USD)                              |
//! | Client price   | effort × client rate                                 |
//! | Margin %       | (client − int × fx) / client × 100                   |
//! | Auto price     | int / (1 − margin/100) × fx                          |
//! | Project margin | (Σprice − Σcost × fx) / Σprice × 100, 0 if Σprice=0 |

use resplan_core::{
    check_rate, CalcError, DefaultMargin, ExchangeRate, PlanSummary, ProjectTotals, ResourcePlan,
    HOURS_PER_DAY, HOURS_PER_WEEK,
};

use crate::WeekTimeline;

/// Per-plan metric calculator bound to one timeline and exchange rate.
///
/// Cheap to build; make one per render.
#[derive(Clone, Copy, Debug)]
pub struct AllocationCalculator<'a> {
    weeks: &'a WeekTimeline,
    exchange_rate: ExchangeRate,
}

impl<'a> AllocationCalculator<'a> {
    pub fn new(weeks: &'a WeekTimeline, exchange_rate: ExchangeRate) -> Self {
        Self {
            weeks,
            exchange_rate,
        }
    }

    pub fn exchange_rate(&self) -> ExchangeRate {
        self.exchange_rate
    }

    /// Hours of work over the active weeks. Weeks without an entry count as 0.
    pub fn estimated_effort_hours(&self, plan: &ResourcePlan) -> f64 {
        // Sum whole percents first so the hour total stays exact
        let percent: u64 = self
            .weeks
            .weeks()
            .map(|w| u64::from(plan.allocation(w).percent()))
            .sum();
        percent as f64 * HOURS_PER_WEEK / 100.0
    }

    /// Effort × internal hourly rate, in USD
    pub fn total_internal_cost(&self, plan: &ResourcePlan) -> Result<f64, CalcError> {
        let rate = check_rate("internal hourly rate", plan.int_hourly_rate)?;
        Ok(self.estimated_effort_hours(plan) * rate)
    }

    /// Effort × client hourly rate, in client currency
    pub fn total_client_price(&self, plan: &ResourcePlan) -> Result<f64, CalcError> {
        let rate = check_rate("client hourly rate", plan.client_hourly_rate)?;
        Ok(self.estimated_effort_hours(plan) * rate)
    }

    /// Margin of the plan's hourly rates; `None` when the client rate is
    /// zero, negative or not finite
    pub fn margin_percent(&self, plan: &ResourcePlan) -> Result<Option<f64>, CalcError> {
        margin_percent(plan, self.exchange_rate)
    }

    /// Full row of derived metrics
    pub fn summarize(&self, plan: &ResourcePlan) -> Result<PlanSummary, CalcError> {
        let internal_cost = self.total_internal_cost(plan)?;
        let client_price = self.total_client_price(plan)?;
        Ok(PlanSummary {
            plan_id: plan.id.clone(),
            role: plan.role.clone(),
            client_role: plan.client_role.clone(),
            name: plan.name.clone(),
            int_hourly_rate: plan.int_hourly_rate,
            int_daily_rate: plan.int_hourly_rate * HOURS_PER_DAY,
            client_hourly_rate: plan.client_hourly_rate,
            client_daily_rate: plan.client_hourly_rate * HOURS_PER_DAY,
            margin_percent: self.margin_percent(plan)?,
            allocations: self.weeks.weeks().map(|w| plan.allocation(w)).collect(),
            effort_hours: self.estimated_effort_hours(plan),
            internal_cost,
            client_price,
        })
    }

    /// Totals across plans, with the project margin computed in client
    /// currency terms
    pub fn totals(&self, plans: &[ResourcePlan]) -> Result<ProjectTotals, CalcError> {
        let mut totals = ProjectTotals::default();
        for plan in plans {
            totals.internal_cost += self.total_internal_cost(plan)?;
            totals.client_price += self.total_client_price(plan)?;
            totals.effort_hours += self.estimated_effort_hours(plan);
        }
        totals.margin_percent =
            aggregate_margin(totals.client_price, totals.internal_cost, self.exchange_rate);
        Ok(totals)
    }

    /// Project margin across plans; 0 when nothing is priced
    pub fn aggregate_margin(&self, plans: &[ResourcePlan]) -> Result<f64, CalcError> {
        Ok(self.totals(plans)?.margin_percent)
    }
}

/// Margin of a plan's hourly rates at the given exchange rate.
///
/// The internal rate must be valid; an unusable client rate means there is
/// no margin to show.
pub fn margin_percent(
    plan: &ResourcePlan,
    exchange_rate: ExchangeRate,
) -> Result<Option<f64>, CalcError> {
    let int_rate = check_rate("internal hourly rate", plan.int_hourly_rate)?;
    Ok(rate_margin(int_rate, plan.client_hourly_rate, exchange_rate))
}

/// `(client − int × fx) / client × 100`, or `None` when the client rate is
/// not a positive finite number
pub fn rate_margin(int_rate_usd: f64, client_rate: f64, exchange_rate: ExchangeRate) -> Option<f64> {
    if !client_rate.is_finite() || client_rate <= 0.0 {
        return None;
    }
    let cost_in_client_currency = exchange_rate.to_client(int_rate_usd);
    let margin = (client_rate - cost_in_client_currency) / client_rate * 100.0;
    margin.is_finite().then_some(margin)
}

/// Client hourly rate that earns `default_margin` on a USD internal rate.
///
/// A margin of 100% or more has no finite price and is reported as
/// [`CalcError::DegenerateMargin`]; negative margins are treated as 0.
pub fn auto_price_from_margin(
    int_rate_usd: f64,
    default_margin: f64,
    exchange_rate: ExchangeRate,
) -> Result<f64, CalcError> {
    let int_rate = check_rate("internal hourly rate", int_rate_usd)?;
    let margin = DefaultMargin::new(default_margin)?;
    let client_rate_usd = int_rate / (1.0 - margin.fraction());
    Ok(exchange_rate.to_client(client_rate_usd))
}

/// `(price − cost × fx) / price × 100`, 0 when the price is 0
pub fn aggregate_margin(client_price: f64, internal_cost_usd: f64, exchange_rate: ExchangeRate) -> f64 {
    if client_price <= 0.0 {
        return 0.0;
    }
    (client_price - exchange_rate.to_client(internal_cost_usd)) / client_price * 100.0
}
