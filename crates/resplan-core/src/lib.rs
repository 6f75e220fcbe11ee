//! # resplan-core
//!
//! Core domain model for the resplan resource planning engine.
//!
//! This crate provides:
//! - Domain types: `Project`, `ResourcePlan`, `WeeklyAllocation`, `RateCard`, `ResourceListEntry`
//! - Value types that validate at construction: `Allocation`, `ExchangeRate`, `DefaultMargin`
//! - Report types produced by the engine: `PlanReport`, `PlanSummary`, `ProjectTotals`
//! - The `Renderer` trait, error types and the `Workbook` file bundle
//!
//! ## Example
//!
//! ```rust
//! use resplan_core::{Allocation, Project, ResourcePlan};
//!
//! let project = Project::new("Checkout rewrite");
//! let plan = ResourcePlan::new("1")
//!     .role("Frontend Engineer")
//!     .rates(25.0, 43.0)
//!     .with_allocations([(1, 50), (2, 50), (3, 100)]);
//!
//! assert_eq!(plan.allocation(3), Allocation::FULL);
//! assert_eq!(plan.allocation(4), Allocation::ZERO);
//! assert_eq!(project.client_currency.symbol(), "$");
//! ```

pub mod rate_card;
pub mod report;

pub use rate_card::{resource_stats, RateCard, Region, RegionalRates, ResourceListEntry, ResourceStats};
pub use report::{format_margin, PlanReport, PlanSummary, ProjectTotals};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases & Constants
// ============================================================================

/// Unique identifier for a resource plan row
pub type PlanId = String;

/// 1-based position label of a week column
pub type WeekNumber = u32;

/// Working hours in a fully allocated week
pub const HOURS_PER_WEEK: f64 = 40.0;

/// Working hours in a day, used for the daily rate columns
pub const HOURS_PER_DAY: f64 = 8.0;

/// Longest timeline a workbook may hold (ten years of weeks)
pub const MAX_WEEKS: u32 = 520;

// ============================================================================
// Allocation
// ============================================================================

/// Share of a resource's week committed to the project, in whole percent.
///
/// Always within `0..=100`; every constructor clamps, including
/// deserialization, so downstream formulas never see an out-of-range value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawAllocation", into = "u8")]
pub struct Allocation(u8);

impl Allocation {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Clamp an arbitrary integer percent into `0..=100`
    pub fn new(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    /// Parse free-text cell input.
    ///
    /// Reads the leading integer (`"75%"` is 75, `"12.9"` is 12), treats
    /// anything without leading digits as 0, then clamps.
    pub fn parse(input: &str) -> Self {
        let s = input.trim_start();
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..end];
        if digits.is_empty() {
            return Self::ZERO;
        }
        // Saturate on overflow, the clamp takes it from there
        let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
        Self::new(if negative { -magnitude } else { magnitude })
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Allocation as a fraction of a full week (`0.0..=1.0`)
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for Allocation {
    fn from(percent: i64) -> Self {
        Self::new(percent)
    }
}

impl From<i32> for Allocation {
    fn from(percent: i32) -> Self {
        Self::new(i64::from(percent))
    }
}

impl From<Allocation> for u8 {
    fn from(allocation: Allocation) -> Self {
        allocation.0
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Wire shapes accepted for an allocation: grid cells send numbers or text
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAllocation {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<RawAllocation> for Allocation {
    fn from(raw: RawAllocation) -> Self {
        match raw {
            RawAllocation::Int(v) => Allocation::new(v),
            // `as` truncates toward zero and maps NaN to 0
            RawAllocation::Float(v) => Allocation::new(v as i64),
            RawAllocation::Text(s) => Allocation::parse(&s),
        }
    }
}

// ============================================================================
// Currency & Exchange Rate
// ============================================================================

/// Currency the client is billed in. Internal costs are always USD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    #[default]
    Eur,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gbp];

    /// ISO 4217 code
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CalcError::UnknownCurrency(s.to_string()))
    }
}

/// Units of client currency per 1 USD. Finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    /// USD billed in USD
    pub const PARITY: Self = Self(1.0);

    pub fn new(rate: f64) -> Result<Self, CalcError> {
        if rate.is_finite() && rate > 0.0 {
            Ok(Self(rate))
        } else {
            Err(CalcError::InvalidExchangeRate(rate))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Express a USD amount in client currency
    pub fn to_client(self, usd: f64) -> f64 {
        usd * self.0
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self::PARITY
    }
}

impl TryFrom<f64> for ExchangeRate {
    type Error = CalcError;

    fn try_from(rate: f64) -> Result<Self, Self::Error> {
        Self::new(rate)
    }
}

impl From<ExchangeRate> for f64 {
    fn from(rate: ExchangeRate) -> Self {
        rate.0
    }
}

/// Target margin percent used to auto-price a plan, within `0.0..100.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct DefaultMargin(f64);

impl DefaultMargin {
    /// Negative margins clamp to zero; 100% and above would need an
    /// infinite price and are rejected.
    pub fn new(percent: f64) -> Result<Self, CalcError> {
        if !percent.is_finite() {
            return Err(CalcError::InvalidNumber {
                field: "default margin",
                value: percent,
            });
        }
        if percent >= 100.0 {
            return Err(CalcError::DegenerateMargin(percent));
        }
        Ok(Self(percent.max(0.0)))
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

// ============================================================================
// Project
// ============================================================================

/// Project-wide settings shared by every plan row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Working days per FTE-month. Informational, no formula reads it.
    #[serde(rename = "daysInFTE", default = "default_days_in_fte")]
    pub days_in_fte: u32,
    #[serde(default)]
    pub client_currency: Currency,
    #[serde(default)]
    pub exchange_rate: ExchangeRate,
    /// Raw setting; validated through [`Project::default_margin`] when used
    #[serde(default)]
    pub default_margin: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_days_in_fte() -> u32 {
    20
}

impl Project {
    /// Create a project billed in USD at parity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: None,
            days_in_fte: default_days_in_fte(),
            client_currency: Currency::Usd,
            exchange_rate: ExchangeRate::PARITY,
            default_margin: 0.0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn currency(mut self, currency: Currency, exchange_rate: ExchangeRate) -> Self {
        self.client_currency = currency;
        self.exchange_rate = exchange_rate;
        self
    }

    pub fn margin(mut self, percent: f64) -> Self {
        self.default_margin = percent;
        self
    }

    /// Validated default margin for auto-pricing
    pub fn default_margin(&self) -> Result<DefaultMargin, CalcError> {
        DefaultMargin::new(self.default_margin)
    }
}

impl Default for Project {
    /// The project created when a workbook has none
    fn default() -> Self {
        Self {
            description: Some("Default project for resource planning".into()),
            client_currency: Currency::Eur,
            exchange_rate: ExchangeRate(0.89),
            ..Self::new("Default Project")
        }
    }
}

// ============================================================================
// Resource Plan
// ============================================================================

/// Allocation of one plan row in one week
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAllocation {
    pub week_number: WeekNumber,
    #[serde(default)]
    pub allocation: Allocation,
}

impl WeeklyAllocation {
    pub fn new(week_number: WeekNumber, allocation: impl Into<Allocation>) -> Self {
        Self {
            week_number,
            allocation: allocation.into(),
        }
    }
}

/// A staffed role line in the planning table.
///
/// The plan owns its allocations, kept sorted by week with at most one
/// entry per week. Margin is derived from the two rates, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePlan {
    pub id: PlanId,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Internal cost, USD per hour
    #[serde(default)]
    pub int_hourly_rate: f64,
    /// Client price per hour, in the project's client currency
    #[serde(default)]
    pub client_hourly_rate: f64,
    #[serde(default, deserialize_with = "sorted_allocations")]
    pub weekly_allocations: Vec<WeeklyAllocation>,
}

/// Incoming allocations arrive in any order; keep them sorted by week with
/// the last value winning for a repeated week
fn sorted_allocations<'de, D>(deserializer: D) -> Result<Vec<WeeklyAllocation>, D::Error>
where
    D: Deserializer<'de>,
{
    let by_week: BTreeMap<WeekNumber, Allocation> = Vec::<WeeklyAllocation>::deserialize(deserializer)?
        .into_iter()
        .map(|wa| (wa.week_number, wa.allocation))
        .collect();
    Ok(by_week
        .into_iter()
        .map(|(week, allocation)| WeeklyAllocation::new(week, allocation))
        .collect())
}

impl ResourcePlan {
    /// Create an empty row with zero rates and no allocations
    pub fn new(id: impl Into<PlanId>) -> Self {
        Self {
            id: id.into(),
            role: String::new(),
            client_role: None,
            name: None,
            int_hourly_rate: 0.0,
            client_hourly_rate: 0.0,
            weekly_allocations: Vec::new(),
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set internal (USD) and client (client currency) hourly rates
    pub fn rates(mut self, int_hourly_rate: f64, client_hourly_rate: f64) -> Self {
        self.int_hourly_rate = int_hourly_rate;
        self.client_hourly_rate = client_hourly_rate;
        self
    }

    pub fn with_allocations<I, A>(mut self, allocations: I) -> Self
    where
        I: IntoIterator<Item = (WeekNumber, A)>,
        A: Into<Allocation>,
    {
        for (week, allocation) in allocations {
            self.set_allocation(week, allocation.into());
        }
        self
    }

    /// Allocation recorded for `week`, zero when there is none
    pub fn allocation(&self, week: WeekNumber) -> Allocation {
        self.weekly_allocations
            .binary_search_by_key(&week, |wa| wa.week_number)
            .map(|i| self.weekly_allocations[i].allocation)
            .unwrap_or(Allocation::ZERO)
    }

    /// Record an allocation, replacing any existing entry for that week
    pub fn set_allocation(&mut self, week: WeekNumber, allocation: Allocation) {
        match self
            .weekly_allocations
            .binary_search_by_key(&week, |wa| wa.week_number)
        {
            Ok(i) => self.weekly_allocations[i].allocation = allocation,
            Err(i) => self
                .weekly_allocations
                .insert(i, WeeklyAllocation::new(week, allocation)),
        }
    }

    /// Allocations keyed by week number
    pub fn allocation_map(&self) -> BTreeMap<WeekNumber, Allocation> {
        self.weekly_allocations
            .iter()
            .map(|wa| (wa.week_number, wa.allocation))
            .collect()
    }

    /// Sort allocations by week, drop week 0 and keep the last value for
    /// duplicated weeks. Returns how many entries were discarded.
    pub fn normalize_allocations(&mut self) -> usize {
        let before = self.weekly_allocations.len();
        let map: BTreeMap<WeekNumber, Allocation> = self
            .weekly_allocations
            .iter()
            .filter(|wa| wa.week_number > 0)
            .map(|wa| (wa.week_number, wa.allocation))
            .collect();
        self.weekly_allocations = map
            .into_iter()
            .map(|(week, allocation)| WeeklyAllocation::new(week, allocation))
            .collect();
        before - self.weekly_allocations.len()
    }

    /// Reject rates that would poison cost and price totals
    pub fn validate_rates(&self) -> Result<(), CalcError> {
        check_rate("internal hourly rate", self.int_hourly_rate)?;
        check_rate("client hourly rate", self.client_hourly_rate)?;
        Ok(())
    }
}

/// A rate is usable when finite and non-negative
pub fn check_rate(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::InvalidNumber { field, value })
    }
}

// ============================================================================
// Workbook
// ============================================================================

/// Everything a planning session works on, as stored in a workbook file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    #[serde(default)]
    pub project: Project,
    #[serde(default)]
    pub rate_cards: Vec<RateCard>,
    #[serde(default)]
    pub resources: Vec<ResourceListEntry>,
    /// Number of active week columns
    #[serde(default = "default_weeks")]
    pub weeks: u32,
    #[serde(default)]
    pub plans: Vec<ResourcePlan>,
}

fn default_weeks() -> u32 {
    1
}

impl Default for Workbook {
    fn default() -> Self {
        Self {
            project: Project::default(),
            rate_cards: Vec::new(),
            resources: Vec::new(),
            weeks: default_weeks(),
            plans: Vec::new(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a computed report for the given workbook
    fn render(&self, workbook: &Workbook, report: &PlanReport) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Numeric validation and configuration errors from the calculator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Invalid {field}: {value} (must be finite and non-negative)")]
    InvalidNumber { field: &'static str, value: f64 },

    #[error("Invalid exchange rate: {0} (must be finite and positive)")]
    InvalidExchangeRate(f64),

    #[error("Default margin of {0}% leaves no room for cost; auto-pricing needs a margin below 100%")]
    DegenerateMargin(f64),

    #[error("Unknown currency: {0} (expected USD, EUR or GBP)")]
    UnknownCurrency(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),
}

/// Structural timeline edits that were refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("Cannot insert a week at position {position}: valid positions are 0..={len}")]
    PositionOutOfRange { position: u32, len: u32 },

    #[error("Cannot remove week {0}: at least one week must remain")]
    LastWeek(WeekNumber),

    #[error("Cannot remove week {week}: the timeline has weeks 1..={len}")]
    UnknownWeek { week: WeekNumber, len: u32 },

    #[error("Cannot add a week: the timeline is limited to {0} weeks")]
    TimelineFull(u32),
}

impl TimelineError {
    /// True when the edit was declined and nothing changed, as opposed to
    /// an invalid argument
    pub fn is_declined(&self) -> bool {
        matches!(self, TimelineError::LastWeek(_) | TimelineError::UnknownWeek { .. })
    }
}

/// Errors from editing a planning sheet
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    #[error("Resource plan not found: {0}")]
    PlanNotFound(PlanId),

    #[error("Role not found in resource list: {0}")]
    RoleNotFound(String),

    #[error("Week {week} is outside the timeline 1..={len}")]
    WeekOutOfRange { week: WeekNumber, len: u32 },

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
