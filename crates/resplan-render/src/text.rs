//! Plain text planning table
//!
//! One line per plan row with rates, margin, weekly allocation and totals,
//! followed by a project footer. Columns are fixed width so the table lines
//! up in a terminal.
//!
//! ```text
//! Project: Portal
//! Client currency: EUR (0.89 per USD)
//!
//! Role                  Name              Int $/h   Int $/d  Cli €/h  Cli €/d  Margin   W1   W2    Hours        Cost $      Price €
//! Application Develo... John Smith          25.00    200.00    43.00   344.00   48.3%  50%  50%     80.0     $2,000.00    €3,440.00
//! ```

use resplan_core::{format_margin, Currency, PlanReport, PlanSummary, RenderError, Renderer, Workbook};

use crate::{format_money, truncate};

const ROLE_WIDTH: usize = 21;
const NAME_WIDTH: usize = 16;

/// Plain text renderer for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Show one column per week
    pub show_weeks: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { show_weeks: true }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit the per-week columns (wide timelines)
    pub fn no_weeks(mut self) -> Self {
        self.show_weeks = false;
        self
    }

    fn header(&self, report: &PlanReport) -> String {
        let sym = report.currency.symbol();
        let mut line = format!(
            "{:<ROLE_WIDTH$} {:<NAME_WIDTH$} {:>8} {:>9} {:>8} {:>8} {:>7}",
            "Role",
            "Name",
            "Int $/h",
            "Int $/d",
            format!("Cli {sym}/h"),
            format!("Cli {sym}/d"),
            "Margin",
        );
        if self.show_weeks {
            for week in &report.weeks {
                line.push_str(&format!(" {:>4}", format!("W{week}")));
            }
        }
        line.push_str(&format!(
            " {:>8} {:>13} {:>13}",
            "Hours",
            "Cost $",
            format!("Price {sym}")
        ));
        line
    }

    fn row(&self, plan: &PlanSummary, currency: Currency) -> String {
        let role = if plan.role.is_empty() { "(unassigned)" } else { plan.role.as_str() };
        let mut line = format!(
            "{:<ROLE_WIDTH$} {:<NAME_WIDTH$} {:>8.2} {:>9.2} {:>8.2} {:>8.2} {:>7}",
            truncate(role, ROLE_WIDTH),
            truncate(plan.name.as_deref().unwrap_or(""), NAME_WIDTH),
            plan.int_hourly_rate,
            plan.int_daily_rate,
            plan.client_hourly_rate,
            plan.client_daily_rate,
            format_margin(plan.margin_percent),
        );
        if self.show_weeks {
            for allocation in &plan.allocations {
                line.push_str(&format!(" {:>4}", allocation.to_string()));
            }
        }
        line.push_str(&format!(
            " {:>8.1} {:>13} {:>13}",
            plan.effort_hours,
            format_money(plan.internal_cost, "$"),
            format_money(plan.client_price, currency.symbol()),
        ));
        line
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, _workbook: &Workbook, report: &PlanReport) -> Result<String, RenderError> {
        let mut out = String::new();
        out.push_str(&format!("Project: {}\n", report.project_name));
        out.push_str(&format!(
            "Client currency: {} ({} per USD)\n\n",
            report.currency, report.exchange_rate
        ));

        let header = self.header(report);
        out.push_str(&header);
        out.push('\n');
        out.push_str(&"-".repeat(header.chars().count()));
        out.push('\n');

        if report.plans.is_empty() {
            out.push_str("(no resource plans)\n");
        }
        for plan in &report.plans {
            out.push_str(&self.row(plan, report.currency));
            out.push('\n');
        }

        let totals = &report.totals;
        out.push('\n');
        out.push_str(&format!("Total effort:   {:.1} h\n", totals.effort_hours));
        out.push_str(&format!(
            "Internal cost:  {}\n",
            format_money(totals.internal_cost, "$")
        ));
        out.push_str(&format!(
            "Client price:   {}\n",
            format_money(totals.client_price, report.currency.symbol())
        ));
        out.push_str(&format!("Project margin: {:.1}%\n", totals.margin_percent));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resplan_core::{Allocation, ProjectTotals};

    fn report() -> PlanReport {
        PlanReport {
            project_name: "Portal".into(),
            currency: Currency::Eur,
            exchange_rate: 0.89,
            weeks: vec![1, 2],
            plans: vec![PlanSummary {
                plan_id: "1".into(),
                role: "Application Development".into(),
                client_role: None,
                name: Some("John Smith".into()),
                int_hourly_rate: 25.0,
                int_daily_rate: 200.0,
                client_hourly_rate: 0.0,
                client_daily_rate: 0.0,
                margin_percent: None,
                allocations: vec![Allocation::new(50), Allocation::FULL],
                effort_hours: 60.0,
                internal_cost: 1500.0,
                client_price: 0.0,
            }],
            totals: ProjectTotals {
                internal_cost: 1500.0,
                client_price: 0.0,
                effort_hours: 60.0,
                margin_percent: 0.0,
            },
        }
    }

    #[test]
    fn undefined_margin_shows_dash() {
        let text = TextRenderer::new().render(&Workbook::default(), &report()).unwrap();
        let row = text.lines().find(|l| l.contains("John Smith")).unwrap();
        assert!(row.contains(" - "), "row: {row}");
        assert!(row.contains("50%"));
        assert!(row.contains("100%"));
        assert!(row.contains("$1,500.00"));
        assert!(row.contains("€0.00"));
    }

    #[test]
    fn week_columns_can_be_hidden() {
        let text = TextRenderer::new()
            .no_weeks()
            .render(&Workbook::default(), &report())
            .unwrap();
        assert!(!text.contains("W1"));
        assert!(!text.contains("50%"));
    }

    #[test]
    fn header_and_rows_align() {
        let text = TextRenderer::new().render(&Workbook::default(), &report()).unwrap();
        let header = text.lines().find(|l| l.starts_with("Role")).unwrap();
        let row = text.lines().find(|l| l.contains("John Smith")).unwrap();
        assert_eq!(header.chars().count(), row.chars().count());
    }
}
