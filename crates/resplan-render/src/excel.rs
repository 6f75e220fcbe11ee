//! Excel planning export
//!
//! Generates an XLSX workbook with two sheets:
//! - Resource Plan: one row per plan with rates, margin, weekly allocation,
//!   effort, cost and price, plus a totals row
//! - Rate Card: internal hourly rates per role and region
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: Resource Plan
//! | Role    | Client Role | Name  | Int $/h | Int $/d | Client €/h | Client €/d | Margin | W1  | W2  | Hours | Cost $  | Price €  |
//! |---------|-------------|-------|---------|---------|------------|------------|--------|-----|-----|-------|---------|----------|
//! | Dev     |             | John  | 25.00   | 200.00  | 43.00      | 344.00     | 48.3%  | 50% | 50% | 40.0  | 1000.00 | 1720.00  |
//! | TOTAL   |             |       |         |         |            |            | 48.3%  |     |     | =SUM  | =SUM    | =SUM     |
//! ```
//!
//! Weekly cells hold the allocation as a fraction with a percent format so
//! spreadsheet users can keep editing them.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use resplan_core::{Currency, PlanReport, PlanSummary, RateCard, Region, RenderError, Renderer, Workbook};

use crate::money_cell;

/// Columns before the first week column
const LEADING_COLUMNS: u16 = 8;

/// Excel planning export renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Write SUM formulas in the totals row instead of static values
    pub use_formulas: bool,
    /// Whether to add the Rate Card sheet
    pub include_rate_card: bool,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            use_formulas: true,
            include_rate_card: true,
        }
    }
}

fn xlsx_err(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use static values instead of formulas
    pub fn static_values(mut self) -> Self {
        self.use_formulas = false;
        self
    }

    pub fn no_rate_card(mut self) -> Self {
        self.include_rate_card = false;
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, workbook: &Workbook, report: &PlanReport) -> Result<Vec<u8>, RenderError> {
        let mut xlsx = XlsxWorkbook::new();
        let formats = ExcelFormats::new(report.currency);

        self.add_plan_sheet(&mut xlsx, report, &formats)?;
        if self.include_rate_card {
            Self::add_rate_card_sheet(&mut xlsx, &workbook.rate_cards, &formats)?;
        }

        xlsx.save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn add_plan_sheet(
        &self,
        xlsx: &mut XlsxWorkbook,
        report: &PlanReport,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = xlsx.add_worksheet();
        sheet.set_name("Resource Plan").map_err(xlsx_err)?;

        let sym = report.currency.symbol();
        let mut headers = vec![
            "Role".to_string(),
            "Client Role".to_string(),
            "Name".to_string(),
            "Int $/h".to_string(),
            "Int $/d".to_string(),
            format!("Client {sym}/h"),
            format!("Client {sym}/d"),
            "Margin".to_string(),
        ];
        headers.extend(report.weeks.iter().map(|w| format!("W{w}")));
        headers.extend(["Hours".to_string(), "Cost $".to_string(), format!("Price {sym}")]);

        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, header.as_str(), &formats.header)
                .map_err(xlsx_err)?;
        }

        sheet.set_column_width(0, 28).ok();
        sheet.set_column_width(1, 22).ok();
        sheet.set_column_width(2, 20).ok();
        for col in 3..LEADING_COLUMNS {
            sheet.set_column_width(col, 11).ok();
        }
        let week_count = report.weeks.len() as u16;
        for offset in 0..week_count {
            sheet.set_column_width(LEADING_COLUMNS + offset, 6).ok();
        }
        let hours_col = LEADING_COLUMNS + week_count;
        sheet.set_column_width(hours_col, 9).ok();
        sheet.set_column_width(hours_col + 1, 14).ok();
        sheet.set_column_width(hours_col + 2, 14).ok();

        let mut row = 1u32;
        for plan in &report.plans {
            Self::write_plan_row(sheet, row, plan, formats)?;
            row += 1;
        }

        // Totals
        let last_data_row = row;
        let totals = &report.totals;
        sheet
            .write_with_format(row, 0, "TOTAL", &formats.total_row)
            .map_err(xlsx_err)?;
        for col in 1..LEADING_COLUMNS - 1 {
            sheet.write_blank(row, col, &formats.total_row).map_err(xlsx_err)?;
        }
        sheet
            .write_number_with_format(row, LEADING_COLUMNS - 1, totals.margin_percent / 100.0, &formats.total_percent)
            .map_err(xlsx_err)?;
        for offset in 0..week_count {
            sheet
                .write_blank(row, LEADING_COLUMNS + offset, &formats.total_row)
                .map_err(xlsx_err)?;
        }

        let sums = [
            (hours_col, totals.effort_hours, &formats.total_number),
            (hours_col + 1, money_cell(totals.internal_cost), &formats.total_usd),
            (hours_col + 2, money_cell(totals.client_price), &formats.total_client),
        ];
        for (col, value, format) in sums {
            if self.use_formulas && !report.plans.is_empty() {
                let letter = Self::col_to_letter(col);
                let formula = format!("=SUM({letter}2:{letter}{last_data_row})");
                sheet
                    .write_formula_with_format(row, col, formula.as_str(), format)
                    .map_err(xlsx_err)?;
            } else {
                sheet
                    .write_number_with_format(row, col, value, format)
                    .map_err(xlsx_err)?;
            }
        }

        sheet.set_freeze_panes(1, 3).ok();
        Ok(())
    }

    fn write_plan_row(
        sheet: &mut Worksheet,
        row: u32,
        plan: &PlanSummary,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let text_cells = [
            plan.role.as_str(),
            plan.client_role.as_deref().unwrap_or(""),
            plan.name.as_deref().unwrap_or(""),
        ];
        for (col, value) in text_cells.into_iter().enumerate() {
            sheet
                .write_with_format(row, col as u16, value, &formats.text)
                .map_err(xlsx_err)?;
        }

        let rates = [
            (3, plan.int_hourly_rate, &formats.usd),
            (4, plan.int_daily_rate, &formats.usd),
            (5, plan.client_hourly_rate, &formats.client),
            (6, plan.client_daily_rate, &formats.client),
        ];
        for (col, value, format) in rates {
            sheet
                .write_number_with_format(row, col, money_cell(value), format)
                .map_err(xlsx_err)?;
        }

        match plan.margin_percent {
            Some(margin) => sheet
                .write_number_with_format(row, LEADING_COLUMNS - 1, margin / 100.0, &formats.percent)
                .map_err(xlsx_err)?,
            None => sheet
                .write_with_format(row, LEADING_COLUMNS - 1, "-", &formats.centered)
                .map_err(xlsx_err)?,
        };

        let mut col = LEADING_COLUMNS;
        for allocation in &plan.allocations {
            sheet
                .write_number_with_format(row, col, allocation.fraction(), &formats.allocation)
                .map_err(xlsx_err)?;
            col += 1;
        }

        sheet
            .write_number_with_format(row, col, plan.effort_hours, &formats.number)
            .map_err(xlsx_err)?;
        sheet
            .write_number_with_format(row, col + 1, money_cell(plan.internal_cost), &formats.usd)
            .map_err(xlsx_err)?;
        sheet
            .write_number_with_format(row, col + 2, money_cell(plan.client_price), &formats.client)
            .map_err(xlsx_err)?;
        Ok(())
    }

    /// Add Rate Card sheet: one row per role, one column per region
    fn add_rate_card_sheet(
        xlsx: &mut XlsxWorkbook,
        rate_cards: &[RateCard],
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = xlsx.add_worksheet();
        sheet.set_name("Rate Card").map_err(xlsx_err)?;

        let fixed = ["Role", "Naming in PM", "Discipline"];
        for (col, header) in fixed.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(xlsx_err)?;
        }
        for (i, region) in Region::ALL.iter().enumerate() {
            let col = fixed.len() as u16 + i as u16;
            sheet
                .write_with_format(0, col, region.display_name(), &formats.header)
                .map_err(xlsx_err)?;
            sheet.set_column_width(col, 14).ok();
        }
        sheet.set_column_width(0, 30).ok();
        sheet.set_column_width(1, 22).ok();
        sheet.set_column_width(2, 18).ok();

        for (i, card) in rate_cards.iter().enumerate() {
            let row = i as u32 + 1;
            sheet
                .write_with_format(row, 0, card.role.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, card.naming_in_pm.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, card.discipline.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            for (j, region) in Region::ALL.iter().enumerate() {
                let col = fixed.len() as u16 + j as u16;
                sheet
                    .write_number_with_format(row, col, money_cell(card.rate_for(*region)), &formats.usd)
                    .map_err(xlsx_err)?;
            }
        }

        sheet.set_freeze_panes(1, 1).ok();
        Ok(())
    }

    /// Convert column index to Excel letter (0=A, 25=Z, 26=AA)
    fn col_to_letter(col: u16) -> String {
        let mut result = String::new();
        let mut n = u32::from(col);
        loop {
            result.insert(0, char::from(b'A' + (n % 26) as u8));
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        result
    }
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, workbook: &Workbook, report: &PlanReport) -> Result<Vec<u8>, RenderError> {
        if report.weeks.is_empty() {
            return Err(RenderError::InvalidData("Report has no weeks".into()));
        }
        self.render_to_bytes(workbook, report)
    }
}

/// Reusable cell formats
struct ExcelFormats {
    header: Format,
    text: Format,
    centered: Format,
    number: Format,
    usd: Format,
    client: Format,
    percent: Format,
    allocation: Format,
    total_row: Format,
    total_number: Format,
    total_percent: Format,
    total_usd: Format,
    total_client: Format,
}

impl ExcelFormats {
    fn new(currency: Currency) -> Self {
        let usd_format = "\"$\"#,##0.00";
        let client_format = format!("\"{}\"#,##0.00", currency.symbol());

        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let total = || {
            Format::new()
                .set_bold()
                .set_background_color(0xE2EFDA)
                .set_border(FormatBorder::Thin)
        };

        Self {
            header,
            text: Format::new().set_border(FormatBorder::Thin),
            centered: Format::new()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            number: Format::new()
                .set_num_format("#,##0.0")
                .set_border(FormatBorder::Thin),
            usd: Format::new()
                .set_num_format(usd_format)
                .set_border(FormatBorder::Thin),
            client: Format::new()
                .set_num_format(&client_format)
                .set_border(FormatBorder::Thin),
            percent: Format::new()
                .set_num_format("0.0%")
                .set_border(FormatBorder::Thin),
            allocation: Format::new()
                .set_num_format("0%")
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            total_row: total(),
            total_number: total().set_num_format("#,##0.0"),
            total_percent: total().set_num_format("0.0%"),
            total_usd: total().set_num_format(usd_format),
            total_client: total().set_num_format(&client_format),
        }
    }
}
