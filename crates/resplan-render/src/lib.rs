//! # resplan-render
//!
//! Rendering backends for resplan planning reports.
//!
//! This crate provides:
//! - Plain-text planning table (for terminals and logs)
//! - Excel planning export with a rate card sheet
//!
//! ## Example
//!
//! ```rust,ignore
//! use resplan_core::Renderer;
//! use resplan_engine::PlanningSheet;
//! use resplan_render::{ExcelRenderer, TextRenderer};
//!
//! let sheet = PlanningSheet::from_workbook(workbook.clone());
//! let report = sheet.report()?;
//!
//! let table = TextRenderer::new().render(&workbook, &report)?;
//! println!("{table}");
//!
//! let xlsx_bytes = ExcelRenderer::new().render(&workbook, &report)?;
//! std::fs::write("plan.xlsx", xlsx_bytes)?;
//! ```

pub mod excel;
pub mod text;

pub use excel::ExcelRenderer;
pub use text::TextRenderer;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Round a money amount to cents, half away from zero.
///
/// Non-finite input has no decimal representation and maps to `None`.
pub fn round_money(amount: f64) -> Option<Decimal> {
    Decimal::from_f64(amount)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Money cell value as written to a spreadsheet
pub(crate) fn money_cell(amount: f64) -> f64 {
    round_money(amount)
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

/// Money text with two decimals and a currency symbol, e.g. `€1,234.50`
pub fn format_money(amount: f64, symbol: &str) -> String {
    let Some(rounded) = round_money(amount) else {
        return "-".to_string();
    };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{symbol}{}.{frac_part}", group_thousands(int_part))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncate a string to `max` chars, marking the cut with `...`
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(round_money(66.666), Some(dec!(66.67)));
        assert_eq!(round_money(-0.126), Some(dec!(-0.13)));
        assert_eq!(round_money(2000.0), Some(dec!(2000.00)));
        assert_eq!(round_money(f64::NAN), None);
    }

    #[test]
    fn money_text() {
        assert_eq!(format_money(3440.0, "€"), "€3,440.00");
        assert_eq!(format_money(1_234_567.891, "$"), "$1,234,567.89");
        assert_eq!(format_money(59.333, "£"), "£59.33");
        assert_eq!(format_money(-160.0, "€"), "-€160.00");
        assert_eq!(format_money(0.0, "$"), "$0.00");
        assert_eq!(format_money(f64::INFINITY, "$"), "-");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("Designer", 12), "Designer");
        assert_eq!(truncate("Application Development", 12), "Applicati...");
    }
}
