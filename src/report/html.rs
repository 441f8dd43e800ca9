use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};

use super::ReportError;
use crate::ledger::balance::{ContractualStanding, ExpenseTotals};
use crate::model::contractual::ContractualEmployee;
use crate::model::expense::Expense;

const EXPENSE_REPORT: &str = "expense_report.html";
const PAYSLIP: &str = "payslip.html";

/// Compiled HTML templates, built once at start-up and shared across workers.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, ReportError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (EXPENSE_REPORT, include_str!("../../templates/expense_report.html")),
            (PAYSLIP, include_str!("../../templates/payslip.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn render_expense_report(&self, report: &ExpenseReport) -> Result<String, ReportError> {
        let context = Context::from_serialize(report)?;
        Ok(self.tera.render(EXPENSE_REPORT, &context)?)
    }

    pub fn render_payslip(&self, payslip: &Payslip) -> Result<String, ReportError> {
        let context = Context::from_serialize(payslip)?;
        Ok(self.tera.render(PAYSLIP, &context)?)
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseRow {
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
}

impl From<&Expense> for ExpenseRow {
    fn from(expense: &Expense) -> Self {
        Self {
            date: expense.date,
            category: expense.display_category(),
            description: expense.description.clone(),
            amount: expense.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Label of the category filter, if any.
    pub category: Option<String>,
    pub rows: Vec<ExpenseRow>,
    pub totals: ExpenseTotals,
}

#[derive(Debug, Serialize)]
pub struct Payslip {
    pub employee: ContractualEmployee,
    pub standing: ContractualStanding,
    pub in_advance: bool,
    pub issued_on: NaiveDate,
}

impl Payslip {
    pub fn new(employee: ContractualEmployee, standing: ContractualStanding, issued_on: NaiveDate) -> Self {
        Self {
            in_advance: standing.advances > Decimal::ZERO,
            employee,
            standing,
            issued_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::balance::ContractualTotals;
    use crate::model::expense::{ExpenseCategory, ExpenseSubType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn expense(category: ExpenseCategory, sub_type: Option<ExpenseSubType>, amount: Decimal) -> Expense {
        Expense {
            id: 1,
            date: date(10),
            category,
            sub_type,
            description: "Fabric <roll>".into(),
            amount,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expense_report_lists_rows_and_totals() {
        let expenses = vec![
            expense(ExpenseCategory::Material, None, dec!(50.00)),
            expense(ExpenseCategory::Rbg, Some(ExpenseSubType::Rent), dec!(300.00)),
        ];
        let totals = ExpenseTotals::from_amounts(expenses.iter().map(|e| (e.category, e.amount)));

        let report = ExpenseReport {
            start_date: Some(date(1)),
            end_date: Some(date(31)),
            category: None,
            rows: expenses.iter().map(ExpenseRow::from).collect(),
            totals,
        };

        let html = Templates::new().unwrap().render_expense_report(&report).unwrap();
        assert!(html.contains("2024-01-01"));
        assert!(html.contains("Guest · Rent"));
        assert!(html.contains("350.00"));
        assert!(html.contains("Fabric &lt;roll&gt;"));
    }

    #[test]
    fn empty_expense_report_still_renders_a_table() {
        let report = ExpenseReport {
            start_date: None,
            end_date: None,
            category: None,
            rows: Vec::new(),
            totals: ExpenseTotals::default(),
        };

        let html = Templates::new().unwrap().render_expense_report(&report).unwrap();
        assert!(html.contains("<table"));
        assert!(html.contains("No expenses"));
    }

    #[test]
    fn payslip_shows_balance_and_advances() {
        let employee = ContractualEmployee {
            id: 3,
            name: "Amina Rahman".into(),
            phone: None,
            role: Some("Stitcher".into()),
        };
        let payslip = Payslip::new(
            employee,
            ContractualTotals::new(dec!(500), dec!(700)).standing(),
            date(31),
        );

        let html = Templates::new().unwrap().render_payslip(&payslip).unwrap();
        assert!(html.contains("Amina Rahman"));
        assert!(html.contains("Stitcher"));
        assert!(html.contains("2024-01-31"));
        assert!(html.contains("Advance outstanding"));
        assert!(html.contains("200"));
        assert!(!html.contains("Balance due"));
    }
}
