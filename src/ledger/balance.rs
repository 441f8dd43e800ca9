//! Balance arithmetic over ledger rows.
//!
//! Everything here is pure: callers fetch sums or rows from the database and
//! hand them in, so each request recomputes from persisted data. All money is
//! `Decimal`; nothing in this module touches floating point.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::expense::ExpenseCategory;
use crate::model::payment::{Payment, PaymentDirection};
use crate::utils::date_range::DateRange;

/// Portion of a new salary payment that exceeds what the employee has earned
/// and not yet been paid. `None` when the payment is covered.
pub fn overpay(earned: Decimal, paid_before: Decimal, amount: Decimal) -> Option<Decimal> {
    let available = earned - paid_before;
    let extra = amount - available;
    (extra > Decimal::ZERO).then_some(extra)
}

/// Amount credited for extra work. An explicit non-zero amount wins; otherwise
/// hours × rate rounded to cents (banker's rounding) when both are given.
pub fn credit_amount(
    hours: Option<Decimal>,
    rate: Option<Decimal>,
    amount: Option<Decimal>,
) -> Option<Decimal> {
    if let Some(explicit) = amount.filter(|a| !a.is_zero()) {
        return Some(explicit);
    }

    match (hours, rate) {
        (Some(h), Some(r)) if !h.is_zero() && !r.is_zero() => Some((h * r).round_dp(2)),
        _ => amount,
    }
}

/// Earned and paid-to-date for one contractual employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractualTotals {
    pub earned: Decimal,
    pub paid: Decimal,
}

impl ContractualTotals {
    pub fn new(earned: Decimal, paid: Decimal) -> Self {
        Self { earned, paid }
    }

    pub fn balance(&self) -> Decimal {
        self.earned - self.paid
    }

    /// Paid beyond earnings. Never negative.
    pub fn advances(&self) -> Decimal {
        (self.paid - self.earned).max(Decimal::ZERO)
    }

    pub fn standing(&self) -> ContractualStanding {
        ContractualStanding {
            earned: self.earned,
            paid: self.paid,
            balance: self.balance(),
            balance_abs: self.balance().abs(),
            advances: self.advances(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContractualStanding {
    #[schema(example = "500.00", value_type = String)]
    pub earned: Decimal,
    #[schema(example = "700.00", value_type = String)]
    pub paid: Decimal,
    #[schema(example = "-200.00", value_type = String)]
    pub balance: Decimal,
    #[schema(example = "200.00", value_type = String)]
    pub balance_abs: Decimal,
    #[schema(example = "200.00", value_type = String)]
    pub advances: Decimal,
}

/// Totals shown on a contractual employee's report for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportTotals {
    #[schema(value_type = String)]
    pub total_work: Decimal,
    #[schema(value_type = String)]
    pub total_salary: Decimal,
    #[schema(value_type = String)]
    pub total_advances: Decimal,
    /// Work minus salary. Advances are already part of the salary paid.
    #[schema(value_type = String)]
    pub balance: Decimal,
}

impl ReportTotals {
    pub fn new(total_work: Decimal, total_salary: Decimal, total_advances: Decimal) -> Self {
        Self {
            total_work,
            total_salary,
            total_advances,
            balance: total_work - total_salary,
        }
    }
}

/// Monthly salary, credits and payments of one fixed employee for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedTotals {
    pub monthly_salary: Decimal,
    pub credits: Decimal,
    pub paid: Decimal,
}

impl FixedTotals {
    pub fn new(monthly_salary: Decimal, credits: Decimal, paid: Decimal) -> Self {
        Self {
            monthly_salary,
            credits,
            paid,
        }
    }

    pub fn due(&self) -> Decimal {
        self.monthly_salary + self.credits
    }

    /// Due minus paid, unclamped: negative means overpaid.
    pub fn balance(&self) -> Decimal {
        self.due() - self.paid
    }

    pub fn standing(&self) -> FixedStanding {
        FixedStanding {
            monthly_salary: self.monthly_salary,
            credits: self.credits,
            due: self.due(),
            paid: self.paid,
            balance: self.balance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FixedStanding {
    #[schema(value_type = String)]
    pub monthly_salary: Decimal,
    #[schema(value_type = String)]
    pub credits: Decimal,
    #[schema(value_type = String)]
    pub due: Decimal,
    #[schema(value_type = String)]
    pub paid: Decimal,
    #[schema(value_type = String)]
    pub balance: Decimal,
}

/// Raw per-table sums for one period across the whole business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSums {
    pub payments_in: Decimal,
    pub payments_out: Decimal,
    pub expenses: Decimal,
    pub salary_payments: Decimal,
    pub fixed_salary_payments: Decimal,
}

impl LedgerSums {
    pub fn payins(&self) -> Decimal {
        self.payments_in
    }

    pub fn payouts(&self) -> Decimal {
        self.payments_out + self.expenses + self.salary_payments + self.fixed_salary_payments
    }

    pub fn balance(&self) -> Decimal {
        self.payins() - self.payouts()
    }

    pub fn summary(&self, range: DateRange) -> PeriodSummary {
        PeriodSummary {
            range,
            payins: self.payins(),
            payouts: self.payouts(),
            balance: self.balance(),
            salary_paid: self.salary_payments,
            fixed_salary_paid: self.fixed_salary_payments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PeriodSummary {
    pub range: DateRange,
    #[schema(example = "200.00", value_type = String)]
    pub payins: Decimal,
    #[schema(example = "50.00", value_type = String)]
    pub payouts: Decimal,
    #[schema(example = "150.00", value_type = String)]
    pub balance: Decimal,
    #[schema(value_type = String)]
    pub salary_paid: Decimal,
    #[schema(value_type = String)]
    pub fixed_salary_paid: Decimal,
}

/// Head counts and payroll figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeStats {
    pub total_contractual: u64,
    pub total_fixed: u64,
    pub total_employees: u64,
    #[schema(value_type = String)]
    pub total_advances: Decimal,
    #[schema(value_type = String)]
    pub total_salary_paid: Decimal,
    #[schema(value_type = String)]
    pub total_salary_due: Decimal,
    /// Contractual balances (all time) plus fixed balances for the month.
    #[schema(value_type = String)]
    pub salary_pending: Decimal,
}

impl EmployeeStats {
    pub fn collect(contractual: &[ContractualTotals], fixed: &[FixedTotals]) -> Self {
        let total_contractual = contractual.len() as u64;
        let total_fixed = fixed.len() as u64;

        let contractual_balance: Decimal = contractual.iter().map(ContractualTotals::balance).sum();
        let fixed_balance: Decimal = fixed.iter().map(FixedTotals::balance).sum();

        Self {
            total_contractual,
            total_fixed,
            total_employees: total_contractual + total_fixed,
            total_advances: contractual.iter().map(ContractualTotals::advances).sum(),
            total_salary_paid: contractual.iter().map(|t| t.paid).sum(),
            total_salary_due: fixed.iter().map(|t| t.monthly_salary).sum(),
            salary_pending: contractual_balance + fixed_balance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ExpenseTotals {
    #[schema(value_type = String)]
    pub material: Decimal,
    #[schema(value_type = String)]
    pub rbg: Decimal,
    #[schema(value_type = String)]
    pub setup: Decimal,
    #[schema(value_type = String)]
    pub outsource: Decimal,
    #[schema(value_type = String)]
    pub logistics: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl ExpenseTotals {
    pub fn add(&mut self, category: ExpenseCategory, amount: Decimal) {
        let slot = match category {
            ExpenseCategory::Material => &mut self.material,
            ExpenseCategory::Rbg => &mut self.rbg,
            ExpenseCategory::Setup => &mut self.setup,
            ExpenseCategory::Outsource => &mut self.outsource,
            ExpenseCategory::Logistics => &mut self.logistics,
        };
        *slot += amount;
        self.total += amount;
    }

    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (ExpenseCategory, Decimal)>,
    {
        let mut totals = Self::default();
        for (category, amount) in amounts {
            totals.add(category, amount);
        }
        totals
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaymentTotals {
    #[schema(value_type = String)]
    pub total_payin: Decimal,
    #[schema(value_type = String)]
    pub total_payout: Decimal,
    #[schema(value_type = String)]
    pub balance: Decimal,
}

impl PaymentTotals {
    pub fn from_payments(payments: &[Payment]) -> Self {
        let (mut total_payin, mut total_payout) = (Decimal::ZERO, Decimal::ZERO);
        for payment in payments {
            match payment.direction {
                PaymentDirection::In => total_payin += payment.amount,
                PaymentDirection::Out => total_payout += payment.amount,
            }
        }

        Self {
            total_payin,
            total_payout,
            balance: total_payin - total_payout,
        }
    }
}
