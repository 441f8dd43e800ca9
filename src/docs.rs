use crate::api::contractual::{
    ContractualDetail, ContractualReport, ContractualSummary, CreateContractual, SalaryForm,
    SalaryReceipt, UpdateContractual, WorkEntries, WorkRow,
};
use crate::api::dashboard::Dashboard;
use crate::api::expense::{
    BulkExpenseRow, BulkExpenses, CreateExpense, ExpenseListResponse, MaterialListResponse,
    ReportRequest,
};
use crate::api::fixed::{
    CreateFixed, CreditForm, FixedListResponse, FixedReport, FixedSalaryForm, FixedSummary,
    UpdateFixed,
};
use crate::api::payment::{CreatePayment, PaymentListResponse};
use crate::ledger::balance::{
    ContractualStanding, EmployeeStats, ExpenseTotals, FixedStanding, PaymentTotals,
    PeriodSummary, ReportTotals,
};
use crate::model::contractual::{AdvancePayment, ContractualEmployee, SalaryPayment, WorkRecord};
use crate::model::expense::{Expense, ExpenseCategory, ExpenseSubType};
use crate::model::fixed::{FixedEmployee, FixedSalaryPayment, FixedWorkCredit};
use crate::model::payment::{Payment, PaymentDirection};
use crate::models::{LoginReqDto, TokenPair, UserReq};
use crate::utils::date_range::DateRange;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookkeeper API",
        version = "1.0.0",
        description = r#"
## Small-business bookkeeping

Tracks money coming in and going out of a small workshop.

### Key Features
- **Payments**: money received or paid out, with running totals
- **Expenses**: categorised spending, bulk entry, PDF and HTML reports
- **Contractual employees**: piece-rate work, salary payments and automatic advances
- **Fixed employees**: monthly salary, overtime credits and payments
- **Dashboard**: month-to-date pay-ins, payouts and payroll figures

### Security
Every `/api` endpoint needs a **JWT Bearer** access token from `/auth/login`.
Viewers can read, bookkeepers can also record, only admins can delete.
Deletes must be repeated with `?confirm=true`.

### Money
Amounts are decimal strings with two places, e.g. `"1250.00"`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::dashboard::dashboard,

        crate::api::payment::list_payments,
        crate::api::payment::create_payment,
        crate::api::payment::delete_payment,

        crate::api::expense::list_expenses,
        crate::api::expense::material_expenses,
        crate::api::expense::create_expense,
        crate::api::expense::bulk_create_expenses,
        crate::api::expense::delete_expense,
        crate::api::expense::expense_report_pdf,
        crate::api::expense::expense_report,
        crate::api::expense::expense_report_preview,

        crate::api::contractual::list_contractual,
        crate::api::contractual::create_contractual,
        crate::api::contractual::get_contractual,
        crate::api::contractual::update_contractual,
        crate::api::contractual::delete_contractual,
        crate::api::contractual::add_work,
        crate::api::contractual::record_salary,
        crate::api::contractual::contractual_report,
        crate::api::contractual::payslip,
        crate::api::contractual::delete_work_record,
        crate::api::contractual::delete_salary_payment,
        crate::api::contractual::delete_advance_payment,

        crate::api::fixed::list_fixed,
        crate::api::fixed::create_fixed,
        crate::api::fixed::fixed_report,
        crate::api::fixed::update_fixed,
        crate::api::fixed::delete_fixed,
        crate::api::fixed::record_fixed_salary,
        crate::api::fixed::add_credit,
        crate::api::fixed::delete_fixed_salary,
        crate::api::fixed::delete_credit
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            TokenPair,
            DateRange,
            Payment,
            PaymentDirection,
            CreatePayment,
            PaymentListResponse,
            PaymentTotals,
            Expense,
            ExpenseCategory,
            ExpenseSubType,
            CreateExpense,
            BulkExpenseRow,
            BulkExpenses,
            ExpenseListResponse,
            MaterialListResponse,
            ExpenseTotals,
            ReportRequest,
            ContractualEmployee,
            WorkRecord,
            SalaryPayment,
            AdvancePayment,
            CreateContractual,
            UpdateContractual,
            WorkRow,
            WorkEntries,
            SalaryForm,
            SalaryReceipt,
            ContractualSummary,
            ContractualDetail,
            ContractualReport,
            ContractualStanding,
            ReportTotals,
            FixedEmployee,
            FixedSalaryPayment,
            FixedWorkCredit,
            CreateFixed,
            UpdateFixed,
            FixedSalaryForm,
            CreditForm,
            FixedSummary,
            FixedListResponse,
            FixedReport,
            FixedStanding,
            PeriodSummary,
            EmployeeStats,
            Dashboard
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "Dashboard", description = "Business summary"),
        (name = "Payments", description = "Money in and out"),
        (name = "Expenses", description = "Categorised expenses and reports"),
        (name = "Contractual employees", description = "Piece-rate workers, salaries and advances"),
        (name = "Fixed employees", description = "Monthly salaried workers and overtime credits"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ledger_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/dashboard",
            "/api/payments/{id}",
            "/api/expenses/report/preview",
            "/api/employees/contractual/{id}/advance/{child_id}",
            "/api/employees/fixed/{id}/credit",
            "/auth/refresh",
        ] {
            assert!(paths.contains_key(path), "{} missing", path);
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
