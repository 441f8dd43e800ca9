use actix_web::{HttpResponse, http::header, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::auth::auth::AuthUser;
use crate::errors::AppError;
use crate::ledger::balance::ExpenseTotals;
use crate::model::expense::{Expense, ExpenseCategory, ExpenseSubType};
use crate::report::canvas;
use crate::report::converter::HtmlToPdf;
use crate::report::html::{ExpenseReport, ExpenseRow, Templates};
use crate::utils::clock::Clock;
use crate::utils::date_range::{DateRange, DateRangeQuery, parse_range};
use crate::utils::db_utils::{Conditions, bind_values};
use crate::utils::form::{
    self, Body, DeleteConfirmation, blank_as_none, field_error, validate_decimal_min_zero,
};

const EXPENSE_COLUMNS: &str = "id, date, category, sub_type, description, amount, created_at, updated_at";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateExpense {
    /// Defaults to today
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(example = "2024-01-10", value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,

    pub category: ExpenseCategory,

    /// Required for `RBG`, ignored otherwise
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true, example = "RENT")]
    pub sub_type: Option<ExpenseSubType>,

    #[serde(default)]
    #[validate(length(max = 255, message = "Description is limited to 255 characters."))]
    #[schema(example = "January rent")]
    pub description: String,

    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(example = "850.00", value_type = String)]
    pub amount: Decimal,
}

impl CreateExpense {
    /// Field checks plus the category/sub type rule. Clears a stray sub type.
    pub fn clean(&mut self) -> Result<(), ValidationErrors> {
        self.description = self.description.trim().to_string();

        let mut extra = ValidationErrors::new();
        if self.category.requires_sub_type() {
            if self.sub_type.is_none() {
                extra.add("sub_type", field_error("required", "Please choose Rent/Bill/Guest."));
            }
        } else {
            self.sub_type = None;
        }

        form::finish(self.validate(), extra)
    }
}

/// One line of a bulk entry. Lines without an amount are skipped.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkExpenseRow {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,
    pub category: ExpenseCategory,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true)]
    pub sub_type: Option<ExpenseSubType>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkExpenses {
    pub rows: Vec<BulkExpenseRow>,
}

impl BulkExpenses {
    /// Rows that carry an amount, each validated like a single expense.
    /// Row problems are reported under `rows` with their 1-based position.
    pub fn into_expenses(self) -> Result<Vec<CreateExpense>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut kept = Vec::new();

        for (index, row) in self.rows.into_iter().enumerate() {
            let Some(amount) = row.amount else { continue };

            let mut expense = CreateExpense {
                date: row.date,
                category: row.category,
                sub_type: row.sub_type,
                description: row.description,
                amount,
            };

            match expense.clean() {
                Ok(()) => kept.push(expense),
                Err(row_errors) => {
                    for (field, field_errors) in row_errors.field_errors() {
                        for e in field_errors.iter() {
                            let detail = e.message.clone().unwrap_or_else(|| e.code.clone());
                            errors.add(
                                "rows",
                                field_error("row", format!("Row {}: {}: {}", index + 1, field, detail)),
                            );
                        }
                    }
                }
            }
        }

        if errors.is_empty() { Ok(kept) } else { Err(errors) }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryFilter {
    /// `MATERIAL`, `RBG`, `SETUP`, `OUTSOURCE` or `LOGISTICS`; anything else is ignored
    pub category: Option<String>,
}

impl CategoryFilter {
    pub fn category(&self) -> Option<ExpenseCategory> {
        parse_category(self.category.as_deref())
    }
}

fn parse_category(raw: Option<&str>) -> Option<ExpenseCategory> {
    raw.map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .and_then(|c| c.parse().ok())
}

#[derive(Serialize, ToSchema)]
pub struct ExpenseListResponse {
    pub range: DateRange,
    #[schema(nullable = true)]
    pub category: Option<ExpenseCategory>,
    pub expenses: Vec<Expense>,
    pub totals: ExpenseTotals,
}

#[derive(Serialize, ToSchema)]
pub struct MaterialListResponse {
    pub range: DateRange,
    pub expenses: Vec<Expense>,
    #[schema(value_type = String)]
    pub total_material: Decimal,
}

pub(crate) async fn load_expenses(
    pool: &MySqlPool,
    range: Option<&DateRange>,
    category: Option<ExpenseCategory>,
) -> Result<Vec<Expense>, AppError> {
    let mut conditions = Conditions::new();
    conditions.date_range("date", range);
    if let Some(category) = category {
        conditions.eq("category", category.as_ref());
    }

    let sql = format!(
        "SELECT {} FROM expenses {} ORDER BY date DESC, id DESC",
        EXPENSE_COLUMNS,
        conditions.where_sql()
    );

    Ok(bind_values!(sqlx::query_as::<_, Expense>(&sql), conditions.values())
        .fetch_all(pool)
        .await?)
}

fn totals_of(expenses: &[Expense]) -> ExpenseTotals {
    ExpenseTotals::from_amounts(expenses.iter().map(|e| (e.category, e.amount)))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    params(DateRangeQuery, CategoryFilter),
    responses((status = 200, body = ExpenseListResponse), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn list_expenses(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    range: web::Query<DateRangeQuery>,
    filter: web::Query<CategoryFilter>,
) -> actix_web::Result<HttpResponse> {
    let range = range.range_or_month_to_date(clock.today());
    let category = filter.category();

    let expenses = load_expenses(pool.get_ref(), Some(&range), category).await?;
    let totals = totals_of(&expenses);

    Ok(HttpResponse::Ok().json(ExpenseListResponse {
        range,
        category,
        expenses,
        totals,
    }))
}

#[utoipa::path(
    get,
    path = "/api/expenses/material",
    responses((status = 200, body = MaterialListResponse), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn material_expenses(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
) -> actix_web::Result<HttpResponse> {
    let range = DateRange::month_to_date(clock.today());
    let expenses = load_expenses(pool.get_ref(), Some(&range), Some(ExpenseCategory::Material)).await?;
    let total_material = expenses.iter().map(|e| e.amount).sum();

    Ok(HttpResponse::Ok().json(MaterialListResponse {
        range,
        expenses,
        total_material,
    }))
}

async fn insert_expense<'e, E>(executor: E, expense: &CreateExpense, today: NaiveDate) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    let result = sqlx::query(
        "INSERT INTO expenses (date, category, sub_type, description, amount) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(expense.date.unwrap_or(today))
    .bind(expense.category.as_ref())
    .bind(expense.sub_type.map(|s| s.as_ref().to_string()))
    .bind(&expense.description)
    .bind(form::money(expense.amount))
    .execute(executor)
    .await?;

    Ok(result.last_insert_id())
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body(content = CreateExpense, content_type = "application/json"),
    responses(
        (status = 201, body = Expense),
        (status = 400, description = "Validation failed, nothing saved"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn create_expense(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    body: Body<CreateExpense>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let mut payload = form::into_inner(body);
    payload.clean().map_err(AppError::from)?;

    let id = insert_expense(pool.get_ref(), &payload, clock.today())
        .await
        .map_err(AppError::from)?;
    tracing::info!(id, category = %payload.category, "Expense recorded");

    let expense: Expense = super::find(pool.get_ref(), "expenses", id, "Expense").await?;
    Ok(HttpResponse::Created().json(expense))
}

#[utoipa::path(
    post,
    path = "/api/expenses/bulk",
    request_body(content = BulkExpenses, content_type = "application/json"),
    responses(
        (status = 201, description = "Rows saved", body = Object, example = json!({"created": 3, "ids": [10, 11, 12]})),
        (status = 400, description = "A row failed validation, nothing saved"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn bulk_create_expenses(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    body: web::Json<BulkExpenses>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let expenses = body.into_inner().into_expenses().map_err(AppError::from)?;
    let today = clock.today();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut ids = Vec::with_capacity(expenses.len());
    for expense in &expenses {
        ids.push(insert_expense(&mut *tx, expense, today).await.map_err(AppError::from)?);
    }
    tx.commit().await.map_err(AppError::from)?;

    tracing::info!(created = ids.len(), "Bulk expenses recorded");
    Ok(HttpResponse::Created().json(serde_json::json!({
        "created": ids.len(),
        "ids": ids,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(("id", description = "Expense ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 404, description = "Expense not found"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn delete_expense(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    let expense: Expense = super::find(pool.get_ref(), "expenses", id, "Expense").await?;
    Ok(super::delete_confirmed(pool.get_ref(), "expenses", id, &expense, &confirm, "Expense").await?)
}

fn pdf_response(bytes: Vec<u8>, disposition: &str, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("{}; filename=\"{}\"", disposition, filename),
        ))
        .body(bytes)
}

#[utoipa::path(
    get,
    path = "/api/expenses/report/pdf",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "PDF drawn page by page", content_type = "application/pdf"),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn expense_report_pdf(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    let expenses = load_expenses(pool.get_ref(), query.range().as_ref(), None).await?;
    let pdf = web::block(move || canvas::expense_report_pdf(&expenses))
        .await?
        .map_err(AppError::from)?;

    Ok(pdf_response(pdf, "inline", "expense_report.pdf"))
}

/// Range and optional category, from a form post or the query string.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReportRequest {
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    #[param(example = "2024-01-31")]
    pub end_date: Option<String>,
    pub category: Option<String>,
}

/// Rows need a full range; category totals always cover the whole range.
async fn build_report(pool: &MySqlPool, request: &ReportRequest) -> Result<ExpenseReport, AppError> {
    let range = parse_range(request.start_date.as_deref(), request.end_date.as_deref());
    let category = parse_category(request.category.as_deref());

    let (rows, totals) = match &range {
        Some(range) => {
            let in_range = load_expenses(pool, Some(range), None).await?;
            let totals = totals_of(&in_range);
            let rows = in_range
                .iter()
                .filter(|e| category.is_none_or(|c| e.category == c))
                .map(ExpenseRow::from)
                .collect();
            (rows, totals)
        }
        None => (Vec::new(), ExpenseTotals::default()),
    };

    Ok(ExpenseReport {
        start_date: range.map(|r| r.start),
        end_date: range.map(|r| r.end),
        category: category.map(|c| c.label().to_string()),
        rows,
        totals,
    })
}

#[utoipa::path(
    post,
    path = "/api/expenses/report",
    request_body(content = ReportRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "PDF rendered from the HTML report", content_type = "application/pdf"),
        (status = 500, description = "Converter missing or failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn expense_report(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    templates: web::Data<Templates>,
    converter: web::Data<HtmlToPdf>,
    body: Body<ReportRequest>,
) -> actix_web::Result<HttpResponse> {
    let request = form::into_inner(body);
    let report = build_report(pool.get_ref(), &request).await?;
    let html = templates.render_expense_report(&report).map_err(AppError::from)?;

    let converter = converter.into_inner();
    let pdf = web::block(move || converter.convert(&html))
        .await?
        .map_err(AppError::from)?;

    Ok(pdf_response(pdf, "attachment", "expenses_report.pdf"))
}

#[utoipa::path(
    get,
    path = "/api/expenses/report/preview",
    params(ReportRequest),
    responses((status = 200, description = "The report as HTML", content_type = "text/html")),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn expense_report_preview(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    templates: web::Data<Templates>,
    query: web::Query<ReportRequest>,
) -> actix_web::Result<HttpResponse> {
    let report = build_report(pool.get_ref(), &query).await?;
    let html = templates.render_expense_report(&report).map_err(AppError::from)?;

    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}
