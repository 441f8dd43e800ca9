use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::auth::auth::AuthUser;
use crate::errors::AppError;
use crate::ledger::balance::{FixedStanding, credit_amount};
use crate::ledger::queries;
use crate::model::fixed::{FixedEmployee, FixedSalaryPayment, FixedWorkCredit};
use crate::utils::clock::Clock;
use crate::utils::date_range::{DateRange, DateRangeQuery};
use crate::utils::db_utils::{SqlUpdate, SqlValue, execute_update};
use crate::utils::form::{
    self, Body, DeleteConfirmation, blank_as_none, check_description, check_hours, check_min_zero,
    field_error, validate_decimal_min_zero, validate_positive_amount,
};

const EMPLOYEES: &str = "fixed_employees";
const SALARY_PAYMENTS: &str = "fixed_salary_payments";
const WORK_CREDITS: &str = "fixed_work_credits";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFixed {
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)."))]
    #[schema(example = "Tom Baker")]
    pub name: String,

    #[validate(length(max = 15, message = "Phone is limited to 15 characters."))]
    #[schema(nullable = true)]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Role is limited to 100 characters."))]
    #[schema(nullable = true)]
    pub role: Option<String>,

    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(example = "2100.00", value_type = String)]
    pub monthly_salary: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFixed {
    #[validate(length(min = 1, max = 100, message = "Name cannot be blank (max 100 characters)."))]
    pub name: Option<String>,
    #[validate(length(max = 15, message = "Phone is limited to 15 characters."))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "Role is limited to 100 characters."))]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = String, nullable = true)]
    pub monthly_salary: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FixedSalaryForm {
    #[validate(custom = "validate_positive_amount")]
    #[schema(example = "1000.00", value_type = String)]
    pub amount: Decimal,

    /// Defaults to today
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description is limited to 1000 characters."))]
    pub description: String,
}

/// Either an explicit amount or hours and rate.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreditForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true, example = "6.5")]
    pub hours: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true, example = "14.00")]
    pub rate: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: String,
}

/// A credit ready to insert.
#[derive(Debug, PartialEq)]
pub struct NewCredit {
    pub date: NaiveDate,
    pub hours: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub amount: Decimal,
    pub description: String,
}

impl CreditForm {
    pub fn into_credit(self, today: NaiveDate) -> Result<NewCredit, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_hours(&mut errors, "hours", self.hours);
        check_min_zero(&mut errors, "rate", self.rate);
        check_min_zero(&mut errors, "amount", self.amount);
        check_description(&mut errors, "description", Some(self.description.as_str()));
        if !errors.is_empty() {
            return Err(errors);
        }

        let amount = match credit_amount(self.hours, self.rate, self.amount).filter(|a| !a.is_zero()) {
            Some(amount) => form::money(amount),
            None => {
                errors.add("amount", field_error("required", "Enter an amount, or both hours and rate."));
                return Err(errors);
            }
        };
        // hours x rate can still overflow the column
        check_min_zero(&mut errors, "amount", Some(amount));
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewCredit {
            date: self.date.unwrap_or(today),
            hours: self.hours.map(form::money),
            rate: self.rate.map(form::money),
            amount,
            description: self.description.trim().to_string(),
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct FixedSummary {
    #[serde(flatten)]
    pub employee: FixedEmployee,
    pub standing: FixedStanding,
}

#[derive(Serialize, ToSchema)]
pub struct FixedListResponse {
    pub range: DateRange,
    pub employees: Vec<FixedSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct FixedReport {
    pub employee: FixedEmployee,
    pub range: DateRange,
    pub payments: Vec<FixedSalaryPayment>,
    pub credits: Vec<FixedWorkCredit>,
    pub standing: FixedStanding,
}

async fn employee(pool: &MySqlPool, id: u64) -> Result<FixedEmployee, AppError> {
    super::find(pool, EMPLOYEES, id, "Employee").await
}

#[utoipa::path(
    get,
    path = "/api/employees/fixed",
    responses((status = 200, body = FixedListResponse), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn list_fixed(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
) -> actix_web::Result<HttpResponse> {
    let range = DateRange::month_to_date(clock.today());
    let rows = queries::fixed_overview(pool.get_ref(), &range)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(FixedListResponse {
        range,
        employees: rows
            .into_iter()
            .map(|(employee, totals)| FixedSummary {
                employee,
                standing: totals.standing(),
            })
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/employees/fixed",
    request_body(content = CreateFixed, content_type = "application/json"),
    responses(
        (status = 201, body = FixedEmployee),
        (status = 400, description = "Validation failed, nothing saved"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn create_fixed(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: Body<CreateFixed>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let mut payload = form::into_inner(body);
    payload.name = payload.name.trim().to_string();
    payload.validate().map_err(AppError::from)?;

    let phone = form::optional_text(payload.phone);
    let role = form::optional_text(payload.role);
    let monthly_salary = form::money(payload.monthly_salary);

    let id = sqlx::query(
        "INSERT INTO fixed_employees (name, phone, role, monthly_salary) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(phone.as_deref())
    .bind(role.as_deref())
    .bind(monthly_salary)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    tracing::info!(id, "Fixed employee created");

    Ok(HttpResponse::Created().json(FixedEmployee {
        id,
        name: payload.name,
        phone,
        role,
        monthly_salary,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees/fixed/{id}",
    params(("id", description = "Employee ID"), DateRangeQuery),
    responses((status = 200, body = FixedReport), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn fixed_report(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    let id = path.into_inner();
    let pool = pool.get_ref();
    let range = query.range_or_month_to_date(clock.today());

    let employee = employee(pool, id).await?;
    let totals = queries::fixed_totals(pool, &employee, &range)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(FixedReport {
        payments: super::children(pool, SALARY_PAYMENTS, id, Some(&range)).await?,
        credits: super::children(pool, WORK_CREDITS, id, Some(&range)).await?,
        standing: totals.standing(),
        employee,
        range,
    }))
}

#[utoipa::path(
    put,
    path = "/api/employees/fixed/{id}",
    params(("id", description = "Employee ID")),
    request_body(content = UpdateFixed, content_type = "application/json"),
    responses(
        (status = 200, body = FixedEmployee),
        (status = 400, description = "Validation failed or nothing to update"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn update_fixed(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Body<UpdateFixed>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let id = path.into_inner();
    let mut payload = form::into_inner(body);
    payload.name = payload.name.map(|n| n.trim().to_string());
    payload.validate().map_err(AppError::from)?;

    let mut update = SqlUpdate::new(EMPLOYEES);
    update
        .set("name", payload.name)
        .set("phone", payload.phone.as_deref().map(SqlValue::optional_text))
        .set("role", payload.role.as_deref().map(SqlValue::optional_text))
        .set("monthly_salary", payload.monthly_salary.map(form::money));

    if update.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("__all__", field_error("empty", "No fields to update."));
        return Err(AppError::from(errors).into());
    }

    let pool = pool.get_ref();
    employee(pool, id).await?;
    execute_update(pool, &update, id).await.map_err(AppError::from)?;
    tracing::info!(id, "Fixed employee updated");

    Ok(HttpResponse::Ok().json(employee(pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/employees/fixed/{id}",
    params(("id", description = "Employee ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Employee, payments and credits deleted"),
        (status = 404),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn delete_fixed(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    let record = employee(pool.get_ref(), id).await?;
    Ok(super::delete_confirmed(pool.get_ref(), EMPLOYEES, id, &record, &confirm, "Employee").await?)
}

#[utoipa::path(
    post,
    path = "/api/employees/fixed/{id}/salary",
    params(("id", description = "Employee ID")),
    request_body(content = FixedSalaryForm, content_type = "application/json"),
    responses(
        (status = 201, body = FixedSalaryPayment),
        (status = 400, description = "Validation failed, nothing saved"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn record_fixed_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    body: Body<FixedSalaryForm>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let employee_id = path.into_inner();
    let payload = form::into_inner(body);
    payload.validate().map_err(AppError::from)?;

    let pool = pool.get_ref();
    employee(pool, employee_id).await?;

    let amount = form::money(payload.amount);
    let date = payload.date.unwrap_or_else(|| clock.today());
    let description = payload.description.trim().to_string();

    let id = sqlx::query(
        "INSERT INTO fixed_salary_payments (employee_id, amount, date, description) VALUES (?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(amount)
    .bind(date)
    .bind(&description)
    .execute(pool)
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    tracing::info!(employee_id, id, amount = %amount, "Fixed salary recorded");

    Ok(HttpResponse::Created().json(FixedSalaryPayment {
        id,
        employee_id,
        amount,
        date,
        description,
    }))
}

#[utoipa::path(
    post,
    path = "/api/employees/fixed/{id}/credit",
    params(("id", description = "Employee ID")),
    request_body(content = CreditForm, content_type = "application/json"),
    responses(
        (status = 201, body = FixedWorkCredit),
        (status = 400, description = "Neither an amount nor hours and rate"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn add_credit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    body: Body<CreditForm>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let employee_id = path.into_inner();
    let credit = form::into_inner(body)
        .into_credit(clock.today())
        .map_err(AppError::from)?;

    let pool = pool.get_ref();
    employee(pool, employee_id).await?;

    let id = sqlx::query(
        "INSERT INTO fixed_work_credits (employee_id, date, hours, rate, amount, description) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(credit.date)
    .bind(credit.hours)
    .bind(credit.rate)
    .bind(credit.amount)
    .bind(&credit.description)
    .execute(pool)
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    tracing::info!(employee_id, id, amount = %credit.amount, "Work credit added");

    Ok(HttpResponse::Created().json(FixedWorkCredit {
        id,
        employee_id,
        date: credit.date,
        hours: credit.hours,
        rate: credit.rate,
        amount: credit.amount,
        description: credit.description,
    }))
}

#[derive(Deserialize)]
pub struct ChildPath {
    pub id: u64,
    pub child_id: u64,
}

#[utoipa::path(
    delete,
    path = "/api/employees/fixed/{id}/salary/{child_id}",
    params(("id", description = "Employee ID"), ("child_id", description = "Payment ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Payment deleted"),
        (status = 404, description = "Missing, or belongs to another employee"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn delete_fixed_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<ChildPath>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let ChildPath { id, child_id } = path.into_inner();
    let pool = pool.get_ref();
    employee(pool, id).await?;
    let record: FixedSalaryPayment =
        super::find_owned(pool, SALARY_PAYMENTS, child_id, id, "Salary payment").await?;
    Ok(super::delete_confirmed(pool, SALARY_PAYMENTS, child_id, &record, &confirm, "Salary payment").await?)
}

#[utoipa::path(
    delete,
    path = "/api/employees/fixed/{id}/credit/{child_id}",
    params(("id", description = "Employee ID"), ("child_id", description = "Credit ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Credit deleted"),
        (status = 404, description = "Missing, or belongs to another employee"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Fixed employees"
)]
pub async fn delete_credit(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<ChildPath>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let ChildPath { id, child_id } = path.into_inner();
    let pool = pool.get_ref();
    employee(pool, id).await?;
    let record: FixedWorkCredit = super::find_owned(pool, WORK_CREDITS, child_id, id, "Work credit").await?;
    Ok(super::delete_confirmed(pool, WORK_CREDITS, child_id, &record, &confirm, "Work credit").await?)
}
