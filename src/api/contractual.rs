use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::auth::auth::AuthUser;
use crate::errors::AppError;
use crate::ledger::balance::{ContractualStanding, ReportTotals};
use crate::ledger::{queries, salary};
use crate::model::contractual::{AdvancePayment, ContractualEmployee, SalaryPayment, WorkRecord};
use crate::report::html::{Payslip, Templates};
use crate::utils::clock::Clock;
use crate::utils::date_range::{DateRange, DateRangeQuery};
use crate::utils::db_utils::{SqlUpdate, SqlValue, execute_update};
use crate::utils::form::{
    self, Body, DeleteConfirmation, blank_as_none, field_error, validate_decimal_min_zero,
    validate_positive_amount,
};

const EMPLOYEES: &str = "contractual_employees";
const WORK_RECORDS: &str = "work_records";
const SALARY_PAYMENTS: &str = "salary_payments";
const ADVANCE_PAYMENTS: &str = "advance_payments";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateContractual {
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)."))]
    #[schema(example = "Amina Rahman")]
    pub name: String,

    #[validate(length(max = 15, message = "Phone is limited to 15 characters."))]
    #[schema(example = "07700900123", nullable = true)]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Role is limited to 100 characters."))]
    #[schema(example = "Stitcher", nullable = true)]
    pub role: Option<String>,
}

/// Only the fields present are changed. A blank phone or role clears it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateContractual {
    #[validate(length(min = 1, max = 100, message = "Name cannot be blank (max 100 characters)."))]
    pub name: Option<String>,
    #[validate(length(max = 15, message = "Phone is limited to 15 characters."))]
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "Role is limited to 100 characters."))]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkRow {
    /// Defaults to today
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = u32, nullable = true, example = 5)]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, nullable = true, example = "100.00")]
    pub item_price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkEntries {
    pub rows: Vec<WorkRow>,
}

/// A work row ready to insert.
#[derive(Debug, PartialEq)]
pub struct NewWork {
    pub date: NaiveDate,
    pub quantity: u32,
    pub item_price: Decimal,
    pub description: Option<String>,
}

impl WorkEntries {
    /// Keeps rows that have both a quantity and a price.
    pub fn into_work(self, today: NaiveDate) -> Result<Vec<NewWork>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut kept = Vec::new();

        for (index, row) in self.rows.into_iter().enumerate() {
            let (Some(quantity), Some(item_price)) = (row.quantity, row.item_price) else {
                continue;
            };

            let problem = if let Err(e) = validate_decimal_min_zero(&item_price) {
                Some(format!("item price: {}", e.message.unwrap_or_default()))
            } else if row.description.as_ref().is_some_and(|d| d.chars().count() > form::DESCRIPTION_MAX) {
                Some(format!("description is limited to {} characters.", form::DESCRIPTION_MAX))
            } else {
                None
            };
            if let Some(problem) = problem {
                errors.add("rows", field_error("row", format!("Row {}: {}", index + 1, problem)));
                continue;
            }

            kept.push(NewWork {
                date: row.date.unwrap_or(today),
                quantity,
                item_price: form::money(item_price),
                description: form::optional_text(row.description),
            });
        }

        if kept.is_empty() && errors.is_empty() {
            errors.add("rows", field_error("required", "Enter at least one row with quantity and item price."));
        }

        if errors.is_empty() { Ok(kept) } else { Err(errors) }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SalaryForm {
    #[validate(custom = "validate_positive_amount")]
    #[schema(example = "700.00", value_type = String)]
    pub amount: Decimal,

    /// Defaults to today
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description is limited to 1000 characters."))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matches part of the name or phone number
    pub q: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContractualSummary {
    #[serde(flatten)]
    pub employee: ContractualEmployee,
    pub standing: ContractualStanding,
}

#[derive(Serialize, ToSchema)]
pub struct ContractualDetail {
    pub employee: ContractualEmployee,
    pub standing: ContractualStanding,
    pub work_records: Vec<WorkRecord>,
    pub salary_payments: Vec<SalaryPayment>,
    pub advances: Vec<AdvancePayment>,
}

#[derive(Serialize, ToSchema)]
pub struct ContractualReport {
    pub employee: ContractualEmployee,
    #[schema(nullable = true)]
    pub range: Option<DateRange>,
    pub work_records: Vec<WorkRecord>,
    pub salary_payments: Vec<SalaryPayment>,
    pub advance_payments: Vec<AdvancePayment>,
    pub totals: ReportTotals,
    #[schema(value_type = String, format = "date")]
    pub today: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct SalaryReceipt {
    pub salary: SalaryPayment,
    /// Present when the payment went beyond the unpaid balance
    #[schema(nullable = true)]
    pub advance: Option<AdvancePayment>,
}

async fn employee(pool: &MySqlPool, id: u64) -> Result<ContractualEmployee, AppError> {
    super::find(pool, EMPLOYEES, id, "Employee").await
}

#[utoipa::path(
    get,
    path = "/api/employees/contractual",
    params(SearchQuery),
    responses((status = 200, body = [ContractualSummary]), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn list_contractual(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> actix_web::Result<HttpResponse> {
    let rows = queries::contractual_overview(pool.get_ref(), query.q.as_deref())
        .await
        .map_err(AppError::from)?;

    let summaries: Vec<ContractualSummary> = rows
        .into_iter()
        .map(|(employee, totals)| ContractualSummary {
            employee,
            standing: totals.standing(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}

#[utoipa::path(
    post,
    path = "/api/employees/contractual",
    request_body(content = CreateContractual, content_type = "application/json"),
    responses(
        (status = 201, body = ContractualEmployee),
        (status = 400, description = "Validation failed, nothing saved"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn create_contractual(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: Body<CreateContractual>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let mut payload = form::into_inner(body);
    payload.name = payload.name.trim().to_string();
    payload.validate().map_err(AppError::from)?;

    let phone = form::optional_text(payload.phone);
    let role = form::optional_text(payload.role);

    let id = sqlx::query("INSERT INTO contractual_employees (name, phone, role) VALUES (?, ?, ?)")
        .bind(&payload.name)
        .bind(phone.as_deref())
        .bind(role.as_deref())
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .last_insert_id();

    tracing::info!(id, "Contractual employee created");

    Ok(HttpResponse::Created().json(ContractualEmployee {
        id,
        name: payload.name,
        phone,
        role,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees/contractual/{id}",
    params(("id", description = "Employee ID")),
    responses((status = 200, body = ContractualDetail), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn get_contractual(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let id = path.into_inner();
    let pool = pool.get_ref();

    let employee = employee(pool, id).await?;
    let totals = queries::contractual_totals(pool, id, None).await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ContractualDetail {
        employee,
        standing: totals.standing(),
        work_records: super::children(pool, WORK_RECORDS, id, None).await?,
        salary_payments: super::children(pool, SALARY_PAYMENTS, id, None).await?,
        advances: super::children(pool, ADVANCE_PAYMENTS, id, None).await?,
    }))
}

#[utoipa::path(
    put,
    path = "/api/employees/contractual/{id}",
    params(("id", description = "Employee ID")),
    request_body(content = UpdateContractual, content_type = "application/json"),
    responses(
        (status = 200, body = ContractualEmployee),
        (status = 400, description = "Validation failed or nothing to update"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn update_contractual(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Body<UpdateContractual>,
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
        .set("role", payload.role.as_deref().map(SqlValue::optional_text));

    if update.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add("__all__", field_error("empty", "No fields to update."));
        return Err(AppError::from(errors).into());
    }

    let pool = pool.get_ref();
    employee(pool, id).await?;
    execute_update(pool, &update, id).await.map_err(AppError::from)?;
    tracing::info!(id, "Contractual employee updated");

    Ok(HttpResponse::Ok().json(employee(pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/employees/contractual/{id}",
    params(("id", description = "Employee ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Employee and all their records deleted"),
        (status = 404),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn delete_contractual(
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
    path = "/api/employees/contractual/{id}/work",
    params(("id", description = "Employee ID")),
    request_body = WorkEntries,
    responses(
        (status = 201, description = "Rows saved", body = [WorkRecord]),
        (status = 400, description = "No usable rows or a bad price"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn add_work(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    body: web::Json<WorkEntries>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let employee_id = path.into_inner();
    let rows = body.into_inner().into_work(clock.today()).map_err(AppError::from)?;

    let pool = pool.get_ref();
    employee(pool, employee_id).await?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut saved = Vec::with_capacity(rows.len());
    for row in rows {
        let id = sqlx::query(
            "INSERT INTO work_records (employee_id, date, quantity, item_price, description) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(employee_id)
        .bind(row.date)
        .bind(row.quantity)
        .bind(row.item_price)
        .bind(row.description.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?
        .last_insert_id();

        saved.push(WorkRecord {
            id,
            employee_id,
            date: row.date,
            quantity: row.quantity,
            item_price: row.item_price,
            description: row.description,
        });
    }
    tx.commit().await.map_err(AppError::from)?;

    tracing::info!(employee_id, rows = saved.len(), "Work recorded");
    Ok(HttpResponse::Created().json(saved))
}

#[utoipa::path(
    post,
    path = "/api/employees/contractual/{id}/salary",
    params(("id", description = "Employee ID")),
    request_body(content = SalaryForm, content_type = "application/json"),
    responses(
        (status = 201, body = SalaryReceipt),
        (status = 400, description = "Validation failed, nothing saved"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn record_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    body: Body<SalaryForm>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let employee_id = path.into_inner();
    let payload = form::into_inner(body);
    payload.validate().map_err(AppError::from)?;

    let (salary, advance) = salary::record_salary_payment(
        pool.get_ref(),
        employee_id,
        form::money(payload.amount),
        payload.date.unwrap_or_else(|| clock.today()),
        form::optional_text(payload.description),
    )
    .await?;

    Ok(HttpResponse::Created().json(SalaryReceipt { salary, advance }))
}

#[utoipa::path(
    get,
    path = "/api/employees/contractual/{id}/report",
    params(("id", description = "Employee ID"), DateRangeQuery),
    responses((status = 200, body = ContractualReport), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn contractual_report(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    let id = path.into_inner();
    let pool = pool.get_ref();
    let range = query.range();

    let employee = employee(pool, id).await?;
    let totals = queries::report_totals(pool, id, range.as_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ContractualReport {
        employee,
        work_records: super::children(pool, WORK_RECORDS, id, range.as_ref()).await?,
        salary_payments: super::children(pool, SALARY_PAYMENTS, id, range.as_ref()).await?,
        advance_payments: super::children(pool, ADVANCE_PAYMENTS, id, range.as_ref()).await?,
        range,
        totals,
        today: clock.today(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees/contractual/{id}/payslip",
    params(("id", description = "Employee ID")),
    responses((status = 200, description = "Payslip page", content_type = "text/html"), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn payslip(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    templates: web::Data<Templates>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let id = path.into_inner();
    let employee = employee(pool.get_ref(), id).await?;
    let totals = queries::contractual_totals(pool.get_ref(), id, None)
        .await
        .map_err(AppError::from)?;

    let html = templates
        .render_payslip(&Payslip::new(employee, totals.standing(), clock.today()))
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

#[derive(Deserialize)]
pub struct ChildPath {
    pub id: u64,
    pub child_id: u64,
}

async fn delete_child<T>(
    auth: AuthUser,
    pool: &MySqlPool,
    path: ChildPath,
    confirm: &DeleteConfirmation,
    table: &'static str,
    what: &str,
) -> actix_web::Result<HttpResponse>
where
    T: Serialize + for<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow> + Send + Unpin,
{
    auth.require_admin()?;

    employee(pool, path.id).await?;
    let record: T = super::find_owned(pool, table, path.child_id, path.id, what).await?;
    Ok(super::delete_confirmed(pool, table, path.child_id, &record, confirm, what).await?)
}

#[utoipa::path(
    delete,
    path = "/api/employees/contractual/{id}/work/{child_id}",
    params(("id", description = "Employee ID"), ("child_id", description = "Work record ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Work record deleted"),
        (status = 404, description = "Missing, or belongs to another employee"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn delete_work_record(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<ChildPath>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    delete_child::<WorkRecord>(auth, &pool, path.into_inner(), &confirm, WORK_RECORDS, "Work record").await
}

#[utoipa::path(
    delete,
    path = "/api/employees/contractual/{id}/salary/{child_id}",
    params(("id", description = "Employee ID"), ("child_id", description = "Salary payment ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Salary payment deleted"),
        (status = 404, description = "Missing, or belongs to another employee"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn delete_salary_payment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<ChildPath>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    delete_child::<SalaryPayment>(auth, &pool, path.into_inner(), &confirm, SALARY_PAYMENTS, "Salary payment")
        .await
}

#[utoipa::path(
    delete,
    path = "/api/employees/contractual/{id}/advance/{child_id}",
    params(("id", description = "Employee ID"), ("child_id", description = "Advance ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Advance deleted"),
        (status = 404, description = "Missing, or belongs to another employee"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Contractual employees"
)]
pub async fn delete_advance_payment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<ChildPath>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    delete_child::<AdvancePayment>(auth, &pool, path.into_inner(), &confirm, ADVANCE_PAYMENTS, "Advance")
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{bearer, clock, config, lazy_pool};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode};
    use actix_web::test as actix_test;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[test]
    fn work_rows_need_quantity_and_price() {
        let entries: WorkEntries = serde_json::from_value(json!({
            "rows": [
                {"date": "2024-01-05", "quantity": 5, "item_price": "100", "description": " hems "},
                {"quantity": "", "item_price": "100"},
                {"quantity": 2},
                {"quantity": "3", "item_price": 2.5}
            ]
        }))
        .unwrap();

        let work = entries.into_work(today()).unwrap();
        assert_eq!(
            work,
            vec![
                NewWork {
                    date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    quantity: 5,
                    item_price: dec!(100),
                    description: Some("hems".into()),
                },
                NewWork {
                    date: today(),
                    quantity: 3,
                    item_price: dec!(2.5),
                    description: None,
                },
            ]
        );
    }

    #[test]
    fn all_blank_work_rows_are_rejected() {
        let entries = WorkEntries {
            rows: vec![WorkRow {
                date: None,
                quantity: None,
                item_price: None,
                description: None,
            }],
        };
        assert!(entries.into_work(today()).unwrap_err().field_errors().contains_key("rows"));
    }

    #[test]
    fn negative_price_is_reported_by_row() {
        let entries: WorkEntries = serde_json::from_value(json!({
            "rows": [{"quantity": 1, "item_price": "-4"}]
        }))
        .unwrap();
        assert!(entries.into_work(today()).is_err());
    }

    #[test]
    fn role_and_rows_fit_their_columns() {
        let form = CreateContractual {
            name: "Amina".into(),
            phone: None,
            role: Some("r".repeat(100)),
        };
        assert!(form.validate().is_ok());

        let entries: WorkEntries = serde_json::from_value(json!({
            "rows": [
                {"quantity": 1, "item_price": "10000000000"},
                {"quantity": 1, "item_price": "5", "description": "d".repeat(1001)}
            ]
        }))
        .unwrap();
        let errors = entries.into_work(today()).unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields["rows"].len(), 2);
    }

    macro_rules! app {
        () => {
            actix_test::init_service(
                App::new()
                    .app_data(lazy_pool())
                    .app_data(config())
                    .app_data(clock())
                    .route("/employees/contractual/{id}", web::put().to(update_contractual))
                    .route("/employees/contractual/{id}/salary", web::post().to(record_salary))
                    .route(
                        "/employees/contractual/{id}/work/{child_id}",
                        web::delete().to(delete_work_record),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn salary_must_be_positive() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/employees/contractual/3/salary")
            .insert_header(bearer(Role::Bookkeeper))
            .set_form([("amount", "-5")])
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert!(body["errors"]["amount"].is_array());
    }

    #[actix_web::test]
    async fn oversized_salary_is_rejected() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/employees/contractual/3/salary")
            .insert_header(bearer(Role::Bookkeeper))
            .set_json(json!({"amount": "1000000000000", "description": "n".repeat(1001)}))
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert!(body["errors"]["amount"].is_array());
        assert!(body["errors"]["description"].is_array());
    }

    #[actix_web::test]
    async fn empty_update_is_rejected() {
        let app = app!();
        let req = actix_test::TestRequest::put()
            .uri("/employees/contractual/3")
            .insert_header(bearer(Role::Admin))
            .set_json(json!({}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn viewers_cannot_delete_records() {
        let app = app!();
        let req = actix_test::TestRequest::delete()
            .uri("/employees/contractual/3/work/9?confirm=true")
            .insert_header(bearer(Role::Viewer))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
