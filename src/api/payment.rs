use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::auth::AuthUser;
use crate::errors::AppError;
use crate::ledger::balance::PaymentTotals;
use crate::model::payment::{Payment, PaymentDirection};
use crate::utils::date_range::{DateRange, DateRangeQuery};
use crate::utils::db_utils::{Conditions, bind_values};
use crate::utils::form::{self, Body, DeleteConfirmation, validate_positive_amount};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePayment {
    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[validate(length(min = 1, max = 255, message = "Description is required (max 255 characters)."))]
    #[schema(example = "Customer order #42")]
    pub description: String,

    #[validate(custom = "validate_positive_amount")]
    #[schema(example = "200.00", value_type = String)]
    pub amount: Decimal,

    #[serde(default, alias = "type")]
    pub direction: PaymentDirection,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentListResponse {
    /// Applied filter, absent when listing everything
    #[schema(nullable = true)]
    pub range: Option<DateRange>,
    pub payments: Vec<Payment>,
    pub totals: PaymentTotals,
}

async fn load_payments(pool: &MySqlPool, range: Option<&DateRange>) -> Result<Vec<Payment>, AppError> {
    let mut conditions = Conditions::new();
    conditions.date_range("date", range);

    let sql = format!(
        "SELECT id, date, description, amount, direction FROM payments {} ORDER BY date DESC, id DESC",
        conditions.where_sql()
    );

    Ok(bind_values!(sqlx::query_as::<_, Payment>(&sql), conditions.values())
        .fetch_all(pool)
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/payments",
    params(DateRangeQuery),
    responses(
        (status = 200, body = PaymentListResponse),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn list_payments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    let range = query.range();
    let payments = load_payments(pool.get_ref(), range.as_ref()).await?;
    let totals = PaymentTotals::from_payments(&payments);

    Ok(HttpResponse::Ok().json(PaymentListResponse {
        range,
        payments,
        totals,
    }))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body(content = CreatePayment, content_type = "application/json"),
    responses(
        (status = 201, body = Payment),
        (status = 400, description = "Validation failed, nothing saved"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: Body<CreatePayment>,
) -> actix_web::Result<HttpResponse> {
    auth.require_writer()?;

    let mut payload = form::into_inner(body);
    payload.description = payload.description.trim().to_string();
    payload.validate().map_err(AppError::from)?;

    let amount = form::money(payload.amount);
    let id = sqlx::query("INSERT INTO payments (date, description, amount, direction) VALUES (?, ?, ?, ?)")
        .bind(payload.date)
        .bind(&payload.description)
        .bind(amount)
        .bind(payload.direction.as_ref())
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .last_insert_id();

    tracing::info!(id, amount = %amount, direction = %payload.direction, "Payment recorded");

    Ok(HttpResponse::Created().json(Payment {
        id,
        date: payload.date,
        description: payload.description,
        amount,
        direction: payload.direction,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    params(("id", description = "Payment ID"), DeleteConfirmation),
    responses(
        (status = 200, description = "Payment deleted"),
        (status = 404, description = "Payment not found"),
        (status = 409, description = "Confirmation required, record echoed back")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn delete_payment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    confirm: web::Query<DeleteConfirmation>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    let payment: Payment = super::find(pool.get_ref(), "payments", id, "Payment").await?;
    Ok(super::delete_confirmed(pool.get_ref(), "payments", id, &payment, &confirm, "Payment").await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{bearer, config, lazy_pool};
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode};
    use actix_web::test as actix_test;
    use serde_json::json;

    macro_rules! app {
        () => {
            actix_test::init_service(
                App::new()
                    .app_data(lazy_pool())
                    .app_data(config())
                    .route("/payments", web::post().to(create_payment))
                    .route("/payments/{id}", web::delete().to(delete_payment)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn viewers_cannot_record_payments() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/payments")
            .insert_header(bearer(Role::Viewer))
            .set_json(json!({"date": "2024-01-15", "description": "x", "amount": "10"}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn non_positive_amount_is_a_field_error() {
        let app = app!();
        let req = actix_test::TestRequest::post()
            .uri("/payments")
            .insert_header(bearer(Role::Bookkeeper))
            .set_form([
                ("date", "2024-01-15"),
                ("description", "Refund"),
                ("amount", "0"),
                ("direction", "OUT"),
            ])
            .to_request();

        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert!(body["errors"]["amount"].is_array());
    }

    #[actix_web::test]
    async fn only_admins_delete() {
        let app = app!();
        let req = actix_test::TestRequest::delete()
            .uri("/payments/1?confirm=true")
            .insert_header(bearer(Role::Bookkeeper))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn direction_defaults_to_pay_in() {
        let payload: CreatePayment =
            serde_json::from_value(json!({"date": "2024-01-15", "description": "Sale", "amount": "5"}))
                .unwrap();
        assert_eq!(payload.direction, PaymentDirection::In);
    }
}
