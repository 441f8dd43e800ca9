use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::errors::AppError;
use crate::ledger::balance::{ContractualTotals, EmployeeStats, FixedTotals, PeriodSummary};
use crate::ledger::queries;
use crate::utils::clock::Clock;
use crate::utils::date_range::{DateRange, DateRangeQuery};

#[derive(Serialize, ToSchema)]
pub struct Dashboard {
    /// First of the current month through today
    pub month: PeriodSummary,
    /// Only when both `start_date` and `end_date` parse
    #[schema(nullable = true)]
    pub range: Option<PeriodSummary>,
    pub employees: EmployeeStats,
}

async fn period(pool: &MySqlPool, range: DateRange) -> Result<PeriodSummary, sqlx::Error> {
    Ok(queries::ledger_sums(pool, &range).await?.summary(range))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Month-to-date figures, optional range and head counts", body = Dashboard),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    let pool = pool.get_ref();
    let month_range = DateRange::month_to_date(clock.today());

    let month = period(pool, month_range).await.map_err(AppError::from)?;
    let range = match query.range() {
        Some(range) => Some(period(pool, range).await.map_err(AppError::from)?),
        None => None,
    };

    let contractual: Vec<ContractualTotals> = queries::contractual_overview(pool, None)
        .await
        .map_err(AppError::from)?
        .into_iter()
        .map(|(_, totals)| totals)
        .collect();
    let fixed: Vec<FixedTotals> = queries::fixed_overview(pool, &month_range)
        .await
        .map_err(AppError::from)?
        .into_iter()
        .map(|(_, totals)| totals)
        .collect();

    Ok(HttpResponse::Ok().json(Dashboard {
        month,
        range,
        employees: EmployeeStats::collect(&contractual, &fixed),
    }))
}
