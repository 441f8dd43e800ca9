pub mod contractual;
pub mod dashboard;
pub mod expense;
pub mod fixed;
pub mod payment;

use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlRow;

use crate::errors::AppError;
use crate::utils::date_range::DateRange;
use crate::utils::db_utils::{Conditions, bind_values, delete_by_id, fetch_by_id, owner_of};
use crate::utils::form::DeleteConfirmation;

pub(crate) async fn find<T>(pool: &MySqlPool, table: &str, id: u64, what: &str) -> Result<T, AppError>
where
    T: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
{
    fetch_by_id(pool, table, id)
        .await?
        .ok_or_else(|| AppError::not_found(what))
}

/// Loads a row that must belong to `employee_id`.
pub(crate) async fn find_owned<T>(
    pool: &MySqlPool,
    table: &str,
    id: u64,
    employee_id: u64,
    what: &str,
) -> Result<T, AppError>
where
    T: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
{
    match owner_of(pool, table, id).await? {
        None => Err(AppError::not_found(what)),
        Some(owner) if owner != employee_id => Err(AppError::Mismatch(format!(
            "{} does not belong to this employee",
            what
        ))),
        Some(_) => find(pool, table, id, what).await,
    }
}

/// Rows of `table` belonging to one employee, newest first.
pub(crate) async fn children<T>(
    pool: &MySqlPool,
    table: &str,
    employee_id: u64,
    range: Option<&DateRange>,
) -> Result<Vec<T>, AppError>
where
    T: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
{
    let mut conditions = Conditions::new();
    conditions.eq("employee_id", employee_id).date_range("date", range);

    let sql = format!(
        "SELECT * FROM {} {} ORDER BY date DESC, id DESC",
        table,
        conditions.where_sql()
    );

    Ok(bind_values!(sqlx::query_as::<_, T>(&sql), conditions.values())
        .fetch_all(pool)
        .await?)
}

/// Deletes `record` once the caller confirmed; otherwise echoes it back.
pub(crate) async fn delete_confirmed<T: Serialize>(
    pool: &MySqlPool,
    table: &'static str,
    id: u64,
    record: &T,
    confirm: &DeleteConfirmation,
    what: &str,
) -> Result<HttpResponse, AppError> {
    confirm.require(record)?;

    if delete_by_id(pool, table, id).await? == 0 {
        return Err(AppError::not_found(what));
    }

    tracing::info!(table, id, "Record deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} deleted successfully", what),
        "id": id,
    })))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use actix_web::web::Data;
    use chrono::NaiveDate;
    use sqlx::MySqlPool;
    use sqlx::mysql::MySqlPoolOptions;

    use crate::auth::jwt::generate_access_token;
    use crate::config::Config;
    use crate::model::role::Role;
    use crate::utils::clock::{Clock, FixedClock};

    pub const SECRET: &str = "handler-test-secret";

    /// A pool that never connects. Handlers that fail validation, auth or
    /// confirmation must answer before touching it.
    pub fn lazy_pool() -> Data<MySqlPool> {
        let pool = MySqlPoolOptions::new()
            .connect_lazy("mysql://nobody@localhost/none")
            .unwrap();
        Data::new(pool)
    }

    pub fn config() -> Data<Config> {
        Data::new(Config::for_tests(SECRET))
    }

    pub fn clock() -> Data<dyn Clock> {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        Data::from(clock)
    }

    pub fn bearer(role: Role) -> (&'static str, String) {
        let token = generate_access_token(1, "tester".into(), role.id(), SECRET, 60).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }
}
