use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlRow;

use crate::utils::date_range::DateRange;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Decimal(Decimal),
    Date(NaiveDate),
    Null,
}

impl SqlValue {
    /// Blank text is stored as NULL.
    pub fn optional_text(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            SqlValue::Null
        } else {
            SqlValue::String(value.to_string())
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        SqlValue::U64(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Decimal(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

/// Binds every [`SqlValue`] onto a `query`, `query_as` or `query_scalar`.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                $crate::utils::db_utils::SqlValue::String(v) => query.bind(v.clone()),
                $crate::utils::db_utils::SqlValue::U64(v) => query.bind(*v),
                $crate::utils::db_utils::SqlValue::Decimal(v) => query.bind(*v),
                $crate::utils::db_utils::SqlValue::Date(v) => query.bind(*v),
                $crate::utils::db_utils::SqlValue::Null => query.bind(None::<String>),
            };
        }
        query
    }};
}

pub(crate) use bind_values;

/// ===============================
/// Dynamic WHERE clause
/// ===============================
#[derive(Debug, Default)]
pub struct Conditions {
    clauses: Vec<String>,
    values: Vec<SqlValue>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<I>(&mut self, clause: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = SqlValue>,
    {
        self.clauses.push(clause.into());
        self.values.extend(values);
        self
    }

    pub fn eq(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.push(format!("{} = ?", column), [value.into()])
    }

    /// No-op without a range, so unfiltered views share the same query.
    pub fn date_range(&mut self, column: &str, range: Option<&DateRange>) -> &mut Self {
        if let Some(range) = range {
            self.push(
                format!("{} BETWEEN ? AND ?", column),
                [SqlValue::Date(range.start), SqlValue::Date(range.end)],
            );
        }
        self
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// ===============================
/// Partial UPDATE builder
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    table: &'static str,
    assignments: Vec<(&'static str, SqlValue)>,
}

impl SqlUpdate {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
        }
    }

    /// Columns left as `None` are not touched.
    pub fn set<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.assignments.push((column, value.into()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn build(&self, id: u64) -> (String, Vec<SqlValue>) {
        let set_clause = self
            .assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, set_clause);

        let mut values: Vec<SqlValue> = self.assignments.iter().map(|(_, v)| v.clone()).collect();
        values.push(SqlValue::U64(id));

        (sql, values)
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: &SqlUpdate, id: u64) -> Result<u64, sqlx::Error> {
    let (sql, values) = update.build(id);
    let result = bind_values!(sqlx::query(&sql), &values).execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn fetch_by_id<T>(pool: &MySqlPool, table: &str, id: u64) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE id = ?", table);
    sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(pool).await
}

/// `employee_id` of a child row, `None` when the row does not exist.
pub async fn owner_of(pool: &MySqlPool, table: &str, id: u64) -> Result<Option<u64>, sqlx::Error> {
    let sql = format!("SELECT employee_id FROM {} WHERE id = ?", table);
    sqlx::query_scalar::<_, u64>(&sql).bind(id).fetch_optional(pool).await
}

pub async fn delete_by_id(pool: &MySqlPool, table: &'static str, id: u64) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table);
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}

/// `COALESCE(SUM(expr), 0)` over the matching rows.
pub async fn sum_decimal(
    pool: &MySqlPool,
    table: &str,
    expr: &str,
    conditions: &Conditions,
) -> Result<Decimal, sqlx::Error> {
    let sql = format!(
        "SELECT COALESCE(SUM({}), 0) FROM {} {}",
        expr,
        table,
        conditions.where_sql()
    );
    tracing::debug!(sql = %sql, values = ?conditions.values(), "Summing");

    bind_values!(sqlx::query_scalar::<_, Decimal>(&sql), conditions.values())
        .fetch_one(pool)
        .await
}
