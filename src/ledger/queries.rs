//! Aggregates read straight from the ledger tables.
//!
//! Every function recomputes from persisted rows; nothing is cached.

use rust_decimal::Decimal;
use sqlx::MySqlPool;

use super::balance::{ContractualTotals, FixedTotals, LedgerSums, ReportTotals};
use crate::model::contractual::ContractualEmployee;
use crate::model::fixed::FixedEmployee;
use crate::model::payment::PaymentDirection;
use crate::utils::date_range::DateRange;
use crate::utils::db_utils::{Conditions, SqlValue, bind_values, sum_decimal};

pub const WORK_TOTAL_SQL: &str = "quantity * item_price";

/// Whole-business sums for one period.
pub async fn ledger_sums(pool: &MySqlPool, range: &DateRange) -> Result<LedgerSums, sqlx::Error> {
    let payments = |direction: PaymentDirection| {
        let mut conditions = Conditions::new();
        conditions
            .date_range("date", Some(range))
            .eq("direction", direction.as_ref());
        conditions
    };

    let mut in_range = Conditions::new();
    in_range.date_range("date", Some(range));

    Ok(LedgerSums {
        payments_in: sum_decimal(pool, "payments", "amount", &payments(PaymentDirection::In)).await?,
        payments_out: sum_decimal(pool, "payments", "amount", &payments(PaymentDirection::Out)).await?,
        expenses: sum_decimal(pool, "expenses", "amount", &in_range).await?,
        salary_payments: sum_decimal(pool, "salary_payments", "amount", &in_range).await?,
        fixed_salary_payments: sum_decimal(pool, "fixed_salary_payments", "amount", &in_range).await?,
    })
}

fn for_employee(employee_id: u64, range: Option<&DateRange>) -> Conditions {
    let mut conditions = Conditions::new();
    conditions.eq("employee_id", employee_id).date_range("date", range);
    conditions
}

/// Earned and paid for one contractual employee, optionally within a period.
pub async fn contractual_totals(
    pool: &MySqlPool,
    employee_id: u64,
    range: Option<&DateRange>,
) -> Result<ContractualTotals, sqlx::Error> {
    let conditions = for_employee(employee_id, range);
    let earned = sum_decimal(pool, "work_records", WORK_TOTAL_SQL, &conditions).await?;
    let paid = sum_decimal(pool, "salary_payments", "amount", &conditions).await?;
    Ok(ContractualTotals::new(earned, paid))
}

pub async fn report_totals(
    pool: &MySqlPool,
    employee_id: u64,
    range: Option<&DateRange>,
) -> Result<ReportTotals, sqlx::Error> {
    let conditions = for_employee(employee_id, range);
    Ok(ReportTotals::new(
        sum_decimal(pool, "work_records", WORK_TOTAL_SQL, &conditions).await?,
        sum_decimal(pool, "salary_payments", "amount", &conditions).await?,
        sum_decimal(pool, "advance_payments", "amount", &conditions).await?,
    ))
}

#[derive(Debug, sqlx::FromRow)]
struct ContractualRow {
    #[sqlx(flatten)]
    employee: ContractualEmployee,
    earned: Decimal,
    paid: Decimal,
}

/// All contractual employees with all-time totals, optionally narrowed by a
/// name or phone search.
pub async fn contractual_overview(
    pool: &MySqlPool,
    search: Option<&str>,
) -> Result<Vec<(ContractualEmployee, ContractualTotals)>, sqlx::Error> {
    let mut conditions = Conditions::new();
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        conditions.push(
            "(e.name LIKE ? OR e.phone LIKE ?)",
            [SqlValue::String(pattern.clone()), SqlValue::String(pattern)],
        );
    }

    let sql = format!(
        r#"
        SELECT e.id, e.name, e.phone, e.role,
            COALESCE((SELECT SUM(w.quantity * w.item_price) FROM work_records w WHERE w.employee_id = e.id), 0) AS earned,
            COALESCE((SELECT SUM(s.amount) FROM salary_payments s WHERE s.employee_id = e.id), 0) AS paid
        FROM contractual_employees e
        {}
        ORDER BY e.name
        "#,
        conditions.where_sql()
    );

    let rows = bind_values!(sqlx::query_as::<_, ContractualRow>(&sql), conditions.values())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.employee, ContractualTotals::new(row.earned, row.paid)))
        .collect())
}

#[derive(Debug, sqlx::FromRow)]
struct FixedRow {
    #[sqlx(flatten)]
    employee: FixedEmployee,
    credits: Decimal,
    paid: Decimal,
}

/// All fixed employees with credits and payments inside `range`.
pub async fn fixed_overview(
    pool: &MySqlPool,
    range: &DateRange,
) -> Result<Vec<(FixedEmployee, FixedTotals)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FixedRow>(
        r#"
        SELECT e.id, e.name, e.phone, e.role, e.monthly_salary,
            COALESCE((SELECT SUM(c.amount) FROM fixed_work_credits c
                WHERE c.employee_id = e.id AND c.date BETWEEN ? AND ?), 0) AS credits,
            COALESCE((SELECT SUM(p.amount) FROM fixed_salary_payments p
                WHERE p.employee_id = e.id AND p.date BETWEEN ? AND ?), 0) AS paid
        FROM fixed_employees e
        ORDER BY e.name
        "#,
    )
    .bind(range.start)
    .bind(range.end)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let totals = FixedTotals::new(row.employee.monthly_salary, row.credits, row.paid);
            (row.employee, totals)
        })
        .collect())
}

pub async fn fixed_totals(
    pool: &MySqlPool,
    employee: &FixedEmployee,
    range: &DateRange,
) -> Result<FixedTotals, sqlx::Error> {
    let conditions = for_employee(employee.id, Some(range));
    Ok(FixedTotals::new(
        employee.monthly_salary,
        sum_decimal(pool, "fixed_work_credits", "amount", &conditions).await?,
        sum_decimal(pool, "fixed_salary_payments", "amount", &conditions).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::db_utils::delete_by_id;
    use chrono::NaiveDate;

    #[test]
    fn employee_filter_scopes_by_id_then_dates() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );

        assert_eq!(for_employee(7, None).where_sql(), "WHERE employee_id = ?");
        assert_eq!(
            for_employee(7, Some(&range)).where_sql(),
            "WHERE employee_id = ? AND date BETWEEN ? AND ?"
        );
    }

    fn day(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(day(1, 1), day(1, 31))
    }

    // These run against a scratch database created from DATABASE_URL:
    // `cargo test -- --ignored`.
    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a MySQL server"]
    async fn january_sums_ignore_other_months(pool: MySqlPool) -> sqlx::Result<()> {
        for (date, amount, direction) in [(day(1, 10), "200", "IN"), (day(2, 1), "999", "IN")] {
            sqlx::query("INSERT INTO payments (date, description, amount, direction) VALUES (?, 'sale', ?, ?)")
                .bind(date)
                .bind(amount)
                .bind(direction)
                .execute(&pool)
                .await?;
        }
        sqlx::query("INSERT INTO expenses (date, category, description, amount) VALUES (?, 'MATERIAL', '', 50)")
            .bind(day(1, 12))
            .execute(&pool)
            .await?;

        let sums = ledger_sums(&pool, &january()).await?;
        assert_eq!(sums.payins(), Decimal::new(200, 0));
        assert_eq!(sums.payouts(), Decimal::new(50, 0));
        assert_eq!(sums.balance(), Decimal::new(150, 0));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a MySQL server"]
    async fn totals_follow_deletes(pool: MySqlPool) -> sqlx::Result<()> {
        let employee_id = sqlx::query("INSERT INTO contractual_employees (name) VALUES ('Amina')")
            .execute(&pool)
            .await?
            .last_insert_id();
        let mut work_ids = Vec::new();
        for (quantity, price) in [(5, "100"), (3, "0.10")] {
            let id = sqlx::query(
                "INSERT INTO work_records (employee_id, date, quantity, item_price) VALUES (?, ?, ?, ?)",
            )
            .bind(employee_id)
            .bind(day(1, 5))
            .bind(quantity)
            .bind(price)
            .execute(&pool)
            .await?
            .last_insert_id();
            work_ids.push(id);
        }
        sqlx::query("INSERT INTO salary_payments (employee_id, amount, date) VALUES (?, 450, ?)")
            .bind(employee_id)
            .bind(day(1, 20))
            .execute(&pool)
            .await?;

        let totals = contractual_totals(&pool, employee_id, Some(&january())).await?;
        assert_eq!(totals.earned, Decimal::new(50030, 2));
        assert_eq!(totals.balance(), Decimal::new(5030, 2));

        assert_eq!(delete_by_id(&pool, "work_records", work_ids[0]).await?, 1);
        let totals = contractual_totals(&pool, employee_id, None).await?;
        assert_eq!(totals.earned, Decimal::new(30, 2));
        assert_eq!(totals.balance(), Decimal::new(-44970, 2));

        let overview = contractual_overview(&pool, None).await?;
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].1, totals);
        Ok(())
    }
}
