use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use super::balance::overpay;
use super::queries::WORK_TOTAL_SQL;
use crate::errors::AppError;
use crate::model::contractual::{AdvancePayment, SalaryPayment};

pub fn advance_note(salary_id: u64) -> String {
    format!("Auto-created from salary ID {}", salary_id)
}

/// Records a salary payment for a contractual employee. Any part of `amount`
/// beyond the unpaid balance becomes an advance.
///
/// Runs in one transaction holding a lock on the employee row, so two
/// concurrent payments cannot both see the same balance.
pub async fn record_salary_payment(
    pool: &MySqlPool,
    employee_id: u64,
    amount: Decimal,
    date: NaiveDate,
    description: Option<String>,
) -> Result<(SalaryPayment, Option<AdvancePayment>), AppError> {
    let mut tx = pool.begin().await?;

    let locked: Option<u64> =
        sqlx::query_scalar("SELECT id FROM contractual_employees WHERE id = ? FOR UPDATE")
            .bind(employee_id)
            .fetch_optional(&mut *tx)
            .await?;

    if locked.is_none() {
        return Err(AppError::not_found("Employee"));
    }

    let earned: Decimal = sqlx::query_scalar(&format!(
        "SELECT COALESCE(SUM({}), 0) FROM work_records WHERE employee_id = ?",
        WORK_TOTAL_SQL
    ))
    .bind(employee_id)
    .fetch_one(&mut *tx)
    .await?;

    let paid_before: Decimal =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM salary_payments WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_one(&mut *tx)
            .await?;

    let salary_id = sqlx::query(
        "INSERT INTO salary_payments (employee_id, amount, date, description) VALUES (?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(amount)
    .bind(date)
    .bind(description.as_deref())
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    let advance = match overpay(earned, paid_before, amount) {
        Some(extra) => {
            let note = advance_note(salary_id);
            let advance_id = sqlx::query(
                "INSERT INTO advance_payments (employee_id, amount, date, note) VALUES (?, ?, ?, ?)",
            )
            .bind(employee_id)
            .bind(extra)
            .bind(date)
            .bind(&note)
            .execute(&mut *tx)
            .await?
            .last_insert_id();

            Some(AdvancePayment {
                id: advance_id,
                employee_id,
                amount: extra,
                date,
                note: Some(note),
            })
        }
        None => None,
    };

    tx.commit().await?;

    tracing::info!(
        employee_id,
        salary_id,
        amount = %amount,
        advance = ?advance.as_ref().map(|a| a.amount),
        "Salary payment recorded"
    );

    Ok((
        SalaryPayment {
            id: salary_id,
            employee_id,
            amount,
            date,
            description,
        },
        advance,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn advance_note_points_at_the_salary() {
        assert_eq!(advance_note(42), "Auto-created from salary ID 42");
    }

    #[test]
    fn overpaid_salary_creates_an_advance_for_the_excess() {
        // 5 units at 100 earned, 700 paid in one go.
        assert_eq!(overpay(dec!(500), Decimal::ZERO, dec!(700)), Some(dec!(200)));
        // With the balance already at -200 the advance is the payment plus
        // that shortfall, not capped at the payment.
        assert_eq!(overpay(dec!(500), dec!(700), dec!(50)), Some(dec!(250)));
        assert_eq!(overpay(dec!(500), dec!(100), dec!(400)), None);
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    // These run against a scratch database created from DATABASE_URL:
    // `cargo test -- --ignored`.
    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a MySQL server"]
    async fn overpayment_is_split_into_salary_and_advance(pool: MySqlPool) -> sqlx::Result<()> {
        let employee_id = sqlx::query("INSERT INTO contractual_employees (name) VALUES ('Amina')")
            .execute(&pool)
            .await?
            .last_insert_id();
        sqlx::query(
            "INSERT INTO work_records (employee_id, date, quantity, item_price) VALUES (?, ?, 5, 100)",
        )
        .bind(employee_id)
        .bind(jan(5))
        .execute(&pool)
        .await?;

        let (salary, advance) = record_salary_payment(&pool, employee_id, dec!(700), jan(10), None)
            .await
            .unwrap();
        let advance = advance.expect("700 against 500 earned is an overpayment");
        assert_eq!(advance.amount, dec!(200));

        let (amount, note): (Decimal, Option<String>) =
            sqlx::query_as("SELECT amount, note FROM advance_payments WHERE employee_id = ?")
                .bind(employee_id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(amount, dec!(200));
        assert_eq!(note, Some(format!("Auto-created from salary ID {}", salary.id)));

        let totals = crate::ledger::queries::contractual_totals(&pool, employee_id, None).await?;
        assert_eq!(totals.balance(), dec!(-200));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a MySQL server"]
    async fn covered_payment_and_missing_employee(pool: MySqlPool) -> sqlx::Result<()> {
        let employee_id = sqlx::query("INSERT INTO contractual_employees (name) VALUES ('Ben')")
            .execute(&pool)
            .await?
            .last_insert_id();
        sqlx::query(
            "INSERT INTO work_records (employee_id, date, quantity, item_price) VALUES (?, ?, 2, 50)",
        )
        .bind(employee_id)
        .bind(jan(3))
        .execute(&pool)
        .await?;

        let (_, advance) = record_salary_payment(&pool, employee_id, dec!(100), jan(4), Some("full".into()))
            .await
            .unwrap();
        assert!(advance.is_none());

        let missing = record_salary_payment(&pool, employee_id + 1, dec!(10), jan(4), None).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let salaries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM salary_payments")
            .fetch_one(&pool)
            .await?;
        assert_eq!(salaries, 1);
        Ok(())
    }
}
