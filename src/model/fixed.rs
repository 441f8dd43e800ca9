use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A worker on a fixed monthly salary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "name": "Tom Baker",
        "phone": "+447700900456",
        "role": "Supervisor",
        "monthly_salary": "2100.00"
    })
)]
pub struct FixedEmployee {
    #[schema(example = 2)]
    pub id: u64,

    #[schema(example = "Tom Baker")]
    pub name: String,

    #[schema(example = "+447700900456", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Supervisor", nullable = true)]
    pub role: Option<String>,

    #[schema(example = "2100.00", value_type = String)]
    pub monthly_salary: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FixedSalaryPayment {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "1000.00", value_type = String)]
    pub amount: Decimal,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub description: String,
}

/// Overtime or extra work added to a fixed employee's due.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FixedWorkCredit {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "2024-01-20", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "6.5", value_type = String, nullable = true)]
    pub hours: Option<Decimal>,

    #[schema(example = "14.00", value_type = String, nullable = true)]
    pub rate: Option<Decimal>,

    #[schema(example = "91.00", value_type = String)]
    pub amount: Decimal,

    pub description: String,
}
