use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A worker paid per unit of completed work.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 3,
        "name": "Amina Rahman",
        "phone": "+447700900123",
        "role": "Stitcher"
    })
)]
pub struct ContractualEmployee {
    #[schema(example = 3)]
    pub id: u64,

    #[schema(example = "Amina Rahman")]
    pub name: String,

    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Stitcher", nullable = true)]
    pub role: Option<String>,
}

/// One unit-priced task performed on a date.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WorkRecord {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "2024-01-12", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = 5)]
    pub quantity: u32,

    #[schema(example = "100.00", value_type = String)]
    pub item_price: Decimal,

    #[schema(nullable = true)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalaryPayment {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "700.00", value_type = String)]
    pub amount: Decimal,

    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(nullable = true)]
    pub description: Option<String>,
}

/// Money paid beyond what was earned at the time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdvancePayment {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "200.00", value_type = String)]
    pub amount: Decimal,

    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "Auto-created from salary ID 12", nullable = true)]
    pub note: Option<String>,
}
