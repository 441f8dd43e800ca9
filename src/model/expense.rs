use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    EnumIter,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ExpenseCategory {
    Material,
    /// Rent, bills and guest costs. Needs a sub type.
    Rbg,
    Setup,
    Outsource,
    Logistics,
}

impl ExpenseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Material => "Material Expense",
            ExpenseCategory::Rbg => "Rent / Bill / Guest",
            ExpenseCategory::Setup => "Setup Purchase",
            ExpenseCategory::Outsource => "Outsource",
            ExpenseCategory::Logistics => "Logistics",
        }
    }

    pub fn requires_sub_type(&self) -> bool {
        matches!(self, ExpenseCategory::Rbg)
    }
}

super::text_column!(ExpenseCategory);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ExpenseSubType {
    Rent,
    Bill,
    Guest,
}

impl ExpenseSubType {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseSubType::Rent => "Rent",
            ExpenseSubType::Bill => "Bill",
            ExpenseSubType::Guest => "Guest",
        }
    }
}

super::text_column!(ExpenseSubType);

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "date": "2024-01-10",
        "category": "RBG",
        "sub_type": "RENT",
        "description": "January rent",
        "amount": "850.00",
        "created_at": "2024-01-10T09:00:00Z",
        "updated_at": "2024-01-10T09:00:00Z"
    })
)]
pub struct Expense {
    pub id: u64,

    #[schema(example = "2024-01-10", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub category: ExpenseCategory,

    #[schema(nullable = true)]
    pub sub_type: Option<ExpenseSubType>,

    #[schema(example = "January rent")]
    pub description: String,

    #[schema(example = "850.00", value_type = String)]
    pub amount: Decimal,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// "Rent / Bill / Guest · Rent" style label used by the reports.
    pub fn display_category(&self) -> String {
        match (self.category.requires_sub_type(), self.sub_type) {
            (true, Some(sub_type)) => format!("{} · {}", self.category.label(), sub_type.label()),
            _ => self.category.label().to_string(),
        }
    }
}
