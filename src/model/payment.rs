use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Whether money came into the business or left it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PaymentDirection {
    #[default]
    In,
    Out,
}

super::text_column!(PaymentDirection);

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "date": "2024-01-15",
        "description": "Customer order #42",
        "amount": "200.00",
        "direction": "IN"
    })
)]
pub struct Payment {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "Customer order #42")]
    pub description: String,

    #[schema(example = "200.00", value_type = String)]
    pub amount: Decimal,

    pub direction: PaymentDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_uses_stored_codes() {
        assert_eq!("IN".parse::<PaymentDirection>().unwrap(), PaymentDirection::In);
        assert_eq!(PaymentDirection::Out.as_ref(), "OUT");
        assert!("SIDEWAYS".parse::<PaymentDirection>().is_err());
        assert_eq!(PaymentDirection::default(), PaymentDirection::In);
    }
}
