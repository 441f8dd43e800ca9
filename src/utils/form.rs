use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use actix_web::{Either, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use utoipa::IntoParams;
use validator::{ValidationError, ValidationErrors};

use crate::errors::AppError;

/// Request body sent either as JSON or as a classic urlencoded form post.
pub type Body<T> = Either<web::Json<T>, web::Form<T>>;

pub fn into_inner<T: DeserializeOwned>(body: Body<T>) -> T {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

/// Optional field that treats a blank form value like a missing one.
///
/// Use with `#[serde(default, deserialize_with = "blank_as_none")]`. Accepts
/// strings from forms as well as JSON numbers.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!("unexpected value {}", other)));
        }
    };

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(serde::de::Error::custom)
}

pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Largest value of a `DECIMAL(12, 2)` money column.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Largest value of the `DECIMAL(6, 2)` hours column.
pub fn max_hours() -> Decimal {
    Decimal::new(999_999, 2)
}

/// Longest free-text description accepted for ledger rows.
pub const DESCRIPTION_MAX: usize = 1000;

fn within(value: &Decimal, max: Decimal) -> Result<(), ValidationError> {
    if *value > max {
        return Err(field_error("too_large", format!("Value cannot exceed {}.", max)));
    }
    Ok(())
}

pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(field_error("positive_amount", "Amount must be greater than zero."));
    }
    within(value, max_amount())
}

pub fn validate_decimal_min_zero(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(field_error("decimal_min_zero", "Value cannot be negative."));
    }
    within(value, max_amount())
}

/// Adds a field error when optional hours are negative or overflow the column.
pub fn check_hours(errors: &mut ValidationErrors, field: &'static str, value: Option<Decimal>) {
    if let Some(value) = value {
        let checked = if value < Decimal::ZERO {
            Err(field_error("decimal_min_zero", "Value cannot be negative."))
        } else {
            within(&value, max_hours())
        };
        if let Err(e) = checked {
            errors.add(field, e);
        }
    }
}

/// Adds a field error when free text is longer than [`DESCRIPTION_MAX`].
pub fn check_description(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) {
    if value.is_some_and(|v| v.chars().count() > DESCRIPTION_MAX) {
        errors.add(
            field,
            field_error("length", format!("Description is limited to {} characters.", DESCRIPTION_MAX)),
        );
    }
}

/// Adds a field error when an optional decimal is negative.
pub fn check_min_zero(errors: &mut ValidationErrors, field: &'static str, value: Option<Decimal>) {
    if let Some(value) = value {
        if let Err(e) = validate_decimal_min_zero(&value) {
            errors.add(field, e);
        }
    }
}

/// Merges derive-level errors with hand-written checks into one result.
pub fn finish(
    derived: Result<(), ValidationErrors>,
    extra: ValidationErrors,
) -> Result<(), ValidationErrors> {
    let mut errors = derived.err().unwrap_or_else(ValidationErrors::new);
    for (field, field_errors) in extra.field_errors() {
        for error in field_errors.iter() {
            errors.add(field, error.clone());
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Money amounts are stored with two decimals.
pub fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `?confirm=true` gate in front of every delete.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteConfirmation {
    /// Must be `true` to actually delete; otherwise the record is echoed back
    pub confirm: Option<bool>,
}

impl DeleteConfirmation {
    pub fn require<T: Serialize>(&self, record: &T) -> Result<(), AppError> {
        if self.confirm.unwrap_or(false) {
            return Ok(());
        }

        let preview = serde_json::to_value(record).unwrap_or(serde_json::Value::Null);
        Err(AppError::ConfirmationRequired(preview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::FromRequest;
    use actix_web::test as actix_test;
    use rust_decimal_macros::dec;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Note {
        title: String,
        amount: Decimal,
    }

    #[actix_web::test]
    async fn body_accepts_json() {
        let (req, mut payload) = actix_test::TestRequest::post()
            .set_json(serde_json::json!({"title": "rent", "amount": "12.50"}))
            .to_http_parts();

        let body = Body::<Note>::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(
            into_inner(body),
            Note {
                title: "rent".into(),
                amount: dec!(12.50)
            }
        );
    }

    #[actix_web::test]
    async fn body_accepts_urlencoded_form() {
        let (req, mut payload) = actix_test::TestRequest::post()
            .set_form([("title", "rent"), ("amount", "12.50")])
            .to_http_parts();

        let body = Body::<Note>::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(into_inner(body).amount, dec!(12.50));
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(validate_positive_amount(&dec!(0.01)).is_ok());
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_decimal_min_zero(&Decimal::ZERO).is_ok());
        assert!(validate_decimal_min_zero(&dec!(-1)).is_err());
    }

    #[test]
    fn amounts_must_fit_the_money_columns() {
        assert!(validate_positive_amount(&dec!(9999999999.99)).is_ok());
        assert!(validate_positive_amount(&dec!(10000000000)).is_err());
        assert!(validate_decimal_min_zero(&dec!(1000000000000)).is_err());

        let mut errors = ValidationErrors::new();
        check_hours(&mut errors, "hours", Some(dec!(9999.99)));
        assert!(errors.is_empty());
        check_hours(&mut errors, "hours", Some(dec!(10000)));
        assert!(errors.field_errors().contains_key("hours"));
    }

    #[test]
    fn long_descriptions_are_rejected() {
        let mut errors = ValidationErrors::new();
        check_description(&mut errors, "description", Some("d".repeat(DESCRIPTION_MAX).as_str()));
        check_description(&mut errors, "description", None);
        assert!(errors.is_empty());

        check_description(&mut errors, "description", Some("d".repeat(DESCRIPTION_MAX + 1).as_str()));
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn finish_merges_errors() {
        let mut extra = ValidationErrors::new();
        check_min_zero(&mut extra, "rate", Some(dec!(-3)));
        check_min_zero(&mut extra, "hours", None);

        let merged = finish(Ok(()), extra).unwrap_err();
        assert!(merged.field_errors().contains_key("rate"));
        assert!(!merged.field_errors().contains_key("hours"));

        assert!(finish(Ok(()), ValidationErrors::new()).is_ok());
    }

    #[test]
    fn deletes_need_explicit_confirmation() {
        let record = serde_json::json!({"id": 4});

        let gate = DeleteConfirmation::default();
        assert!(matches!(gate.require(&record), Err(AppError::ConfirmationRequired(_))));

        let gate = DeleteConfirmation { confirm: Some(true) };
        assert!(gate.require(&record).is_ok());
    }

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "blank_as_none")]
        amount: Option<Decimal>,
    }

    #[test]
    fn blank_values_deserialize_as_none() {
        let row = web::Query::<Row>::from_query("amount=").unwrap();
        assert_eq!(row.amount, None);

        let row = web::Query::<Row>::from_query("").unwrap();
        assert_eq!(row.amount, None);

        let row = web::Query::<Row>::from_query("amount=7.25").unwrap();
        assert_eq!(row.amount, Some(dec!(7.25)));

        let row: Row = serde_json::from_value(serde_json::json!({"amount": 12.5})).unwrap();
        assert_eq!(row.amount, Some(dec!(12.5)));

        let row: Row = serde_json::from_value(serde_json::json!({"amount": " 3.10 "})).unwrap();
        assert_eq!(row.amount, Some(dec!(3.10)));

        assert!(serde_json::from_value::<Row>(serde_json::json!({"amount": "abc"})).is_err());
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" note ".into())), Some("note".into()));
    }
}
