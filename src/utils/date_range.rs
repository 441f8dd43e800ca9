use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range, matching SQL `BETWEEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start: NaiveDate,
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// First day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
        Self { start, end: today }
    }
}

/// `start_date` / `end_date` query parameters as the browser sends them.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// Inclusive start, `YYYY-MM-DD`
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    /// Inclusive end, `YYYY-MM-DD`
    #[param(example = "2024-01-31")]
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// The requested range, or `None` unless both ends parse.
    pub fn range(&self) -> Option<DateRange> {
        parse_range(self.start_date.as_deref(), self.end_date.as_deref())
    }

    pub fn range_or_month_to_date(&self, today: NaiveDate) -> DateRange {
        self.range().unwrap_or_else(|| DateRange::month_to_date(today))
    }
}

pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "Ignoring malformed date filter");
            None
        }
    }
}

/// Both ends or nothing. Partial or malformed input is ignored, never an error.
pub fn parse_range(start: Option<&str>, end: Option<&str>) -> Option<DateRange> {
    Some(DateRange::new(parse_date(start)?, parse_date(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn query(start: Option<&str>, end: Option<&str>) -> DateRangeQuery {
        DateRangeQuery {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
        }
    }

    #[test]
    fn both_dates_give_a_range() {
        let range = query(Some("2024-01-01"), Some(" 2024-01-31 ")).range().unwrap();
        assert_eq!(range, DateRange::new(day(2024, 1, 1), day(2024, 1, 31)));
    }

    #[test]
    fn malformed_start_falls_back_to_current_month() {
        let today = day(2024, 3, 17);
        let q = query(Some("not-a-date"), Some("2024-01-31"));

        assert_eq!(q.range(), None);
        assert_eq!(
            q.range_or_month_to_date(today),
            DateRange::new(day(2024, 3, 1), day(2024, 3, 17))
        );
    }

    #[test]
    fn partial_input_is_ignored() {
        assert_eq!(query(Some("2024-01-01"), None).range(), None);
        assert_eq!(query(None, Some("2024-01-31")).range(), None);
        assert_eq!(query(Some(""), Some("")).range(), None);
        assert_eq!(query(Some("2024-02-30"), Some("2024-03-01")).range(), None);
    }

    #[test]
    fn month_to_date_on_the_first() {
        let first = day(2024, 2, 1);
        assert_eq!(DateRange::month_to_date(first), DateRange::new(first, first));
    }
}
