//! Field validation shared by the services.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::ServiceError;
use crate::types::{Gender, Relationship};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Formats tried, in order, after RFC 3339. Slash dates are day-first.
const BIRTH_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Trimmed, non-empty, bounded name
pub fn name(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ServiceError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

pub fn optional_name(field: &str, value: Option<&str>) -> Result<Option<String>, ServiceError> {
    value.map(|v| name(field, v)).transpose()
}

/// Optional free text: trimmed, empty becomes `None`
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn email(value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim().to_ascii_lowercase();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid || trimmed.chars().any(char::is_whitespace) {
        return Err(ServiceError::Validation(format!("invalid email '{}'", value)));
    }
    Ok(trimmed)
}

pub fn password(value: &str) -> Result<(), ServiceError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn gender(value: &str) -> Result<Gender, ServiceError> {
    value.parse().map_err(ServiceError::Validation)
}

pub fn relationship(value: &str) -> Result<Relationship, ServiceError> {
    value
        .parse()
        .map_err(|raw: String| ServiceError::InvalidRelationship(raw.trim().to_string()))
}

/// Parse a free-form date string
pub fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ServiceError::InvalidDate(raw.to_string()));
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }
    BIRTH_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| ServiceError::InvalidDate(raw.to_string()))
}

/// Parse a birth date and reject dates in the future
pub fn birth_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    let date = parse_date(raw)?;
    if date > Utc::now().date_naive() {
        return Err(ServiceError::Validation(format!("birth date {} is in the future", date)));
    }
    Ok(date)
}

/// Completed months between `birth` and `on`
pub fn age_in_months(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut months = (on.year() - birth.year()) * 12 + on.month() as i32 - birth.month() as i32;
    if on.day() < birth.day() {
        months -= 1;
    }
    months.max(0)
}

pub fn months_range(min_months: i32, max_months: i32) -> Result<(), ServiceError> {
    if min_months < 0 {
        return Err(ServiceError::Validation("min_months must not be negative".to_string()));
    }
    if min_months > max_months {
        return Err(ServiceError::Validation(
            "min_months must not be greater than max_months".to_string(),
        ));
    }
    Ok(())
}

pub fn capacity(value: Option<i32>) -> Result<(), ServiceError> {
    match value {
        Some(c) if c <= 0 => Err(ServiceError::Validation("capacity must be positive".to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_free_form_dates() {
        assert_eq!(parse_date("2021-03-05").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date(" 2021/03/05 ").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("05/03/2021").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("05-03-2021").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("05.03.2021").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("March 05, 2021").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("Mar 05, 2021").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("05 March 2021").unwrap(), ymd(2021, 3, 5));
        assert_eq!(parse_date("2021-03-05T10:30:00Z").unwrap(), ymd(2021, 3, 5));
    }

    #[test]
    fn rejects_malformed_dates() {
        for raw in ["", "   ", "yesterday", "2021-13-01", "31/02/2021", "2021-03"] {
            assert!(
                matches!(parse_date(raw), Err(ServiceError::InvalidDate(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn rejects_future_birth_dates() {
        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(2);
        let raw = tomorrow.format("%Y-%m-%d").to_string();
        assert!(matches!(birth_date(&raw), Err(ServiceError::Validation(_))));
        assert!(birth_date("2020-01-01").is_ok());
    }

    #[test]
    fn computes_age_in_months() {
        assert_eq!(age_in_months(ymd(2020, 1, 15), ymd(2020, 1, 20)), 0);
        assert_eq!(age_in_months(ymd(2020, 1, 15), ymd(2020, 2, 14)), 0);
        assert_eq!(age_in_months(ymd(2020, 1, 15), ymd(2020, 2, 15)), 1);
        assert_eq!(age_in_months(ymd(2020, 1, 15), ymd(2022, 1, 15)), 24);
        assert_eq!(age_in_months(ymd(2020, 1, 15), ymd(2019, 1, 15)), 0);
    }

    #[test]
    fn validates_names_and_emails() {
        assert_eq!(name("first_name", "  Ada ").unwrap(), "Ada");
        assert!(name("first_name", "   ").is_err());
        assert!(name("first_name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert_eq!(email(" Parent@Example.COM ").unwrap(), "parent@example.com");
        assert!(email("no-at-sign").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("a@localhost").is_err());
        assert!(password("short").is_err());
        assert!(password("long enough").is_ok());
    }

    #[test]
    fn relationship_errors_carry_the_raw_value() {
        assert_eq!(relationship("Father").unwrap(), Relationship::Father);
        match relationship(" cousin ") {
            Err(ServiceError::InvalidRelationship(raw)) => assert_eq!(raw, "cousin"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn validates_ranges_and_capacity() {
        assert!(months_range(0, 12).is_ok());
        assert!(months_range(12, 12).is_ok());
        assert!(months_range(-1, 12).is_err());
        assert!(months_range(13, 12).is_err());
        assert!(capacity(None).is_ok());
        assert!(capacity(Some(10)).is_ok());
        assert!(capacity(Some(0)).is_err());
    }

    #[test]
    fn optional_text_drops_blanks() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" note ")), Some("note".to_string()));
        assert_eq!(optional_text(None), None);
    }
}
