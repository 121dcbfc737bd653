//! Field validation for request bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};

use super::error::ApiError;

pub const REQUIRED: &str = "This field is required.";

/// Collects per-field messages; the first message recorded for a field wins.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, msg: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| msg.into());
    }

    /// Record `REQUIRED` if the trimmed value is empty. Returns the trimmed value.
    pub fn require<'a>(&mut self, field: &str, value: &'a str) -> &'a str {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, REQUIRED);
        }
        value
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("Ensure this field has no more than {max} characters."),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !value.is_empty() && !is_valid_email(value) {
            self.add(field, "Enter a valid email address.");
        }
    }

    /// Parse a `YYYY-MM-DD` date, recording an error on failure.
    pub fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        if value.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.add(field, "Date has wrong format. Use YYYY-MM-DD.");
                None
            }
        }
    }

    /// Parse an RFC 3339 timestamp, recording an error on failure.
    pub fn datetime(&mut self, field: &str, value: &str) -> Option<DateTime<FixedOffset>> {
        if value.is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => Some(dt),
            Err(_) => {
                self.add(field, "Datetime has wrong format. Use RFC 3339.");
                None
            }
        }
    }

    /// Parse a closed-set value with the given parser.
    pub fn choice<T>(&mut self, field: &str, value: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        if value.is_empty() {
            return None;
        }
        let parsed = parse(value);
        if parsed.is_none() {
            self.add(field, format!("\"{value}\" is not a valid choice."));
        }
        parsed
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("alice@x..com"));
        assert!(!is_valid_email("al ice@x.com"));
        assert!(!is_valid_email("a@b@x.com"));
    }

    #[test]
    fn test_require_trims() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.require("title", "  hello "), "hello");
        assert!(errors.is_empty());

        errors.require("title", "   ");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        match errors.finish() {
            Err(ApiError::Validation(fields)) => assert_eq!(fields["email"], "first"),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_dates() {
        let mut errors = FieldErrors::new();
        assert!(errors.date("start", "2026-01-15").is_some());
        assert!(errors.datetime("at", "2026-01-15T10:00:00Z").is_some());
        assert!(errors.is_empty());

        assert!(errors.date("start", "15/01/2026").is_none());
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_max_len_counts_chars() {
        let mut errors = FieldErrors::new();
        errors.max_len("title", &"é".repeat(100), 100);
        assert!(errors.is_empty());
        errors.max_len("title", &"a".repeat(101), 100);
        assert!(!errors.is_empty());
    }
}
