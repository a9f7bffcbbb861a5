//! Field validation for permissive request bodies.
//!
//! Request structs accept loosely typed JSON (numbers may arrive as strings, booleans as
//! `1`/`0`) and are converted into typed database requests through a [`Validator`], which
//! collects every failing field before reporting them together as
//! [`Error::Validation`](crate::errors::Error::Validation).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::BTreeMap, str::FromStr};

use crate::errors::Error;
use crate::types::parse_positive_id;

/// Money columns are `NUMERIC(14,2)`, leaving twelve integer digits
fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000_i64)
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Record `message` against `field` unless `condition` holds
    pub fn check(&mut self, condition: bool, field: &str, message: impl Into<String>) {
        if !condition {
            self.error(field, message);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn missing<T>(&mut self, field: &str) -> Option<T> {
        self.error(field, format!("{field} is required"));
        None
    }

    pub fn required_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match self.optional_text(value) {
            Some(text) => Some(text),
            None => self.missing(field),
        }
    }

    /// Trimmed text, with blank treated as absent
    pub fn optional_text(&mut self, value: Option<String>) -> Option<String> {
        value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }

    /// For updates: `null` clears, blank clears, text is trimmed
    pub fn nullable_text(&mut self, value: Option<Option<String>>) -> Option<Option<String>> {
        value.map(|inner| self.optional_text(inner))
    }

    pub fn required_email(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let email = self.required_text(field, value)?;
        self.email(field, email)
    }

    pub fn optional_email(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let email = self.optional_text(value)?;
        self.email(field, email)
    }

    fn email(&mut self, field: &str, email: String) -> Option<String> {
        if is_valid_email(&email) {
            Some(email.to_lowercase())
        } else {
            self.error(field, format!("{field} must be a valid email address"));
            None
        }
    }

    pub fn required_id(&mut self, field: &str, value: Option<Value>) -> Option<i64> {
        match value {
            None | Some(Value::Null) => self.missing(field),
            Some(v) => self.id(field, &v),
        }
    }

    pub fn optional_id(&mut self, field: &str, value: Option<Value>) -> Option<i64> {
        match value {
            None | Some(Value::Null) => None,
            Some(v) => self.id(field, &v),
        }
    }

    /// For updates: absent leaves untouched, `null` clears
    pub fn nullable_id(&mut self, field: &str, value: Option<Option<Value>>) -> Option<Option<i64>> {
        match value? {
            None | Some(Value::Null) => Some(None),
            Some(v) => self.id(field, &v).map(Some),
        }
    }

    fn id(&mut self, field: &str, value: &Value) -> Option<i64> {
        let parsed = match value {
            Value::Number(n) => n.as_i64().filter(|id| *id > 0),
            Value::String(s) => parse_positive_id(s),
            _ => None,
        };
        if parsed.is_none() {
            self.error(field, format!("{field} must be a positive integer"));
        }
        parsed
    }

    pub fn required_integer(&mut self, field: &str, value: Option<Value>) -> Option<i64> {
        match value {
            None | Some(Value::Null) => self.missing(field),
            Some(v) => self.integer(field, &v),
        }
    }

    pub fn optional_integer(&mut self, field: &str, value: Option<Value>) -> Option<i64> {
        match value {
            None | Some(Value::Null) => None,
            Some(v) => self.integer(field, &v),
        }
    }

    fn integer(&mut self, field: &str, value: &Value) -> Option<i64> {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.error(field, format!("{field} must be an integer"));
        }
        parsed
    }

    /// A non-negative money amount, rounded to cents
    pub fn required_amount(&mut self, field: &str, value: Option<Value>) -> Option<Decimal> {
        match value {
            None | Some(Value::Null) => self.missing(field),
            Some(v) => self.amount(field, &v),
        }
    }

    pub fn optional_amount(&mut self, field: &str, value: Option<Value>) -> Option<Decimal> {
        match value {
            None | Some(Value::Null) => None,
            Some(v) => self.amount(field, &v),
        }
    }

    pub fn nullable_amount(&mut self, field: &str, value: Option<Option<Value>>) -> Option<Option<Decimal>> {
        match value? {
            None | Some(Value::Null) => Some(None),
            Some(v) => self.amount(field, &v).map(Some),
        }
    }

    fn amount(&mut self, field: &str, value: &Value) -> Option<Decimal> {
        let Some(amount) = parse_decimal(value) else {
            self.error(field, format!("{field} must be a number"));
            return None;
        };
        if amount.is_sign_negative() && !amount.is_zero() {
            self.error(field, format!("{field} must not be negative"));
            return None;
        }
        let amount = amount.round_dp(2);
        if amount >= max_amount() {
            self.error(field, format!("{field} must be less than {}", max_amount()));
            return None;
        }
        Some(amount)
    }

    pub fn required_date(&mut self, field: &str, value: Option<String>) -> Option<NaiveDate> {
        match self.optional_text(value) {
            None => self.missing(field),
            Some(raw) => self.date(field, &raw),
        }
    }

    pub fn optional_date(&mut self, field: &str, value: Option<String>) -> Option<NaiveDate> {
        let raw = self.optional_text(value)?;
        self.date(field, &raw)
    }

    pub fn nullable_date(&mut self, field: &str, value: Option<Option<String>>) -> Option<Option<NaiveDate>> {
        match self.nullable_text(value)? {
            None => Some(None),
            Some(raw) => self.date(field, &raw).map(Some),
        }
    }

    fn date(&mut self, field: &str, raw: &str) -> Option<NaiveDate> {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.error(field, format!("{field} must be a date in YYYY-MM-DD format"));
                None
            }
        }
    }

    /// Booleans, also accepting `1`/`0` and their string forms
    pub fn optional_bool(&mut self, field: &str, value: Option<Value>) -> Option<bool> {
        let value = value?;
        let parsed = match &value {
            Value::Null => return None,
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.error(field, format!("{field} must be true, false, 1 or 0"));
        }
        parsed
    }

    pub fn required_enum<T: DeserializeOwned>(&mut self, field: &str, value: Option<String>, allowed: &[&str]) -> Option<T> {
        match self.optional_text(value) {
            None => self.missing(field),
            Some(raw) => self.enumeration(field, raw, allowed),
        }
    }

    pub fn optional_enum<T: DeserializeOwned>(&mut self, field: &str, value: Option<String>, allowed: &[&str]) -> Option<T> {
        let raw = self.optional_text(value)?;
        self.enumeration(field, raw, allowed)
    }

    fn enumeration<T: DeserializeOwned>(&mut self, field: &str, raw: String, allowed: &[&str]) -> Option<T> {
        match serde_json::from_value(Value::String(raw)) {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(field, format!("{field} must be one of: {}", allowed.join(", ")));
                None
            }
        }
    }

    /// Report collected errors, or build the validated value.
    ///
    /// `build` runs only when no field failed, so every required `Option` it unpacks is `Some`.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, Error> {
        if !self.errors.is_empty() {
            return Err(Error::Validation { errors: self.errors });
        }
        build().ok_or_else(|| Error::Internal {
            operation: "assemble validated request".to_string(),
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::employees::EmploymentType;
    use serde_json::json;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn test_collects_every_missing_field() {
        let mut v = Validator::new();
        let first = v.required_text("first_name", None);
        let last = v.required_text("last_name", Some("   ".to_string()));
        let email = v.required_email("email", Some("nurse@hospital.org".to_string()));
        let dept = v.required_id("department_id", None);

        let err = v.finish(|| Some((first?, last?, email?, dept?))).unwrap_err();
        match err {
            Error::Validation { errors } => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors["first_name"], "first_name is required");
                assert_eq!(errors["last_name"], "last_name is required");
                assert_eq!(errors["department_id"], "department_id is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_finish_builds_when_valid() {
        let mut v = Validator::new();
        let name = v.required_text("name", Some("  Cardiology ".to_string()));
        let budget = v.optional_amount("budget", Some(json!("1500.504")));
        let result = v.finish(|| Some((name?, budget))).unwrap();
        assert_eq!(result.0, "Cardiology");
        assert_eq!(result.1, Some(dec("1500.50")));
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let mut v = Validator::new();
        assert_eq!(v.required_id("a", Some(json!(3))), Some(3));
        assert_eq!(v.required_id("b", Some(json!("12"))), Some(12));
        assert_eq!(v.required_id("c", Some(json!(0))), None);
        assert_eq!(v.required_id("d", Some(json!("x"))), None);
        assert_eq!(v.required_id("e", Some(json!(1.5))), None);
        assert_eq!(v.errors.len(), 3);
        assert_eq!(v.errors["c"], "c must be a positive integer");
    }

    #[test]
    fn test_nullable_id_distinguishes_absent_and_null() {
        let mut v = Validator::new();
        assert_eq!(v.nullable_id("manager_id", None), None);
        assert_eq!(v.nullable_id("manager_id", Some(None)), Some(None));
        assert_eq!(v.nullable_id("manager_id", Some(Some(json!(4)))), Some(Some(4)));
        assert!(!v.has_errors());
    }

    #[test]
    fn test_amounts() {
        let mut v = Validator::new();
        assert_eq!(v.required_amount("a", Some(json!(250))), Some(dec("250")));
        assert_eq!(v.required_amount("b", Some(json!("99.99"))), Some(dec("99.99")));
        assert_eq!(v.required_amount("c", Some(json!(-1))), None);
        assert_eq!(v.required_amount("d", Some(json!("lots"))), None);
        assert_eq!(v.errors["c"], "c must not be negative");
        assert_eq!(v.errors["d"], "d must be a number");
    }

    #[test]
    fn test_amounts_fit_money_columns() {
        let mut v = Validator::new();
        assert_eq!(v.required_amount("a", Some(json!("999999999999.99"))), Some(dec("999999999999.99")));
        assert_eq!(v.required_amount("b", Some(json!("1000000000000"))), None);
        assert_eq!(v.required_amount("c", Some(json!("999999999999.996"))), None);
        assert_eq!(v.optional_amount("d", Some(json!(1_000_000_000_000_000_i64))), None);
        assert_eq!(v.errors.len(), 3);
        assert_eq!(v.errors["b"], "b must be less than 1000000000000");
    }

    #[test]
    fn test_dates() {
        let mut v = Validator::new();
        assert_eq!(
            v.optional_date("hire_date", Some("2024-02-29".to_string())),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(v.optional_date("a", Some("2023-02-29".to_string())), None);
        assert_eq!(v.optional_date("b", Some("29/02/2024".to_string())), None);
        assert_eq!(v.nullable_date("end_date", Some(None)), Some(None));
        assert_eq!(v.errors.len(), 2);
    }

    #[test]
    fn test_flexible_booleans() {
        let mut v = Validator::new();
        assert_eq!(v.optional_bool("a", Some(json!(true))), Some(true));
        assert_eq!(v.optional_bool("b", Some(json!(0))), Some(false));
        assert_eq!(v.optional_bool("c", Some(json!("1"))), Some(true));
        assert_eq!(v.optional_bool("d", Some(json!("false"))), Some(false));
        assert_eq!(v.optional_bool("e", None), None);
        assert_eq!(v.optional_bool("f", Some(json!(2))), None);
        assert_eq!(v.errors.len(), 1);
    }

    #[test]
    fn test_enums() {
        let mut v = Validator::new();
        let allowed = ["full_time", "part_time", "contract", "temporary"];
        let parsed: Option<EmploymentType> = v.optional_enum("employment_type", Some("contract".to_string()), &allowed);
        assert_eq!(parsed, Some(EmploymentType::Contract));
        let bad: Option<EmploymentType> = v.optional_enum("employment_type", Some("gig".to_string()), &allowed);
        assert!(bad.is_none());
        assert_eq!(
            v.errors["employment_type"],
            "employment_type must be one of: full_time, part_time, contract, temporary"
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+hr@hospital.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@hospital.org"));
        assert!(!is_valid_email("a@b@c.org"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a@.org"));
        assert!(!is_valid_email("a b@c.org"));
    }

    #[test]
    fn test_emails_are_lowercased() {
        let mut v = Validator::new();
        assert_eq!(
            v.required_email("email", Some("Nurse.Joy@Hospital.ORG".to_string())),
            Some("nurse.joy@hospital.org".to_string())
        );
    }
}
