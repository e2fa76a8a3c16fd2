//! Shape and enum checks for fund records, run before anything touches storage.
//!
//! Every check runs; callers get the complete list of violations rather than
//! the first one.

use chrono::{DateTime, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::database::record::FundContent;
use crate::types::{is_approver, Category, FundKind, Source, APPROVERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub fn validate_incoming(data: &Value) -> Vec<FieldError> {
    parse_incoming(data).err().unwrap_or_default()
}

pub fn validate_outgoing(data: &Value) -> Vec<FieldError> {
    parse_outgoing(data).err().unwrap_or_default()
}

/// Validate `data` for the given table and build its typed content
pub fn parse_content(kind: FundKind, data: &Value) -> Result<FundContent, Vec<FieldError>> {
    match kind {
        FundKind::Incoming => parse_incoming(data),
        FundKind::Outgoing => parse_outgoing(data),
    }
}

pub fn parse_incoming(data: &Value) -> Result<FundContent, Vec<FieldError>> {
    let mut c = Checker::new(data)?;
    let date = c.date();
    let amount = c.amount();
    let source = c.choice("source", Source::parse, &Source::ALL.map(|s| s.as_str()));
    let approved_by = c.approver();
    let donor_initials = c.optional_text("donor_initials");
    let purpose_note = c.optional_text("purpose_note");

    match (date, amount, source, approved_by) {
        (Some(date), Some(amount), Some(source), Some(approved_by)) if c.errors.is_empty() => Ok(
            FundContent::incoming(date, amount, source, donor_initials, purpose_note, approved_by),
        ),
        _ => Err(c.errors),
    }
}

pub fn parse_outgoing(data: &Value) -> Result<FundContent, Vec<FieldError>> {
    let mut c = Checker::new(data)?;
    let date = c.date();
    let amount = c.amount();
    let recipient = c.required_text("recipient");
    let purpose = c.required_text("purpose");
    let category = c.choice("category", Category::parse, &Category::ALL.map(|c| c.as_str()));
    let approved_by = c.approver();

    match (date, amount, recipient, purpose, category, approved_by) {
        (Some(date), Some(amount), Some(recipient), Some(purpose), Some(category), Some(approved_by))
            if c.errors.is_empty() =>
        {
            Ok(FundContent::outgoing(date, amount, recipient, purpose, category, approved_by))
        }
        _ => Err(c.errors),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date part kept)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

/// Accepts JSON numbers and numeric strings
/// Largest amount a `NUMERIC(14, 2)` column holds
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

pub fn parse_amount(raw: &Value) -> Option<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

struct Checker<'a> {
    data: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Checker<'a> {
    fn new(data: &'a Value) -> Result<Self, Vec<FieldError>> {
        match data.as_object() {
            Some(data) => Ok(Self {
                data,
                errors: Vec::new(),
            }),
            None => Err(vec![FieldError::new("data", "data must be an object")]),
        }
    }

    /// Present, non-null and not blank
    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.data.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    fn text(&self, field: &str) -> Option<String> {
        match self.present(field)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn date(&mut self) -> Option<NaiveDate> {
        let Some(raw) = self.present("date") else {
            self.errors.push(FieldError::new("date", "date is required"));
            return None;
        };
        let parsed = raw.as_str().and_then(parse_date);
        if parsed.is_none() {
            self.errors
                .push(FieldError::new("date", "date must be a valid date (YYYY-MM-DD)"));
        }
        parsed
    }

    fn amount(&mut self) -> Option<Decimal> {
        let Some(raw) = self.present("amount") else {
            self.errors.push(FieldError::new("amount", "amount is required"));
            return None;
        };
        match parse_amount(raw) {
            Some(amount) if !amount.is_sign_negative() || amount.is_zero() => {
                // Stored as NUMERIC(14, 2)
                let mut amount = amount
                    .abs()
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                if amount > max_amount() {
                    self.errors.push(FieldError::new(
                        "amount",
                        format!("amount must not exceed {}", max_amount()),
                    ));
                    return None;
                }
                amount.rescale(2);
                Some(amount)
            }
            _ => {
                self.errors
                    .push(FieldError::new("amount", "amount must be a non-negative number"));
                None
            }
        }
    }

    fn required_text(&mut self, field: &str) -> Option<String> {
        let value = self.text(field);
        if value.is_none() {
            self.errors
                .push(FieldError::new(field, format!("{} is required", field)));
        }
        value
    }

    fn optional_text(&self, field: &str) -> Option<String> {
        self.text(field)
    }

    fn choice<T>(&mut self, field: &str, parse: fn(&str) -> Option<T>, allowed: &[&str]) -> Option<T> {
        let raw = self.required_text(field)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            self.errors.push(FieldError::new(
                field,
                format!("{} must be one of: {}", field, allowed.join(", ")),
            ));
        }
        parsed
    }

    fn approver(&mut self) -> Option<String> {
        self.choice(
            "approved_by",
            |name| is_approver(name).then(|| name.to_string()),
            &APPROVERS,
        )
    }
}
