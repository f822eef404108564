//! Request body parsing and per-kind required-field schemas.
//!
//! Every kind declares an ordered list of rules; the first rule that fails
//! decides the message returned to the PMS. Nothing reaches the spool
//! without passing through [`validate`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::fiscal::FiscalKind;

pub const INVALID_JSON: &str = "Nieprawidlowy JSON";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Check {
    /// A string with at least one character.
    NonEmptyString,
    /// A JSON object (contents checked by later rules).
    Object,
    /// An array with at least one element.
    NonEmptyArray,
    /// A number strictly greater than zero.
    Positive,
    /// A number greater than or equal to zero.
    NonNegative,
}

impl Check {
    fn accepts(self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Check::NonEmptyString, Some(Value::String(s))) => !s.is_empty(),
            (Check::Object, Some(Value::Object(_))) => true,
            (Check::NonEmptyArray, Some(Value::Array(items))) => !items.is_empty(),
            (Check::Positive, Some(Value::Number(n))) => n.as_f64().is_some_and(|n| n > 0.0),
            (Check::NonNegative, Some(Value::Number(n))) => n.as_f64().is_some_and(|n| n >= 0.0),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Path from the payload root, e.g. `["company", "nip"]`.
    pub path: &'static [&'static str],
    pub check: Check,
    pub message: &'static str,
}

const fn rule(path: &'static [&'static str], check: Check, message: &'static str) -> FieldRule {
    FieldRule {
        path,
        check,
        message,
    }
}

const RECEIPT_RULES: &[FieldRule] = &[
    rule(&["transactionId"], Check::NonEmptyString, "Brak transactionId"),
    rule(&["reservationId"], Check::NonEmptyString, "Brak reservationId"),
    rule(&["items"], Check::NonEmptyArray, "Brak items"),
    rule(&["totalAmount"], Check::Positive, "Brak/nieprawidlowe totalAmount"),
    rule(&["paymentType"], Check::NonEmptyString, "Brak paymentType"),
];

const INVOICE_RULES: &[FieldRule] = &[
    rule(&["reservationId"], Check::NonEmptyString, "Brak reservationId"),
    rule(&["company"], Check::Object, "Brak company"),
    rule(&["company", "nip"], Check::NonEmptyString, "Brak company.nip"),
    rule(&["company", "name"], Check::NonEmptyString, "Brak company.name"),
    rule(&["items"], Check::NonEmptyArray, "Brak items"),
    rule(&["totalAmount"], Check::NonNegative, "Brak/nieprawidlowe totalAmount"),
];

const STORNO_RULES: &[FieldRule] = &[
    rule(
        &["originalReceiptNumber"],
        Check::NonEmptyString,
        "Brak originalReceiptNumber",
    ),
    rule(&["reason"], Check::NonEmptyString, "Brak reason"),
    rule(&["amount"], Check::Positive, "Brak/nieprawidlowe amount"),
];

/// Reports carry no required fields; any JSON object is accepted.
const REPORT_RULES: &[FieldRule] = &[];

/// Required-field schema for a kind.
pub fn rules(kind: FiscalKind) -> &'static [FieldRule] {
    match kind {
        FiscalKind::Receipt => RECEIPT_RULES,
        FiscalKind::Invoice => INVOICE_RULES,
        FiscalKind::ReportX | FiscalKind::ReportZ | FiscalKind::ReportPeriodic => REPORT_RULES,
        FiscalKind::Storno => STORNO_RULES,
    }
}

/// Parse a request body into a JSON object.
pub fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError(INVALID_JSON)),
    }
}

/// Check `payload` against the schema of `kind`.
pub fn validate(kind: FiscalKind, payload: &Map<String, Value>) -> Result<(), ValidationError> {
    for rule in rules(kind) {
        if !rule.check.accepts(lookup(payload, rule.path)) {
            return Err(ValidationError(rule.message));
        }
    }
    Ok(())
}

fn lookup<'a>(payload: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(payload.get(*first)?, |value, key| value.as_object()?.get(*key))
}
