//! Entry validation.
//!
//! Both create and update go through the same rule set:
//!
//! 1. `mensaje` (and `createdBy`) are dropped from the payload.
//! 2. The seven common fields `tipo`, `claimantName`, `expenseDate`, `reason`,
//!    `costCenter`, `branch` and `folio` must be present and non-blank.
//! 3. `tipo` selects the variant rules:
//!    - `fuel` needs `origin`, `destination`, `startKm` and `endKm`; `km` is
//!      `endKm - startKm` unless the payload carries a finite `km`.
//!    - `expense` needs `amountToJustify`.
//! 4. `expenseDate` is parsed.
//!
//! Payload values are coerced the way loosely typed clients expect: numbers
//! and booleans count as text, numeric strings count as numbers.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    Entry, EntryDetails, EntryKind, ExpenseClaim, FuelTrip, Identity, NewEntry, ServiceType,
    entry::{EXPENSE, FUEL},
    util::normalize_optional,
};

/// Payload keys that are accepted but never read.
const IGNORED_KEYS: [&str; 2] = ["mensaje", "createdBy"];

const COMMON_FIELDS: [&str; 7] = [
    "tipo",
    "claimantName",
    "expenseDate",
    "reason",
    "costCenter",
    "branch",
    "folio",
];

/// Why an entry payload was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<&'static str>),
    #[error("missing fuel fields: {}", .0.join(", "))]
    MissingFuelFields(Vec<&'static str>),
    #[error("invalid km: endKm must be greater than or equal to startKm")]
    InvalidKm,
    #[error("missing amountToJustify")]
    MissingAmount,
    #[error("amountToJustify must be a number, got {0:?}")]
    InvalidAmount(String),
    #[error("unsupported tipo {0:?}, expected \"fuel\" or \"expense\"")]
    UnsupportedType(String),
    #[error("costCenter must be exactly four digits, got {0:?}")]
    InvalidCostCenter(String),
    #[error("unsupported serviceType {0:?}")]
    UnsupportedServiceType(String),
    #[error("expenseDate is not a valid date: {0:?}")]
    InvalidDate(String),
}

/// Validate a create payload on behalf of `owner`.
pub fn validate_create(owner: &Identity, payload: Map<String, Value>) -> Result<NewEntry, Rejection> {
    let draft = Draft::parse(strip_ignored(payload))?;

    Ok(NewEntry {
        created_by: owner.user_id.clone(),
        details: EntryDetails {
            claimant_name: draft.claimant_name,
            expense_date: draft.expense_date,
            reason: draft.reason,
            cost_center: draft.cost_center,
            branch: draft.branch,
            folio: draft.folio,
            notes: draft.notes.flatten(),
            service_type: draft.service_type.flatten(),
        },
        kind: draft.kind,
    })
}

/// Validate an update payload against the stored entry.
///
/// The result is rebuilt from the payload: the variant always comes from the
/// new `tipo`, so no field of the previous variant survives. Identity and
/// timestamps come from `existing`. An omitted `expenseDate`, `notes` or
/// `serviceType` keeps the stored value.
pub fn validate_update(existing: &Entry, payload: Map<String, Value>) -> Result<Entry, Rejection> {
    let draft = Draft::parse(strip_ignored(payload))?;
    let previous = &existing.details;

    Ok(Entry {
        id: existing.id,
        created_by: existing.created_by.clone(),
        details: EntryDetails {
            claimant_name: draft.claimant_name,
            expense_date: draft.expense_date.or(previous.expense_date),
            reason: draft.reason,
            cost_center: draft.cost_center,
            branch: draft.branch,
            folio: draft.folio,
            notes: draft.notes.unwrap_or_else(|| previous.notes.clone()),
            service_type: draft.service_type.unwrap_or(previous.service_type),
        },
        kind: draft.kind,
        created_at: existing.created_at,
        updated_at: existing.updated_at,
    })
}

fn strip_ignored(mut payload: Map<String, Value>) -> Map<String, Value> {
    for key in IGNORED_KEYS {
        payload.remove(key);
    }
    payload
}

/// Fields common to create and update once the payload passed every rule.
///
/// Optional fields are `None` when the key is absent and `Some(None)` when the
/// key is present but blank or null.
struct Draft {
    claimant_name: String,
    expense_date: Option<DateTime<Utc>>,
    reason: String,
    cost_center: String,
    branch: String,
    folio: String,
    notes: Option<Option<String>>,
    service_type: Option<Option<ServiceType>>,
    kind: EntryKind,
}

impl Draft {
    fn parse(payload: Map<String, Value>) -> Result<Self, Rejection> {
        let missing: Vec<&'static str> = COMMON_FIELDS
            .into_iter()
            .filter(|key| required_text(&payload, key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Rejection::MissingRequiredFields(missing));
        }
        let field = |key: &str| required_text(&payload, key).unwrap_or_default();

        let cost_center = field("costCenter");
        if !is_cost_center(&cost_center) {
            return Err(Rejection::InvalidCostCenter(cost_center));
        }

        let service_type = match payload.get("serviceType") {
            None => None,
            Some(value) => Some(
                normalize_optional(as_text(value).as_deref())
                    .map(|label| {
                        ServiceType::try_from(label.as_str())
                            .map_err(Rejection::UnsupportedServiceType)
                    })
                    .transpose()?,
            ),
        };

        let kind = match field("tipo").as_str() {
            FUEL => EntryKind::Fuel(fuel_trip(&payload)?),
            EXPENSE => EntryKind::Expense(expense_claim(&payload)?),
            other => return Err(Rejection::UnsupportedType(other.to_string())),
        };

        let expense_date = payload.get("expenseDate").map(parse_date).transpose()?;

        Ok(Self {
            claimant_name: field("claimantName"),
            expense_date,
            reason: field("reason"),
            cost_center,
            branch: field("branch"),
            folio: field("folio"),
            notes: payload
                .get("notes")
                .map(|value| normalize_optional(as_text(value).as_deref())),
            service_type,
            kind,
        })
    }
}

fn fuel_trip(payload: &Map<String, Value>) -> Result<FuelTrip, Rejection> {
    let origin = required_text(payload, "origin");
    let destination = required_text(payload, "destination");
    let start = payload.get("startKm");
    let end = payload.get("endKm");

    let (Some(origin), Some(destination), Some(start), Some(end)) =
        (origin.clone(), destination.clone(), start, end)
    else {
        let missing = [
            ("origin", origin.is_none()),
            ("destination", destination.is_none()),
            ("startKm", start.is_none()),
            ("endKm", end.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, is_missing)| is_missing.then_some(key))
        .collect();
        return Err(Rejection::MissingFuelFields(missing));
    };

    let start_km = as_number(start);
    let end_km = as_number(end);
    if !start_km.is_finite() || !end_km.is_finite() {
        return Err(Rejection::InvalidKm);
    }

    // A finite km sent by the client wins over the odometer difference.
    let km = explicit_km(payload.get("km")).unwrap_or(end_km - start_km);
    if !km.is_finite() || km < 0.0 {
        return Err(Rejection::InvalidKm);
    }

    Ok(FuelTrip {
        origin,
        destination,
        start_km,
        end_km,
        km,
    })
}

/// Null or blank `km` means "not supplied" and falls back to the odometer
/// difference, rather than claiming zero kilometres.
fn explicit_km(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(as_number(value)).filter(|km| km.is_finite()),
    }
}

fn expense_claim(payload: &Map<String, Value>) -> Result<ExpenseClaim, Rejection> {
    // A null amount counts as missing, not as the text "null".
    let raw = payload
        .get("amountToJustify")
        .and_then(as_text)
        .filter(|text| !text.is_empty())
        .ok_or(Rejection::MissingAmount)?;

    let amount_to_justify = raw.trim().parse::<f64>().unwrap_or(f64::NAN);
    if !amount_to_justify.is_finite() {
        return Err(Rejection::InvalidAmount(raw));
    }
    Ok(ExpenseClaim { amount_to_justify })
}

fn is_cost_center(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Text of a scalar value; `None` for null, arrays and objects.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Trimmed text of `key`, or `None` if the field counts as missing.
fn required_text(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(as_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Numeric value of a payload field. Null and blank strings are zero,
/// anything unparseable is NaN.
fn as_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD` dates, naive `YYYY-MM-DDTHH:MM:SS`
/// timestamps (read as UTC) and epoch milliseconds.
fn parse_date(value: &Value) -> Result<DateTime<Utc>, Rejection> {
    let invalid = || Rejection::InvalidDate(value.to_string());
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc());
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.and_utc())
                .map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}
