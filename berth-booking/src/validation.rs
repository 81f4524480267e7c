use berth_core::booking::{Gender, Passenger};
use berth_core::{CoreError, CoreResult};
use berth_shared::Masked;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::Value;

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;

/// `YYYY-MM-DD`, or an RFC 3339 timestamp read as a calendar day in `offset`.
pub fn parse_calendar_date(raw: &str, offset: FixedOffset) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&offset).date_naive())
    })
}

/// Travel must be today or later; only the calendar day is compared.
pub fn validate_travel_date(raw: &str, today: NaiveDate, offset: FixedOffset) -> CoreResult<NaiveDate> {
    let date = parse_calendar_date(raw, offset).ok_or_else(|| CoreError::invalid("Invalid travel date"))?;
    if date < today {
        return Err(CoreError::invalid("Travel date cannot be in the past"));
    }
    Ok(date)
}

/// Integer ages, given either as a JSON number or a numeric string.
pub fn parse_age(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Checks every passenger in order and stops at the first problem.
pub fn validate_passengers(raw: &[Value]) -> CoreResult<Vec<Passenger>> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| validate_passenger(index + 1, value))
        .collect()
}

fn validate_passenger(position: usize, value: &Value) -> CoreResult<Passenger> {
    let fields = value
        .as_object()
        .ok_or_else(|| CoreError::invalid("Invalid passenger format"))?;

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CoreError::invalid(format!("Passenger {} must have a valid name", position)))?;

    let age = fields
        .get("age")
        .and_then(parse_age)
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
        .and_then(|age| u8::try_from(age).ok())
        .ok_or_else(|| CoreError::invalid(format!("Passenger {} must have a valid age", position)))?;

    let gender = fields
        .get("gender")
        .and_then(Value::as_str)
        .and_then(Gender::parse)
        .ok_or_else(|| CoreError::invalid(format!("Passenger {} must have a valid gender", position)))?;

    let seat_number = fields
        .get("seatNumber")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Passenger {
        name: Masked::new(name.to_string()),
        age,
        gender,
        seat_number,
    })
}
