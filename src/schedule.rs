//! Cron expression matching.
//!
//! Accepts standard 5-field Unix cron expressions (minute, hour, day-of-month,
//! month, day-of-week) as well as the 6-field form with a leading seconds
//! field. 5-field expressions match at minute resolution: any instant inside
//! a matching minute is due.

use chrono::{DateTime, Timelike, Utc};
use cron::Schedule;
use std::str::FromStr;

use crate::error::StoreError;

/// Convert a 5-field expression to the 6-field form the `cron` crate parses.
fn normalize(expression: &str) -> String {
    if expression.split_whitespace().count() == 5 {
        format!("0 {}", expression)
    } else {
        expression.to_string()
    }
}

fn parse(expression: &str) -> Result<Schedule, StoreError> {
    Schedule::from_str(&normalize(expression))
        .map_err(|e| StoreError::InvalidSchedule(format!("'{}': {}", expression, e)))
}

/// Check that an expression parses, without evaluating it.
pub fn validate(expression: &str) -> Result<(), StoreError> {
    parse(expression).map(|_| ())
}

/// Report whether `at` is one of the expression's trigger instants.
///
/// Pure: same inputs, same answer. 5-field expressions are evaluated against
/// the minute containing `at`; 6-field expressions match exact seconds.
pub fn is_due(expression: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
    let schedule = parse(expression)?;
    let at = if expression.split_whitespace().count() == 5 {
        at.with_second(0).unwrap_or(at)
    } else {
        at
    };
    Ok(schedule.includes(at))
}

/// Next trigger instant after now.
pub fn next_run(expression: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    Ok(parse(expression)?.upcoming(Utc).next())
}

/// Next trigger instant strictly after `after`.
pub fn next_run_after(
    expression: &str,
    after: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    Ok(parse(expression)?.after(&after).next())
}
