//! Schedule evaluator
//!
//! Decides whether a game should be running at a given instant from its weekly
//! start/stop window. Expressions are accepted in two syntaxes:
//!
//! - 5-field crontab: `minute hour day-of-month month day-of-week`, weekday
//!   0-7 with Sunday as 0 or 7, or `SUN`..`SAT`
//! - scheduler form: `cron(minute hour day-of-month month day-of-week year)`
//!   with `?` wildcards and weekday 1-7 with Sunday as 1
//!
//! Both are rewritten to the seconds-first 7-field form of the `cron` crate,
//! which numbers weekdays 1-7 from Sunday. All evaluation happens in UTC.
//!
//! A crontab expression restricting both day-of-month and day-of-week fires
//! on either match, as cron does. The `cron` crate requires both, so such an
//! expression is kept as two schedules and the earlier firing wins. The
//! scheduler form never restricts both: one of the two must be `?`.
//!
//! The window test compares the next start against the next stop: if the
//! stop comes first we are past a start and before its stop. This only holds
//! when the two expressions alternate once per cycle.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use gamehost_models::{GameCatalog, GameProperties, ScheduleWindow};

use crate::error::ScheduleError;

const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// A parsed recurring schedule expression
#[derive(Debug, Clone)]
pub struct ScheduleExpr {
    source: String,
    schedules: Vec<Schedule>,
}

impl ScheduleExpr {
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let source = expr.trim();
        let normalized = match source
            .strip_prefix("cron(")
            .and_then(|inner| inner.strip_suffix(')'))
        {
            Some(inner) => vec![from_scheduler_form(source, inner)?],
            None => from_crontab(source)?,
        };

        let schedules = normalized
            .iter()
            .map(|expr| {
                Schedule::from_str(expr).map_err(|e| ScheduleError::Parse {
                    expr: source.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: source.to_string(),
            schedules,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// First occurrence strictly after `now`
    pub fn next_after(&self, now: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(now).next())
            .min()
    }
}

fn from_crontab(source: &str) -> Result<Vec<String>, ScheduleError> {
    let fields: Vec<&str> = source.split_whitespace().collect();
    let [minute, hour, dom, month, dow] = fields[..] else {
        return Err(ScheduleError::FieldCount {
            expr: source.to_string(),
            count: fields.len(),
        });
    };

    let month = map_field(source, month, (1, 12), month_ordinal)?;
    let dow = map_field(source, dow, (1, 7), |token| {
        weekday_ordinal(token).or_else(|| match token.parse::<u32>() {
            Ok(n @ 0..=7) => Some(n % 7 + 1),
            _ => None,
        })
    })?;

    if restricted(dom) && restricted(&dow) {
        return Ok(vec![
            format!("0 {} {} {} {} * *", minute, hour, dom, month),
            format!("0 {} {} * {} {} *", minute, hour, month, dow),
        ]);
    }
    Ok(vec![format!("0 {} {} {} {} {} *", minute, hour, wildcard(dom), month, dow)])
}

fn from_scheduler_form(source: &str, inner: &str) -> Result<String, ScheduleError> {
    let fields: Vec<&str> = inner.split_whitespace().collect();
    let [minute, hour, dom, month, dow, year] = fields[..] else {
        return Err(ScheduleError::FieldCount {
            expr: source.to_string(),
            count: fields.len(),
        });
    };

    let month = map_field(source, month, (1, 12), month_ordinal)?;
    let dow = map_field(source, dow, (1, 7), |token| {
        weekday_ordinal(token).or_else(|| match token.parse::<u32>() {
            Ok(n @ 1..=7) => Some(n),
            _ => None,
        })
    })?;

    Ok(format!(
        "0 {} {} {} {} {} {}",
        minute,
        hour,
        wildcard(dom),
        month,
        dow,
        wildcard(year)
    ))
}

/// Crontab treats a day field starting with `*` as unrestricted, even with a step
fn restricted(field: &str) -> bool {
    !field.starts_with('*') && field != "?"
}

fn wildcard(field: &str) -> &str {
    if field == "?" {
        "*"
    } else {
        field
    }
}

fn weekday_ordinal(token: &str) -> Option<u32> {
    let upper = token.to_ascii_uppercase();
    WEEKDAYS
        .iter()
        .position(|d| upper.starts_with(d))
        .map(|idx| idx as u32 + 1)
}

fn month_ordinal(token: &str) -> Option<u32> {
    let upper = token.to_ascii_uppercase();
    MONTHS
        .iter()
        .position(|m| upper.starts_with(m))
        .map(|idx| idx as u32 + 1)
        .or_else(|| match token.parse::<u32>() {
            Ok(n @ 1..=12) => Some(n),
            _ => None,
        })
}

/// Rewrite every value in a list/range/step field through `ordinal`
///
/// `domain` is the `cron` crate's range for the field. A range whose mapped
/// end falls below its start wraps around the domain (`FRI-SUN` becomes
/// `6-7,1`); one whose distinct ends land on the same value (crontab `0-7`)
/// covers the whole domain.
fn map_field(
    source: &str,
    field: &str,
    domain: (u32, u32),
    ordinal: impl Fn(&str) -> Option<u32>,
) -> Result<String, ScheduleError> {
    let value = |token: &str| {
        ordinal(token).ok_or_else(|| ScheduleError::Parse {
            expr: source.to_string(),
            message: format!("unrecognised value '{}' in field '{}'", token, field),
        })
    };
    let (min, max) = domain;

    let mut items = Vec::new();
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };

        let tokens: Vec<&str> = range.split('-').collect();
        let mapped = match tokens[..] {
            ["*" | "?"] => "*".to_string(),
            [single] => value(single)?.to_string(),
            [lo_token, hi_token] => {
                let (lo, hi) = (value(lo_token)?, value(hi_token)?);
                if lo == hi && lo_token != hi_token {
                    format!("{}-{}", min, max)
                } else if hi < lo {
                    if step.is_some() {
                        return Err(ScheduleError::Parse {
                            expr: source.to_string(),
                            message: format!("stepped range '{}' wraps around", item),
                        });
                    }
                    if hi == min {
                        format!("{}-{},{}", lo, max, min)
                    } else {
                        format!("{}-{},{}-{}", lo, max, min, hi)
                    }
                } else {
                    format!("{}-{}", lo, hi)
                }
            }
            _ => {
                return Err(ScheduleError::Parse {
                    expr: source.to_string(),
                    message: format!("malformed range '{}' in field '{}'", range, field),
                })
            }
        };

        items.push(match step {
            Some(step) => format!("{}/{}", mapped, step),
            None => mapped,
        });
    }
    Ok(items.join(","))
}

/// Next start and stop of a window after `now`
pub fn next_transitions(
    window: &ScheduleWindow,
    now: &DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ScheduleError> {
    let start = ScheduleExpr::parse(&window.start)?;
    let stop = ScheduleExpr::parse(&window.stop)?;

    let next_start = start
        .next_after(now)
        .ok_or_else(|| ScheduleError::NoUpcoming(start.source().to_string()))?;
    let next_stop = stop
        .next_after(now)
        .ok_or_else(|| ScheduleError::NoUpcoming(stop.source().to_string()))?;

    Ok((next_start, next_stop))
}

/// Whether compute should be running at `now`
///
/// With a window: true iff the next start is later than the next stop.
/// Without one: the static `auto_start` flag.
pub fn is_operational(
    window: Option<&ScheduleWindow>,
    auto_start: bool,
    now: &DateTime<Utc>,
) -> Result<bool, ScheduleError> {
    match window {
        Some(window) => {
            let (next_start, next_stop) = next_transitions(window, now)?;
            Ok(next_start > next_stop)
        }
        None => Ok(auto_start),
    }
}

pub fn game_is_operational(game: &GameProperties, now: &DateTime<Utc>) -> Result<bool, ScheduleError> {
    is_operational(game.schedule.as_ref(), game.auto_start, now).map_err(|e| ScheduleError::Game {
        game: game.name.clone(),
        source: Box::new(e),
    })
}

/// Check that every schedule expression in the catalog parses
pub fn check_catalog(catalog: &GameCatalog) -> Result<(), ScheduleError> {
    for game in &catalog.games {
        if let Some(window) = &game.schedule {
            for expr in [&window.start, &window.stop] {
                ScheduleExpr::parse(expr).map_err(|e| ScheduleError::Game {
                    game: game.name.clone(),
                    source: Box::new(e),
                })?;
            }
        }
    }
    Ok(())
}
