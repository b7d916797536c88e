//! Event assembly: resolving a [`Directive`] into a committable
//! [`EventDraft`].
//!
//! Resolution is strict. The extractor guarantees field types; this
//! module enforces the mutual-exclusion and range rules and anchors
//! everything to absolute UTC instants in the account's timezone.
//!
//! Rule order:
//! 1. `no-op` direction wins unconditionally.
//! 2. A later-hour offset excludes date, time, and early-minute fields.
//! 3. Otherwise exactly one of explicit date / relative date resolves the
//!    base day (a lone time means today); the time defaults when absent.
//! 4. An early-minute offset derives the remind stamp.
//! 5. A resolved stamp not in the future is stale: dropped, not an error.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use flashnote_core::defaults::{
    DEFAULT_EVENT_HOUR, EARLY_MINUTE_MAX, LATER_HOUR_MAX, LATER_HOUR_MIN,
};
use flashnote_core::{
    Direction, Directive, Error, EventDraft, LaterOption, LocalZone, RelativeDay, ReminderPolicy,
    Result,
};

/// Outcome of resolving a directive. Stale drafts and no-ops are
/// ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    NoOp,
    Stale,
    Draft(EventDraft),
}

/// Resolve `directive` against the dispatch start time `now` in the
/// account's timezone.
pub fn assemble(directive: &Directive, now: DateTime<Utc>, timezone: &str) -> Result<Assembly> {
    if directive.direction == Direction::NoOp {
        return Ok(Assembly::NoOp);
    }

    let description = directive
        .description
        .clone()
        .ok_or_else(|| Error::Validation("schedule directive without description".to_string()))?;

    let now_ms = now.timestamp_millis();

    if let Some(hours) = directive.later_hour_offset {
        return assemble_later(directive, description, hours, now_ms);
    }

    let zone = LocalZone::resolve(timezone);

    let base_date = match (directive.date, directive.relative_date) {
        (Some(_), Some(_)) => {
            return Err(Error::Validation(
                "date and relative date are mutually exclusive".to_string(),
            ))
        }
        (Some(date), None) => date,
        (None, Some(day)) => resolve_relative_day(day, zone.local_date(now)),
        (None, None) if directive.time.is_some() => zone.local_date(now),
        (None, None) => {
            return Err(Error::Validation(
                "schedule directive without temporal fields".to_string(),
            ))
        }
    };

    let time = directive
        .time
        .unwrap_or_else(default_event_time);
    let calendar_stamp = zone.to_utc_ms(base_date.and_time(time));

    let (remind_stamp, reminder) = match directive.early_minute_offset {
        Some(minutes) => {
            if minutes > EARLY_MINUTE_MAX {
                return Err(Error::Validation(format!(
                    "early minute offset {} out of range",
                    minutes
                )));
            }
            (
                calendar_stamp - i64::from(minutes) * 60_000,
                ReminderPolicy::Early {
                    early_minute: minutes,
                },
            )
        }
        None => (calendar_stamp, ReminderPolicy::default()),
    };

    if calendar_stamp <= now_ms {
        debug!(calendar_stamp, now_ms, "resolved stamp is not in the future");
        return Ok(Assembly::Stale);
    }

    Ok(Assembly::Draft(EventDraft {
        body_override: Some(description.clone()),
        description,
        calendar_stamp,
        remind_stamp,
        reminder,
    }))
}

fn assemble_later(
    directive: &Directive,
    description: String,
    hours: f64,
    now_ms: i64,
) -> Result<Assembly> {
    if directive.date.is_some()
        || directive.time.is_some()
        || directive.relative_date.is_some()
        || directive.early_minute_offset.is_some()
    {
        return Err(Error::Validation(
            "later hour offset conflicts with date, time, or early minute fields".to_string(),
        ));
    }
    if !hours.is_finite() || !(LATER_HOUR_MIN..=LATER_HOUR_MAX).contains(&hours) {
        return Err(Error::Validation(format!(
            "later hour offset {} out of range",
            hours
        )));
    }

    let calendar_stamp = now_ms + (hours * 3_600_000.0).round() as i64;
    if calendar_stamp <= now_ms {
        return Ok(Assembly::Stale);
    }

    let reminder = match LaterOption::from_hours(hours) {
        Some(later) => ReminderPolicy::Later { later },
        None => ReminderPolicy::SpecificTime {
            specific_stamp: calendar_stamp,
        },
    };

    Ok(Assembly::Draft(EventDraft {
        body_override: Some(description.clone()),
        description,
        calendar_stamp,
        remind_stamp: calendar_stamp,
        reminder,
    }))
}

/// Resolve a keyword day against today's local date. Weekday names
/// always mean the next such weekday, never today.
fn resolve_relative_day(day: RelativeDay, today: NaiveDate) -> NaiveDate {
    match day {
        RelativeDay::Today => today,
        RelativeDay::Tomorrow => today + Duration::days(1),
        RelativeDay::DayAfterTomorrow => today + Duration::days(2),
        weekday => {
            let target = i64::from(weekday.weekday_index().unwrap_or(0));
            let current = i64::from(today.weekday().num_days_from_sunday());
            let mut ahead = target - current;
            if ahead <= 0 {
                ahead += 7;
            }
            today + Duration::days(ahead)
        }
    }
}

fn default_event_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_EVENT_HOUR, 0, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is valid"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use flashnote_core::Direction;

    const TZ: &str = "Asia/Shanghai";

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn schedule_directive() -> Directive {
        Directive {
            direction: Direction::Schedule,
            description: Some("拿快递".to_string()),
            ..Directive::default()
        }
    }

    fn draft(assembly: Assembly) -> EventDraft {
        match assembly {
            Assembly::Draft(d) => d,
            other => panic!("expected draft, got {:?}", other),
        }
    }

    #[test]
    fn noop_direction_wins_over_everything() {
        let directive = Directive {
            direction: Direction::NoOp,
            later_hour_offset: Some(999.0),
            ..Directive::default()
        };
        let out = assemble(&directive, Utc::now(), TZ).unwrap();
        assert_eq!(out, Assembly::NoOp);
    }

    #[test]
    fn later_hour_adds_exact_milliseconds() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.later_hour_offset = Some(1.0);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        assert_eq!(d.calendar_stamp, now.timestamp_millis() + 3_600_000);
        assert_eq!(d.remind_stamp, d.calendar_stamp);
        assert_eq!(
            d.reminder,
            ReminderPolicy::Later {
                later: LaterOption::OneHour
            }
        );
    }

    #[test]
    fn later_hour_fraction_maps_to_specific_time() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.later_hour_offset = Some(1.5);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        let expected = now.timestamp_millis() + 5_400_000;
        assert_eq!(d.calendar_stamp, expected);
        assert_eq!(
            d.reminder,
            ReminderPolicy::SpecificTime {
                specific_stamp: expected
            }
        );
    }

    #[test]
    fn later_hour_bounds_are_enforced() {
        for hours in [0.1, 24.5, -1.0, f64::NAN] {
            let mut directive = schedule_directive();
            directive.later_hour_offset = Some(hours);
            let err = assemble(&directive, Utc::now(), TZ).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "hours = {}", hours);
        }
    }

    #[test]
    fn later_hour_boundary_values_pass() {
        for hours in [0.25, 24.0] {
            let mut directive = schedule_directive();
            directive.later_hour_offset = Some(hours);
            assert!(matches!(
                assemble(&directive, Utc::now(), TZ).unwrap(),
                Assembly::Draft(_)
            ));
        }
    }

    #[test]
    fn later_hour_conflicts_with_date() {
        let mut directive = schedule_directive();
        directive.later_hour_offset = Some(1.0);
        directive.date = NaiveDate::from_ymd_opt(2025, 8, 7);
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn later_hour_conflicts_with_time() {
        let mut directive = schedule_directive();
        directive.later_hour_offset = Some(1.0);
        directive.time = NaiveTime::from_hms_opt(20, 0, 0);
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn later_hour_conflicts_with_early_minute() {
        let mut directive = schedule_directive();
        directive.later_hour_offset = Some(1.0);
        directive.early_minute_offset = Some(10);
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn date_and_relative_date_conflict() {
        let mut directive = schedule_directive();
        directive.date = NaiveDate::from_ymd_opt(2025, 8, 7);
        directive.relative_date = Some(RelativeDay::Tomorrow);
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn explicit_date_and_time_resolve_in_local_zone() {
        // 2025-08-06 04:41 UTC is 12:41 in UTC+8
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.date = NaiveDate::from_ymd_opt(2025, 8, 6);
        directive.time = NaiveTime::from_hms_opt(12, 53, 0);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        // 12:53 local = 04:53 UTC
        assert_eq!(
            d.calendar_stamp,
            utc("2025-08-06T04:53:00Z").timestamp_millis()
        );
    }

    #[test]
    fn missing_time_defaults_to_morning() {
        let now = utc("2025-08-06T01:00:00Z");
        let mut directive = schedule_directive();
        directive.relative_date = Some(RelativeDay::Tomorrow);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        // Tomorrow local is 2025-08-07; 09:00 local = 01:00 UTC
        assert_eq!(
            d.calendar_stamp,
            utc("2025-08-07T01:00:00Z").timestamp_millis()
        );
    }

    #[test]
    fn lone_time_means_today() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.time = NaiveTime::from_hms_opt(22, 0, 0);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        // 22:00 local today = 14:00 UTC
        assert_eq!(
            d.calendar_stamp,
            utc("2025-08-06T14:00:00Z").timestamp_millis()
        );
    }

    #[test]
    fn early_minute_subtracts_exact_milliseconds() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.relative_date = Some(RelativeDay::Tomorrow);
        directive.time = NaiveTime::from_hms_opt(20, 0, 0);
        directive.early_minute_offset = Some(30);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        assert_eq!(d.remind_stamp, d.calendar_stamp - 30 * 60_000);
        assert_eq!(d.reminder, ReminderPolicy::Early { early_minute: 30 });
    }

    #[test]
    fn early_minute_zero_means_on_time() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.relative_date = Some(RelativeDay::Tomorrow);
        directive.early_minute_offset = Some(0);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        assert_eq!(d.remind_stamp, d.calendar_stamp);
        assert_eq!(d.reminder, ReminderPolicy::Early { early_minute: 0 });
    }

    #[test]
    fn early_minute_above_one_day_is_rejected() {
        let mut directive = schedule_directive();
        directive.relative_date = Some(RelativeDay::Tomorrow);
        directive.early_minute_offset = Some(1441);
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn no_temporal_fields_is_a_validation_error() {
        let directive = schedule_directive();
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn missing_description_is_a_validation_error() {
        let directive = Directive {
            direction: Direction::Schedule,
            later_hour_offset: Some(1.0),
            ..Directive::default()
        };
        assert!(matches!(
            assemble(&directive, Utc::now(), TZ).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn past_stamp_is_stale_not_error() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.date = NaiveDate::from_ymd_opt(2025, 8, 5);
        directive.time = NaiveTime::from_hms_opt(10, 0, 0);

        assert_eq!(assemble(&directive, now, TZ).unwrap(), Assembly::Stale);
    }

    #[test]
    fn today_default_time_already_passed_is_stale() {
        // 12:41 local, date today, no time → default 09:00 is in the past
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.relative_date = Some(RelativeDay::Today);

        assert_eq!(assemble(&directive, now, TZ).unwrap(), Assembly::Stale);
    }

    #[test]
    fn weekday_always_resolves_forward() {
        // 2025-08-06 is a Wednesday (local)
        let wednesday = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert_eq!(
            resolve_relative_day(RelativeDay::Friday, wednesday),
            NaiveDate::from_ymd_opt(2025, 8, 8).unwrap()
        );
        // Same weekday means next week, not today
        assert_eq!(
            resolve_relative_day(RelativeDay::Wednesday, wednesday),
            NaiveDate::from_ymd_opt(2025, 8, 13).unwrap()
        );
        // Earlier weekday wraps into next week
        assert_eq!(
            resolve_relative_day(RelativeDay::Monday, wednesday),
            NaiveDate::from_ymd_opt(2025, 8, 11).unwrap()
        );
    }

    #[test]
    fn malformed_timezone_falls_back_to_default_offset() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.date = NaiveDate::from_ymd_opt(2025, 8, 6);
        directive.time = NaiveTime::from_hms_opt(22, 0, 0);

        let d = draft(assemble(&directive, now, "Invalid/Zone").unwrap());
        // Fallback offset UTC+8: 22:00 local = 14:00 UTC
        assert_eq!(
            d.calendar_stamp,
            utc("2025-08-06T14:00:00Z").timestamp_millis()
        );
    }

    #[test]
    fn draft_carries_body_override() {
        let now = utc("2025-08-06T04:41:00Z");
        let mut directive = schedule_directive();
        directive.later_hour_offset = Some(1.0);

        let d = draft(assemble(&directive, now, TZ).unwrap());
        assert_eq!(d.body_override.as_deref(), Some("拿快递"));
    }
}
