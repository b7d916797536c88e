//! Shared data model for the classification and dispatch pipeline.
//!
//! The flow through these types: a model reply parses into a [`Directive`]
//! (raw decision, unvalidated temporal fields), the assembler resolves it
//! into an [`EventDraft`] (absolute stamps, ready to commit), and the
//! guarded commit writes a [`Schedule`] plus [`Provenance`] onto the
//! target [`NoteRecord`] or [`TaskRecord`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// DIRECTIVE — parsed model output
// =============================================================================

/// The classifier's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Nothing schedulable in the message.
    #[default]
    NoOp,
    /// The message implies an event; temporal fields follow.
    Schedule,
}

/// Keyword date relative to "now" in the account's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDay {
    Today,
    Tomorrow,
    DayAfterTomorrow,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl RelativeDay {
    /// All accepted keyword spellings, in prompt order.
    pub const KEYWORDS: [&'static str; 10] = [
        "today",
        "tomorrow",
        "day_after_tomorrow",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];

    /// Weekday index with Sunday = 0, or `None` for the relative variants.
    pub fn weekday_index(&self) -> Option<u32> {
        match self {
            RelativeDay::Sunday => Some(0),
            RelativeDay::Monday => Some(1),
            RelativeDay::Tuesday => Some(2),
            RelativeDay::Wednesday => Some(3),
            RelativeDay::Thursday => Some(4),
            RelativeDay::Friday => Some(5),
            RelativeDay::Saturday => Some(6),
            _ => None,
        }
    }
}

impl std::str::FromStr for RelativeDay {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "today" => Ok(RelativeDay::Today),
            "tomorrow" => Ok(RelativeDay::Tomorrow),
            "day_after_tomorrow" => Ok(RelativeDay::DayAfterTomorrow),
            "monday" => Ok(RelativeDay::Monday),
            "tuesday" => Ok(RelativeDay::Tuesday),
            "wednesday" => Ok(RelativeDay::Wednesday),
            "thursday" => Ok(RelativeDay::Thursday),
            "friday" => Ok(RelativeDay::Friday),
            "saturday" => Ok(RelativeDay::Saturday),
            "sunday" => Ok(RelativeDay::Sunday),
            _ => Err(()),
        }
    }
}

/// Parsed model output: the classification decision plus any extracted,
/// not-yet-validated temporal fields.
///
/// Mutual-exclusion rules between the fields are enforced by the
/// assembler, not here — a `Directive` can be contradictory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directive {
    pub direction: Direction,
    pub description: Option<String>,
    /// Explicit date (`YYYY-MM-DD`).
    pub date: Option<NaiveDate>,
    /// Explicit time-of-day (`HH:MM`).
    pub time: Option<NaiveTime>,
    /// Keyword date; mutually exclusive with `date`.
    pub relative_date: Option<RelativeDay>,
    /// Remind this many minutes before the event.
    pub early_minute_offset: Option<u32>,
    /// Event happens this many hours from now; mutually exclusive with
    /// `date`, `time`, and `early_minute_offset`.
    pub later_hour_offset: Option<f64>,
}

// =============================================================================
// EVENT DRAFT — resolved, committable schedule
// =============================================================================

/// Named relative-reminder choices for round "later" offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaterOption {
    #[serde(rename = "30min")]
    ThirtyMin,
    #[serde(rename = "1hr")]
    OneHour,
    #[serde(rename = "2hr")]
    TwoHours,
    #[serde(rename = "3hr")]
    ThreeHours,
    #[serde(rename = "tomorrow_this_moment")]
    TomorrowThisMoment,
}

impl LaterOption {
    /// Map a round hour offset to its named option.
    pub fn from_hours(hours: f64) -> Option<Self> {
        if hours == 0.5 {
            Some(LaterOption::ThirtyMin)
        } else if hours == 1.0 {
            Some(LaterOption::OneHour)
        } else if hours == 2.0 {
            Some(LaterOption::TwoHours)
        } else if hours == 3.0 {
            Some(LaterOption::ThreeHours)
        } else if hours == 24.0 {
            Some(LaterOption::TomorrowThisMoment)
        } else {
            None
        }
    }
}

/// How the reminder for a committed event fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReminderPolicy {
    /// Remind N minutes before the event; 0 means on time.
    Early { early_minute: u32 },
    /// Remind after a named relative delay.
    Later { later: LaterOption },
    /// Remind at an absolute instant (epoch milliseconds).
    SpecificTime { specific_stamp: i64 },
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        ReminderPolicy::Early { early_minute: 0 }
    }
}

/// Fully resolved, validated scheduling output. Committed at most once
/// per target record.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Model-reformulated description of the event.
    pub description: String,
    /// Absolute instant of the event, epoch milliseconds. Always in the
    /// future relative to the pipeline's own start time.
    pub calendar_stamp: i64,
    /// Absolute instant the notification fires, epoch milliseconds.
    pub remind_stamp: i64,
    pub reminder: ReminderPolicy,
    /// For notes: replace the note body with this text on commit.
    pub body_override: Option<String>,
}

// =============================================================================
// TARGET RECORDS
// =============================================================================

/// The scheduling sub-structure this pipeline writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub calendar_stamp: i64,
    pub remind_stamp: i64,
    pub reminder: ReminderPolicy,
}

/// Which worker produced a committed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub persona: String,
    pub provider: String,
    pub model: String,
}

/// Lifecycle state of a note or task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordState {
    Active,
    Removed,
}

/// A posted note. Owned by the note subsystem; this pipeline only
/// updates the scheduling fields, provenance, and (optionally) the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub body: String,
    pub state: RecordState,
    pub schedule: Option<Schedule>,
    pub provenance: Option<Provenance>,
    pub edited_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task. Same ownership rules as [`NoteRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub owner: Uuid,
    pub description: String,
    pub state: RecordState,
    pub schedule: Option<Schedule>,
    pub provenance: Option<Provenance>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountState {
    Normal,
    Suspended,
}

/// Automation usage counters on an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quota {
    pub dispatch_count: u32,
    pub last_dispatch_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub state: AccountState,
    /// IANA timezone name, e.g. `Asia/Shanghai`. Malformed values fall
    /// back to a fixed offset at resolution time.
    pub timezone: String,
    pub locale: String,
    /// Paid-tier accounts bypass the free dispatch limit.
    pub subscribed: bool,
    pub quota: Quota,
}

// =============================================================================
// MODEL NAME NORMALIZATION
// =============================================================================

/// Normalize a provider wire model name for provenance storage.
///
/// A few providers expose generic aliases on the wire; stored provenance
/// uses the concrete family name instead.
pub fn storage_model_name(model: &str) -> &str {
    match model {
        "deepseek-chat" => "deepseek-v3",
        "deepseek-reasoner" => "deepseek-r1",
        other => other,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_day_keywords_round_trip() {
        for kw in RelativeDay::KEYWORDS {
            let day: RelativeDay = kw.parse().expect(kw);
            let json = serde_json::to_string(&day).unwrap();
            assert_eq!(json, format!("\"{}\"", kw));
        }
    }

    #[test]
    fn relative_day_rejects_unknown_keyword() {
        assert!("someday".parse::<RelativeDay>().is_err());
        assert!("Tomorrow".parse::<RelativeDay>().is_err());
    }

    #[test]
    fn weekday_index_sunday_first() {
        assert_eq!(RelativeDay::Sunday.weekday_index(), Some(0));
        assert_eq!(RelativeDay::Saturday.weekday_index(), Some(6));
        assert_eq!(RelativeDay::Tomorrow.weekday_index(), None);
    }

    #[test]
    fn later_option_from_round_hours() {
        assert_eq!(LaterOption::from_hours(0.5), Some(LaterOption::ThirtyMin));
        assert_eq!(LaterOption::from_hours(1.0), Some(LaterOption::OneHour));
        assert_eq!(LaterOption::from_hours(24.0), Some(LaterOption::TomorrowThisMoment));
        assert_eq!(LaterOption::from_hours(1.5), None);
    }

    #[test]
    fn reminder_policy_wire_format() {
        let early = ReminderPolicy::Early { early_minute: 30 };
        assert_eq!(
            serde_json::to_value(early).unwrap(),
            serde_json::json!({"type": "early", "early_minute": 30})
        );

        let later = ReminderPolicy::Later {
            later: LaterOption::OneHour,
        };
        assert_eq!(
            serde_json::to_value(later).unwrap(),
            serde_json::json!({"type": "later", "later": "1hr"})
        );

        let specific = ReminderPolicy::SpecificTime {
            specific_stamp: 1_700_000_000_000,
        };
        assert_eq!(
            serde_json::to_value(specific).unwrap(),
            serde_json::json!({"type": "specific_time", "specific_stamp": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn reminder_policy_default_is_on_time() {
        assert_eq!(
            ReminderPolicy::default(),
            ReminderPolicy::Early { early_minute: 0 }
        );
    }

    #[test]
    fn directive_default_is_noop() {
        let d = Directive::default();
        assert_eq!(d.direction, Direction::NoOp);
        assert!(d.description.is_none());
        assert!(d.later_hour_offset.is_none());
    }

    #[test]
    fn storage_model_name_rewrites_aliases() {
        assert_eq!(storage_model_name("deepseek-chat"), "deepseek-v3");
        assert_eq!(storage_model_name("deepseek-reasoner"), "deepseek-r1");
        assert_eq!(storage_model_name("glm-4.6"), "glm-4.6");
    }

    #[test]
    fn record_state_wire_format() {
        assert_eq!(
            serde_json::to_string(&RecordState::Active).unwrap(),
            "\"ACTIVE\""
        );
        assert_eq!(
            serde_json::to_string(&AccountState::Normal).unwrap(),
            "\"NORMAL\""
        );
    }
}
