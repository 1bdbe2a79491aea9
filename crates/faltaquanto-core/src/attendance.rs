//! Attendance bookkeeping: marks, batch outcomes and absence standing.

use serde::{Deserialize, Serialize};

use crate::{
  subject::{AbsenceEvent, Subject},
  weekday::Weekday,
};

/// Above this absence percentage a subject is shown in the danger style.
pub const DANGER_THRESHOLD_PERCENT: f64 = 70.0;

/// What happened to a scheduled class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
  /// Increments the attended-classes counter.
  Attended,
  /// Appends an absence event and increments the absences counter.
  Absent,
}

/// Request to mark every subject scheduled on a weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
  pub mark:    Mark,
  /// Defaults to the current weekday of whoever handles the request.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weekday: Option<Weekday>,
}

/// A freshly recorded absence together with the updated subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceMarked {
  pub subject: Subject,
  pub absence: AbsenceEvent,
}

/// Result of marking every subject scheduled on `weekday`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
  pub mark:     Mark,
  pub weekday:  Weekday,
  /// Subjects that were marked, in their state after the update.
  pub affected: Vec<Subject>,
}

/// `absences / limit * 100`.
///
/// A zero limit reads as 0 % with no absences and 100 % otherwise. The value
/// is not clamped: a subject over its limit reports more than 100.
pub fn absence_percent(absences: u32, limit: u32) -> f64 {
  if limit == 0 {
    return if absences == 0 { 0.0 } else { 100.0 };
  }
  f64::from(absences) / f64::from(limit) * 100.0
}

/// How close a subject is to its absence limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
  Safe,
  /// Above [`DANGER_THRESHOLD_PERCENT`] but not over the limit.
  Danger,
  /// More absences than the limit allows.
  Exceeded,
}

impl Standing {
  pub fn of(absences: u32, limit: u32) -> Self {
    if absences > limit {
      Self::Exceeded
    } else if absence_percent(absences, limit) > DANGER_THRESHOLD_PERCENT {
      Self::Danger
    } else {
      Self::Safe
    }
  }

  /// Whether the progress bar uses the danger style.
  pub fn is_alarming(self) -> bool { !matches!(self, Self::Safe) }
}
