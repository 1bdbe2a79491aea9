//! Subject — a tracked class with a weekly schedule and an absence limit.
//!
//! A subject carries its own bookkeeping: an attended-classes counter, an
//! absences counter, and the ordered list of absence events backing that
//! counter. The store keeps `absences_committed == absences.len()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  attendance::{self, Standing},
  weekday::{Weekday, WeekdaySet},
};

/// Absence limit given to new subjects when the caller does not pick one.
pub const DEFAULT_ABSENCE_LIMIT: u32 = 7;

// ─── Absence events ──────────────────────────────────────────────────────────

/// A missed class. The timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceEvent {
  pub absence_id:  Uuid,
  pub recorded_at: DateTime<Utc>,
}

// ─── Subject ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:         Uuid,
  /// The user this subject belongs to; every query is scoped by it.
  pub owner_id:           Uuid,
  pub name:               String,
  pub weekdays:           WeekdaySet,
  pub absence_limit:      u32,
  pub absences_committed: u32,
  pub classes_attended:   u32,
  /// Oldest first.
  pub absences:           Vec<AbsenceEvent>,
  pub created_at:         DateTime<Utc>,
}

impl Subject {
  pub fn is_scheduled_on(&self, day: Weekday) -> bool { self.weekdays.contains(day) }

  /// Absences as a percentage of the limit; see [`attendance::absence_percent`].
  pub fn absence_percent(&self) -> f64 {
    attendance::absence_percent(self.absences_committed, self.absence_limit)
  }

  pub fn standing(&self) -> Standing {
    Standing::of(self.absences_committed, self.absence_limit)
  }

  /// Absences left before the limit is exceeded.
  pub fn remaining_absences(&self) -> u32 {
    self.absence_limit.saturating_sub(self.absences_committed)
  }
}

// ─── NewSubject ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::AttendanceStore::add_subject`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
  pub name:          String,
  pub weekdays:      WeekdaySet,
  pub absence_limit: u32,
}

impl NewSubject {
  pub fn new(name: impl Into<String>, weekdays: WeekdaySet) -> Self {
    Self {
      name: name.into(),
      weekdays,
      absence_limit: DEFAULT_ABSENCE_LIMIT,
    }
  }

  /// Trim the name and check the record invariants.
  pub fn validate(mut self) -> Result<Self> {
    self.name = validate_name(&self.name)?;
    validate_weekdays(self.weekdays)?;
    Ok(self)
  }
}

// ─── SubjectDraft ────────────────────────────────────────────────────────────

/// Body of a create request. A missing `absence_limit` is filled in by the
/// server from its configured default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDraft {
  pub name:          String,
  pub weekdays:      WeekdaySet,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub absence_limit: Option<u32>,
}

impl SubjectDraft {
  pub fn with_default_limit(self, default_limit: u32) -> NewSubject {
    NewSubject {
      name:          self.name,
      weekdays:      self.weekdays,
      absence_limit: self.absence_limit.unwrap_or(default_limit),
    }
  }
}

// ─── SubjectPatch ────────────────────────────────────────────────────────────

/// A partial update submitted by the edit form. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weekdays:      Option<WeekdaySet>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub absence_limit: Option<u32>,
}

impl SubjectPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.weekdays.is_none() && self.absence_limit.is_none()
  }

  /// Validate every supplied field the same way [`NewSubject::validate`] does.
  pub fn validate(mut self) -> Result<Self> {
    if let Some(name) = &self.name {
      self.name = Some(validate_name(name)?);
    }
    if let Some(weekdays) = self.weekdays {
      validate_weekdays(weekdays)?;
    }
    Ok(self)
  }

  /// Apply the patch in place.
  pub fn apply(self, subject: &mut Subject) {
    if let Some(name) = self.name {
      subject.name = name;
    }
    if let Some(weekdays) = self.weekdays {
      subject.weekdays = weekdays;
    }
    if let Some(limit) = self.absence_limit {
      subject.absence_limit = limit;
    }
  }
}

fn validate_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyName);
  }
  Ok(trimmed.to_owned())
}

fn validate_weekdays(weekdays: WeekdaySet) -> Result<()> {
  if weekdays.is_empty() {
    return Err(Error::NoWeekdays);
  }
  Ok(())
}
