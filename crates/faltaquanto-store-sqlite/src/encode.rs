//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings; weekday sets as their
//! bit mask.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use faltaquanto_core::{
  account::{User, UserAccount},
  subject::{AbsenceEvent, Subject},
  weekday::WeekdaySet,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Weekdays & counters ─────────────────────────────────────────────────────

pub fn encode_weekdays(set: WeekdaySet) -> i64 { i64::from(set.bits()) }

pub fn decode_weekdays(bits: i64) -> Result<WeekdaySet> {
  let bits = u8::try_from(bits).map_err(|_| Error::CorruptCounter {
    column: "weekdays",
    value:  bits,
  })?;
  Ok(WeekdaySet::from_bits(bits)?)
}

pub fn decode_counter(column: &'static str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::CorruptCounter { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `users` row including the password hash.
pub struct RawAccount {
  pub user:          RawUser,
  pub password_hash: String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<UserAccount> {
    Ok(UserAccount {
      user:          self.user.into_user()?,
      password_hash: self.password_hash,
    })
  }
}

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:         String,
  pub owner_id:           String,
  pub name:               String,
  pub weekdays:           i64,
  pub absence_limit:      i64,
  pub absences_committed: i64,
  pub classes_attended:   i64,
  pub created_at:         String,
}

/// Raw values read directly from an `absences` row.
pub struct RawAbsence {
  pub absence_id:  String,
  pub subject_id:  String,
  pub recorded_at: String,
}

impl RawAbsence {
  pub fn into_event(self) -> Result<AbsenceEvent> {
    Ok(AbsenceEvent {
      absence_id:  decode_uuid(&self.absence_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

impl RawSubject {
  pub fn into_subject(self, absences: Vec<AbsenceEvent>) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      owner_id: decode_uuid(&self.owner_id)?,
      name: self.name,
      weekdays: decode_weekdays(self.weekdays)?,
      absence_limit: decode_counter("absence_limit", self.absence_limit)?,
      absences_committed: decode_counter("absences_committed", self.absences_committed)?,
      classes_attended: decode_counter("classes_attended", self.classes_attended)?,
      absences,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Attach absence rows to their subjects, preserving the row order of both.
pub fn assemble_subjects(subjects: Vec<RawSubject>, absences: Vec<RawAbsence>) -> Result<Vec<Subject>> {
  let mut by_subject: HashMap<String, Vec<AbsenceEvent>> = HashMap::new();
  for raw in absences {
    let key = raw.subject_id.clone();
    by_subject.entry(key).or_default().push(raw.into_event()?);
  }

  subjects
    .into_iter()
    .map(|raw| {
      let events = by_subject.remove(&raw.subject_id).unwrap_or_default();
      raw.into_subject(events)
    })
    .collect()
}
