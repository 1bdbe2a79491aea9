//! Weekdays and weekday sets.
//!
//! Weekdays are numbered the way the schedule is stored: `0` is Sunday and
//! `6` is Saturday.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, FromRepr, IntoEnumIterator};

use crate::{Error, Result};

/// A day of the week, serialised as its integer (`0` = Sunday).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumIter,
  EnumCount,
  FromRepr,
  Serialize,
  Deserialize,
)]
#[repr(u8)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weekday {
  Sunday = 0,
  Monday = 1,
  Tuesday = 2,
  Wednesday = 3,
  Thursday = 4,
  Friday = 5,
  Saturday = 6,
}

impl Weekday {
  pub fn index(self) -> u8 { self as u8 }

  /// Three-letter label used on schedule checkboxes.
  pub fn label(self) -> &'static str {
    match self {
      Self::Sunday => "Dom",
      Self::Monday => "Seg",
      Self::Tuesday => "Ter",
      Self::Wednesday => "Qua",
      Self::Thursday => "Qui",
      Self::Friday => "Sex",
      Self::Saturday => "Sáb",
    }
  }

  /// Full day name, as used in long dates.
  pub fn long_label(self) -> &'static str {
    match self {
      Self::Sunday => "domingo",
      Self::Monday => "segunda-feira",
      Self::Tuesday => "terça-feira",
      Self::Wednesday => "quarta-feira",
      Self::Thursday => "quinta-feira",
      Self::Friday => "sexta-feira",
      Self::Saturday => "sábado",
    }
  }
}

impl TryFrom<u8> for Weekday {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> {
    Self::from_repr(value).ok_or(Error::InvalidWeekday(value))
  }
}

impl From<Weekday> for u8 {
  fn from(day: Weekday) -> Self { day.index() }
}

impl From<chrono::Weekday> for Weekday {
  fn from(day: chrono::Weekday) -> Self {
    match day {
      chrono::Weekday::Sun => Self::Sunday,
      chrono::Weekday::Mon => Self::Monday,
      chrono::Weekday::Tue => Self::Tuesday,
      chrono::Weekday::Wed => Self::Wednesday,
      chrono::Weekday::Thu => Self::Thursday,
      chrono::Weekday::Fri => Self::Friday,
      chrono::Weekday::Sat => Self::Saturday,
    }
  }
}

impl fmt::Display for Weekday {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ─── WeekdaySet ──────────────────────────────────────────────────────────────

/// A set of weekdays, held as a 7-bit mask (bit `n` = weekday `n`).
///
/// Serialises as a sorted array of weekday integers, e.g. `[1, 3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
  const ALL_BITS: u8 = (1 << Weekday::COUNT) - 1;

  pub const fn empty() -> Self { Self(0) }

  /// Rebuild a set from its stored mask. Bits above Saturday are rejected.
  pub fn from_bits(bits: u8) -> Result<Self> {
    if bits & !Self::ALL_BITS != 0 {
      return Err(Error::InvalidWeekday(bits));
    }
    Ok(Self(bits))
  }

  pub fn bits(self) -> u8 { self.0 }

  pub fn is_empty(self) -> bool { self.0 == 0 }

  pub fn len(self) -> usize { self.0.count_ones() as usize }

  pub fn contains(self, day: Weekday) -> bool { self.0 & (1 << day.index()) != 0 }

  pub fn insert(&mut self, day: Weekday) { self.0 |= 1 << day.index(); }

  pub fn remove(&mut self, day: Weekday) { self.0 &= !(1 << day.index()); }

  /// Flip membership of `day`, as a schedule checkbox does.
  pub fn toggle(&mut self, day: Weekday) { self.0 ^= 1 << day.index(); }

  /// Members in ascending order (Sunday first).
  pub fn iter(self) -> impl Iterator<Item = Weekday> {
    Weekday::iter().filter(move |d| self.contains(*d))
  }

  /// Short labels joined with `", "`, e.g. `"Seg, Qua"`.
  pub fn labels(self) -> String {
    self.iter().map(Weekday::label).collect::<Vec<_>>().join(", ")
  }
}

impl FromIterator<Weekday> for WeekdaySet {
  fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
    let mut set = Self::empty();
    for day in iter {
      set.insert(day);
    }
    set
  }
}

impl From<Vec<Weekday>> for WeekdaySet {
  fn from(days: Vec<Weekday>) -> Self { days.into_iter().collect() }
}

impl From<WeekdaySet> for Vec<Weekday> {
  fn from(set: WeekdaySet) -> Self { set.iter().collect() }
}
