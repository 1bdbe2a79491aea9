//! [`SqliteStore`] — the SQLite implementation of [`AttendanceStore`].

use std::{collections::HashSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use faltaquanto_core::{
  account::{User, UserAccount},
  attendance::Mark,
  store::AttendanceStore,
  subject::{AbsenceEvent, NewSubject, Subject, SubjectPatch},
  weekday::Weekday,
};

use crate::{
  Result,
  encode::{
    RawAbsence, RawAccount, RawSubject, RawUser, assemble_subjects, encode_dt, encode_uuid,
    encode_weekdays,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

const SUBJECT_COLUMNS: &str = "subject_id, owner_id, name, weekdays, absence_limit, \
                               absences_committed, classes_attended, created_at";

fn raw_subject(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubject> {
  Ok(RawSubject {
    subject_id:         row.get(0)?,
    owner_id:           row.get(1)?,
    name:               row.get(2)?,
    weekdays:           row.get(3)?,
    absence_limit:      row.get(4)?,
    absences_committed: row.get(5)?,
    classes_attended:   row.get(6)?,
    created_at:         row.get(7)?,
  })
}

fn raw_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    email:      row.get(1)?,
    created_at: row.get(2)?,
  })
}

/// Subjects of `owner` (optionally just `only`) with their absence rows, both
/// in display order.
fn query_subjects(
  conn: &rusqlite::Connection,
  owner: &str,
  only: Option<&str>,
) -> rusqlite::Result<(Vec<RawSubject>, Vec<RawAbsence>)> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {SUBJECT_COLUMNS} FROM subjects
     WHERE owner_id = ?1 AND (?2 IS NULL OR subject_id = ?2)
     ORDER BY created_at, rowid"
  ))?;
  let subjects = stmt
    .query_map(rusqlite::params![owner, only], raw_subject)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT a.absence_id, a.subject_id, a.recorded_at
     FROM absences a
     JOIN subjects s ON s.subject_id = a.subject_id
     WHERE s.owner_id = ?1 AND (?2 IS NULL OR s.subject_id = ?2)
     ORDER BY a.recorded_at, a.rowid",
  )?;
  let absences = stmt
    .query_map(rusqlite::params![owner, only], |row| {
      Ok(RawAbsence {
        absence_id:  row.get(0)?,
        subject_id:  row.get(1)?,
        recorded_at: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok((subjects, absences))
}

/// Insert an absence row and bump the counter. Returns `false` (and writes
/// nothing) if the subject is not owned by `owner`.
fn insert_absence(
  tx: &rusqlite::Transaction<'_>,
  owner: &str,
  subject: &str,
  event: &AbsenceEvent,
) -> rusqlite::Result<bool> {
  let changed = tx.execute(
    "UPDATE subjects SET absences_committed = absences_committed + 1
     WHERE subject_id = ?1 AND owner_id = ?2",
    rusqlite::params![subject, owner],
  )?;
  if changed == 0 {
    return Ok(false);
  }
  tx.execute(
    "INSERT INTO absences (absence_id, subject_id, recorded_at) VALUES (?1, ?2, ?3)",
    rusqlite::params![encode_uuid(event.absence_id), subject, encode_dt(event.recorded_at)],
  )?;
  Ok(true)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A FaltaQuanto store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_subjects(&self, owner_id: Uuid, only: Option<Uuid>) -> Result<Vec<Subject>> {
    let owner = encode_uuid(owner_id);
    let only = only.map(encode_uuid);

    let (subjects, absences) = self
      .conn
      .call(move |conn| Ok(query_subjects(conn, &owner, only.as_deref())?))
      .await?;

    assemble_subjects(subjects, absences)
  }

  async fn load_subject(&self, owner_id: Uuid, subject_id: Uuid) -> Result<Option<Subject>> {
    Ok(self.load_subjects(owner_id, Some(subject_id)).await?.pop())
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_user(&self, email: String, password_hash: String) -> Result<Option<User>> {
    let user = User {
      user_id: Uuid::new_v4(),
      email,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(user.user_id);
    let email = user.email.clone();
    let at_str = encode_dt(user.created_at);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO users (user_id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email, password_hash, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(created.then_some(user))
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
    let email = email.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, created_at, password_hash FROM users WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawAccount {
                  user:          raw_user(row)?,
                  password_hash: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let now_str = encode_dt(Utc::now());
    let expires_str = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Housekeeping: drop this user's stale sessions.
        tx.execute(
          "DELETE FROM sessions WHERE user_id = ?1 AND expires_at <= ?2",
          rusqlite::params![user_str, now_str],
        )?;
        tx.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![token_hash, user_str, now_str, expires_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_user(&self, token_hash: String, now: DateTime<Utc>) -> Result<Option<User>> {
    let now_str = encode_dt(now);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.user_id, u.email, u.created_at
               FROM sessions s
               JOIN users u ON u.user_id = s.user_id
               WHERE s.token_hash = ?1 AND s.expires_at > ?2",
              rusqlite::params![token_hash, now_str],
              raw_user,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, owner_id: Uuid, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id:         Uuid::new_v4(),
      owner_id,
      name:               input.name,
      weekdays:           input.weekdays,
      absence_limit:      input.absence_limit,
      absences_committed: 0,
      classes_attended:   0,
      absences:           Vec::new(),
      created_at:         Utc::now(),
    };

    let id_str = encode_uuid(subject.subject_id);
    let owner_str = encode_uuid(owner_id);
    let name = subject.name.clone();
    let weekdays = encode_weekdays(subject.weekdays);
    let limit = i64::from(subject.absence_limit);
    let at_str = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, owner_id, name, weekdays, absence_limit, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, owner_str, name, weekdays, limit, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, owner_id: Uuid, subject_id: Uuid) -> Result<Option<Subject>> {
    self.load_subject(owner_id, subject_id).await
  }

  async fn list_subjects(&self, owner_id: Uuid) -> Result<Vec<Subject>> {
    self.load_subjects(owner_id, None).await
  }

  async fn update_subject(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
    patch: SubjectPatch,
  ) -> Result<Option<Subject>> {
    if patch.is_empty() {
      return self.load_subject(owner_id, subject_id).await;
    }

    let id_str = encode_uuid(subject_id);
    let owner_str = encode_uuid(owner_id);
    let name = patch.name;
    let weekdays = patch.weekdays.map(encode_weekdays);
    let limit = patch.absence_limit.map(i64::from);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET
             name          = COALESCE(?3, name),
             weekdays      = COALESCE(?4, weekdays),
             absence_limit = COALESCE(?5, absence_limit)
           WHERE subject_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str, name, weekdays, limit],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.load_subject(owner_id, subject_id).await
  }

  async fn delete_subject(&self, owner_id: Uuid, subject_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(subject_id);
    let owner_str = encode_uuid(owner_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn mark_attended(&self, owner_id: Uuid, subject_id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);
    let owner_str = encode_uuid(owner_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET classes_attended = classes_attended + 1
           WHERE subject_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.load_subject(owner_id, subject_id).await
  }

  async fn mark_absent(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
  ) -> Result<Option<(Subject, AbsenceEvent)>> {
    let event = AbsenceEvent {
      absence_id:  Uuid::new_v4(),
      recorded_at: Utc::now(),
    };

    let id_str = encode_uuid(subject_id);
    let owner_str = encode_uuid(owner_id);
    let written = event.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !insert_absence(&tx, &owner_str, &id_str, &written)? {
          return Ok(false);
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Ok(None);
    }
    Ok(
      self
        .load_subject(owner_id, subject_id)
        .await?
        .map(|subject| (subject, event)),
    )
  }

  async fn remove_absence(
    &self,
    owner_id: Uuid,
    subject_id: Uuid,
    absence_id: Uuid,
  ) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);
    let owner_str = encode_uuid(owner_id);
    let absence_str = encode_uuid(absence_id);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted = tx.execute(
          "DELETE FROM absences
           WHERE absence_id = ?1
             AND subject_id IN (SELECT subject_id FROM subjects WHERE subject_id = ?2 AND owner_id = ?3)",
          rusqlite::params![absence_str, id_str, owner_str],
        )?;
        if deleted == 0 {
          return Ok(false);
        }
        tx.execute(
          "UPDATE subjects SET absences_committed = absences_committed - 1 WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !removed {
      return Ok(None);
    }
    self.load_subject(owner_id, subject_id).await
  }

  async fn mark_scheduled(&self, owner_id: Uuid, weekday: Weekday, mark: Mark) -> Result<Vec<Subject>> {
    let owner_str = encode_uuid(owner_id);
    let day = i64::from(weekday.index());
    let now = Utc::now();

    let affected: Vec<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let ids = {
          let mut stmt = tx.prepare(
            "SELECT subject_id FROM subjects
             WHERE owner_id = ?1 AND (weekdays >> ?2) & 1 = 1
             ORDER BY created_at, rowid",
          )?;
          stmt
            .query_map(rusqlite::params![owner_str, day], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        for id in &ids {
          match mark {
            Mark::Attended => {
              tx.execute(
                "UPDATE subjects SET classes_attended = classes_attended + 1 WHERE subject_id = ?1",
                rusqlite::params![id],
              )?;
            }
            Mark::Absent => {
              let event = AbsenceEvent {
                absence_id:  Uuid::new_v4(),
                recorded_at: now,
              };
              insert_absence(&tx, &owner_str, id, &event)?;
            }
          }
        }

        tx.commit()?;
        Ok(ids)
      })
      .await?;

    if affected.is_empty() {
      return Ok(Vec::new());
    }

    let wanted: HashSet<String> = affected.into_iter().collect();
    let mut subjects = self.load_subjects(owner_id, None).await?;
    subjects.retain(|s| wanted.contains(&encode_uuid(s.subject_id)));
    Ok(subjects)
  }
}
