//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use faltaquanto_core::{
  account::User,
  attendance::Mark,
  store::AttendanceStore,
  subject::{NewSubject, SubjectPatch},
  weekday::{Weekday, WeekdaySet},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, email: &str) -> User {
  s.create_user(email.into(), "$argon2id$stub".into())
    .await
    .unwrap()
    .expect("fresh email")
}

fn days(list: &[Weekday]) -> WeekdaySet { list.iter().copied().collect() }

fn penal() -> NewSubject {
  NewSubject::new("Direito Penal", days(&[Weekday::Monday, Weekday::Wednesday]))
}

fn civil() -> NewSubject {
  NewSubject::new("Direito Civil", days(&[Weekday::Tuesday]))
}

// ─── Accounts & sessions ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_user() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;

  let account = s.find_user_by_email("ana@example.com").await.unwrap().unwrap();
  assert_eq!(account.user, u);
  assert_eq!(account.password_hash, "$argon2id$stub");

  assert!(s.find_user_by_email("bob@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_returns_none() {
  let s = store().await;
  user(&s, "ana@example.com").await;
  let again = s
    .create_user("ana@example.com".into(), "$argon2id$other".into())
    .await
    .unwrap();
  assert!(again.is_none());
}

#[tokio::test]
async fn session_lookup_respects_expiry() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let now = Utc::now();

  s.create_session(u.user_id, "live".into(), now + Duration::hours(1))
    .await
    .unwrap();
  s.create_session(u.user_id, "stale".into(), now - Duration::seconds(1))
    .await
    .unwrap();

  assert_eq!(s.session_user("live".into(), now).await.unwrap(), Some(u.clone()));
  assert!(s.session_user("stale".into(), now).await.unwrap().is_none());
  assert!(s.session_user("unknown".into(), now).await.unwrap().is_none());
  assert!(
    s.session_user("live".into(), now + Duration::hours(2))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn deleted_session_no_longer_resolves() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let now = Utc::now();
  s.create_session(u.user_id, "tok".into(), now + Duration::hours(1))
    .await
    .unwrap();

  s.delete_session("tok".into()).await.unwrap();
  assert!(s.session_user("tok".into(), now).await.unwrap().is_none());

  // Deleting again is harmless.
  s.delete_session("tok".into()).await.unwrap();
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;

  let subject = s.add_subject(u.user_id, penal()).await.unwrap();
  assert_eq!(subject.absence_limit, 7);
  assert_eq!(subject.absences_committed, 0);
  assert_eq!(subject.classes_attended, 0);
  assert!(subject.absences.is_empty());

  let fetched = s
    .get_subject(u.user_id, subject.subject_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched, subject);
  assert_eq!(fetched.weekdays, days(&[Weekday::Monday, Weekday::Wednesday]));
}

#[tokio::test]
async fn list_is_scoped_to_owner_and_ordered() {
  let s = store().await;
  let ana = user(&s, "ana@example.com").await;
  let bob = user(&s, "bob@example.com").await;

  let first = s.add_subject(ana.user_id, penal()).await.unwrap();
  let second = s.add_subject(ana.user_id, civil()).await.unwrap();
  s.add_subject(bob.user_id, penal()).await.unwrap();

  let list = s.list_subjects(ana.user_id).await.unwrap();
  let ids: Vec<Uuid> = list.iter().map(|s| s.subject_id).collect();
  assert_eq!(ids, vec![first.subject_id, second.subject_id]);

  assert_eq!(s.list_subjects(bob.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn other_users_subject_is_invisible() {
  let s = store().await;
  let ana = user(&s, "ana@example.com").await;
  let bob = user(&s, "bob@example.com").await;
  let subject = s.add_subject(ana.user_id, penal()).await.unwrap();

  let id = subject.subject_id;
  assert!(s.get_subject(bob.user_id, id).await.unwrap().is_none());
  assert!(s.mark_attended(bob.user_id, id).await.unwrap().is_none());
  assert!(s.mark_absent(bob.user_id, id).await.unwrap().is_none());
  assert!(!s.delete_subject(bob.user_id, id).await.unwrap());

  let untouched = s.get_subject(ana.user_id, id).await.unwrap().unwrap();
  assert_eq!(untouched.classes_attended, 0);
  assert_eq!(untouched.absences_committed, 0);
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let subject = s.add_subject(u.user_id, penal()).await.unwrap();

  let updated = s
    .update_subject(
      u.user_id,
      subject.subject_id,
      SubjectPatch {
        absence_limit: Some(10),
        ..Default::default()
      },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.absence_limit, 10);
  assert_eq!(updated.name, "Direito Penal");
  assert_eq!(updated.weekdays, subject.weekdays);

  let renamed = s
    .update_subject(
      u.user_id,
      subject.subject_id,
      SubjectPatch {
        name: Some("Penal II".into()),
        weekdays: Some(days(&[Weekday::Friday])),
        absence_limit: None,
      },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "Penal II");
  assert_eq!(renamed.weekdays, days(&[Weekday::Friday]));
  assert_eq!(renamed.absence_limit, 10);
}

#[tokio::test]
async fn update_missing_subject_returns_none() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let result = s
    .update_subject(
      u.user_id,
      Uuid::new_v4(),
      SubjectPatch {
        name: Some("x".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_removes_subject_and_history() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let subject = s.add_subject(u.user_id, penal()).await.unwrap();
  s.mark_absent(u.user_id, subject.subject_id).await.unwrap();

  assert!(s.delete_subject(u.user_id, subject.subject_id).await.unwrap());
  assert!(s.get_subject(u.user_id, subject.subject_id).await.unwrap().is_none());
  assert!(!s.delete_subject(u.user_id, subject.subject_id).await.unwrap());
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn mark_attended_increments_counter() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let subject = s.add_subject(u.user_id, penal()).await.unwrap();

  s.mark_attended(u.user_id, subject.subject_id).await.unwrap();
  let after = s
    .mark_attended(u.user_id, subject.subject_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(after.classes_attended, 2);
  assert_eq!(after.absences_committed, 0);
}

#[tokio::test]
async fn absences_counter_tracks_history() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let subject = s.add_subject(u.user_id, penal()).await.unwrap();
  let id = subject.subject_id;

  let (_, first) = s.mark_absent(u.user_id, id).await.unwrap().unwrap();
  let (_, second) = s.mark_absent(u.user_id, id).await.unwrap().unwrap();
  let (after, third) = s.mark_absent(u.user_id, id).await.unwrap().unwrap();

  assert_eq!(after.absences_committed, 3);
  assert_eq!(after.absences.len(), 3);
  let history: Vec<Uuid> = after.absences.iter().map(|a| a.absence_id).collect();
  assert_eq!(history, vec![first.absence_id, second.absence_id, third.absence_id]);

  let after = s
    .remove_absence(u.user_id, id, second.absence_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(after.absences_committed, 2);
  assert_eq!(after.absences.len(), 2);
  assert!(after.absences.iter().all(|a| a.absence_id != second.absence_id));
}

#[tokio::test]
async fn removing_unknown_absence_changes_nothing() {
  let s = store().await;
  let ana = user(&s, "ana@example.com").await;
  let bob = user(&s, "bob@example.com").await;
  let subject = s.add_subject(ana.user_id, penal()).await.unwrap();
  let (_, event) = s
    .mark_absent(ana.user_id, subject.subject_id)
    .await
    .unwrap()
    .unwrap();

  assert!(
    s.remove_absence(ana.user_id, subject.subject_id, Uuid::new_v4())
      .await
      .unwrap()
      .is_none()
  );
  assert!(
    s.remove_absence(bob.user_id, subject.subject_id, event.absence_id)
      .await
      .unwrap()
      .is_none()
  );

  let after = s
    .get_subject(ana.user_id, subject.subject_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(after.absences_committed, 1);
  assert_eq!(after.absences.len(), 1);
}

#[tokio::test]
async fn batch_marks_only_subjects_scheduled_that_day() {
  let s = store().await;
  let u = user(&s, "ana@example.com").await;
  let monday = s.add_subject(u.user_id, penal()).await.unwrap();
  let tuesday = s.add_subject(u.user_id, civil()).await.unwrap();

  let affected = s
    .mark_scheduled(u.user_id, Weekday::Monday, Mark::Absent)
    .await
    .unwrap();
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0].subject_id, monday.subject_id);
  assert_eq!(affected[0].absences_committed, 1);
  assert_eq!(affected[0].absences.len(), 1);

  let untouched = s
    .get_subject(u.user_id, tuesday.subject_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(untouched.absences_committed, 0);

  let affected = s
    .mark_scheduled(u.user_id, Weekday::Tuesday, Mark::Attended)
    .await
    .unwrap();
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0].classes_attended, 1);
}

#[tokio::test]
async fn batch_with_nothing_scheduled_is_empty() {
  let s = store().await;
  let ana = user(&s, "ana@example.com").await;
  let bob = user(&s, "bob@example.com").await;
  s.add_subject(bob.user_id, penal()).await.unwrap();

  let affected = s
    .mark_scheduled(ana.user_id, Weekday::Monday, Mark::Attended)
    .await
    .unwrap();
  assert!(affected.is_empty());
}
